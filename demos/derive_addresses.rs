//! Offline address derivation and instruction encoding
//!
//! Prints the escrow, vault and token-account addresses for a maker and seed,
//! and the encoded make / take / refund instructions. No network access.
//!
//! Usage:
//!   cargo run --example derive_addresses -- <program> <maker> <mint_a> <mint_b> [seed]

use solana_escrow_client::sdk::{
    EscrowBuilder, EscrowInstruction, TakeAccounts,
    instruction::{build_make_ix, build_refund_ix, build_take_ix},
};
use solana_escrow_client::*;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

fn show(label: &str, ix: &Instruction) -> Result<(), Box<dyn std::error::Error>> {
    let decoded = EscrowInstruction::unpack(&ix.data)?;
    println!("  {label}: {} ({})", hex::encode(&ix.data), decoded.name());
    for (i, meta) in ix.accounts.iter().enumerate() {
        let mut flags = String::new();
        if meta.is_signer {
            flags.push('s');
        }
        if meta.is_writable {
            flags.push('w');
        }
        println!("    #{i:<2} {:<44} {flags}", meta.pubkey);
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 4 {
        return Err("usage: derive_addresses <program> <maker> <mint_a> <mint_b> [seed]".into());
    }
    let program = Pubkey::from_str(&args[0])?;
    let maker = Pubkey::from_str(&args[1])?;
    let mint_a = Pubkey::from_str(&args[2])?;
    let mint_b = Pubkey::from_str(&args[3])?;
    let seed = match args.get(4) {
        Some(s) => s.parse()?,
        None => random_seed(),
    };

    print_header("Escrow Addresses");

    print_step(1, "Deriving...");
    let config = EscrowBuilder::new(program, seed)
        .maker(maker)
        .mint_a(mint_a)
        .mint_b(mint_b)
        .receive(1)
        .deposit(1)
        .build()?;
    let keys = &config.keys;
    println!("  Seed:        {seed}");
    println!("  Escrow:      {} (bump {})", keys.escrow.address, keys.escrow.bump);
    println!("  Vault:       {}", keys.vault.address);
    println!("  Maker ATA A: {}", config.maker_ata_a);

    print_step(2, "Encoding instructions (1 A for 1 B, sample taker)...");
    let (_, taker) = generate_keypair();
    let take = TakeAccounts::associated(taker, keys)?;
    show("make", &build_make_ix(&config)?)?;
    show("take", &build_take_ix(keys, &take)?)?;
    show("refund", &build_refund_ix(keys, &config.maker_ata_a))?;

    Ok(())
}

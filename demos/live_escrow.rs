//! Live Escrow: make → take on a local validator
//!
//! End-to-end run of the token escrow against a running cluster:
//! 1. Airdrops SOL to a fresh maker and taker
//! 2. Creates mint A (maker side) and mint B (taker side) and funds both
//! 3. Maker locks 50 A asking for 100 B
//! 4. Taker swaps; the escrow and its vault close
//!
//! Usage:
//!   ESCROW_PROGRAM_ID=<program> cargo run --example live_escrow
//!
//! Requires:
//!   - solana-test-validator (or ESCROW_RPC_URL) with the escrow program deployed

use solana_escrow_client::sdk::{
    ClusterConfig, EscrowBuilder, EscrowClient, Submitter, TakeAccounts,
    token::{airdrop, create_associated_account, create_mint, mint_to},
    verify::token_balance,
};
use solana_escrow_client::*;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::signature::{Keypair, Signer};

const DECIMALS: u8 = 6;
const DEPOSIT: u64 = 50;
const RECEIVE: u64 = 100;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    print_header("Live Escrow: make → take");

    // ── Step 1: Connect ─────────────────────────────────────────
    print_step(1, "Connecting...");
    let config = ClusterConfig::from_env()?;
    let client = config.rpc_client();
    let version = client.get_version().await.map_err(|e| {
        format!(
            "Failed to connect: {e}\n  \
             Is a validator running at {}? (solana-test-validator)",
            config.rpc_url
        )
    })?;
    println!("  Connected! Node: {}", version.solana_core);
    let submitter = Submitter::new(&client, config.submit_options());

    // ── Step 2: Fund maker and taker ────────────────────────────
    print_step(2, "Airdropping 2 SOL each to maker and taker...");
    let (maker, maker_pk) = generate_keypair();
    let (taker, taker_pk) = generate_keypair();
    airdrop(&submitter, &client, &maker_pk, 2 * LAMPORTS_PER_SOL).await?;
    airdrop(&submitter, &client, &taker_pk, 2 * LAMPORTS_PER_SOL).await?;
    println!("  Maker: {maker_pk}");
    println!("  Taker: {taker_pk}");

    // ── Step 3: Mints and token accounts ────────────────────────
    print_step(3, "Creating mints and token accounts...");
    let mint_a = Keypair::new();
    let mint_b = Keypair::new();
    create_mint(&submitter, &client, &maker, &mint_a, DECIMALS).await?;
    create_mint(&submitter, &client, &taker, &mint_b, DECIMALS).await?;
    let maker_ata_a =
        create_associated_account(&submitter, &maker, &maker_pk, &mint_a.pubkey()).await?;
    let taker_ata_b =
        create_associated_account(&submitter, &taker, &taker_pk, &mint_b.pubkey()).await?;
    mint_to(&submitter, &maker, &mint_a.pubkey(), &maker_ata_a, 1_000, DECIMALS).await?;
    mint_to(&submitter, &taker, &mint_b.pubkey(), &taker_ata_b, 1_000, DECIMALS).await?;
    println!("  Mint A: {} (maker holds 1000)", mint_a.pubkey());
    println!("  Mint B: {} (taker holds 1000)", mint_b.pubkey());

    // ── Step 4: Make ────────────────────────────────────────────
    let seed = random_seed();
    print_step(4, &format!("Maker offers {DEPOSIT} A for {RECEIVE} B (seed {seed})..."));
    let escrow = EscrowBuilder::new(config.program_id, seed)
        .maker(maker_pk)
        .mint_a(mint_a.pubkey())
        .mint_b(mint_b.pubkey())
        .receive(RECEIVE)
        .deposit(DEPOSIT)
        .build()?;
    let escrows = EscrowClient::new(&client, config.submit_options());
    let made = escrows.make(&maker, &escrow).await?;
    println!("  Escrow: {}", escrow.keys.escrow.address);
    println!("  Vault:  {} ({} A)", escrow.keys.vault.address, made.vault_balance);
    println!("  TX:     {}", made.signature);

    // ── Step 5: Take ────────────────────────────────────────────
    print_step(5, "Taker swaps...");
    let accounts = TakeAccounts::associated(taker_pk, &escrow.keys)?;
    let taken = escrows.take(&taker, &escrow.keys, &accounts).await?;
    println!("  TX: {}", taken.signature);
    println!("  Taker received {} A, maker received {} B", taken.deposit, taken.receive);

    // ── Step 6: Final balances ──────────────────────────────────
    print_step(6, "Final balances...");
    println!("  Maker A: {}", token_balance(&client, &maker_ata_a).await?);
    println!("  Maker B: {}", token_balance(&client, &accounts.maker_ata_b).await?);
    println!("  Taker A: {}", token_balance(&client, &accounts.taker_ata_a).await?);
    println!("  Taker B: {}", token_balance(&client, &taker_ata_b).await?);
    println!("  Escrow open: {}", escrows.status(&escrow.keys).await?.is_open());

    println!("\n=== Escrow settled ===");
    Ok(())
}

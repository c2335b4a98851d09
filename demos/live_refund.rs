//! Live Refund: make → refund, then a late take
//!
//! 1. Maker locks 75 A asking for 200 B
//! 2. Maker refunds; the deposit returns and the escrow closes
//! 3. A taker tries to take the closed escrow and is turned away
//!
//! Usage:
//!   ESCROW_PROGRAM_ID=<program> cargo run --example live_refund

use solana_escrow_client::sdk::{
    ClusterConfig, EscrowBuilder, EscrowClient, Submitter, TakeAccounts,
    token::{airdrop, create_associated_account, create_mint, mint_to},
    verify::token_balance,
};
use solana_escrow_client::*;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::signature::{Keypair, Signer};

const DECIMALS: u8 = 6;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    print_header("Live Refund: make → refund");

    // ── Step 1: Connect and fund ────────────────────────────────
    print_step(1, "Connecting and funding maker...");
    let config = ClusterConfig::from_env()?;
    let client = config.rpc_client();
    client.get_version().await.map_err(|e| {
        format!(
            "Failed to connect: {e}\n  \
             Is a validator running at {}? (solana-test-validator)",
            config.rpc_url
        )
    })?;
    let submitter = Submitter::new(&client, config.submit_options());
    let (maker, maker_pk) = generate_keypair();
    let (taker, taker_pk) = generate_keypair();
    airdrop(&submitter, &client, &maker_pk, 2 * LAMPORTS_PER_SOL).await?;
    airdrop(&submitter, &client, &taker_pk, LAMPORTS_PER_SOL).await?;

    // ── Step 2: Mints ───────────────────────────────────────────
    print_step(2, "Creating mints...");
    let mint_a = Keypair::new();
    let mint_b = Keypair::new();
    create_mint(&submitter, &client, &maker, &mint_a, DECIMALS).await?;
    create_mint(&submitter, &client, &maker, &mint_b, DECIMALS).await?;
    let maker_ata_a =
        create_associated_account(&submitter, &maker, &maker_pk, &mint_a.pubkey()).await?;
    mint_to(&submitter, &maker, &mint_a.pubkey(), &maker_ata_a, 1_000, DECIMALS).await?;
    println!("  Maker A: {}", token_balance(&client, &maker_ata_a).await?);

    // ── Step 3: Make ────────────────────────────────────────────
    let seed = random_seed();
    print_step(3, &format!("Maker offers 75 A for 200 B (seed {seed})..."));
    let escrow = EscrowBuilder::new(config.program_id, seed)
        .maker(maker_pk)
        .mint_a(mint_a.pubkey())
        .mint_b(mint_b.pubkey())
        .receive(200)
        .deposit(75)
        .build()?;
    let escrows = EscrowClient::new(&client, config.submit_options());
    let made = escrows.make(&maker, &escrow).await?;
    println!("  Escrow: {} (TX {})", escrow.keys.escrow.address, made.signature);
    println!("  Maker A: {}", token_balance(&client, &maker_ata_a).await?);

    // ── Step 4: Refund ──────────────────────────────────────────
    print_step(4, "Maker refunds...");
    let refunded = escrows.refund(&maker, &escrow.keys, &maker_ata_a).await?;
    println!("  TX: {} ({} A returned)", refunded.signature, refunded.deposit);
    println!("  Maker A: {}", token_balance(&client, &maker_ata_a).await?);

    // ── Step 5: Late take ───────────────────────────────────────
    print_step(5, "Taker tries the closed escrow...");
    let accounts = TakeAccounts::associated(taker_pk, &escrow.keys)?;
    let late = escrows
        .take(&taker, &escrow.keys, &accounts)
        .await
        .map(|_| ());
    print_result("take after refund", &late);

    println!("\n=== Refund complete ===");
    Ok(())
}

//! Create a mint owned by the configured wallet and mint an initial supply
//! into the wallet's associated account.
//!
//! Usage:
//!   ESCROW_PROGRAM_ID=<program> cargo run --example create_mint -- [amount] [decimals]

use solana_escrow_client::sdk::{
    ClusterConfig, Submitter,
    config::load_keypair,
    token::{create_associated_account, create_mint, mint_to},
    verify::token_balance,
};
use solana_escrow_client::*;
use solana_sdk::signature::{Keypair, Signer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let amount: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(21_000_000);
    let decimals: u8 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(6);

    print_header("Create Mint");

    let config = ClusterConfig::from_env()?;
    let wallet = load_keypair(&config.wallet_path)?;
    let client = config.rpc_client();
    let submitter = Submitter::new(&client, config.submit_options());

    print_step(1, "Creating mint...");
    let mint = Keypair::new();
    let sig = create_mint(&submitter, &client, &wallet, &mint, decimals).await?;
    println!("  Mint: {} ({decimals} decimals)", mint.pubkey());
    println!("  TX:   {sig}");

    print_step(2, "Creating associated account...");
    let ata =
        create_associated_account(&submitter, &wallet, &wallet.pubkey(), &mint.pubkey()).await?;
    println!("  Account: {ata}");

    print_step(3, &format!("Minting {amount} tokens..."));
    let base_units = 10u64
        .checked_pow(decimals.into())
        .and_then(|scale| amount.checked_mul(scale))
        .ok_or("supply overflows u64 at this precision")?;
    mint_to(&submitter, &wallet, &mint.pubkey(), &ata, base_units, decimals).await?;
    println!("  Balance: {}", token_balance(&client, &ata).await?);

    Ok(())
}

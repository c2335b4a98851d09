//! Live Vault: deposit and withdraw lamports
//!
//! Usage:
//!   ESCROW_PROGRAM_ID=<escrow> VAULT_PROGRAM_ID=<vault> \
//!     cargo run --example live_vault

use solana_escrow_client::sdk::{
    ClusterConfig, Submitter, VaultConfig,
    token::airdrop,
    vault::{deposit, withdraw},
};
use solana_escrow_client::*;
use solana_sdk::native_token::LAMPORTS_PER_SOL;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    print_header("Live Vault: deposit → withdraw");

    print_step(1, "Connecting...");
    let config = ClusterConfig::from_env()?;
    let program_id = config.vault_program_id()?;
    let client = config.rpc_client();
    client.get_version().await.map_err(|e| {
        format!(
            "Failed to connect: {e}\n  \
             Is a validator running at {}? (solana-test-validator)",
            config.rpc_url
        )
    })?;
    let submitter = Submitter::new(&client, config.submit_options());

    print_step(2, "Funding owner...");
    let (owner, owner_pk) = generate_keypair();
    airdrop(&submitter, &client, &owner_pk, 2 * LAMPORTS_PER_SOL).await?;
    let vault = VaultConfig::derive(program_id, owner_pk)?;
    println!("  Owner: {owner_pk}");
    println!("  Vault: {} (bump {})", vault.vault.address, vault.vault.bump);

    print_step(3, "Depositing 0.5 SOL...");
    let sig = deposit(&submitter, &client, &owner, &vault, LAMPORTS_PER_SOL / 2).await?;
    println!("  TX: {sig}");
    println!("  Vault: {} lamports", client.get_balance(&vault.vault.address).await?);

    print_step(4, "Withdrawing...");
    let (sig, released) = withdraw(&submitter, &client, &owner, &vault).await?;
    println!("  TX: {sig} ({released} lamports released)");
    println!("  Owner: {} lamports", client.get_balance(&owner_pk).await?);

    print_step(5, "Withdrawing from the empty vault...");
    let again = withdraw(&submitter, &client, &owner, &vault).await.map(|_| ());
    print_result("empty withdraw", &again);

    println!("\n=== Vault drained ===");
    Ok(())
}

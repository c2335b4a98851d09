//! REST API over the escrow client, signing with a custodial wallet.
//!
//! Usage:
//!   ESCROW_PROGRAM_ID=<program> cargo run --bin api
//!
//! Requires a reachable RPC node (ESCROW_RPC_URL, default the local
//! validator at http://127.0.0.1:8899) and a funded wallet (ESCROW_WALLET).

use solana_escrow_client::api::{AppState, build_router, start_tracker};
use solana_escrow_client::sdk::ClusterConfig;
use solana_escrow_client::sdk::config::load_keypair;
use solana_sdk::signer::Signer;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[api] {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClusterConfig::from_env()?;
    let wallet = load_keypair(&config.wallet_path)?;

    println!("Connecting to {}...", config.rpc_url);
    let client = config.rpc_client();
    let version = client.get_version().await.map_err(|e| {
        format!(
            "Failed to connect: {e}\n  \
             Is a validator running at {}? (solana-test-validator)",
            config.rpc_url
        )
    })?;
    let balance = client.get_balance(&wallet.pubkey()).await?;
    println!(
        "Connected! Node: {}, wallet {} holds {} lamports",
        version.solana_core,
        wallet.pubkey(),
        balance
    );

    let state = AppState::new(Arc::new(client), &config, wallet);
    start_tracker(state.clone(), Duration::from_secs(5));

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    println!("Listening on http://{}", config.listen);
    println!("Escrow program: {}", config.program_id);
    println!();
    println!("Endpoints:");
    println!("  POST /escrow                    Make escrow (service wallet is maker)");
    println!("  POST /escrow/import             Register someone else's escrow");
    println!("  GET  /escrow/{{id}}               Status + details");
    println!("  POST /escrow/{{id}}/take          Take (service wallet is taker)");
    println!("  POST /escrow/{{id}}/refund        Refund to maker");
    println!("  GET  /escrow/{{id}}/instructions  Encoded instructions");

    axum::serve(listener, app).await?;

    Ok(())
}

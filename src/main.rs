fn main() {
    println!("Solana Escrow Client");
    println!("====================");
    println!();
    println!("Set ESCROW_PROGRAM_ID (and VAULT_PROGRAM_ID for the vault demo), then:");
    println!("  cargo run --example derive_addresses");
    println!("  cargo run --example create_mint");
    println!("  cargo run --example live_escrow");
    println!("  cargo run --example live_refund");
    println!("  cargo run --example live_vault");
    println!("  cargo run --bin api");
}

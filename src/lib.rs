//! Client for a three-phase token escrow on Solana (make → take | refund),
//! plus the lamport vault and SPL token fixtures used alongside it.
//!
//! The on-chain programs are assumed deployed; this crate derives addresses,
//! encodes instructions, submits transactions and verifies the resulting
//! ledger state. See `demos/` for end-to-end runs against a local validator.

pub mod api;
pub mod sdk;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;

/// Generate a fresh keypair together with its public key.
pub fn generate_keypair() -> (Keypair, Pubkey) {
    let kp = Keypair::new();
    let pk = kp.pubkey();
    (kp, pk)
}

/// Random escrow seed, for demos that want a fresh instance per run.
pub fn random_seed() -> u64 {
    rand::random()
}

pub fn print_header(title: &str) {
    println!("\n=== {} ===\n", title);
}

pub fn print_step(num: usize, description: &str) {
    println!("Step {}: {}", num, description);
}

pub fn print_result<E: std::fmt::Display>(label: &str, result: &Result<(), E>) {
    match result {
        Ok(()) => println!("  [{}] PASS", label),
        Err(e) => println!("  [{}] FAIL as expected: {}", label, e),
    }
}

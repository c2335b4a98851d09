//! Program-derived address helpers.
//!
//! The seed tuples here are the durable contract with the on-chain programs:
//! `"escrow" ‖ maker ‖ seed.to_le_bytes()` for the escrow record, the
//! associated token address of (escrow, mint A) for its vault, and
//! `"vault" ‖ owner` for the lamport vault.

use solana_sdk::pubkey::Pubkey;

use super::error::EscrowError;

pub const ESCROW_SEED: &[u8] = b"escrow";
pub const VAULT_SEED: &[u8] = b"vault";

/// An off-curve address together with the bump that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivedAddress {
    pub address: Pubkey,
    pub bump: u8,
}

/// Search for the canonical (highest) bump for
/// `namespace ‖ owner ‖ [numeric_seed as u64 LE]` under `program_id`.
pub fn derive_program_address(
    namespace: &[u8],
    owner: &Pubkey,
    numeric_seed: Option<u64>,
    program_id: &Pubkey,
) -> Result<DerivedAddress, EscrowError> {
    let seed_bytes = numeric_seed.map(u64::to_le_bytes);
    let mut seeds: Vec<&[u8]> = vec![namespace, owner.as_ref()];
    if let Some(bytes) = seed_bytes.as_ref() {
        seeds.push(bytes.as_slice());
    }
    find(&seeds, program_id)
}

fn find(seeds: &[&[u8]], program_id: &Pubkey) -> Result<DerivedAddress, EscrowError> {
    Pubkey::try_find_program_address(seeds, program_id)
        .map(|(address, bump)| DerivedAddress { address, bump })
        .ok_or_else(|| {
            EscrowError::InvalidConfig(format!(
                "no off-curve address for {} seed(s) under program {program_id}",
                seeds.len()
            ))
        })
}

pub fn escrow_address(
    maker: &Pubkey,
    seed: u64,
    program_id: &Pubkey,
) -> Result<DerivedAddress, EscrowError> {
    derive_program_address(ESCROW_SEED, maker, Some(seed), program_id)
}

/// Associated token account of `wallet` for `mint`.
///
/// Seeds are `[wallet, token_program, mint]` under the associated-token
/// program; `wallet` may itself be off-curve.
pub fn associated_token_address(
    wallet: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Result<DerivedAddress, EscrowError> {
    find(
        &[wallet.as_ref(), token_program.as_ref(), mint.as_ref()],
        &spl_associated_token_account::id(),
    )
}

/// Token vault held by an escrow: the escrow's associated account for mint A.
pub fn vault_address(
    escrow: &Pubkey,
    mint_a: &Pubkey,
    token_program: &Pubkey,
) -> Result<DerivedAddress, EscrowError> {
    associated_token_address(escrow, mint_a, token_program)
}

/// System-owned lamport vault for `owner`.
pub fn sol_vault_address(
    owner: &Pubkey,
    program_id: &Pubkey,
) -> Result<DerivedAddress, EscrowError> {
    derive_program_address(VAULT_SEED, owner, None, program_id)
}

//! Read-back checks after a confirmed transaction.
//!
//! Closure is asserted through absence: fetching a closed account yields
//! [`EscrowError::AccountNotFound`], which these helpers treat as success.

use std::fmt::Display;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use super::error::EscrowError;
use super::escrow::{EscrowConfig, EscrowKeys};
use super::instruction::TakeAccounts;
use super::ledger::{Ledger, TransactionMeta};
use super::state::{EscrowRecord, TokenAccountState};

pub async fn fetch_escrow<L: Ledger>(
    ledger: &L,
    address: &Pubkey,
) -> Result<EscrowRecord, EscrowError> {
    let account = ledger
        .get_account(address)
        .await
        .map_err(|e| EscrowError::from_ledger("fetch escrow", e))?
        .ok_or(EscrowError::AccountNotFound { address: *address })?;
    EscrowRecord::decode(address, &account.data)
}

pub async fn fetch_token_account<L: Ledger>(
    ledger: &L,
    address: &Pubkey,
) -> Result<TokenAccountState, EscrowError> {
    let account = ledger
        .get_account(address)
        .await
        .map_err(|e| EscrowError::from_ledger("fetch token account", e))?
        .ok_or(EscrowError::AccountNotFound { address: *address })?;
    TokenAccountState::decode(address, &account)
}

/// Token balance, with a missing account reading as zero.
pub async fn token_balance<L: Ledger>(ledger: &L, address: &Pubkey) -> Result<u64, EscrowError> {
    match fetch_token_account(ledger, address).await {
        Ok(state) => Ok(state.amount),
        Err(EscrowError::AccountNotFound { .. }) => Ok(0),
        Err(e) => Err(e),
    }
}

/// Succeeds only if `address` no longer exists.
pub async fn ensure_closed<L: Ledger>(
    ledger: &L,
    address: &Pubkey,
    label: &str,
) -> Result<(), EscrowError> {
    let account = ledger
        .get_account(address)
        .await
        .map_err(|e| EscrowError::from_ledger("check closed", e))?;
    match account {
        None => Ok(()),
        Some(acc) => Err(EscrowError::Verification(format!(
            "{label} {address} still exists ({} lamports, {} bytes)",
            acc.lamports,
            acc.data.len()
        ))),
    }
}

fn mismatch(
    field: &str,
    address: &Pubkey,
    expected: impl Display,
    actual: impl Display,
) -> EscrowError {
    EscrowError::Verification(format!(
        "{field} at {address}: expected {expected}, got {actual}"
    ))
}

/// What a confirmed make left on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MakeReport {
    pub record: EscrowRecord,
    pub vault: TokenAccountState,
}

pub async fn verify_make<L: Ledger>(
    ledger: &L,
    config: &EscrowConfig,
) -> Result<MakeReport, EscrowError> {
    let keys = &config.keys;
    let escrow = &keys.escrow.address;
    let record = fetch_escrow(ledger, escrow).await?;

    if record.seed != keys.seed {
        return Err(mismatch("escrow seed", escrow, keys.seed, record.seed));
    }
    if record.maker != keys.maker {
        return Err(mismatch("escrow maker", escrow, keys.maker, record.maker));
    }
    if record.mint_a != keys.mint_a {
        return Err(mismatch("escrow mint A", escrow, keys.mint_a, record.mint_a));
    }
    if record.mint_b != keys.mint_b {
        return Err(mismatch("escrow mint B", escrow, keys.mint_b, record.mint_b));
    }
    if record.receive != config.receive {
        return Err(mismatch("escrow receive", escrow, config.receive, record.receive));
    }
    if record.bump != keys.escrow.bump {
        return Err(mismatch("escrow bump", escrow, keys.escrow.bump, record.bump));
    }

    let vault_addr = &keys.vault.address;
    let vault = fetch_token_account(ledger, vault_addr).await?;
    if vault.amount != config.deposit {
        return Err(mismatch("vault balance", vault_addr, config.deposit, vault.amount));
    }
    if vault.owner != *escrow {
        return Err(mismatch("vault owner", vault_addr, escrow, vault.owner));
    }
    if vault.mint != keys.mint_a {
        return Err(mismatch("vault mint", vault_addr, keys.mint_a, vault.mint));
    }

    Ok(MakeReport { record, vault })
}

/// Metadata of a confirmed transaction, which must be visible by now.
pub async fn confirmed_transaction<L: Ledger>(
    ledger: &L,
    signature: &Signature,
) -> Result<TransactionMeta, EscrowError> {
    let meta = ledger
        .get_transaction(signature)
        .await
        .map_err(|e| EscrowError::from_ledger("fetch transaction", e))?
        .ok_or_else(|| {
            EscrowError::Verification(format!("confirmed transaction {signature} is not visible"))
        })?;
    if let Some(error) = &meta.error {
        return Err(EscrowError::Verification(format!(
            "transaction {signature} is recorded as failed: {error}"
        )));
    }
    Ok(meta)
}

fn expect_delta(
    meta: &TransactionMeta,
    address: &Pubkey,
    label: &str,
    expected: i128,
) -> Result<(), EscrowError> {
    let delta = meta.token_delta(address);
    if delta != expected {
        return Err(mismatch(&format!("{label} balance change"), address, expected, delta));
    }
    Ok(())
}

/// Swap post-conditions, read from the take transaction's own balance
/// records: taker +deposit of A, vault -deposit, maker +receive of B,
/// taker -receive of B; escrow and vault closed.
pub async fn verify_take<L: Ledger>(
    ledger: &L,
    keys: &EscrowKeys,
    take: &TakeAccounts,
    signature: &Signature,
    deposit: u64,
    receive: u64,
) -> Result<(), EscrowError> {
    let meta = confirmed_transaction(ledger, signature).await?;
    let deposit = i128::from(deposit);
    let receive = i128::from(receive);
    expect_delta(&meta, &take.taker_ata_a, "taker token A", deposit)?;
    expect_delta(&meta, &keys.vault.address, "vault", -deposit)?;
    expect_delta(&meta, &take.maker_ata_b, "maker token B", receive)?;
    expect_delta(&meta, &take.taker_ata_b, "taker token B", -receive)?;
    ensure_closed(ledger, &keys.vault.address, "vault").await?;
    ensure_closed(ledger, &keys.escrow.address, "escrow").await
}

/// Refund post-conditions: maker +deposit of A, vault drained and closed,
/// escrow closed.
pub async fn verify_refund<L: Ledger>(
    ledger: &L,
    keys: &EscrowKeys,
    maker_ata_a: &Pubkey,
    signature: &Signature,
    deposit: u64,
) -> Result<(), EscrowError> {
    let meta = confirmed_transaction(ledger, signature).await?;
    let deposit = i128::from(deposit);
    expect_delta(&meta, maker_ata_a, "maker token A", deposit)?;
    expect_delta(&meta, &keys.vault.address, "vault", -deposit)?;
    ensure_closed(ledger, &keys.vault.address, "vault").await?;
    ensure_closed(ledger, &keys.escrow.address, "escrow").await
}

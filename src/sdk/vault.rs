//! Lamport vault client.
//!
//! The vault is a system-owned PDA at `"vault" ‖ owner`. Deposit moves
//! lamports in; withdraw drains the whole balance back to the owner.

use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::system_program;

use super::error::EscrowError;
use super::ledger::Ledger;
use super::pda::{self, DerivedAddress};
use super::submit::Submitter;

pub const DEPOSIT_DISCRIMINATOR: u8 = 0;
pub const WITHDRAW_DISCRIMINATOR: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultConfig {
    pub program_id: Pubkey,
    pub owner: Pubkey,
    pub vault: DerivedAddress,
}

impl VaultConfig {
    pub fn derive(program_id: Pubkey, owner: Pubkey) -> Result<Self, EscrowError> {
        let vault = pda::sol_vault_address(&owner, &program_id)?;
        Ok(Self {
            program_id,
            owner,
            vault,
        })
    }

    fn accounts(&self) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.owner, true),
            AccountMeta::new(self.vault.address, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ]
    }
}

pub fn build_deposit_ix(config: &VaultConfig, lamports: u64) -> Result<Instruction, EscrowError> {
    if lamports == 0 {
        return Err(EscrowError::precondition("deposit", "amount must be > 0"));
    }
    let mut data = Vec::with_capacity(9);
    data.push(DEPOSIT_DISCRIMINATOR);
    data.extend_from_slice(&lamports.to_le_bytes());
    Ok(Instruction {
        program_id: config.program_id,
        accounts: config.accounts(),
        data,
    })
}

pub fn build_withdraw_ix(config: &VaultConfig) -> Instruction {
    Instruction {
        program_id: config.program_id,
        accounts: config.accounts(),
        data: vec![WITHDRAW_DISCRIMINATOR],
    }
}

async fn vault_balance<L: Ledger>(
    ledger: &L,
    config: &VaultConfig,
    operation: &'static str,
) -> Result<u64, EscrowError> {
    ledger
        .get_balance(&config.vault.address)
        .await
        .map_err(|e| EscrowError::from_ledger(operation, e))
}

fn check_owner(
    owner: &Keypair,
    config: &VaultConfig,
    operation: &'static str,
) -> Result<(), EscrowError> {
    if owner.pubkey() != config.owner {
        return Err(EscrowError::precondition(
            operation,
            format!("signer {} does not own vault {}", owner.pubkey(), config.vault.address),
        ));
    }
    Ok(())
}

/// Deposit `lamports` and check the vault grew by exactly that much.
pub async fn deposit<L: Ledger>(
    submitter: &Submitter<'_, L>,
    ledger: &L,
    owner: &Keypair,
    config: &VaultConfig,
    lamports: u64,
) -> Result<Signature, EscrowError> {
    check_owner(owner, config, "deposit")?;
    let ix = build_deposit_ix(config, lamports)?;
    let before = vault_balance(ledger, config, "deposit").await?;
    let signature = submitter.submit("deposit", &[ix], owner, &[]).await?;
    let after = vault_balance(ledger, config, "deposit").await?;
    if after != before.saturating_add(lamports) {
        return Err(EscrowError::Verification(format!(
            "vault {} balance: expected {}, got {after}",
            config.vault.address,
            before.saturating_add(lamports)
        )));
    }
    Ok(signature)
}

/// Withdraw everything. Returns the signature and the lamports released.
pub async fn withdraw<L: Ledger>(
    submitter: &Submitter<'_, L>,
    ledger: &L,
    owner: &Keypair,
    config: &VaultConfig,
) -> Result<(Signature, u64), EscrowError> {
    check_owner(owner, config, "withdraw")?;
    let before = vault_balance(ledger, config, "withdraw").await?;
    if before == 0 {
        return Err(EscrowError::precondition(
            "withdraw",
            format!("vault {} is empty", config.vault.address),
        ));
    }
    let signature = submitter
        .submit("withdraw", &[build_withdraw_ix(config)], owner, &[])
        .await?;
    let after = vault_balance(ledger, config, "withdraw").await?;
    if after != 0 {
        return Err(EscrowError::Verification(format!(
            "vault {} still holds {after} lamports after withdraw",
            config.vault.address
        )));
    }
    Ok((signature, before))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> VaultConfig {
        VaultConfig::derive(Pubkey::new_unique(), Pubkey::new_unique()).unwrap()
    }

    #[test]
    fn deposit_data_layout() {
        let ix = build_deposit_ix(&config(), 1_000_000_000).unwrap();
        assert_eq!(ix.data[0], DEPOSIT_DISCRIMINATOR);
        assert_eq!(&ix.data[1..], &1_000_000_000u64.to_le_bytes());
    }

    #[test]
    fn deposit_rejects_zero() {
        assert!(build_deposit_ix(&config(), 0).is_err());
    }

    #[test]
    fn account_order() {
        let cfg = config();
        let ix = build_withdraw_ix(&cfg);
        assert_eq!(ix.data, vec![WITHDRAW_DISCRIMINATOR]);
        assert_eq!(ix.accounts[0].pubkey, cfg.owner);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[1].pubkey, cfg.vault.address);
        assert!(ix.accounts[1].is_writable && !ix.accounts[1].is_signer);
        assert_eq!(ix.accounts[2].pubkey, system_program::id());
    }
}

//! Per-instance escrow flows: derive, build, submit, verify.

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};

use super::error::EscrowError;
use super::escrow::{EscrowConfig, EscrowKeys};
use super::instruction::{TakeAccounts, build_make_ix, build_refund_ix, build_take_ix};
use super::ledger::Ledger;
use super::state::EscrowRecord;
use super::submit::{SubmitOptions, Submitter};
use super::verify;

/// Result of a confirmed and verified make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MakeReceipt {
    pub signature: Signature,
    pub keys: EscrowKeys,
    pub record: EscrowRecord,
    pub vault_balance: u64,
}

/// Result of a confirmed and verified take or refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleReceipt {
    pub signature: Signature,
    /// Token A released from the vault.
    pub deposit: u64,
    /// Token B paid to the maker (zero for a refund).
    pub receive: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscrowStatus {
    Open {
        record: EscrowRecord,
        vault_balance: u64,
    },
    /// The escrow account no longer exists (taken, refunded, or never made).
    Closed,
}

impl EscrowStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }
}

pub struct EscrowClient<'a, L> {
    ledger: &'a L,
    options: SubmitOptions,
}

impl<'a, L: Ledger> EscrowClient<'a, L> {
    pub fn new(ledger: &'a L, options: SubmitOptions) -> Self {
        Self { ledger, options }
    }

    fn submitter(&self) -> Submitter<'a, L> {
        Submitter::new(self.ledger, self.options)
    }

    pub async fn make(
        &self,
        maker: &Keypair,
        config: &EscrowConfig,
    ) -> Result<MakeReceipt, EscrowError> {
        let signature = self.submit_make(maker, config).await?;
        self.verify_make(config, signature).await
    }

    /// The submitting half of [`make`](Self::make). Once this returns a
    /// signature the deposit has left the maker, whatever the read-back says.
    pub async fn submit_make(
        &self,
        maker: &Keypair,
        config: &EscrowConfig,
    ) -> Result<Signature, EscrowError> {
        if maker.pubkey() != config.keys.maker {
            return Err(EscrowError::precondition(
                "make",
                format!(
                    "signer {} is not the configured maker {}",
                    maker.pubkey(),
                    config.keys.maker
                ),
            ));
        }
        let ix = build_make_ix(config)?;
        self.submitter().submit("make", &[ix], maker, &[]).await
    }

    /// Read back a landed make.
    pub async fn verify_make(
        &self,
        config: &EscrowConfig,
        signature: Signature,
    ) -> Result<MakeReceipt, EscrowError> {
        let report = verify::verify_make(self.ledger, config).await?;
        Ok(MakeReceipt {
            signature,
            keys: config.keys,
            record: report.record,
            vault_balance: report.vault.amount,
        })
    }

    /// Swap the vault's token A for the record's receive amount of token B.
    ///
    /// A missing escrow (already taken or refunded) surfaces as
    /// [`EscrowError::AccountNotFound`], both before submission and when the
    /// ledger rejects because a competing settlement landed first.
    pub async fn take(
        &self,
        taker: &Keypair,
        keys: &EscrowKeys,
        accounts: &TakeAccounts,
    ) -> Result<SettleReceipt, EscrowError> {
        if taker.pubkey() != accounts.taker {
            return Err(EscrowError::precondition(
                "take",
                format!("signer {} is not the taker {}", taker.pubkey(), accounts.taker),
            ));
        }
        let ix = build_take_ix(keys, accounts)?;
        let record = self.open_record(keys).await?;
        let deposit = verify::fetch_token_account(self.ledger, &keys.vault.address)
            .await?
            .amount;

        let signature = match self.submitter().submit("take", &[ix], taker, &[]).await {
            Ok(sig) => sig,
            Err(e) => return Err(self.settle_failure(keys, e).await),
        };
        verify::verify_take(self.ledger, keys, accounts, &signature, deposit, record.receive)
            .await?;

        Ok(SettleReceipt {
            signature,
            deposit,
            receive: record.receive,
        })
    }

    /// Return the vault's token A to the maker and close the escrow.
    pub async fn refund(
        &self,
        maker: &Keypair,
        keys: &EscrowKeys,
        maker_ata_a: &Pubkey,
    ) -> Result<SettleReceipt, EscrowError> {
        if maker.pubkey() != keys.maker {
            return Err(EscrowError::precondition(
                "refund",
                format!("signer {} is not the maker {}", maker.pubkey(), keys.maker),
            ));
        }
        self.open_record(keys).await?;
        let deposit = verify::fetch_token_account(self.ledger, &keys.vault.address)
            .await?
            .amount;

        let ix = build_refund_ix(keys, maker_ata_a);
        let signature = match self.submitter().submit("refund", &[ix], maker, &[]).await {
            Ok(sig) => sig,
            Err(e) => return Err(self.settle_failure(keys, e).await),
        };
        verify::verify_refund(self.ledger, keys, maker_ata_a, &signature, deposit).await?;

        Ok(SettleReceipt {
            signature,
            deposit,
            receive: 0,
        })
    }

    /// Current on-ledger state of the escrow.
    pub async fn status(&self, keys: &EscrowKeys) -> Result<EscrowStatus, EscrowError> {
        let record = match verify::fetch_escrow(self.ledger, &keys.escrow.address).await {
            Ok(record) => record,
            Err(EscrowError::AccountNotFound { .. }) => return Ok(EscrowStatus::Closed),
            Err(e) => return Err(e),
        };
        let vault_balance = verify::token_balance(self.ledger, &keys.vault.address).await?;
        Ok(EscrowStatus::Open {
            record,
            vault_balance,
        })
    }

    async fn open_record(&self, keys: &EscrowKeys) -> Result<EscrowRecord, EscrowError> {
        let address = keys.escrow.address;
        let record = verify::fetch_escrow(self.ledger, &address).await?;
        if record.maker != keys.maker
            || record.seed != keys.seed
            || record.mint_a != keys.mint_a
            || record.mint_b != keys.mint_b
        {
            return Err(EscrowError::InvalidAccountData {
                address,
                reason: format!(
                    "record (maker {}, seed {}) does not match the requested escrow",
                    record.maker, record.seed
                ),
            });
        }
        Ok(record)
    }

    /// A rejected settlement whose escrow is gone lost the race.
    async fn settle_failure(&self, keys: &EscrowKeys, err: EscrowError) -> EscrowError {
        if !matches!(err, EscrowError::Rejected { .. }) {
            return err;
        }
        match self.ledger.get_account(&keys.escrow.address).await {
            Ok(None) => EscrowError::AccountNotFound {
                address: keys.escrow.address,
            },
            _ => err,
        }
    }
}

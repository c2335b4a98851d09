use std::time::Duration;

use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use tokio::time::Instant;

use super::error::EscrowError;
use super::ledger::{Ledger, SignatureStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOptions {
    /// Upper bound on the confirmation wait after a successful send.
    pub confirm_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            confirm_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Signs, sends once, and waits for confirmation.
///
/// A send is never repeated: on [`EscrowError::Timeout`] the transaction may
/// still land, and the caller must re-read ledger state before retrying.
pub struct Submitter<'a, L> {
    ledger: &'a L,
    options: SubmitOptions,
}

impl<'a, L: Ledger> Submitter<'a, L> {
    pub fn new(ledger: &'a L, options: SubmitOptions) -> Self {
        Self { ledger, options }
    }

    pub fn options(&self) -> SubmitOptions {
        self.options
    }

    /// Assemble `instructions` into one transaction paid by `payer`, sign with
    /// `payer` plus `signers`, submit, and block until confirmed.
    pub async fn submit(
        &self,
        operation: &'static str,
        instructions: &[Instruction],
        payer: &Keypair,
        signers: &[&Keypair],
    ) -> Result<Signature, EscrowError> {
        if instructions.is_empty() {
            return Err(EscrowError::precondition(operation, "no instructions to submit"));
        }

        let blockhash = self
            .ledger
            .get_latest_blockhash()
            .await
            .map_err(|e| EscrowError::from_ledger(operation, e))?;

        let payer_key = payer.pubkey();
        let mut all: Vec<&Keypair> = vec![payer];
        for signer in signers {
            if signer.pubkey() != payer_key && !all.iter().any(|k| k.pubkey() == signer.pubkey()) {
                all.push(signer);
            }
        }

        let mut tx = Transaction::new_with_payer(instructions, Some(&payer_key));
        tx.try_sign(&all[..], blockhash)
            .map_err(|e| EscrowError::precondition(operation, format!("signing failed: {e}")))?;
        let expected = tx.signatures[0];

        let signature = self
            .ledger
            .send_transaction(&tx)
            .await
            .map_err(|e| match EscrowError::from_ledger(operation, e) {
                EscrowError::Rejected {
                    operation,
                    error,
                    logs,
                    ..
                } => EscrowError::Rejected {
                    operation,
                    signature: Some(expected),
                    error,
                    logs,
                },
                other => other,
            })?;

        self.wait(operation, &signature, Some(blockhash)).await?;
        Ok(signature)
    }

    /// Poll until `signature` reaches the configured commitment, fails, or the
    /// timeout elapses.
    pub async fn confirm(
        &self,
        operation: &'static str,
        signature: &Signature,
    ) -> Result<(), EscrowError> {
        self.wait(operation, signature, None).await
    }

    async fn wait(
        &self,
        operation: &'static str,
        signature: &Signature,
        blockhash: Option<Hash>,
    ) -> Result<(), EscrowError> {
        let start = Instant::now();
        loop {
            match self.ledger.get_signature_status(signature).await {
                Ok(SignatureStatus::Confirmed { .. }) => return Ok(()),
                Ok(SignatureStatus::Failed { error, .. }) => {
                    return Err(EscrowError::Rejected {
                        operation,
                        signature: Some(*signature),
                        error,
                        logs: self.failure_logs(operation, signature).await,
                    });
                }
                Ok(SignatureStatus::Pending) => {}
                // A failed poll says nothing about the transaction itself.
                Err(e) => {
                    eprintln!("[submitter] {operation}: status poll for {signature} failed: {e}")
                }
            }

            let waited = start.elapsed();
            if waited >= self.options.confirm_timeout {
                return Err(EscrowError::Timeout {
                    operation,
                    signature: *signature,
                    blockhash,
                    waited,
                });
            }
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    /// Program logs of a transaction that landed and failed. Best effort: the
    /// rejection stands even if the logs cannot be read.
    async fn failure_logs(&self, operation: &'static str, signature: &Signature) -> Vec<String> {
        match self.ledger.get_transaction(signature).await {
            Ok(Some(meta)) => meta.logs,
            Ok(None) => Vec::new(),
            Err(e) => {
                eprintln!("[submitter] {operation}: could not read logs for {signature}: {e}");
                Vec::new()
            }
        }
    }
}

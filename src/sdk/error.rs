use std::fmt;
use std::time::Duration;

use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use super::ledger::LedgerError;

/// Coarse classification of an [`EscrowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before reaching the network.
    Precondition,
    /// Transport failure or unconfirmed submission. Retry with a fresh blockhash
    /// only after re-checking ledger state.
    Network,
    /// The ledger program rejected the transaction.
    Rejected,
    /// Expected race outcome: the account was already closed (or never existed).
    Conflict,
    /// Read-back did not match what was submitted.
    Verification,
    /// Configuration or layout problem. Not recoverable.
    Fatal,
}

#[derive(Debug)]
pub enum EscrowError {
    Precondition {
        operation: &'static str,
        reason: String,
    },
    InvalidConfig(String),
    Transport {
        operation: &'static str,
        detail: String,
    },
    /// The transaction was sent but confirmation never arrived. It may still land.
    Timeout {
        operation: &'static str,
        signature: Signature,
        /// Blockhash the transaction was signed with, when the submitter built it.
        /// Once it expires the transaction can no longer land.
        blockhash: Option<Hash>,
        waited: Duration,
    },
    Rejected {
        operation: &'static str,
        signature: Option<Signature>,
        error: String,
        logs: Vec<String>,
    },
    AccountNotFound {
        address: Pubkey,
    },
    InvalidAccountData {
        address: Pubkey,
        reason: String,
    },
    Verification(String),
}

impl EscrowError {
    pub fn precondition(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Precondition {
            operation,
            reason: reason.into(),
        }
    }

    /// Attach an operation name to a raw ledger error.
    pub fn from_ledger(operation: &'static str, err: LedgerError) -> Self {
        match err {
            LedgerError::Transport(detail) => Self::Transport { operation, detail },
            LedgerError::Rejected { error, logs } => Self::Rejected {
                operation,
                signature: None,
                error,
                logs,
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Precondition { .. } => ErrorKind::Precondition,
            Self::Transport { .. } | Self::Timeout { .. } => ErrorKind::Network,
            Self::Rejected { .. } => ErrorKind::Rejected,
            Self::AccountNotFound { .. } => ErrorKind::Conflict,
            Self::Verification(_) => ErrorKind::Verification,
            Self::InvalidConfig(_) | Self::InvalidAccountData { .. } => ErrorKind::Fatal,
        }
    }

    pub fn is_account_not_found(&self) -> bool {
        matches!(self, Self::AccountNotFound { .. })
    }

    /// True when the outcome on the ledger is unknown and must be re-checked.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl fmt::Display for EscrowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Precondition { operation, reason } => {
                write!(f, "{operation}: precondition failed: {reason}")
            }
            Self::InvalidConfig(e) => write!(f, "invalid config: {e}"),
            Self::Transport { operation, detail } => {
                write!(f, "{operation}: RPC error: {detail}")
            }
            Self::Timeout {
                operation,
                signature,
                waited,
                ..
            } => write!(
                f,
                "{operation}: transaction {signature} not confirmed after {}ms (may still land)",
                waited.as_millis()
            ),
            Self::Rejected {
                operation,
                signature,
                error,
                logs,
            } => {
                match signature {
                    Some(sig) => write!(f, "{operation}: transaction {sig} rejected: {error}")?,
                    None => write!(f, "{operation}: transaction rejected: {error}")?,
                }
                if !logs.is_empty() {
                    write!(f, "\n  logs:\n    {}", logs.join("\n    "))?;
                }
                Ok(())
            }
            Self::AccountNotFound { address } => write!(f, "account not found: {address}"),
            Self::InvalidAccountData { address, reason } => {
                write!(f, "invalid account data at {address}: {reason}")
            }
            Self::Verification(e) => write!(f, "verification error: {e}"),
        }
    }
}

impl std::error::Error for EscrowError {}

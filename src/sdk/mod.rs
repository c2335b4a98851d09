pub mod client;
pub mod config;
pub mod error;
pub mod escrow;
pub mod instruction;
pub mod ledger;
pub mod pda;
pub mod state;
pub mod submit;
pub mod token;
pub mod vault;
pub mod verify;

pub use client::{EscrowClient, EscrowStatus, MakeReceipt, SettleReceipt};
pub use config::ClusterConfig;
pub use error::{ErrorKind, EscrowError};
pub use escrow::{EscrowBuilder, EscrowConfig, EscrowKeys};
pub use instruction::{EscrowInstruction, TakeAccounts};
pub use ledger::{Ledger, LedgerError, SignatureStatus, TokenBalance, TransactionMeta};
pub use pda::DerivedAddress;
pub use state::{EscrowRecord, TokenAccountState};
pub use submit::{SubmitOptions, Submitter};
pub use vault::VaultConfig;

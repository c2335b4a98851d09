//! The RPC boundary.
//!
//! Everything the SDK needs from a cluster goes through [`Ledger`]. The
//! production implementation wraps the nonblocking `RpcClient`; tests supply a
//! ledger backed by a local bank.

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::client_error::{Error as ClientError, ErrorKind as ClientErrorKind};
use solana_rpc_client_api::config::RpcTransactionConfig;
use solana_rpc_client_api::request::{RpcError, RpcResponseErrorData};
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use solana_transaction_status_client_types::option_serializer::OptionSerializer;
use solana_transaction_status_client_types::{
    EncodedConfirmedTransactionWithStatusMeta, UiTransactionEncoding, UiTransactionTokenBalance,
};

/// Raw ledger failure, before the caller attaches operation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    Transport(String),
    /// Definitive rejection (preflight simulation or execution) with program logs.
    Rejected { error: String, logs: Vec<String> },
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Rejected { error, .. } => write!(f, "rejected: {error}"),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Confirmation state of a submitted signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    /// Unknown to the cluster or not yet at the configured commitment.
    Pending,
    Confirmed { slot: u64 },
    Failed { slot: u64, error: String },
}

/// Token balance of one account as recorded in a transaction's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    pub account: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
}

/// What the ledger recorded for a processed transaction.
///
/// Token balances cover only the accounts this transaction touched, taken
/// immediately before and after it executed, so deltas computed from them are
/// unaffected by other transactions on the same accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionMeta {
    pub slot: u64,
    /// Execution error, if the transaction landed but failed.
    pub error: Option<String>,
    pub logs: Vec<String>,
    pub pre_token_balances: Vec<TokenBalance>,
    pub post_token_balances: Vec<TokenBalance>,
}

impl TransactionMeta {
    pub fn pre_balance(&self, account: &Pubkey) -> Option<u64> {
        find_balance(&self.pre_token_balances, account)
    }

    pub fn post_balance(&self, account: &Pubkey) -> Option<u64> {
        find_balance(&self.post_token_balances, account)
    }

    /// Change in `account`'s token amount; an account absent on either side
    /// (created or closed by the transaction) counts as zero there.
    pub fn token_delta(&self, account: &Pubkey) -> i128 {
        i128::from(self.post_balance(account).unwrap_or(0))
            - i128::from(self.pre_balance(account).unwrap_or(0))
    }
}

fn find_balance(balances: &[TokenBalance], account: &Pubkey) -> Option<u64> {
    balances
        .iter()
        .find(|b| b.account == *account)
        .map(|b| b.amount)
}

pub trait Ledger: Send + Sync {
    /// `Ok(None)` means the account does not exist.
    fn get_account(
        &self,
        address: &Pubkey,
    ) -> impl Future<Output = Result<Option<Account>, LedgerError>> + Send;

    fn get_balance(
        &self,
        address: &Pubkey,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;

    fn get_latest_blockhash(&self) -> impl Future<Output = Result<Hash, LedgerError>> + Send;

    /// Send a signed transaction exactly once.
    fn send_transaction(
        &self,
        tx: &Transaction,
    ) -> impl Future<Output = Result<Signature, LedgerError>> + Send;

    fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> impl Future<Output = Result<SignatureStatus, LedgerError>> + Send;

    /// `Ok(None)` until the transaction is processed at the configured commitment.
    fn get_transaction(
        &self,
        signature: &Signature,
    ) -> impl Future<Output = Result<Option<TransactionMeta>, LedgerError>> + Send;

    /// False once `blockhash` is too old for a transaction signed with it to land.
    fn is_blockhash_valid(
        &self,
        blockhash: &Hash,
    ) -> impl Future<Output = Result<bool, LedgerError>> + Send;

    fn request_airdrop(
        &self,
        to: &Pubkey,
        lamports: u64,
    ) -> impl Future<Output = Result<Signature, LedgerError>> + Send;

    fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> impl Future<Output = Result<u64, LedgerError>> + Send;
}

fn map_client_error(err: ClientError) -> LedgerError {
    if let ClientErrorKind::RpcError(RpcError::RpcResponseError {
        message,
        data: RpcResponseErrorData::SendTransactionPreflightFailure(sim),
        ..
    }) = err.kind()
    {
        let error = sim
            .err
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| message.clone());
        return LedgerError::Rejected {
            error,
            logs: sim.logs.clone().unwrap_or_default(),
        };
    }
    LedgerError::Transport(format!("{err}"))
}

fn token_balances(
    balances: OptionSerializer<Vec<UiTransactionTokenBalance>>,
    keys: &[Pubkey],
) -> Vec<TokenBalance> {
    Option::<Vec<UiTransactionTokenBalance>>::from(balances)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|b| {
            Some(TokenBalance {
                account: *keys.get(usize::from(b.account_index))?,
                mint: Pubkey::from_str(&b.mint).ok()?,
                amount: b.ui_token_amount.amount.parse().ok()?,
            })
        })
        .collect()
}

fn transaction_meta(
    tx: EncodedConfirmedTransactionWithStatusMeta,
) -> Result<TransactionMeta, LedgerError> {
    let meta = tx
        .transaction
        .meta
        .ok_or_else(|| LedgerError::Transport("transaction has no status metadata".into()))?;
    let decoded = tx
        .transaction
        .transaction
        .decode()
        .ok_or_else(|| LedgerError::Transport("transaction could not be decoded".into()))?;

    // Balance indices run over static keys followed by lookup-table addresses.
    let mut keys = decoded.message.static_account_keys().to_vec();
    if let OptionSerializer::Some(loaded) = &meta.loaded_addresses {
        for address in loaded.writable.iter().chain(&loaded.readonly) {
            if let Ok(key) = Pubkey::from_str(address) {
                keys.push(key);
            }
        }
    }

    Ok(TransactionMeta {
        slot: tx.slot,
        error: meta.err.as_ref().map(|e| e.to_string()),
        logs: Option::<Vec<String>>::from(meta.log_messages).unwrap_or_default(),
        pre_token_balances: token_balances(meta.pre_token_balances, &keys),
        post_token_balances: token_balances(meta.post_token_balances, &keys),
    })
}

impl Ledger for RpcClient {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, LedgerError> {
        self.get_account_with_commitment(address, self.commitment())
            .await
            .map(|resp| resp.value)
            .map_err(map_client_error)
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, LedgerError> {
        self.get_balance_with_commitment(address, self.commitment())
            .await
            .map(|resp| resp.value)
            .map_err(map_client_error)
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError> {
        RpcClient::get_latest_blockhash(self)
            .await
            .map_err(map_client_error)
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, LedgerError> {
        RpcClient::send_transaction(self, tx)
            .await
            .map_err(map_client_error)
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<SignatureStatus, LedgerError> {
        let resp = self
            .get_signature_statuses(&[*signature])
            .await
            .map_err(map_client_error)?;
        let Some(status) = resp.value.into_iter().next().flatten() else {
            return Ok(SignatureStatus::Pending);
        };
        if let Some(err) = &status.err {
            return Ok(SignatureStatus::Failed {
                slot: status.slot,
                error: err.to_string(),
            });
        }
        if status.satisfies_commitment(self.commitment()) {
            Ok(SignatureStatus::Confirmed { slot: status.slot })
        } else {
            Ok(SignatureStatus::Pending)
        }
    }

    async fn get_transaction(
        &self,
        signature: &Signature,
    ) -> Result<Option<TransactionMeta>, LedgerError> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            commitment: Some(self.commitment()),
            max_supported_transaction_version: Some(0),
        };
        match self.get_transaction_with_config(signature, config).await {
            Ok(tx) => transaction_meta(tx).map(Some),
            // An unknown signature comes back as a `null` result, which fails
            // to deserialize.
            Err(e) if matches!(e.kind(), ClientErrorKind::SerdeJson(_)) => Ok(None),
            Err(e) => Err(map_client_error(e)),
        }
    }

    async fn is_blockhash_valid(&self, blockhash: &Hash) -> Result<bool, LedgerError> {
        RpcClient::is_blockhash_valid(self, blockhash, self.commitment())
            .await
            .map_err(map_client_error)
    }

    async fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> Result<Signature, LedgerError> {
        RpcClient::request_airdrop(self, to, lamports)
            .await
            .map_err(map_client_error)
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, LedgerError> {
        RpcClient::get_minimum_balance_for_rent_exemption(self, data_len)
            .await
            .map_err(map_client_error)
    }
}

//! Cluster configuration, read from the environment once and passed explicitly.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, read_keypair_file};

use super::error::EscrowError;
use super::submit::SubmitOptions;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";
pub const DEFAULT_WALLET: &str = "~/.config/solana/id.json";
pub const DEFAULT_LISTEN: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    pub rpc_url: String,
    pub commitment: CommitmentConfig,
    pub program_id: Pubkey,
    pub vault_program_id: Option<Pubkey>,
    pub wallet_path: PathBuf,
    pub confirm_timeout: Duration,
    pub poll_interval: Duration,
    pub listen: String,
}

impl ClusterConfig {
    /// Defaults for everything except the escrow program id.
    pub fn new(program_id: Pubkey) -> Self {
        let defaults = SubmitOptions::default();
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            commitment: CommitmentConfig::confirmed(),
            program_id,
            vault_program_id: None,
            wallet_path: expand_home(DEFAULT_WALLET),
            confirm_timeout: defaults.confirm_timeout,
            poll_interval: defaults.poll_interval,
            listen: DEFAULT_LISTEN.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, EscrowError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` is this over `std::env`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EscrowError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let program_id = get("ESCROW_PROGRAM_ID")
            .ok_or_else(|| EscrowError::InvalidConfig("ESCROW_PROGRAM_ID is not set".into()))
            .and_then(|v| parse_pubkey("ESCROW_PROGRAM_ID", &v))?;
        let mut config = Self::new(program_id);

        if let Some(url) = get("ESCROW_RPC_URL") {
            config.rpc_url = url;
        }
        if let Some(level) = get("ESCROW_COMMITMENT") {
            config.commitment = parse_commitment(&level)?;
        }
        if let Some(v) = get("VAULT_PROGRAM_ID") {
            config.vault_program_id = Some(parse_pubkey("VAULT_PROGRAM_ID", &v)?);
        }
        if let Some(path) = get("ESCROW_WALLET") {
            config.wallet_path = expand_home(&path);
        }
        if let Some(v) = get("ESCROW_CONFIRM_TIMEOUT_SECS") {
            let secs = parse_u64("ESCROW_CONFIRM_TIMEOUT_SECS", &v)?;
            config.confirm_timeout = Duration::from_secs(secs);
        }
        if let Some(v) = get("ESCROW_POLL_INTERVAL_MS") {
            let ms = parse_u64("ESCROW_POLL_INTERVAL_MS", &v)?;
            if ms == 0 {
                return Err(EscrowError::InvalidConfig(
                    "ESCROW_POLL_INTERVAL_MS must be > 0".into(),
                ));
            }
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(addr) = get("API_LISTEN") {
            config.listen = addr;
        }
        Ok(config)
    }

    pub fn submit_options(&self) -> SubmitOptions {
        SubmitOptions {
            confirm_timeout: self.confirm_timeout,
            poll_interval: self.poll_interval,
        }
    }

    pub fn rpc_client(&self) -> RpcClient {
        RpcClient::new_with_commitment(self.rpc_url.clone(), self.commitment)
    }

    pub fn vault_program_id(&self) -> Result<Pubkey, EscrowError> {
        self.vault_program_id
            .ok_or_else(|| EscrowError::InvalidConfig("VAULT_PROGRAM_ID is not set".into()))
    }
}

/// Read a CLI-format (JSON byte array) keypair file.
pub fn load_keypair(path: &Path) -> Result<Keypair, EscrowError> {
    read_keypair_file(path).map_err(|e| {
        EscrowError::InvalidConfig(format!("cannot read keypair {}: {e}", path.display()))
    })
}

pub fn parse_commitment(level: &str) -> Result<CommitmentConfig, EscrowError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        other => Err(EscrowError::InvalidConfig(format!(
            "ESCROW_COMMITMENT must be processed, confirmed or finalized (got {other:?})"
        ))),
    }
}

fn parse_pubkey(key: &str, value: &str) -> Result<Pubkey, EscrowError> {
    Pubkey::from_str(value.trim())
        .map_err(|e| EscrowError::InvalidConfig(format!("{key}: {e} ({value:?})")))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, EscrowError> {
    value
        .trim()
        .parse()
        .map_err(|e| EscrowError::InvalidConfig(format!("{key}: {e} ({value:?})")))
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = std::env::var_os("HOME")
    {
        return PathBuf::from(home).join(rest);
    }
    PathBuf::from(path)
}

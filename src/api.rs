//! REST API types and router for the escrow client.
//!
//! The service holds one custodial wallet. Escrows it makes are refundable by
//! it; escrows made by others can be imported and taken by it. This module
//! contains the shared state, handlers, confirmation tracker and router
//! builder used by the `api` binary and integration tests.

use crate::random_seed;
use crate::sdk::{
    ClusterConfig, EscrowBuilder, EscrowClient, EscrowError, EscrowKeys, EscrowStatus, Ledger,
    SignatureStatus, SubmitOptions, TakeAccounts,
    instruction::{build_make_ix, build_refund_ix, build_take_ix},
    pda,
    verify::{fetch_escrow, token_balance},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

// ─── App State ───────────────────────────────────────────────

pub struct AppState<L> {
    pub ledger: Arc<L>,
    pub program_id: Pubkey,
    pub token_program: Pubkey,
    pub options: SubmitOptions,
    pub wallet: Arc<Keypair>,
    pub escrows: Arc<Mutex<HashMap<String, EscrowEntry>>>,
}

// Derive would require `L: Clone`; only the Arcs are cloned.
impl<L> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            program_id: self.program_id,
            token_program: self.token_program,
            options: self.options,
            wallet: Arc::clone(&self.wallet),
            escrows: Arc::clone(&self.escrows),
        }
    }
}

impl<L: Ledger> AppState<L> {
    pub fn new(ledger: Arc<L>, config: &ClusterConfig, wallet: Keypair) -> Self {
        Self {
            ledger,
            program_id: config.program_id,
            token_program: spl_token::id(),
            options: config.submit_options(),
            wallet: Arc::new(wallet),
            escrows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn client(&self) -> EscrowClient<'_, L> {
        EscrowClient::new(&*self.ledger, self.options)
    }
}

/// The service wallet's side of an escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Maker,
    Taker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Make,
    Take,
    Refund,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Taken,
    Refunded,
}

/// A submission whose confirmation did not arrive in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSubmission {
    pub operation: Operation,
    pub signature: Signature,
    pub blockhash: Option<Hash>,
}

impl PendingSubmission {
    fn from_timeout(operation: Operation, err: &EscrowError) -> Option<Self> {
        match err {
            EscrowError::Timeout {
                signature,
                blockhash,
                ..
            } => Some(Self {
                operation,
                signature: *signature,
                blockhash: *blockhash,
            }),
            _ => None,
        }
    }
}

pub struct EscrowEntry {
    pub id: String,
    pub keys: EscrowKeys,
    pub role: Role,
    pub receive: u64,
    pub deposit: u64,
    pub maker_ata_a: Pubkey,
    pub make_signature: Option<Signature>,
    pub settle_signature: Option<Signature>,
    pub settlement: Option<Settlement>,
    pub pending: Option<PendingSubmission>,
    /// Ledger error for a pending submission that later failed.
    pub failure: Option<String>,
    /// The make never landed; the entry only reports the failure.
    pub make_failed: bool,
    /// A take or refund is being submitted right now.
    pub in_flight: bool,
}

impl EscrowEntry {
    fn new(keys: EscrowKeys, role: Role, receive: u64, deposit: u64, maker_ata_a: Pubkey) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            keys,
            role,
            receive,
            deposit,
            maker_ata_a,
            make_signature: None,
            settle_signature: None,
            settlement: None,
            pending: None,
            failure: None,
            make_failed: false,
            in_flight: false,
        }
    }
}

// ─── Request / Response DTOs ─────────────────────────────────

#[derive(Deserialize)]
struct CreateEscrowReq {
    mint_a: String,
    mint_b: String,
    receive: u64,
    deposit: u64,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    maker_ata_a: Option<String>,
}

#[derive(Deserialize)]
struct ImportEscrowReq {
    maker: String,
    seed: u64,
}

#[derive(Serialize)]
struct EscrowResponse {
    id: String,
    role: String,
    status: String,
    seed: u64,
    maker: String,
    escrow: String,
    vault: String,
    mint_a: String,
    mint_b: String,
    receive: u64,
    deposit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
}

#[derive(Serialize)]
struct StatusResponse {
    id: String,
    role: String,
    status: String,
    seed: u64,
    maker: String,
    escrow: String,
    vault: String,
    mint_a: String,
    mint_b: String,
    receive: u64,
    deposit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    vault_balance: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    make_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    settle_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pending_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<String>,
}

#[derive(Serialize)]
struct TxResponse {
    signature: String,
    status: String,
    deposit: u64,
    receive: u64,
}

#[derive(Serialize)]
struct AccountMetaView {
    pubkey: String,
    is_signer: bool,
    is_writable: bool,
}

#[derive(Serialize)]
struct InstructionView {
    program_id: String,
    data_hex: String,
    accounts: Vec<AccountMetaView>,
}

#[derive(Serialize)]
struct InstructionsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    make: Option<InstructionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    take: Option<InstructionView>,
    refund: InstructionView,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
}

// ─── Error helpers ───────────────────────────────────────────

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_body(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: msg.into(),
            status: None,
            id: None,
            signature: None,
        }),
    )
}

fn bad_request(msg: impl Into<String>) -> ApiError {
    error_body(StatusCode::BAD_REQUEST, msg)
}

fn not_found(msg: impl Into<String>) -> ApiError {
    error_body(StatusCode::NOT_FOUND, msg)
}

fn conflict(msg: impl Into<String>) -> ApiError {
    error_body(StatusCode::CONFLICT, msg)
}

fn internal(msg: impl Into<String>) -> ApiError {
    error_body(StatusCode::INTERNAL_SERVER_ERROR, msg)
}

/// Map an SDK error onto an HTTP response. Timeouts report `pending` and the
/// signature so the caller can poll instead of resubmitting.
fn sdk_error(err: &EscrowError, id: Option<&str>) -> ApiError {
    let (code, status, signature) = match err {
        EscrowError::Precondition { .. } => (StatusCode::BAD_REQUEST, None, None),
        EscrowError::AccountNotFound { .. } => (StatusCode::CONFLICT, Some("closed"), None),
        EscrowError::Rejected { signature, .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, None, *signature)
        }
        EscrowError::Timeout { signature, .. } => {
            (StatusCode::GATEWAY_TIMEOUT, Some("pending"), Some(*signature))
        }
        EscrowError::Transport { .. } => (StatusCode::BAD_GATEWAY, None, None),
        EscrowError::Verification(_)
        | EscrowError::InvalidConfig(_)
        | EscrowError::InvalidAccountData { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, None, None)
        }
    };
    (
        code,
        Json(ErrorResponse {
            error: err.to_string(),
            status: status.map(str::to_string),
            id: id.map(str::to_string),
            signature: signature.map(|s| s.to_string()),
        }),
    )
}

type ApiResult<T> = Result<(StatusCode, Json<T>), ApiError>;

// ─── Helpers ─────────────────────────────────────────────────

fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey, ApiError> {
    Pubkey::from_str(value.trim()).map_err(|e| bad_request(format!("invalid {field}: {e}")))
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Maker => "maker",
        Role::Taker => "taker",
    }
}

/// Status that follows from local bookkeeping alone, if any.
fn cached_status(entry: &EscrowEntry) -> Option<&'static str> {
    if entry.make_failed {
        return Some("failed");
    }
    if entry.pending.is_some() {
        return Some("pending");
    }
    match entry.settlement {
        Some(Settlement::Taken) => Some("taken"),
        Some(Settlement::Refunded) => Some("refunded"),
        None => None,
    }
}

fn is_failed_make(entry: &EscrowEntry) -> bool {
    cached_status(entry) == Some("failed")
}

/// Whether a live (not failed) entry already covers `escrow`.
fn is_tracked(escrows: &HashMap<String, EscrowEntry>, escrow: &Pubkey) -> bool {
    escrows
        .values()
        .any(|e| e.keys.escrow.address == *escrow && !is_failed_make(e))
}

fn instruction_view(ix: &Instruction) -> InstructionView {
    InstructionView {
        program_id: ix.program_id.to_string(),
        data_hex: hex::encode(&ix.data),
        accounts: ix
            .accounts
            .iter()
            .map(|m| AccountMetaView {
                pubkey: m.pubkey.to_string(),
                is_signer: m.is_signer,
                is_writable: m.is_writable,
            })
            .collect(),
    }
}

fn escrow_response(
    entry: &EscrowEntry,
    status: &str,
    signature: Option<Signature>,
) -> EscrowResponse {
    let keys = &entry.keys;
    EscrowResponse {
        id: entry.id.clone(),
        role: role_name(entry.role).to_string(),
        status: status.to_string(),
        seed: keys.seed,
        maker: keys.maker.to_string(),
        escrow: keys.escrow.address.to_string(),
        vault: keys.vault.address.to_string(),
        mint_a: keys.mint_a.to_string(),
        mint_b: keys.mint_b.to_string(),
        receive: entry.receive,
        deposit: entry.deposit,
        signature: signature.map(|s| s.to_string()),
    }
}

async fn register(
    escrows: &Mutex<HashMap<String, EscrowEntry>>,
    entry: EscrowEntry,
) -> Result<(), ApiError> {
    let mut escrows = escrows.lock().await;
    if is_tracked(&escrows, &entry.keys.escrow.address) {
        return Err(conflict(format!(
            "escrow {} is already registered",
            entry.keys.escrow.address
        )));
    }
    escrows.insert(entry.id.clone(), entry);
    Ok(())
}

// ─── Confirmation Tracker ────────────────────────────────────

/// Data extracted from an EscrowEntry for confirmation checking outside the lock.
pub struct ConfirmationCandidate {
    pub id: String,
    pub keys: EscrowKeys,
    pub pending: PendingSubmission,
}

/// Returns None unless the entry has an unconfirmed submission.
pub fn classify_for_tracking(entry: &EscrowEntry) -> Option<ConfirmationCandidate> {
    let pending = entry.pending?;
    Some(ConfirmationCandidate {
        id: entry.id.clone(),
        keys: entry.keys,
        pending,
    })
}

enum Resolution {
    Landed,
    Failed(String),
    /// Never landed, and its blockhash has expired so it never will.
    Expired,
    Unknown,
}

async fn resolve<L: Ledger>(state: &AppState<L>, candidate: &ConfirmationCandidate) -> Resolution {
    let signature = &candidate.pending.signature;
    match state.ledger.get_signature_status(signature).await {
        Ok(SignatureStatus::Confirmed { .. }) => return Resolution::Landed,
        Ok(SignatureStatus::Failed { error, .. }) => return Resolution::Failed(error),
        Ok(SignatureStatus::Pending) => {}
        Err(e) => {
            eprintln!("[tracker] status poll for {} failed: {e}", candidate.id);
            return Resolution::Unknown;
        }
    }

    // The status cache can lag behind the transaction history.
    match state.ledger.get_transaction(signature).await {
        Ok(Some(meta)) => {
            return match meta.error {
                None => Resolution::Landed,
                Some(error) => Resolution::Failed(error),
            };
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("[tracker] transaction lookup for {} failed: {e}", candidate.id);
            return Resolution::Unknown;
        }
    }

    // For a make the escrow account itself is authoritative.
    if candidate.pending.operation == Operation::Make {
        match state.client().status(&candidate.keys).await {
            Ok(EscrowStatus::Open { .. }) => return Resolution::Landed,
            Ok(EscrowStatus::Closed) => {}
            Err(e) => {
                eprintln!("[tracker] ledger read for {} failed: {e}", candidate.id);
                return Resolution::Unknown;
            }
        }
    }

    // Nothing on the ledger. Only an expired blockhash makes that final.
    let Some(blockhash) = candidate.pending.blockhash else {
        return Resolution::Unknown;
    };
    match state.ledger.is_blockhash_valid(&blockhash).await {
        Ok(false) => Resolution::Expired,
        Ok(true) => Resolution::Unknown,
        Err(e) => {
            eprintln!("[tracker] blockhash check for {} failed: {e}", candidate.id);
            Resolution::Unknown
        }
    }
}

/// Run a single confirmation-tracking pass across all escrows.
pub async fn track_confirmations<L: Ledger>(state: &AppState<L>) {
    // Phase 1: Collect candidates under lock, then drop.
    let candidates: Vec<ConfirmationCandidate> = {
        let escrows = state.escrows.lock().await;
        escrows.values().filter_map(classify_for_tracking).collect()
    };

    // Phase 2: Query the ledger for each candidate (no lock held).
    for candidate in &candidates {
        let resolution = resolve(state, candidate).await;
        if matches!(resolution, Resolution::Unknown) {
            continue;
        }

        // Phase 3: Re-lock and update.
        let mut escrows = state.escrows.lock().await;
        let Some(entry) = escrows.get_mut(&candidate.id) else {
            continue;
        };
        if entry.pending != Some(candidate.pending) {
            continue;
        }
        entry.pending = None;
        let signature = candidate.pending.signature;
        match resolution {
            Resolution::Landed => {
                eprintln!(
                    "[tracker] {:?} for {} confirmed late ({signature})",
                    candidate.pending.operation, candidate.id
                );
                match candidate.pending.operation {
                    Operation::Make => entry.make_signature = Some(signature),
                    Operation::Take => {
                        entry.settle_signature = Some(signature);
                        entry.settlement = Some(Settlement::Taken);
                    }
                    Operation::Refund => {
                        entry.settle_signature = Some(signature);
                        entry.settlement = Some(Settlement::Refunded);
                    }
                }
            }
            Resolution::Failed(error) => {
                eprintln!(
                    "[tracker] {:?} for {} failed on ledger: {error}",
                    candidate.pending.operation, candidate.id
                );
                entry.failure = Some(error);
                entry.make_failed = candidate.pending.operation == Operation::Make;
            }
            Resolution::Expired => {
                eprintln!(
                    "[tracker] {:?} for {} expired without landing ({signature})",
                    candidate.pending.operation, candidate.id
                );
                // A settlement can simply be retried; a make that never
                // landed leaves nothing to track.
                if candidate.pending.operation == Operation::Make {
                    entry.failure = Some(format!("transaction {signature} expired before landing"));
                    entry.make_failed = true;
                }
            }
            Resolution::Unknown => {}
        }
    }
}

/// Start the background confirmation tracker.
pub fn start_tracker<L: Ledger + 'static>(
    state: AppState<L>,
    interval: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            // Run each pass in its own task so a panic does not end the loop.
            let s = state.clone();
            let result = tokio::task::spawn(async move {
                track_confirmations(&s).await;
            })
            .await;
            if let Err(e) = result {
                eprintln!("[tracker] Tracking pass panicked: {e}");
            }
        }
    })
}

// ─── POST /escrow ────────────────────────────────────────────

async fn create_escrow<L: Ledger + 'static>(
    State(state): State<AppState<L>>,
    Json(req): Json<CreateEscrowReq>,
) -> ApiResult<EscrowResponse> {
    let mint_a = parse_pubkey("mint_a", &req.mint_a)?;
    let mint_b = parse_pubkey("mint_b", &req.mint_b)?;
    let seed = req.seed.unwrap_or_else(random_seed);

    let mut builder = EscrowBuilder::new(state.program_id, seed)
        .maker(state.wallet.pubkey())
        .mint_a(mint_a)
        .mint_b(mint_b)
        .receive(req.receive)
        .deposit(req.deposit)
        .token_program(state.token_program);
    if let Some(ata) = &req.maker_ata_a {
        builder = builder.maker_ata_a(parse_pubkey("maker_ata_a", ata)?);
    }
    let config = builder.build().map_err(|e| sdk_error(&e, None))?;

    // Reserve the id before submitting so a timed-out make stays trackable.
    let mut entry = EscrowEntry::new(
        config.keys,
        Role::Maker,
        config.receive,
        config.deposit,
        config.maker_ata_a,
    );
    let id = entry.id.clone();
    if is_tracked(&*state.escrows.lock().await, &config.keys.escrow.address) {
        return Err(conflict(format!(
            "escrow with seed {seed} already exists for this wallet"
        )));
    }
    if state
        .client()
        .status(&config.keys)
        .await
        .map_err(|e| sdk_error(&e, None))?
        .is_open()
    {
        return Err(conflict(format!(
            "escrow {} already exists on the ledger",
            config.keys.escrow.address
        )));
    }

    // Once a signature exists the deposit is on the ledger, so the entry is
    // registered whether or not the read-back succeeds.
    let client = state.client();
    let outcome = match client.submit_make(&state.wallet, &config).await {
        Ok(signature) => Ok((signature, client.verify_make(&config, signature).await)),
        Err(e) => Err(e),
    };

    let mut escrows = state.escrows.lock().await;
    let address = config.keys.escrow.address;
    if is_tracked(&escrows, &address) {
        return Err(conflict("escrow was created by a concurrent request"));
    }
    match outcome {
        Ok((signature, verified)) => {
            entry.make_signature = Some(signature);
            // Drop failed attempts at the same address.
            escrows.retain(|_, e| e.keys.escrow.address != address);
            match verified {
                Ok(_) => {
                    let resp = escrow_response(&entry, "open", Some(signature));
                    escrows.insert(id, entry);
                    eprintln!("[api] made escrow {address} ({signature})");
                    Ok((StatusCode::CREATED, Json(resp)))
                }
                Err(e) => {
                    escrows.insert(id.clone(), entry);
                    eprintln!("[api] make for {id} landed ({signature}) but read-back failed: {e}");
                    let (code, Json(mut body)) = sdk_error(&e, Some(&id));
                    body.status = Some("unverified".into());
                    body.signature = Some(signature.to_string());
                    Err((code, Json(body)))
                }
            }
        }
        Err(e) => {
            let Some(pending) = PendingSubmission::from_timeout(Operation::Make, &e) else {
                return Err(sdk_error(&e, None));
            };
            entry.pending = Some(pending);
            escrows.insert(id.clone(), entry);
            eprintln!("[api] make for {id} unconfirmed, tracking {}", pending.signature);
            Err(sdk_error(&e, Some(&id)))
        }
    }
}

// ─── POST /escrow/import ─────────────────────────────────────

async fn import_escrow<L: Ledger + 'static>(
    State(state): State<AppState<L>>,
    Json(req): Json<ImportEscrowReq>,
) -> ApiResult<EscrowResponse> {
    let maker = parse_pubkey("maker", &req.maker)?;
    // The wallet's own escrows come back as maker entries so they stay
    // refundable after the registry is lost.
    let role = if maker == state.wallet.pubkey() {
        Role::Maker
    } else {
        Role::Taker
    };
    let escrow = pda::escrow_address(&maker, req.seed, &state.program_id)
        .map_err(|e| sdk_error(&e, None))?;

    let record = match fetch_escrow(&*state.ledger, &escrow.address).await {
        Ok(record) => record,
        Err(EscrowError::AccountNotFound { address }) => {
            return Err(not_found(format!("no escrow on the ledger at {address}")));
        }
        Err(e) => return Err(sdk_error(&e, None)),
    };
    let keys = EscrowKeys::from_record(
        state.program_id,
        state.token_program,
        escrow.address,
        &record,
    )
    .map_err(|e| sdk_error(&e, None))?;
    let deposit = token_balance(&*state.ledger, &keys.vault.address)
        .await
        .map_err(|e| sdk_error(&e, None))?;
    let maker_ata_a = pda::associated_token_address(&maker, &keys.mint_a, &keys.token_program)
        .map_err(|e| sdk_error(&e, None))?
        .address;

    let entry = EscrowEntry::new(keys, role, record.receive, deposit, maker_ata_a);
    let resp = escrow_response(&entry, "open", None);
    register(&state.escrows, entry).await?;

    Ok((StatusCode::CREATED, Json(resp)))
}

// ─── GET /escrow/{id} ────────────────────────────────────────

async fn get_escrow<L: Ledger + 'static>(
    State(state): State<AppState<L>>,
    Path(id): Path<String>,
) -> ApiResult<StatusResponse> {
    let (keys, role, receive, deposit, cached, make_sig, settle_sig, pending, failure) = {
        let escrows = state.escrows.lock().await;
        let entry = escrows
            .get(&id)
            .ok_or_else(|| not_found("escrow not found"))?;
        (
            entry.keys,
            entry.role,
            entry.receive,
            entry.deposit,
            cached_status(entry),
            entry.make_signature,
            entry.settle_signature,
            entry.pending,
            entry.failure.clone(),
        )
    }; // lock dropped

    let (status, vault_balance) = match cached {
        Some(s) => (s.to_string(), None),
        None => match state
            .client()
            .status(&keys)
            .await
            .map_err(|e| sdk_error(&e, Some(&id)))?
        {
            EscrowStatus::Open { vault_balance, .. } => ("open".to_string(), Some(vault_balance)),
            EscrowStatus::Closed => ("closed".to_string(), None),
        },
    };

    Ok((
        StatusCode::OK,
        Json(StatusResponse {
            id,
            role: role_name(role).to_string(),
            status,
            seed: keys.seed,
            maker: keys.maker.to_string(),
            escrow: keys.escrow.address.to_string(),
            vault: keys.vault.address.to_string(),
            mint_a: keys.mint_a.to_string(),
            mint_b: keys.mint_b.to_string(),
            receive,
            deposit,
            vault_balance,
            make_signature: make_sig.map(|s| s.to_string()),
            settle_signature: settle_sig.map(|s| s.to_string()),
            pending_signature: pending.map(|p| p.signature.to_string()),
            failure,
        }),
    ))
}

// ─── POST /escrow/{id}/take and /refund ──────────────────────

/// Lock, validate, and mark the entry in flight.
async fn begin_settlement<L: Ledger>(
    state: &AppState<L>,
    id: &str,
    operation: Operation,
) -> Result<(EscrowKeys, Pubkey), ApiError> {
    let mut escrows = state.escrows.lock().await;
    let entry = escrows
        .get_mut(id)
        .ok_or_else(|| not_found("escrow not found"))?;

    let required = match operation {
        Operation::Take => Role::Taker,
        _ => Role::Maker,
    };
    if entry.role != required {
        return Err(bad_request(match operation {
            Operation::Take => "service wallet made this escrow; it can only refund",
            _ => "service wallet did not make this escrow; it can only take",
        }));
    }
    if entry.make_failed {
        return Err(conflict("make never landed; nothing to settle"));
    }
    if entry.settlement.is_some() {
        return Err(conflict("escrow already settled"));
    }
    if let Some(p) = entry.pending {
        return Err(conflict(format!(
            "submission {} is still unconfirmed",
            p.signature
        )));
    }
    if entry.in_flight {
        return Err(conflict("a settlement for this escrow is already in flight"));
    }
    entry.in_flight = true;
    Ok((entry.keys, entry.maker_ata_a))
}

async fn settle<L: Ledger + 'static>(
    state: AppState<L>,
    id: String,
    operation: Operation,
) -> ApiResult<TxResponse> {
    // Phase 1: Lock, validate, extract what we need, drop lock.
    let (keys, maker_ata_a) = begin_settlement(&state, &id, operation).await?;

    // Phase 2: Submit without holding the lock.
    let client = state.client();
    let outcome = match operation {
        Operation::Take => match TakeAccounts::associated(state.wallet.pubkey(), &keys) {
            Ok(accounts) => client.take(&state.wallet, &keys, &accounts).await,
            Err(e) => Err(e),
        },
        _ => client.refund(&state.wallet, &keys, &maker_ata_a).await,
    };

    // Phase 3: Re-lock to update state.
    let mut escrows = state.escrows.lock().await;
    let entry = escrows
        .get_mut(&id)
        .ok_or_else(|| internal("escrow disappeared"))?;
    entry.in_flight = false;

    let (settlement, status) = match operation {
        Operation::Take => (Settlement::Taken, "taken"),
        _ => (Settlement::Refunded, "refunded"),
    };
    match outcome {
        Ok(receipt) => {
            entry.settlement = Some(settlement);
            entry.settle_signature = Some(receipt.signature);
            eprintln!("[api] {status} escrow {} ({})", keys.escrow.address, receipt.signature);
            Ok((
                StatusCode::OK,
                Json(TxResponse {
                    signature: receipt.signature.to_string(),
                    status: status.to_string(),
                    deposit: receipt.deposit,
                    receive: receipt.receive,
                }),
            ))
        }
        Err(e) => {
            if let Some(pending) = PendingSubmission::from_timeout(operation, &e) {
                entry.pending = Some(pending);
                eprintln!(
                    "[api] {status} for {id} unconfirmed, tracking {}",
                    pending.signature
                );
            }
            Err(sdk_error(&e, Some(&id)))
        }
    }
}

async fn take_escrow<L: Ledger + 'static>(
    State(state): State<AppState<L>>,
    Path(id): Path<String>,
) -> ApiResult<TxResponse> {
    settle(state, id, Operation::Take).await
}

async fn refund_escrow<L: Ledger + 'static>(
    State(state): State<AppState<L>>,
    Path(id): Path<String>,
) -> ApiResult<TxResponse> {
    settle(state, id, Operation::Refund).await
}

// ─── GET /escrow/{id}/instructions ───────────────────────────

async fn get_instructions<L: Ledger + 'static>(
    State(state): State<AppState<L>>,
    Path(id): Path<String>,
) -> ApiResult<InstructionsResponse> {
    let (keys, role, receive, deposit, maker_ata_a) = {
        let escrows = state.escrows.lock().await;
        let entry = escrows
            .get(&id)
            .ok_or_else(|| not_found("escrow not found"))?;
        (entry.keys, entry.role, entry.receive, entry.deposit, entry.maker_ata_a)
    };

    let make = match role {
        Role::Maker => {
            let config = crate::sdk::EscrowConfig {
                keys,
                receive,
                deposit,
                maker_ata_a,
            };
            Some(instruction_view(
                &build_make_ix(&config).map_err(|e| sdk_error(&e, Some(&id)))?,
            ))
        }
        Role::Taker => None,
    };
    let take = match role {
        Role::Taker => {
            let accounts = TakeAccounts::associated(state.wallet.pubkey(), &keys)
                .map_err(|e| sdk_error(&e, Some(&id)))?;
            Some(instruction_view(
                &build_take_ix(&keys, &accounts).map_err(|e| sdk_error(&e, Some(&id)))?,
            ))
        }
        Role::Maker => None,
    };

    Ok((
        StatusCode::OK,
        Json(InstructionsResponse {
            make,
            take,
            refund: instruction_view(&build_refund_ix(&keys, &maker_ata_a)),
        }),
    ))
}

// ─── Router builder ──────────────────────────────────────────

pub fn build_router<L: Ledger + 'static>(state: AppState<L>) -> Router {
    Router::new()
        .route("/escrow", post(create_escrow::<L>))
        .route("/escrow/import", post(import_escrow::<L>))
        .route("/escrow/{id}", get(get_escrow::<L>))
        .route("/escrow/{id}/take", post(take_escrow::<L>))
        .route("/escrow/{id}/refund", post(refund_escrow::<L>))
        .route("/escrow/{id}/instructions", get(get_instructions::<L>))
        .with_state(state)
}

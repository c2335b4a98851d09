//! Ledger for integration tests, backed by a local bank.
//!
//! `ProgramTest` runs the real system, SPL token and associated-token
//! programs. The escrow and lamport-vault programs are native stand-ins with
//! the deployed programs' account layouts and error codes. On top of the bank,
//! `TestLedger` records the transaction metadata and signature statuses an RPC
//! node would serve, and can inject the faults a live cluster produces.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use solana_escrow_client::sdk::{
    Ledger, LedgerError, SignatureStatus, TokenBalance, TransactionMeta,
};
use solana_program_test::{BanksClient, ProgramTest, ProgramTestContext, processor};
use solana_sdk::account::{Account, AccountSharedData};
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::rent::Rent;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::system_instruction;
use solana_sdk::system_program;
use solana_sdk::transaction::Transaction;
use spl_associated_token_account::get_associated_token_address;
use spl_associated_token_account::instruction::{
    create_associated_token_account, create_associated_token_account_idempotent,
};
use spl_token::solana_program::account_info::AccountInfo;
use spl_token::solana_program::entrypoint::ProgramResult;
use spl_token::solana_program::msg;
use spl_token::solana_program::program::{invoke, invoke_signed};
use spl_token::solana_program::program_error::ProgramError;
use spl_token::solana_program::program_option::COption;
use spl_token::solana_program::program_pack::Pack;
use spl_token::solana_program::sysvar::Sysvar;
use spl_token::state::{Account as TokenAccount, AccountState, Mint};

pub const INVALID_AMOUNT: u32 = 6000;
pub const ACCOUNT_NOT_INITIALIZED: u32 = 3012;
pub const CONSTRAINT_SEEDS: u32 = 2006;
pub const CONSTRAINT_HAS_ONE: u32 = 2001;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

const ESCROW_LEN: usize = 114;
const BLOCKHASH_POLL: Duration = Duration::from_millis(5);
const BLOCKHASH_ATTEMPTS: usize = 1_000;

#[derive(Default)]
struct State {
    statuses: HashMap<Signature, SignatureStatus>,
    transactions: HashMap<Signature, TransactionMeta>,
    used_blockhashes: HashSet<Hash>,
    expired_blockhashes: HashSet<Hash>,
    slot: u64,
    sent: usize,
    drop_confirmations: bool,
    drop_transactions: bool,
    skip_preflight: bool,
    fail_transport: bool,
    fail_reads: bool,
    fail_reads_after_send: bool,
}

pub struct TestLedger {
    context: Mutex<ProgramTestContext>,
    banks: BanksClient,
    payer: Keypair,
    rent: Rent,
    escrow_program: Pubkey,
    vault_program: Pubkey,
    state: Mutex<State>,
    // Keeps the balance reads around each transaction atomic.
    send_lock: tokio::sync::Mutex<()>,
}

impl TestLedger {
    pub async fn start() -> Self {
        let escrow_program = Pubkey::new_unique();
        let vault_program = Pubkey::new_unique();
        let mut program_test = ProgramTest::default();
        program_test.add_program("escrow_standin", escrow_program, processor!(process_escrow));
        program_test.add_program("vault_standin", vault_program, processor!(process_vault));
        let context = program_test.start_with_context().await;

        let mut banks = context.banks_client.clone();
        let rent = banks.get_rent().await.unwrap();
        let payer = context.payer.insecure_clone();
        Self {
            context: Mutex::new(context),
            banks,
            payer,
            rent,
            escrow_program,
            vault_program,
            state: Mutex::new(State::default()),
            send_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn escrow_program(&self) -> Pubkey {
        self.escrow_program
    }

    pub fn vault_program(&self) -> Pubkey {
        self.vault_program
    }

    /// Transactions still execute, but their status never leaves `Pending`.
    pub fn set_drop_confirmations(&self, drop: bool) {
        self.state.lock().unwrap().drop_confirmations = drop;
    }

    /// Sends are accepted and signed for, but never reach the bank.
    pub fn set_drop_transactions(&self, drop: bool) {
        self.state.lock().unwrap().drop_transactions = drop;
    }

    /// Failed transactions land and report through their status instead of
    /// being rejected at send time.
    pub fn set_skip_preflight(&self, skip: bool) {
        self.state.lock().unwrap().skip_preflight = skip;
    }

    /// Every send fails before reaching the ledger.
    pub fn set_fail_transport(&self, fail: bool) {
        self.state.lock().unwrap().fail_transport = fail;
    }

    /// Account and balance reads fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    /// Reads start failing once the next transaction has executed.
    pub fn fail_reads_after_next_send(&self) {
        self.state.lock().unwrap().fail_reads_after_send = true;
    }

    /// Every blockhash handed out so far expires; later transactions get a
    /// fresh one.
    pub fn expire_blockhashes(&self) {
        let mut state = self.state.lock().unwrap();
        let used: Vec<Hash> = state.used_blockhashes.iter().copied().collect();
        state.expired_blockhashes.extend(used);
    }

    /// Number of transactions that reached `send_transaction`.
    pub fn sent(&self) -> usize {
        self.state.lock().unwrap().sent
    }

    pub async fn account(&self, address: &Pubkey) -> Option<Account> {
        self.banks.clone().get_account(*address).await.unwrap()
    }

    pub async fn lamports(&self, address: &Pubkey) -> u64 {
        self.account(address).await.map(|a| a.lamports).unwrap_or(0)
    }

    pub async fn token_amount(&self, address: &Pubkey) -> Option<u64> {
        let account = self.account(address).await?;
        TokenAccount::unpack(&account.data).ok().map(|a| a.amount)
    }

    pub async fn mint_supply(&self, address: &Pubkey) -> Option<u64> {
        let account = self.account(address).await?;
        Mint::unpack(&account.data).ok().map(|m| m.supply)
    }

    pub fn set_account(&self, address: &Pubkey, account: Account) {
        self.context
            .lock()
            .unwrap()
            .set_account(address, &AccountSharedData::from(account));
    }

    /// Replace `address` with a system account holding `lamports`.
    pub fn fund(&self, address: &Pubkey, lamports: u64) {
        self.set_account(address, Account::new(lamports, 0, &system_program::id()));
    }

    /// Funded keypair, for tests that only need a signer.
    pub fn funded_keypair(&self) -> Keypair {
        let kp = Keypair::new();
        self.fund(&kp.pubkey(), 10 * LAMPORTS_PER_SOL);
        kp
    }

    /// Inject an initialized mint.
    pub fn add_mint(&self, authority: &Pubkey, decimals: u8) -> Pubkey {
        let address = Pubkey::new_unique();
        let mint = Mint {
            mint_authority: COption::Some(*authority),
            supply: 0,
            decimals,
            is_initialized: true,
            freeze_authority: COption::None,
        };
        self.set_packed(&address, mint);
        address
    }

    /// Inject `owner`'s associated token account for `mint` holding `amount`.
    pub fn add_token_account(&self, owner: &Pubkey, mint: &Pubkey, amount: u64) -> Pubkey {
        let address = get_associated_token_address(owner, mint);
        let account = TokenAccount {
            mint: *mint,
            owner: *owner,
            amount,
            delegate: COption::None,
            state: AccountState::Initialized,
            is_native: COption::None,
            delegated_amount: 0,
            close_authority: COption::None,
        };
        self.set_packed(&address, account);
        address
    }

    fn set_packed<T: Pack>(&self, address: &Pubkey, state: T) {
        let mut data = vec![0u8; T::LEN];
        T::pack(state, &mut data).unwrap();
        self.set_account(
            address,
            Account {
                lamports: self.rent.minimum_balance(T::LEN),
                data,
                owner: spl_token::id(),
                executable: false,
                rent_epoch: 0,
            },
        );
    }

    fn check_reads(&self) -> Result<(), LedgerError> {
        if self.state.lock().unwrap().fail_reads {
            return Err(LedgerError::Transport("connection reset by peer".into()));
        }
        Ok(())
    }

    async fn token_balances(&self, keys: &[Pubkey]) -> Vec<TokenBalance> {
        let mut balances = Vec::new();
        for key in keys {
            let Some(account) = self.account(key).await else {
                continue;
            };
            if account.owner != spl_token::id() {
                continue;
            }
            if let Ok(state) = TokenAccount::unpack(&account.data) {
                balances.push(TokenBalance {
                    account: *key,
                    mint: state.mint,
                    amount: state.amount,
                });
            }
        }
        balances
    }

    /// Execute `tx` on the bank, returning its result and metadata.
    async fn execute(&self, tx: &Transaction) -> Result<TransactionMeta, LedgerError> {
        let keys = tx.message.account_keys.clone();
        let pre_token_balances = self.token_balances(&keys).await;
        let outcome = self
            .banks
            .clone()
            .process_transaction_with_metadata(tx.clone())
            .await
            .map_err(|e| LedgerError::Rejected {
                error: e.to_string(),
                logs: Vec::new(),
            })?;
        let logs = outcome
            .metadata
            .map(|m| m.log_messages)
            .unwrap_or_default();
        let post_token_balances = self.token_balances(&keys).await;

        let slot = {
            let mut state = self.state.lock().unwrap();
            state.slot += 1;
            state.slot
        };
        Ok(TransactionMeta {
            slot,
            error: outcome.result.err().map(|e| e.to_string()),
            logs,
            pre_token_balances,
            post_token_balances,
        })
    }
}

impl Ledger for TestLedger {
    async fn get_account(&self, address: &Pubkey) -> Result<Option<Account>, LedgerError> {
        self.check_reads()?;
        Ok(self.account(address).await)
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64, LedgerError> {
        self.check_reads()?;
        Ok(self.lamports(address).await)
    }

    /// A blockhash no earlier transaction used, so identical instructions
    /// sent twice still get distinct signatures.
    async fn get_latest_blockhash(&self) -> Result<Hash, LedgerError> {
        for _ in 0..BLOCKHASH_ATTEMPTS {
            let hash = self
                .banks
                .clone()
                .get_latest_blockhash()
                .await
                .map_err(|e| LedgerError::Transport(e.to_string()))?;
            {
                let state = self.state.lock().unwrap();
                if !state.used_blockhashes.contains(&hash)
                    && !state.expired_blockhashes.contains(&hash)
                {
                    return Ok(hash);
                }
            }
            tokio::time::sleep(BLOCKHASH_POLL).await;
        }
        Err(LedgerError::Transport("bank stopped producing blockhashes".into()))
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, LedgerError> {
        let _guard = self.send_lock.lock().await;
        let signature = tx.signatures[0];
        let blockhash = tx.message.recent_blockhash;
        let (drop_transactions, skip_preflight) = {
            let mut state = self.state.lock().unwrap();
            state.sent += 1;
            if state.fail_transport {
                return Err(LedgerError::Transport("connection refused".into()));
            }
            if state.expired_blockhashes.contains(&blockhash) {
                return Err(LedgerError::Rejected {
                    error: "Blockhash not found".into(),
                    logs: Vec::new(),
                });
            }
            state.used_blockhashes.insert(blockhash);
            (state.drop_transactions, state.skip_preflight)
        };
        if drop_transactions {
            return Ok(signature);
        }

        let meta = self.execute(tx).await?;
        let mut state = self.state.lock().unwrap();
        if state.fail_reads_after_send {
            state.fail_reads_after_send = false;
            state.fail_reads = true;
        }
        let slot = meta.slot;
        match meta.error.clone() {
            Some(error) if !skip_preflight => {
                return Err(LedgerError::Rejected {
                    error,
                    logs: meta.logs,
                });
            }
            Some(error) => {
                state
                    .statuses
                    .insert(signature, SignatureStatus::Failed { slot, error });
            }
            None if state.drop_confirmations => {}
            None => {
                state
                    .statuses
                    .insert(signature, SignatureStatus::Confirmed { slot });
            }
        }
        state.transactions.insert(signature, meta);
        Ok(signature)
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> Result<SignatureStatus, LedgerError> {
        tokio::task::yield_now().await;
        Ok(self
            .state
            .lock()
            .unwrap()
            .statuses
            .get(signature)
            .cloned()
            .unwrap_or(SignatureStatus::Pending))
    }

    async fn get_transaction(
        &self,
        signature: &Signature,
    ) -> Result<Option<TransactionMeta>, LedgerError> {
        tokio::task::yield_now().await;
        Ok(self.state.lock().unwrap().transactions.get(signature).cloned())
    }

    async fn is_blockhash_valid(&self, blockhash: &Hash) -> Result<bool, LedgerError> {
        tokio::task::yield_now().await;
        Ok(!self
            .state
            .lock()
            .unwrap()
            .expired_blockhashes
            .contains(blockhash))
    }

    /// Paid out of the bank's payer, outside the send counter.
    async fn request_airdrop(&self, to: &Pubkey, lamports: u64) -> Result<Signature, LedgerError> {
        let _guard = self.send_lock.lock().await;
        let blockhash = self.get_latest_blockhash().await?;
        self.state.lock().unwrap().used_blockhashes.insert(blockhash);
        let ix = system_instruction::transfer(&self.payer.pubkey(), to, lamports);
        let tx = Transaction::new_signed_with_payer(
            &[ix],
            Some(&self.payer.pubkey()),
            &[&self.payer],
            blockhash,
        );
        let signature = tx.signatures[0];
        let meta = self.execute(&tx).await?;
        if let Some(error) = meta.error {
            return Err(LedgerError::Rejected {
                error,
                logs: meta.logs,
            });
        }
        self.state
            .lock()
            .unwrap()
            .statuses
            .insert(signature, SignatureStatus::Confirmed { slot: meta.slot });
        Ok(signature)
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, LedgerError> {
        Ok(self.rent.minimum_balance(data_len))
    }
}

// ─── Escrow stand-in ────────────────────────────────────────

fn program_error(name: &str, code: u32) -> ProgramError {
    msg!("Error Code: {}. Error Number: {}.", name, code);
    ProgramError::Custom(code)
}

fn read_u64(data: &[u8], at: usize) -> Result<u64, ProgramError> {
    data.get(at..at + 8)
        .and_then(|b| <[u8; 8]>::try_from(b).ok())
        .map(u64::from_le_bytes)
        .ok_or(ProgramError::InvalidInstructionData)
}

struct Record {
    seed: u64,
    maker: Pubkey,
    mint_a: Pubkey,
    mint_b: Pubkey,
    receive: u64,
    bump: u8,
}

impl Record {
    fn load(program_id: &Pubkey, escrow: &AccountInfo) -> Result<Self, ProgramError> {
        if escrow.owner != program_id || escrow.data_is_empty() {
            return Err(program_error("AccountNotInitialized", ACCOUNT_NOT_INITIALIZED));
        }
        let data = escrow.try_borrow_data()?;
        if data.len() != ESCROW_LEN || data[0] != 1 {
            return Err(ProgramError::InvalidAccountData);
        }
        let key = |at: usize| {
            Pubkey::try_from(&data[at..at + 32]).map_err(|_| ProgramError::InvalidAccountData)
        };
        Ok(Self {
            seed: read_u64(&data, 1)?,
            maker: key(9)?,
            mint_a: key(41)?,
            mint_b: key(73)?,
            receive: read_u64(&data, 105)?,
            bump: data[113],
        })
    }

    fn pack(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(ESCROW_LEN);
        data.push(1);
        data.extend_from_slice(&self.seed.to_le_bytes());
        data.extend_from_slice(self.maker.as_ref());
        data.extend_from_slice(self.mint_a.as_ref());
        data.extend_from_slice(self.mint_b.as_ref());
        data.extend_from_slice(&self.receive.to_le_bytes());
        data.push(self.bump);
        data
    }
}

struct Programs<'a, 'b> {
    system: &'b AccountInfo<'a>,
    token: &'b AccountInfo<'a>,
    associated: &'b AccountInfo<'a>,
}

impl<'a> Programs<'a, '_> {
    fn create_ata(
        &self,
        payer: &AccountInfo<'a>,
        ata: &AccountInfo<'a>,
        wallet: &AccountInfo<'a>,
        mint: &AccountInfo<'a>,
    ) -> ProgramResult {
        invoke(
            &create_associated_token_account_idempotent(
                payer.key,
                wallet.key,
                mint.key,
                self.token.key,
            ),
            &[
                payer.clone(),
                ata.clone(),
                wallet.clone(),
                mint.clone(),
                self.system.clone(),
                self.token.clone(),
                self.associated.clone(),
            ],
        )
    }

    /// Empty the vault into `destination` and close it, rent to the maker.
    fn release_vault(
        &self,
        record: &Record,
        escrow: &AccountInfo<'a>,
        vault: &AccountInfo<'a>,
        destination: &AccountInfo<'a>,
        maker: &AccountInfo<'a>,
    ) -> ProgramResult {
        let held = TokenAccount::unpack(&vault.try_borrow_data()?)?.amount;
        let seed = record.seed.to_le_bytes();
        let bump = [record.bump];
        let signer: &[&[u8]] = &[b"escrow", record.maker.as_ref(), &seed, &bump];
        invoke_signed(
            &spl_token::instruction::transfer(
                self.token.key,
                vault.key,
                destination.key,
                escrow.key,
                &[],
                held,
            )?,
            &[vault.clone(), destination.clone(), escrow.clone(), self.token.clone()],
            &[signer],
        )?;
        invoke_signed(
            &spl_token::instruction::close_account(
                self.token.key,
                vault.key,
                maker.key,
                escrow.key,
                &[],
            )?,
            &[vault.clone(), maker.clone(), escrow.clone(), self.token.clone()],
            &[signer],
        )
    }
}

fn close_escrow(escrow: &AccountInfo, destination: &AccountInfo) -> ProgramResult {
    let lamports = escrow.lamports();
    let credited = destination
        .lamports()
        .checked_add(lamports)
        .ok_or(ProgramError::ArithmeticOverflow)?;
    **destination.try_borrow_mut_lamports()? = credited;
    **escrow.try_borrow_mut_lamports()? = 0;
    escrow.try_borrow_mut_data()?.fill(0);
    Ok(())
}

fn process_escrow(program_id: &Pubkey, accounts: &[AccountInfo], data: &[u8]) -> ProgramResult {
    match data.split_first() {
        Some((0, args)) => make(program_id, accounts, args),
        Some((1, _)) => take(program_id, accounts),
        Some((2, _)) => refund(program_id, accounts),
        _ => Err(ProgramError::InvalidInstructionData),
    }
}

fn make(program_id: &Pubkey, accounts: &[AccountInfo], args: &[u8]) -> ProgramResult {
    let [maker, escrow, mint_a, mint_b, maker_ata_a, vault, system, token, associated] = accounts
    else {
        return Err(ProgramError::NotEnoughAccountKeys);
    };
    let seed = read_u64(args, 0)?;
    let receive = read_u64(args, 8)?;
    let amount = read_u64(args, 16)?;
    if receive == 0 || amount == 0 {
        return Err(program_error("InvalidAmount", INVALID_AMOUNT));
    }
    if !maker.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    if *mint_b.owner != spl_token::id() {
        return Err(ProgramError::InvalidAccountData);
    }

    let seed_bytes = seed.to_le_bytes();
    let (expected, bump) =
        Pubkey::find_program_address(&[b"escrow", maker.key.as_ref(), &seed_bytes], program_id);
    if *escrow.key != expected || *vault.key != get_associated_token_address(escrow.key, mint_a.key)
    {
        return Err(program_error("ConstraintSeeds", CONSTRAINT_SEEDS));
    }

    let lamports = Rent::get()?.minimum_balance(ESCROW_LEN);
    invoke_signed(
        &system_instruction::create_account(
            maker.key,
            escrow.key,
            lamports,
            ESCROW_LEN as u64,
            program_id,
        ),
        &[maker.clone(), escrow.clone(), system.clone()],
        &[&[b"escrow", maker.key.as_ref(), &seed_bytes, &[bump]]],
    )?;
    let record = Record {
        seed,
        maker: *maker.key,
        mint_a: *mint_a.key,
        mint_b: *mint_b.key,
        receive,
        bump,
    };
    escrow.try_borrow_mut_data()?.copy_from_slice(&record.pack());

    invoke(
        &create_associated_token_account(maker.key, escrow.key, mint_a.key, token.key),
        &[
            maker.clone(),
            vault.clone(),
            escrow.clone(),
            mint_a.clone(),
            system.clone(),
            token.clone(),
            associated.clone(),
        ],
    )?;
    invoke(
        &spl_token::instruction::transfer(
            token.key,
            maker_ata_a.key,
            vault.key,
            maker.key,
            &[],
            amount,
        )?,
        &[maker_ata_a.clone(), vault.clone(), maker.clone(), token.clone()],
    )
}

fn take(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let [
        taker,
        maker,
        escrow,
        mint_a,
        mint_b,
        vault,
        taker_ata_a,
        taker_ata_b,
        maker_ata_b,
        system,
        token,
        associated,
    ] = accounts
    else {
        return Err(ProgramError::NotEnoughAccountKeys);
    };
    if !taker.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    let record = Record::load(program_id, escrow)?;
    if record.maker != *maker.key || record.mint_a != *mint_a.key || record.mint_b != *mint_b.key {
        return Err(program_error("ConstraintHasOne", CONSTRAINT_HAS_ONE));
    }

    let programs = Programs {
        system,
        token,
        associated,
    };
    programs.create_ata(taker, taker_ata_a, taker, mint_a)?;
    programs.create_ata(taker, maker_ata_b, maker, mint_b)?;
    invoke(
        &spl_token::instruction::transfer(
            token.key,
            taker_ata_b.key,
            maker_ata_b.key,
            taker.key,
            &[],
            record.receive,
        )?,
        &[taker_ata_b.clone(), maker_ata_b.clone(), taker.clone(), token.clone()],
    )?;
    programs.release_vault(&record, escrow, vault, taker_ata_a, maker)?;
    close_escrow(escrow, maker)
}

fn refund(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let [maker, escrow, mint_a, vault, maker_ata_a, system, token, associated] = accounts else {
        return Err(ProgramError::NotEnoughAccountKeys);
    };
    if !maker.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    let record = Record::load(program_id, escrow)?;
    if record.maker != *maker.key || record.mint_a != *mint_a.key {
        return Err(program_error("ConstraintHasOne", CONSTRAINT_HAS_ONE));
    }

    let programs = Programs {
        system,
        token,
        associated,
    };
    programs.create_ata(maker, maker_ata_a, maker, mint_a)?;
    programs.release_vault(&record, escrow, vault, maker_ata_a, maker)?;
    close_escrow(escrow, maker)
}

// ─── Lamport vault stand-in ─────────────────────────────────

fn process_vault(program_id: &Pubkey, accounts: &[AccountInfo], data: &[u8]) -> ProgramResult {
    let [owner, vault, system] = accounts else {
        return Err(ProgramError::NotEnoughAccountKeys);
    };
    if !owner.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }
    let (expected, bump) =
        Pubkey::find_program_address(&[b"vault", owner.key.as_ref()], program_id);
    if *vault.key != expected {
        return Err(program_error("ConstraintSeeds", CONSTRAINT_SEEDS));
    }

    match data.split_first() {
        Some((0, args)) => {
            let amount = read_u64(args, 0)?;
            if amount == 0 {
                return Err(program_error("InvalidAmount", INVALID_AMOUNT));
            }
            invoke(
                &system_instruction::transfer(owner.key, vault.key, amount),
                &[owner.clone(), vault.clone(), system.clone()],
            )
        }
        Some((1, _)) => {
            let held = vault.lamports();
            if held == 0 {
                return Err(program_error("InvalidAmount", INVALID_AMOUNT));
            }
            invoke_signed(
                &system_instruction::transfer(vault.key, owner.key, held),
                &[vault.clone(), owner.clone(), system.clone()],
                &[&[b"vault", owner.key.as_ref(), &[bump]]],
            )
        }
        _ => Err(ProgramError::InvalidInstructionData),
    }
}

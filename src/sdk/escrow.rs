use solana_sdk::pubkey::Pubkey;

use super::error::EscrowError;
use super::pda::{self, DerivedAddress};
use super::state::EscrowRecord;

const OPERATION: &str = "make";

/// Addresses that identify one escrow instance on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscrowKeys {
    pub program_id: Pubkey,
    pub token_program: Pubkey,
    pub seed: u64,
    pub maker: Pubkey,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub escrow: DerivedAddress,
    pub vault: DerivedAddress,
}

impl EscrowKeys {
    /// Derive escrow and vault addresses: seed → escrow → vault.
    pub fn derive(
        program_id: Pubkey,
        token_program: Pubkey,
        maker: Pubkey,
        seed: u64,
        mint_a: Pubkey,
        mint_b: Pubkey,
    ) -> Result<Self, EscrowError> {
        let escrow = pda::escrow_address(&maker, seed, &program_id)?;
        let vault = pda::vault_address(&escrow.address, &mint_a, &token_program)?;
        Ok(Self {
            program_id,
            token_program,
            seed,
            maker,
            mint_a,
            mint_b,
            escrow,
            vault,
        })
    }

    /// Rebuild the keys from a record read off the ledger (taker side).
    ///
    /// Fails if the record does not derive back to `escrow_address`.
    pub fn from_record(
        program_id: Pubkey,
        token_program: Pubkey,
        escrow_address: Pubkey,
        record: &EscrowRecord,
    ) -> Result<Self, EscrowError> {
        let keys = Self::derive(
            program_id,
            token_program,
            record.maker,
            record.seed,
            record.mint_a,
            record.mint_b,
        )?;
        if keys.escrow.address != escrow_address {
            return Err(EscrowError::InvalidAccountData {
                address: escrow_address,
                reason: format!(
                    "record (maker {}, seed {}) derives to {}",
                    record.maker, record.seed, keys.escrow.address
                ),
            });
        }
        Ok(keys)
    }
}

/// Fully resolved make terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscrowConfig {
    pub keys: EscrowKeys,
    pub receive: u64,
    pub deposit: u64,
    pub maker_ata_a: Pubkey,
}

/// Builder for make terms. All structural checks happen in [`build`](Self::build),
/// before any network round trip.
pub struct EscrowBuilder {
    program_id: Pubkey,
    seed: u64,
    token_program: Pubkey,
    maker: Option<Pubkey>,
    mint_a: Option<Pubkey>,
    mint_b: Option<Pubkey>,
    receive: Option<u64>,
    deposit: Option<u64>,
    maker_ata_a: Option<Pubkey>,
}

impl EscrowBuilder {
    pub fn new(program_id: Pubkey, seed: u64) -> Self {
        Self {
            program_id,
            seed,
            token_program: spl_token::id(),
            maker: None,
            mint_a: None,
            mint_b: None,
            receive: None,
            deposit: None,
            maker_ata_a: None,
        }
    }

    pub fn maker(mut self, maker: Pubkey) -> Self {
        self.maker = Some(maker);
        self
    }

    pub fn mint_a(mut self, mint: Pubkey) -> Self {
        self.mint_a = Some(mint);
        self
    }

    pub fn mint_b(mut self, mint: Pubkey) -> Self {
        self.mint_b = Some(mint);
        self
    }

    /// Amount of token B the maker wants back.
    pub fn receive(mut self, amount: u64) -> Self {
        self.receive = Some(amount);
        self
    }

    /// Amount of token A moved into the vault.
    pub fn deposit(mut self, amount: u64) -> Self {
        self.deposit = Some(amount);
        self
    }

    /// Source token account; defaults to the maker's associated account for mint A.
    pub fn maker_ata_a(mut self, account: Pubkey) -> Self {
        self.maker_ata_a = Some(account);
        self
    }

    pub fn token_program(mut self, program: Pubkey) -> Self {
        self.token_program = program;
        self
    }

    pub fn build(self) -> Result<EscrowConfig, EscrowError> {
        let maker = self
            .maker
            .ok_or_else(|| EscrowError::precondition(OPERATION, "maker required"))?;
        let mint_a = self
            .mint_a
            .ok_or_else(|| EscrowError::precondition(OPERATION, "mint A required"))?;
        let mint_b = self
            .mint_b
            .ok_or_else(|| EscrowError::precondition(OPERATION, "mint B required"))?;
        let receive = self
            .receive
            .ok_or_else(|| EscrowError::precondition(OPERATION, "receive amount required"))?;
        let deposit = self
            .deposit
            .ok_or_else(|| EscrowError::precondition(OPERATION, "deposit amount required"))?;

        if maker == Pubkey::default() {
            return Err(EscrowError::precondition(
                OPERATION,
                "maker must not be the default pubkey",
            ));
        }
        if receive == 0 {
            return Err(EscrowError::precondition(OPERATION, "receive amount must be > 0"));
        }
        if deposit == 0 {
            return Err(EscrowError::precondition(OPERATION, "deposit amount must be > 0"));
        }
        if mint_a == mint_b {
            return Err(EscrowError::precondition(
                OPERATION,
                format!("mint A and mint B must differ (both {mint_a})"),
            ));
        }

        let keys = EscrowKeys::derive(
            self.program_id,
            self.token_program,
            maker,
            self.seed,
            mint_a,
            mint_b,
        )?;
        let maker_ata_a = match self.maker_ata_a {
            Some(account) => account,
            None => pda::associated_token_address(&maker, &mint_a, &self.token_program)?.address,
        };

        Ok(EscrowConfig {
            keys,
            receive,
            deposit,
            maker_ata_a,
        })
    }
}

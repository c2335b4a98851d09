//! Escrow instruction encoding.
//!
//! Data is a one-byte discriminator followed by fixed-width little-endian
//! arguments. Account *position* carries the role, so the orders below are
//! part of the wire format:
//!
//! ```text
//! Make   maker(s,w) escrow(w) mint_a mint_b maker_ata_a(w) vault(w) system token ata
//! Take   taker(s,w) maker(w) escrow(w) mint_a mint_b vault(w)
//!        taker_ata_a(w) taker_ata_b(w) maker_ata_b(w) system token ata
//! Refund maker(s,w) escrow(w) mint_a vault(w) maker_ata_a(w) system token ata
//! ```

use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;

use super::error::EscrowError;
use super::escrow::{EscrowConfig, EscrowKeys};
use super::pda;

pub const MAKE_DISCRIMINATOR: u8 = 0;
pub const TAKE_DISCRIMINATOR: u8 = 1;
pub const REFUND_DISCRIMINATOR: u8 = 2;

/// Decoded escrow instruction data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscrowInstruction {
    Make { seed: u64, receive: u64, amount: u64 },
    Take,
    Refund,
}

impl EscrowInstruction {
    pub const MAKE_LEN: usize = 1 + 8 * 3;

    pub fn discriminator(&self) -> u8 {
        match self {
            Self::Make { .. } => MAKE_DISCRIMINATOR,
            Self::Take => TAKE_DISCRIMINATOR,
            Self::Refund => REFUND_DISCRIMINATOR,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Make { .. } => "make",
            Self::Take => "take",
            Self::Refund => "refund",
        }
    }

    pub fn pack(&self) -> Vec<u8> {
        match self {
            Self::Make {
                seed,
                receive,
                amount,
            } => {
                let mut data = Vec::with_capacity(Self::MAKE_LEN);
                data.push(MAKE_DISCRIMINATOR);
                data.extend_from_slice(&seed.to_le_bytes());
                data.extend_from_slice(&receive.to_le_bytes());
                data.extend_from_slice(&amount.to_le_bytes());
                data
            }
            Self::Take | Self::Refund => vec![self.discriminator()],
        }
    }

    pub fn unpack(data: &[u8]) -> Result<Self, EscrowError> {
        let invalid = |reason: String| EscrowError::precondition("decode instruction", reason);
        let (&tag, rest) = data
            .split_first()
            .ok_or_else(|| invalid("empty instruction data".into()))?;
        match tag {
            MAKE_DISCRIMINATOR => {
                if rest.len() != 24 {
                    return Err(invalid(format!(
                        "make payload is {} bytes, expected 24",
                        rest.len()
                    )));
                }
                let word = |i: usize| {
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(&rest[i * 8..i * 8 + 8]);
                    u64::from_le_bytes(buf)
                };
                Ok(Self::Make {
                    seed: word(0),
                    receive: word(1),
                    amount: word(2),
                })
            }
            TAKE_DISCRIMINATOR => Ok(Self::Take),
            REFUND_DISCRIMINATOR => Ok(Self::Refund),
            other => Err(invalid(format!("unknown discriminator {other}"))),
        }
    }
}

/// Token accounts the taker side touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TakeAccounts {
    pub taker: Pubkey,
    /// Receives the vault's token A.
    pub taker_ata_a: Pubkey,
    /// Pays the receive amount of token B.
    pub taker_ata_b: Pubkey,
    /// Receives token B.
    pub maker_ata_b: Pubkey,
}

impl TakeAccounts {
    /// Use associated token accounts for every leg.
    pub fn associated(taker: Pubkey, keys: &EscrowKeys) -> Result<Self, EscrowError> {
        let tp = &keys.token_program;
        Ok(Self {
            taker,
            taker_ata_a: pda::associated_token_address(&taker, &keys.mint_a, tp)?.address,
            taker_ata_b: pda::associated_token_address(&taker, &keys.mint_b, tp)?.address,
            maker_ata_b: pda::associated_token_address(&keys.maker, &keys.mint_b, tp)?.address,
        })
    }
}

fn program_accounts(keys: &EscrowKeys) -> [AccountMeta; 3] {
    [
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(keys.token_program, false),
        AccountMeta::new_readonly(spl_associated_token_account::id(), false),
    ]
}

pub fn build_make_ix(config: &EscrowConfig) -> Result<Instruction, EscrowError> {
    if config.deposit == 0 || config.receive == 0 {
        return Err(EscrowError::precondition(
            "make",
            "deposit and receive amounts must be > 0",
        ));
    }
    let keys = &config.keys;
    let mut accounts = vec![
        AccountMeta::new(keys.maker, true),
        AccountMeta::new(keys.escrow.address, false),
        AccountMeta::new_readonly(keys.mint_a, false),
        AccountMeta::new_readonly(keys.mint_b, false),
        AccountMeta::new(config.maker_ata_a, false),
        AccountMeta::new(keys.vault.address, false),
    ];
    accounts.extend(program_accounts(keys));

    let data = EscrowInstruction::Make {
        seed: keys.seed,
        receive: config.receive,
        amount: config.deposit,
    }
    .pack();

    Ok(Instruction {
        program_id: keys.program_id,
        accounts,
        data,
    })
}

pub fn build_take_ix(keys: &EscrowKeys, take: &TakeAccounts) -> Result<Instruction, EscrowError> {
    if take.taker == keys.maker {
        return Err(EscrowError::precondition(
            "take",
            format!("taker {} is the maker of escrow {}", take.taker, keys.escrow.address),
        ));
    }
    let mut accounts = vec![
        AccountMeta::new(take.taker, true),
        AccountMeta::new(keys.maker, false),
        AccountMeta::new(keys.escrow.address, false),
        AccountMeta::new_readonly(keys.mint_a, false),
        AccountMeta::new_readonly(keys.mint_b, false),
        AccountMeta::new(keys.vault.address, false),
        AccountMeta::new(take.taker_ata_a, false),
        AccountMeta::new(take.taker_ata_b, false),
        AccountMeta::new(take.maker_ata_b, false),
    ];
    accounts.extend(program_accounts(keys));

    Ok(Instruction {
        program_id: keys.program_id,
        accounts,
        data: EscrowInstruction::Take.pack(),
    })
}

pub fn build_refund_ix(keys: &EscrowKeys, maker_ata_a: &Pubkey) -> Instruction {
    let mut accounts = vec![
        AccountMeta::new(keys.maker, true),
        AccountMeta::new(keys.escrow.address, false),
        AccountMeta::new_readonly(keys.mint_a, false),
        AccountMeta::new(keys.vault.address, false),
        AccountMeta::new(*maker_ata_a, false),
    ];
    accounts.extend(program_accounts(keys));

    Instruction {
        program_id: keys.program_id,
        accounts,
        data: EscrowInstruction::Refund.pack(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_data_layout() {
        let data = EscrowInstruction::Make {
            seed: 12345,
            receive: 100,
            amount: 50,
        }
        .pack();
        assert_eq!(data.len(), EscrowInstruction::MAKE_LEN);
        assert_eq!(data[0], MAKE_DISCRIMINATOR);
        assert_eq!(&data[1..9], &12345u64.to_le_bytes());
        assert_eq!(&data[9..17], &100u64.to_le_bytes());
        assert_eq!(&data[17..25], &50u64.to_le_bytes());
    }

    #[test]
    fn take_and_refund_are_bare_discriminators() {
        assert_eq!(EscrowInstruction::Take.pack(), vec![1]);
        assert_eq!(EscrowInstruction::Refund.pack(), vec![2]);
    }

    #[test]
    fn unpack_reads_make_arguments() {
        let mut data = vec![0u8];
        data.extend_from_slice(&54321u64.to_le_bytes());
        data.extend_from_slice(&200u64.to_le_bytes());
        data.extend_from_slice(&75u64.to_le_bytes());
        assert_eq!(
            EscrowInstruction::unpack(&data).unwrap(),
            EscrowInstruction::Make {
                seed: 54321,
                receive: 200,
                amount: 75
            }
        );
    }

    #[test]
    fn unpack_rejects_truncated_make() {
        let err = EscrowInstruction::unpack(&[0, 1, 2, 3]).unwrap_err();
        assert!(err.to_string().contains("expected 24"));
    }

    #[test]
    fn unpack_rejects_unknown_discriminator() {
        let err = EscrowInstruction::unpack(&[9]).unwrap_err();
        assert!(err.to_string().contains("unknown discriminator 9"));
    }

    #[test]
    fn unpack_rejects_empty() {
        assert!(EscrowInstruction::unpack(&[]).is_err());
    }
}

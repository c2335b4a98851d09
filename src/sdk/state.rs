use solana_sdk::account::Account;
use solana_sdk::pubkey::Pubkey;
use spl_token::solana_program::program_pack::Pack;

use super::error::EscrowError;

/// Account discriminator written in front of the record by the Anchor build.
pub const ESCROW_ACCOUNT_DISCRIMINATOR: u8 = 1;

/// On-ledger escrow terms.
///
/// Layout (little-endian, packed):
/// `seed u64 | maker [32] | mint_a [32] | mint_b [32] | receive u64 | bump u8`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscrowRecord {
    pub seed: u64,
    pub maker: Pubkey,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub receive: u64,
    pub bump: u8,
}

impl EscrowRecord {
    /// 8 (seed) + 32 (maker) + 32 (mint_a) + 32 (mint_b) + 8 (receive) + 1 (bump)
    pub const LEN: usize = 8 + 32 + 32 + 32 + 8 + 1;

    /// Decode either the raw layout or the one-byte-discriminator layout.
    pub fn decode(address: &Pubkey, data: &[u8]) -> Result<Self, EscrowError> {
        let body = match data.len() {
            Self::LEN => data,
            n if n == Self::LEN + 1 => {
                if data[0] != ESCROW_ACCOUNT_DISCRIMINATOR {
                    return Err(EscrowError::InvalidAccountData {
                        address: *address,
                        reason: format!("unexpected account discriminator {}", data[0]),
                    });
                }
                &data[1..]
            }
            n => {
                return Err(EscrowError::InvalidAccountData {
                    address: *address,
                    reason: format!(
                        "escrow data is {n} bytes, expected {} or {}",
                        Self::LEN,
                        Self::LEN + 1
                    ),
                });
            }
        };

        let u64_at = |offset: usize| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(&body[offset..offset + 8]);
            u64::from_le_bytes(buf)
        };
        let key_at = |offset: usize| {
            let mut buf = [0u8; 32];
            buf.copy_from_slice(&body[offset..offset + 32]);
            Pubkey::new_from_array(buf)
        };

        Ok(Self {
            seed: u64_at(0),
            maker: key_at(8),
            mint_a: key_at(40),
            mint_b: key_at(72),
            receive: u64_at(104),
            bump: body[112],
        })
    }

    /// Encode in the raw layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(Self::LEN);
        data.extend_from_slice(&self.seed.to_le_bytes());
        data.extend_from_slice(self.maker.as_ref());
        data.extend_from_slice(self.mint_a.as_ref());
        data.extend_from_slice(self.mint_b.as_ref());
        data.extend_from_slice(&self.receive.to_le_bytes());
        data.push(self.bump);
        data
    }
}

/// The fields of an SPL token account the verifier cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenAccountState {
    pub address: Pubkey,
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
}

impl TokenAccountState {
    pub fn decode(address: &Pubkey, account: &Account) -> Result<Self, EscrowError> {
        let token = spl_token::state::Account::unpack(&account.data).map_err(|e| {
            EscrowError::InvalidAccountData {
                address: *address,
                reason: format!("not an initialized token account: {e}"),
            }
        })?;
        Ok(Self {
            address: *address,
            mint: token.mint,
            owner: token.owner,
            amount: token.amount,
        })
    }
}

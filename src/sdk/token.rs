//! SPL token fixtures: mints, associated accounts, minting, and airdrops.

use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::system_instruction;
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use spl_token::solana_program::program_pack::Pack;

use super::error::EscrowError;
use super::ledger::Ledger;
use super::pda;
use super::submit::Submitter;

/// Create-account plus `InitializeMint2`. `mint` must co-sign.
pub fn build_create_mint_ixs(
    payer: &Pubkey,
    mint: &Pubkey,
    decimals: u8,
    authority: &Pubkey,
    freeze_authority: Option<&Pubkey>,
    rent_lamports: u64,
) -> Result<Vec<Instruction>, EscrowError> {
    let create = system_instruction::create_account(
        payer,
        mint,
        rent_lamports,
        spl_token::state::Mint::LEN as u64,
        &spl_token::id(),
    );
    let init = spl_token::instruction::initialize_mint2(
        &spl_token::id(),
        mint,
        authority,
        freeze_authority,
        decimals,
    )
    .map_err(|e| EscrowError::precondition("create mint", e.to_string()))?;
    Ok(vec![create, init])
}

/// Idempotent create of `wallet`'s associated account for `mint`.
pub fn build_create_ata_ix(
    payer: &Pubkey,
    wallet: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Instruction {
    create_associated_token_account_idempotent(payer, wallet, mint, token_program)
}

pub fn build_mint_to_ix(
    mint: &Pubkey,
    destination: &Pubkey,
    authority: &Pubkey,
    amount: u64,
    decimals: u8,
) -> Result<Instruction, EscrowError> {
    if amount == 0 {
        return Err(EscrowError::precondition("mint to", "amount must be > 0"));
    }
    spl_token::instruction::mint_to_checked(
        &spl_token::id(),
        mint,
        destination,
        authority,
        &[],
        amount,
        decimals,
    )
    .map_err(|e| EscrowError::precondition("mint to", e.to_string()))
}

/// Create and initialize `mint` with `payer` as both mint and freeze authority.
pub async fn create_mint<L: Ledger>(
    submitter: &Submitter<'_, L>,
    ledger: &L,
    payer: &Keypair,
    mint: &Keypair,
    decimals: u8,
) -> Result<Signature, EscrowError> {
    let rent = ledger
        .get_minimum_balance_for_rent_exemption(spl_token::state::Mint::LEN)
        .await
        .map_err(|e| EscrowError::from_ledger("create mint", e))?;
    let authority = payer.pubkey();
    let ixs = build_create_mint_ixs(
        &authority,
        &mint.pubkey(),
        decimals,
        &authority,
        Some(&authority),
        rent,
    )?;
    submitter.submit("create mint", &ixs, payer, &[mint]).await
}

/// Ensure `wallet` has an associated account for `mint` and return its address.
pub async fn create_associated_account<L: Ledger>(
    submitter: &Submitter<'_, L>,
    payer: &Keypair,
    wallet: &Pubkey,
    mint: &Pubkey,
) -> Result<Pubkey, EscrowError> {
    let token_program = spl_token::id();
    let ata = pda::associated_token_address(wallet, mint, &token_program)?;
    let ix = build_create_ata_ix(&payer.pubkey(), wallet, mint, &token_program);
    submitter
        .submit("create token account", &[ix], payer, &[])
        .await?;
    Ok(ata.address)
}

pub async fn mint_to<L: Ledger>(
    submitter: &Submitter<'_, L>,
    authority: &Keypair,
    mint: &Pubkey,
    destination: &Pubkey,
    amount: u64,
    decimals: u8,
) -> Result<Signature, EscrowError> {
    let ix = build_mint_to_ix(mint, destination, &authority.pubkey(), amount, decimals)?;
    submitter.submit("mint to", &[ix], authority, &[]).await
}

/// Request an airdrop and wait for it through the submitter's confirmation loop.
pub async fn airdrop<L: Ledger>(
    submitter: &Submitter<'_, L>,
    ledger: &L,
    to: &Pubkey,
    lamports: u64,
) -> Result<Signature, EscrowError> {
    let signature = ledger
        .request_airdrop(to, lamports)
        .await
        .map_err(|e| EscrowError::from_ledger("airdrop", e))?;
    submitter.confirm("airdrop", &signature).await?;
    Ok(signature)
}

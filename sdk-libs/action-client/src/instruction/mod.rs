mod compress_sol;
pub mod data;
mod packed_accounts;
mod transfer;

pub use compress_sol::create_compress_sol_instruction;
pub use data::CompressedProof;
pub use packed_accounts::PackedAccounts;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
use thiserror::Error;
pub use transfer::{
    create_inputs_and_remaining_accounts, create_transfer_instruction,
    CreateTransferInstructionInputs, SplCompression, TokenTransferOutput,
};

#[derive(Error, Debug)]
pub enum InstructionError {
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Got {root_indices} root indices for {accounts} input accounts")]
    RootIndicesMismatch { accounts: usize, root_indices: usize },

    #[error("Transfer has neither outputs nor spl compression")]
    EmptyTransfer,

    #[error("Input account owned by {found}, expected signer {expected}")]
    SignerCheckFailed { expected: Pubkey, found: Pubkey },

    #[error("Input account of mint {found}, expected {expected}")]
    MintMismatch { expected: Pubkey, found: Pubkey },

    #[error("Input and output amounts do not balance")]
    SumCheckFailed,

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Too many remaining accounts: {0}")]
    TooManyAccounts(usize),

    #[error("Serialization error: {0}")]
    Serialization(#[from] std::io::Error),
}

/// Creates the associated token account of `owner` unless it exists.
pub fn create_associated_token_account_idempotent(
    payer: &Pubkey,
    owner: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Instruction {
    spl_associated_token_account::instruction::create_associated_token_account_idempotent(
        payer,
        owner,
        mint,
        token_program,
    )
}

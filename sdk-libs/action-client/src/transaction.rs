use solana_sdk::{
    compute_budget::ComputeBudgetInstruction, hash::Hash, instruction::Instruction,
    message::Message, packet::PACKET_DATA_SIZE, pubkey::Pubkey, transaction::Transaction,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransactionBuildError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Transaction is {size} bytes, max {max}")]
    TooLarge { size: usize, max: usize },
}

/// Unsigned legacy transaction paying with `payer`. A compute unit limit
/// instruction is prepended to `instructions`.
pub fn build_unsigned_transaction(
    payer: &Pubkey,
    instructions: &[Instruction],
    recent_blockhash: Hash,
    compute_unit_limit: u32,
) -> Transaction {
    let mut ixs = Vec::with_capacity(instructions.len() + 1);
    ixs.push(ComputeBudgetInstruction::set_compute_unit_limit(
        compute_unit_limit,
    ));
    ixs.extend_from_slice(instructions);
    let mut message = Message::new(&ixs, Some(payer));
    message.recent_blockhash = recent_blockhash;
    Transaction::new_unsigned(message)
}

/// Wire form of a transaction as returned to wallets: bincode, then base64.
pub fn serialize_transaction_base64(
    transaction: &Transaction,
) -> Result<String, TransactionBuildError> {
    let bytes = bincode::serialize(transaction)?;
    if bytes.len() > PACKET_DATA_SIZE {
        return Err(TransactionBuildError::TooLarge {
            size: bytes.len(),
            max: PACKET_DATA_SIZE,
        });
    }
    Ok(base64::encode(bytes))
}

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Photon API error in {method} (code: {code}): {message}")]
    PhotonError {
        method: String,
        code: i64,
        message: String,
    },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Missing result in {method}: {message}")]
    MissingResult { method: String, message: String },

    #[error("Invalid response data: {0}")]
    InvalidResponseData(String),

    #[error("Base58 decode error: {input}: {message}")]
    Base58DecodeError { input: String, message: String },

    #[error("Unknown state tree {0}: no nullifier queue configured")]
    UnknownStateTree(Pubkey),

    #[error("Indexer not synced to slot {required}, indexer slot {indexer_slot}")]
    IndexerNotSyncedToSlot { required: u64, indexer_slot: u64 },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

impl IndexerError {
    pub fn base58<E: std::fmt::Display>(input: &str, error: E) -> Self {
        Self::Base58DecodeError {
            input: input.to_string(),
            message: error.to_string(),
        }
    }

    pub fn missing_result(method: &str, message: &str) -> Self {
        Self::MissingResult {
            method: method.to_string(),
            message: message.to_string(),
        }
    }

    /// Transport and server side failures are worth another attempt, malformed
    /// data is not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IndexerError::PhotonError { .. }
                | IndexerError::Request(_)
                | IndexerError::IndexerNotSyncedToSlot { .. }
        )
    }
}

use light_action_client::{
    indexer::IndexerError, instruction::InstructionError, rpc::RpcError,
    selection::SelectionError, transaction::TransactionBuildError,
};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;
use tracing::{error, warn};
use warp::{
    http::StatusCode,
    reply::{self, Reply, Response},
};

#[derive(Error, Debug)]
pub enum ActionError {
    #[error("Invalid input query parameter: {0}")]
    InvalidQueryParameter(&'static str),

    #[error("Invalid \"account\" provided")]
    InvalidAccount,

    #[error("Invalid path parameter: {0}")]
    InvalidPathParameter(&'static str),

    #[error("No compressed balance of mint {0}")]
    NoCompressedBalance(Pubkey),

    #[error("Invalid mint {mint}: {error}")]
    InvalidMint { mint: Pubkey, error: String },

    #[error("{0}")]
    Selection(#[from] SelectionError),

    #[error("Instruction error: {0}")]
    Instruction(#[from] InstructionError),

    #[error("Indexer error: {0}")]
    Indexer(#[from] IndexerError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionBuildError),
}

impl ActionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ActionError::Indexer(_) | ActionError::Rpc(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ActionError::Transaction(TransactionBuildError::Serialization(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ActionError::Instruction(InstructionError::Serialization(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Action failed: {}", self);
        } else {
            warn!("Action rejected: {}", self);
        }
        reply::with_status(
            reply::json(&ErrorResponse {
                message: self.to_string(),
            }),
            status,
        )
        .into_response()
    }
}

/// Body of every error reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid pubkey: {field} - {error}")]
    InvalidPubkey { field: &'static str, error: String },

    #[error("Invalid value: {field} - {error}")]
    InvalidValue { field: &'static str, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ActionError::InvalidQueryParameter("to").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ActionError::InvalidQueryParameter("amount").to_string(),
            "Invalid input query parameter: amount"
        );
        assert_eq!(
            ActionError::InvalidAccount.to_string(),
            "Invalid \"account\" provided"
        );
        assert_eq!(
            ActionError::Selection(SelectionError::InsufficientBalance {
                required: 2,
                balance: 1
            })
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ActionError::Indexer(IndexerError::InvalidResponseData("x".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ActionError::Rpc(RpcError::CustomError("x".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

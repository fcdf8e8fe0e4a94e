use async_trait::async_trait;
use solana_sdk::{hash::Hash, pubkey::Pubkey};

mod errors;
mod solana_rpc;

pub use errors::RpcError;
pub use solana_rpc::{unpack_mint, SolanaRpc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintInfo {
    pub decimals: u8,
    /// spl token or token-2022, the owner of the mint account.
    pub token_program: Pubkey,
}

/// The Solana JSON-RPC reads needed to assemble a transaction.
#[async_trait]
pub trait Rpc: Send + Sync {
    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError>;

    async fn get_mint(&self, mint: &Pubkey) -> Result<MintInfo, RpcError>;

    async fn get_mint_decimals(&self, mint: &Pubkey) -> Result<u8, RpcError> {
        Ok(self.get_mint(mint).await?.decimals)
    }
}

use std::fmt::{Debug, Formatter};

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, hash::Hash, program_pack::Pack,
    pubkey::Pubkey,
};
use spl_token::state::Mint;
use tracing::debug;

use super::{MintInfo, Rpc, RpcError};
use crate::constants::TOKEN_2022_PROGRAM_ID;

pub struct SolanaRpc {
    client: RpcClient,
}

impl Debug for SolanaRpc {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SolanaRpc {{ client: {:?} }}", self.client.url())
    }
}

impl SolanaRpc {
    pub fn new(url: impl ToString) -> Self {
        Self::new_with_commitment(url, CommitmentConfig::confirmed())
    }

    pub fn new_with_commitment(url: impl ToString, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url.to_string(), commitment),
        }
    }
}

#[async_trait]
impl Rpc for SolanaRpc {
    async fn get_latest_blockhash(&self) -> Result<Hash, RpcError> {
        // Confirmed commitments land more reliably than finalized ones.
        let (blockhash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(CommitmentConfig::confirmed())
            .await?;
        debug!(
            "Latest blockhash {} valid until block height {}",
            blockhash, last_valid_block_height
        );
        Ok(blockhash)
    }

    async fn get_mint(&self, mint: &Pubkey) -> Result<MintInfo, RpcError> {
        let account = self
            .client
            .get_account_with_commitment(mint, self.client.commitment())
            .await?
            .value
            .ok_or(RpcError::AccountNotFound(*mint))?;
        unpack_mint(mint, &account)
    }
}

/// Token-2022 mints share the spl token base layout and append extensions
/// after it.
pub fn unpack_mint(mint: &Pubkey, account: &Account) -> Result<MintInfo, RpcError> {
    if account.owner != spl_token::ID && account.owner != TOKEN_2022_PROGRAM_ID {
        return Err(RpcError::InvalidMint {
            account: *mint,
            message: format!("owned by {}", account.owner),
        });
    }
    let data = account.data.get(..Mint::LEN).ok_or_else(|| RpcError::InvalidMint {
        account: *mint,
        message: format!("data length {}", account.data.len()),
    })?;
    let state = Mint::unpack(data).map_err(|e| RpcError::InvalidMint {
        account: *mint,
        message: e.to_string(),
    })?;
    Ok(MintInfo {
        decimals: state.decimals,
        token_program: account.owner,
    })
}

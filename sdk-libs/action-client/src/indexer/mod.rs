use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;

mod base58;
mod config;
mod error;
mod photon_indexer;
mod types;

pub use base58::{
    decode_base58_option_to_pubkey, decode_base58_to_fixed_array, decode_base58_to_pubkey,
    encode_base58,
};
pub use config::{IndexerRpcConfig, RetryConfig};
pub use error::IndexerError;
pub use photon_indexer::PhotonIndexer;
pub use types::{
    balances_by_mint, AccountState, CompressedTokenAccount, Context, Hash, MerkleContext,
    Response, StateTreeInfo, TokenBalance, TokenData, ValidityProofWithContext,
};

/// Read access to compressed state.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// Returns every compressed token account of `owner`, optionally
    /// restricted to `mint`. All pages are fetched.
    async fn get_compressed_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        mint: Option<Pubkey>,
        config: Option<IndexerRpcConfig>,
    ) -> Result<Response<Vec<CompressedTokenAccount>>, IndexerError>;

    /// Proves that the accounts with `hashes` exist and are not nullified.
    /// Root indices are returned in the order of `hashes`.
    async fn get_validity_proof(
        &self,
        hashes: Vec<Hash>,
        config: Option<IndexerRpcConfig>,
    ) -> Result<Response<ValidityProofWithContext>, IndexerError>;
}

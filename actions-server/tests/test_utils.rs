#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use light_action_client::{
    indexer::{
        AccountState, CompressedTokenAccount, Context, Hash, Indexer, IndexerError,
        IndexerRpcConfig, MerkleContext, Response, TokenData, ValidityProofWithContext,
    },
    instruction::CompressedProof,
    rpc::{MintInfo, Rpc, RpcError},
};
use light_actions_server::{
    actions::ActionState,
    compression::{CompressionService, ServiceSettings},
    config::ActionsConfig,
};
use solana_sdk::{hash::Hash as BlockHash, pubkey, pubkey::Pubkey};

pub const SPL_TOKEN_PROGRAM_ID: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
pub const TEST_DECIMALS: u8 = 6;
pub const TEST_SLOT: u64 = 42;

#[derive(Default)]
pub struct MockIndexer {
    pub accounts: Vec<CompressedTokenAccount>,
    pub fail: bool,
}

#[async_trait]
impl Indexer for MockIndexer {
    async fn get_compressed_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        mint: Option<Pubkey>,
        _config: Option<IndexerRpcConfig>,
    ) -> Result<Response<Vec<CompressedTokenAccount>>, IndexerError> {
        if self.fail {
            return Err(IndexerError::InvalidResponseData(
                "indexer unavailable".to_string(),
            ));
        }
        let value = self
            .accounts
            .iter()
            .filter(|account| account.token.owner == *owner)
            .filter(|account| mint.map_or(true, |mint| account.token.mint == mint))
            .cloned()
            .collect();
        Ok(Response {
            context: Context { slot: TEST_SLOT },
            value,
        })
    }

    async fn get_validity_proof(
        &self,
        hashes: Vec<Hash>,
        _config: Option<IndexerRpcConfig>,
    ) -> Result<Response<ValidityProofWithContext>, IndexerError> {
        if self.fail {
            return Err(IndexerError::InvalidResponseData(
                "indexer unavailable".to_string(),
            ));
        }
        let accounts = hashes
            .iter()
            .map(|hash| {
                self.accounts
                    .iter()
                    .find(|account| account.hash == *hash)
                    .ok_or_else(|| IndexerError::InvalidParameters("unknown hash".to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Response {
            context: Context { slot: TEST_SLOT },
            value: ValidityProofWithContext {
                proof: Some(CompressedProof::default()),
                root_indices: accounts.iter().map(|_| Some(7)).collect(),
                leaf_indices: accounts
                    .iter()
                    .map(|account| account.merkle_context.leaf_index)
                    .collect(),
                merkle_trees: accounts
                    .iter()
                    .map(|account| account.merkle_context.merkle_tree)
                    .collect(),
            },
        })
    }
}

pub struct MockRpc {
    pub blockhash: BlockHash,
    pub mints: HashMap<Pubkey, MintInfo>,
}

impl MockRpc {
    pub fn with_mints(mints: &[Pubkey]) -> Self {
        Self {
            blockhash: BlockHash::new_unique(),
            mints: mints
                .iter()
                .map(|mint| {
                    (
                        *mint,
                        MintInfo {
                            decimals: TEST_DECIMALS,
                            token_program: SPL_TOKEN_PROGRAM_ID,
                        },
                    )
                })
                .collect(),
        }
    }
}

#[async_trait]
impl Rpc for MockRpc {
    async fn get_latest_blockhash(&self) -> Result<BlockHash, RpcError> {
        Ok(self.blockhash)
    }

    async fn get_mint(&self, mint: &Pubkey) -> Result<MintInfo, RpcError> {
        self.mints
            .get(mint)
            .copied()
            .ok_or(RpcError::AccountNotFound(*mint))
    }
}

pub fn token_account(
    owner: Pubkey,
    mint: Pubkey,
    amount: u64,
    leaf_index: u32,
) -> CompressedTokenAccount {
    let mut hash = [0u8; 32];
    hash[..4].copy_from_slice(&leaf_index.to_le_bytes());
    hash[31] = 1;
    CompressedTokenAccount {
        hash,
        lamports: 0,
        merkle_context: MerkleContext {
            merkle_tree: light_action_client::constants::DEFAULT_STATE_MERKLE_TREE,
            queue: light_action_client::constants::DEFAULT_NULLIFIER_QUEUE,
            leaf_index,
            prove_by_index: false,
        },
        token: TokenData {
            mint,
            owner,
            amount,
            delegate: None,
            state: AccountState::Initialized,
            tlv: None,
        },
    }
}

pub fn test_state(config: ActionsConfig, indexer: MockIndexer, rpc: MockRpc) -> ActionState {
    let service = CompressionService::new(
        Arc::new(indexer),
        Arc::new(rpc),
        ServiceSettings::from(&config),
    );
    ActionState {
        config: Arc::new(config),
        service: Arc::new(service),
    }
}

use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use tracing::{debug, error, trace, warn};

use super::{
    base58::{
        decode_base58_option_to_pubkey, decode_base58_to_fixed_array, decode_base58_to_pubkey,
        encode_base58,
    },
    config::RetryConfig,
    types::{
        AccountState, CompressedTokenAccount, Context, MerkleContext, Response, StateTreeInfo,
        TokenData, ValidityProofWithContext,
    },
    Hash, Indexer, IndexerError, IndexerRpcConfig,
};
use crate::{
    constants::{DEFAULT_NULLIFIER_QUEUE, DEFAULT_STATE_MERKLE_TREE},
    instruction::CompressedProof,
};

const GET_COMPRESSED_TOKEN_ACCOUNTS_BY_OWNER: &str = "getCompressedTokenAccountsByOwner";
const GET_VALIDITY_PROOF: &str = "getValidityProof";

pub struct PhotonIndexer {
    url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    /// v1 token accounts do not report their queue, it is looked up here.
    state_trees: Vec<StateTreeInfo>,
}

impl PhotonIndexer {
    pub fn default_path() -> String {
        "http://127.0.0.1:8784".to_string()
    }

    pub fn new(url: String, api_key: Option<String>) -> Self {
        Self {
            url,
            api_key,
            client: reqwest::Client::new(),
            state_trees: vec![StateTreeInfo::new(
                DEFAULT_STATE_MERKLE_TREE,
                DEFAULT_NULLIFIER_QUEUE,
            )],
        }
    }

    pub fn with_state_trees(
        mut self,
        state_trees: impl IntoIterator<Item = StateTreeInfo>,
    ) -> Self {
        for info in state_trees {
            if !self.state_trees.iter().any(|known| known.tree == info.tree) {
                self.state_trees.push(info);
            }
        }
        self
    }

    async fn retry<F, Fut, T>(
        &self,
        config: RetryConfig,
        mut operation: F,
    ) -> Result<T, IndexerError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, IndexerError>>,
    {
        let max_retries = config.num_retries.max(1);
        let mut attempts = 0;
        let mut delay_ms = config.delay_ms;

        loop {
            attempts += 1;
            trace!("Attempt {}/{}: Executing operation", attempts, max_retries);

            match operation().await {
                Ok(value) => {
                    trace!("Attempt {}/{}: Operation succeeded.", attempts, max_retries);
                    return Ok(value);
                }
                Err(e) => {
                    let is_retryable = e.is_retryable();
                    if is_retryable && attempts < max_retries {
                        warn!(
                            "Attempt {}/{}: Operation failed: {}. Retrying",
                            attempts, max_retries, e
                        );
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                        delay_ms = std::cmp::min(delay_ms.saturating_mul(2), config.max_delay_ms);
                    } else {
                        if is_retryable {
                            error!("Operation failed after max retries: {}", e);
                        } else {
                            error!("Operation failed with non-retryable error: {}", e);
                        }
                        return Err(e);
                    }
                }
            }
        }
    }

    async fn send_request<P: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<T, IndexerError> {
        let mut request = self.client.post(&self.url);
        if let Some(api_key) = &self.api_key {
            request = request.query(&[("api-key", api_key)]);
        }
        let response: RpcResponse<T> = request
            .json(&RpcRequest::new(method, params))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Self::extract_result(method, response)
    }

    fn extract_result<T>(method: &str, response: RpcResponse<T>) -> Result<T, IndexerError> {
        if let Some(error) = response.error {
            return Err(IndexerError::PhotonError {
                method: method.to_string(),
                code: error.code,
                message: error.message,
            });
        }
        response
            .result
            .ok_or_else(|| IndexerError::missing_result(method, "value not present"))
    }

    fn check_slot(required: u64, indexer_slot: u64) -> Result<(), IndexerError> {
        if indexer_slot < required {
            return Err(IndexerError::IndexerNotSyncedToSlot {
                required,
                indexer_slot,
            });
        }
        Ok(())
    }

    async fn get_token_accounts_page(
        &self,
        owner: &Pubkey,
        mint: Option<Pubkey>,
        cursor: Option<String>,
        config: &IndexerRpcConfig,
    ) -> Result<(u64, TokenAccountList), IndexerError> {
        self.retry(config.retry_config.clone(), || async {
            let params = GetCompressedTokenAccountsByOwnerParams {
                owner: owner.to_string(),
                mint: mint.map(|mint| mint.to_string()),
                cursor: cursor.clone(),
                limit: None,
            };
            let response: ContextResponse<TokenAccountList> = self
                .send_request(GET_COMPRESSED_TOKEN_ACCOUNTS_BY_OWNER, params)
                .await?;
            Self::check_slot(config.slot, response.context.slot)?;
            Ok((response.context.slot, response.value))
        })
        .await
    }

    fn resolve_queue(&self, tree: &Pubkey, queue: Option<Pubkey>) -> Result<Pubkey, IndexerError> {
        match queue {
            Some(queue) => Ok(queue),
            None => self
                .state_trees
                .iter()
                .find(|info| info.tree == *tree)
                .map(|info| info.queue)
                .ok_or(IndexerError::UnknownStateTree(*tree)),
        }
    }

    fn convert_token_account(
        &self,
        item: &PhotonTokenAccount,
    ) -> Result<CompressedTokenAccount, IndexerError> {
        let account = &item.account;
        let tree = decode_base58_to_pubkey(&account.tree)?;
        let queue = decode_base58_option_to_pubkey(&account.queue)?;
        let token = &item.token_data;
        let state = match token.state.as_str() {
            "initialized" => AccountState::Initialized,
            "frozen" => AccountState::Frozen,
            other => {
                return Err(IndexerError::InvalidResponseData(format!(
                    "unknown token account state: {}",
                    other
                )))
            }
        };
        let tlv = token
            .tlv
            .as_ref()
            .map(|tlv| base64::decode(tlv))
            .transpose()
            .map_err(|e| IndexerError::InvalidResponseData(format!("invalid tlv: {}", e)))?;

        Ok(CompressedTokenAccount {
            hash: decode_base58_to_fixed_array(&account.hash)?,
            lamports: account.lamports,
            merkle_context: MerkleContext {
                merkle_tree: tree,
                queue: self.resolve_queue(&tree, queue)?,
                leaf_index: account.leaf_index,
                prove_by_index: account.prove_by_index.unwrap_or(false),
            },
            token: TokenData {
                mint: decode_base58_to_pubkey(&token.mint)?,
                owner: decode_base58_to_pubkey(&token.owner)?,
                amount: token.amount,
                delegate: decode_base58_option_to_pubkey(&token.delegate)?,
                state,
                tlv,
            },
        })
    }
}

impl Debug for PhotonIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotonIndexer")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("state_trees", &self.state_trees)
            .finish()
    }
}

#[async_trait]
impl Indexer for PhotonIndexer {
    async fn get_compressed_token_accounts_by_owner(
        &self,
        owner: &Pubkey,
        mint: Option<Pubkey>,
        config: Option<IndexerRpcConfig>,
    ) -> Result<Response<Vec<CompressedTokenAccount>>, IndexerError> {
        let config = config.unwrap_or_default();
        let mut items = Vec::new();
        let mut cursor = None;
        let mut slot;
        loop {
            let (page_slot, page) = self
                .get_token_accounts_page(owner, mint, cursor.clone(), &config)
                .await?;
            slot = page_slot;
            for item in page.items.iter() {
                items.push(self.convert_token_account(item)?);
            }
            match page.cursor {
                Some(next) if !page.items.is_empty() && Some(&next) != cursor.as_ref() => {
                    cursor = Some(next);
                }
                _ => break,
            }
        }
        debug!(
            "Fetched {} compressed token accounts for {} at slot {}",
            items.len(),
            owner,
            slot
        );
        Ok(Response {
            context: Context { slot },
            value: items,
        })
    }

    async fn get_validity_proof(
        &self,
        hashes: Vec<Hash>,
        config: Option<IndexerRpcConfig>,
    ) -> Result<Response<ValidityProofWithContext>, IndexerError> {
        if hashes.is_empty() {
            return Err(IndexerError::InvalidParameters(
                "at least one hash is required".to_string(),
            ));
        }
        let config = config.unwrap_or_default();
        self.retry(config.retry_config.clone(), || async {
            let params = GetValidityProofParams {
                hashes: hashes.iter().map(encode_base58).collect(),
            };
            let response: ContextResponse<PhotonValidityProof> =
                self.send_request(GET_VALIDITY_PROOF, params).await?;
            Self::check_slot(config.slot, response.context.slot)?;
            Ok(Response {
                context: Context {
                    slot: response.context.slot,
                },
                value: response.value.into_validity_proof(hashes.len())?,
            })
        })
        .await
    }
}

#[derive(Serialize, Debug)]
struct RpcRequest<'a, T> {
    jsonrpc: &'a str,
    id: &'a str,
    method: &'a str,
    params: T,
}

impl<'a, T> RpcRequest<'a, T> {
    fn new(method: &'a str, params: T) -> Self {
        Self {
            jsonrpc: "2.0",
            id: "1",
            method,
            params,
        }
    }
}

#[derive(Deserialize, Debug)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize, Debug)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize, Debug)]
struct ContextResponse<T> {
    context: PhotonContext,
    value: T,
}

#[derive(Deserialize, Debug)]
struct PhotonContext {
    slot: u64,
}

#[derive(Serialize, Debug)]
struct GetCompressedTokenAccountsByOwnerParams {
    owner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    mint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u16>,
}

#[derive(Serialize, Debug)]
struct GetValidityProofParams {
    hashes: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TokenAccountList {
    items: Vec<PhotonTokenAccount>,
    cursor: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PhotonTokenAccount {
    account: PhotonAccount,
    token_data: PhotonTokenData,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PhotonAccount {
    hash: String,
    lamports: u64,
    leaf_index: u32,
    tree: String,
    #[serde(default)]
    queue: Option<String>,
    #[serde(default)]
    prove_by_index: Option<bool>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PhotonTokenData {
    mint: String,
    owner: String,
    amount: u64,
    delegate: Option<String>,
    state: String,
    tlv: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PhotonValidityProof {
    compressed_proof: Option<PhotonCompressedProof>,
    root_indices: Vec<PhotonRootIndex>,
    leaf_indices: Vec<u32>,
    merkle_trees: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct PhotonCompressedProof {
    a: Vec<u8>,
    b: Vec<u8>,
    c: Vec<u8>,
}

/// Older indexers return plain root indices, newer ones also report whether
/// the account is proven by index.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum PhotonRootIndex {
    Index(u64),
    #[serde(rename_all = "camelCase")]
    WithContext { root_index: u64, prove_by_index: bool },
}

impl PhotonRootIndex {
    fn into_root_index(self) -> Result<Option<u16>, IndexerError> {
        let root_index = match self {
            PhotonRootIndex::WithContext {
                prove_by_index: true,
                ..
            } => return Ok(None),
            PhotonRootIndex::Index(root_index)
            | PhotonRootIndex::WithContext { root_index, .. } => root_index,
        };
        u16::try_from(root_index).map(Some).map_err(|_| {
            IndexerError::InvalidResponseData(format!("root index out of range: {}", root_index))
        })
    }
}

impl PhotonCompressedProof {
    fn into_compressed_proof(self) -> Result<CompressedProof, IndexerError> {
        fn fixed<const N: usize>(name: &str, bytes: Vec<u8>) -> Result<[u8; N], IndexerError> {
            let len = bytes.len();
            bytes.try_into().map_err(|_| {
                IndexerError::InvalidResponseData(format!(
                    "proof.{} has {} bytes, expected {}",
                    name, len, N
                ))
            })
        }
        Ok(CompressedProof {
            a: fixed("a", self.a)?,
            b: fixed("b", self.b)?,
            c: fixed("c", self.c)?,
        })
    }
}

impl PhotonValidityProof {
    fn into_validity_proof(
        self,
        num_hashes: usize,
    ) -> Result<ValidityProofWithContext, IndexerError> {
        if self.root_indices.len() != num_hashes {
            return Err(IndexerError::InvalidResponseData(format!(
                "expected {} root indices, got {}",
                num_hashes,
                self.root_indices.len()
            )));
        }
        let root_indices = self
            .root_indices
            .into_iter()
            .map(PhotonRootIndex::into_root_index)
            .collect::<Result<Vec<_>, _>>()?;
        let proof = self
            .compressed_proof
            .map(PhotonCompressedProof::into_compressed_proof)
            .transpose()?;
        if proof.is_none() && root_indices.iter().any(Option::is_some) {
            return Err(IndexerError::InvalidResponseData(
                "missing proof for accounts proven by root".to_string(),
            ));
        }
        let merkle_trees = self
            .merkle_trees
            .iter()
            .map(|tree| decode_base58_to_pubkey(tree))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ValidityProofWithContext {
            proof,
            root_indices,
            leaf_indices: self.leaf_indices,
            merkle_trees,
        })
    }
}

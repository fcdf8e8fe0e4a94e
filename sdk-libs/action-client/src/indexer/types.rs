use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::instruction::CompressedProof;

pub type Hash = [u8; 32];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MerkleContext {
    pub merkle_tree: Pubkey,
    pub queue: Pubkey,
    pub leaf_index: u32,
    /// Inclusion is proven by leaf index in an output queue instead of a zk
    /// proof against a root.
    pub prove_by_index: bool,
}

/// A v1 state tree and the nullifier queue that belongs to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTreeInfo {
    pub tree: Pubkey,
    pub queue: Pubkey,
}

impl StateTreeInfo {
    pub fn new(tree: Pubkey, queue: Pubkey) -> Self {
        Self { tree, queue }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountState {
    Initialized,
    Frozen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenData {
    pub mint: Pubkey,
    pub owner: Pubkey,
    pub amount: u64,
    pub delegate: Option<Pubkey>,
    pub state: AccountState,
    pub tlv: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedTokenAccount {
    pub hash: Hash,
    pub lamports: u64,
    pub merkle_context: MerkleContext,
    pub token: TokenData,
}

impl CompressedTokenAccount {
    pub fn is_frozen(&self) -> bool {
        self.token.state == AccountState::Frozen
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidityProofWithContext {
    /// `None` when every account is proven by index.
    pub proof: Option<CompressedProof>,
    /// One entry per requested hash, in request order. `None` means the
    /// account is proven by index.
    pub root_indices: Vec<Option<u16>>,
    pub leaf_indices: Vec<u32>,
    pub merkle_trees: Vec<Pubkey>,
}

/// Compressed token balance of one mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenBalance {
    pub mint: String,
    pub amount: u64,
    pub accounts: usize,
}

/// Sums the balances of `accounts` per mint, ordered by mint.
pub fn balances_by_mint(accounts: &[CompressedTokenAccount]) -> Vec<TokenBalance> {
    let mut balances = std::collections::BTreeMap::<Pubkey, (u64, usize)>::new();
    for account in accounts {
        let entry = balances.entry(account.token.mint).or_default();
        entry.0 = entry.0.saturating_add(account.token.amount);
        entry.1 += 1;
    }
    balances
        .into_iter()
        .map(|(mint, (amount, accounts))| TokenBalance {
            mint: mint.to_string(),
            amount,
            accounts,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Context {
    pub slot: u64,
}

/// Indexer result together with the slot it was read at.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Response<T> {
    pub context: Context,
    pub value: T,
}

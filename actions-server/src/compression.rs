use std::sync::Arc;

use light_action_client::{
    indexer::{
        balances_by_mint, encode_base58, AccountState, CompressedTokenAccount, Indexer,
        IndexerRpcConfig, RetryConfig, StateTreeInfo, TokenBalance,
    },
    instruction::{
        create_associated_token_account_idempotent, create_compress_sol_instruction,
        create_transfer_instruction, CreateTransferInstructionInputs, InstructionError,
        SplCompression, TokenTransferOutput,
    },
    pda::get_associated_token_address,
    rpc::{MintInfo, Rpc, RpcError},
    selection::{
        select_max_amount, select_min_compressed_token_accounts_for_transfer, spendable_balance,
        Selection,
    },
    transaction::build_unsigned_transaction,
};
use serde::{Deserialize, Serialize};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, transaction::Transaction};
use tracing::{debug, info};

use crate::{config::ActionsConfig, errors::ActionError};

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub cu_limit: u32,
    pub max_input_accounts: usize,
    pub output_state_tree: StateTreeInfo,
    pub indexer_retry_config: RetryConfig,
}

impl From<&ActionsConfig> for ServiceSettings {
    fn from(config: &ActionsConfig) -> Self {
        Self {
            cu_limit: config.cu_limit,
            max_input_accounts: config.max_input_accounts,
            output_state_tree: config.output_state_tree,
            indexer_retry_config: config.indexer_retry_config.clone(),
        }
    }
}

/// Result of a decompression, which may leave compressed balance behind when
/// it needs more inputs than one transaction carries.
#[derive(Debug, Clone)]
pub struct DecompressTransaction {
    pub transaction: Transaction,
    pub amount: u64,
    pub remaining: u64,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressedTokenAccountInfo {
    pub hash: String,
    pub mint: String,
    pub amount: u64,
    pub lamports: u64,
    pub tree: String,
    pub leaf_index: u32,
    pub frozen: bool,
    pub delegate: Option<String>,
}

impl From<&CompressedTokenAccount> for CompressedTokenAccountInfo {
    fn from(account: &CompressedTokenAccount) -> Self {
        Self {
            hash: encode_base58(&account.hash),
            mint: account.token.mint.to_string(),
            amount: account.token.amount,
            lamports: account.lamports,
            tree: account.merkle_context.merkle_tree.to_string(),
            leaf_index: account.merkle_context.leaf_index,
            frozen: account.token.state == AccountState::Frozen,
            delegate: account.token.delegate.map(|delegate| delegate.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompressedTokens {
    pub owner: String,
    pub accounts: Vec<CompressedTokenAccountInfo>,
    pub balances: Vec<TokenBalance>,
}

/// Assembles unsigned transactions from indexer and rpc reads.
pub struct CompressionService {
    indexer: Arc<dyn Indexer>,
    rpc: Arc<dyn Rpc>,
    settings: ServiceSettings,
}

impl CompressionService {
    pub fn new(indexer: Arc<dyn Indexer>, rpc: Arc<dyn Rpc>, settings: ServiceSettings) -> Self {
        Self {
            indexer,
            rpc,
            settings,
        }
    }

    fn indexer_config(&self) -> Option<IndexerRpcConfig> {
        Some(IndexerRpcConfig {
            slot: 0,
            retry_config: self.settings.indexer_retry_config.clone(),
        })
    }

    pub async fn get_mint(&self, mint: &Pubkey) -> Result<MintInfo, ActionError> {
        self.rpc.get_mint(mint).await.map_err(|e| match e {
            RpcError::AccountNotFound(_) => ActionError::InvalidMint {
                mint: *mint,
                error: "account not found".to_string(),
            },
            RpcError::InvalidMint { message, .. } => ActionError::InvalidMint {
                mint: *mint,
                error: message,
            },
            e => ActionError::Rpc(e),
        })
    }

    async fn finalize(
        &self,
        payer: &Pubkey,
        instructions: &[Instruction],
    ) -> Result<Transaction, ActionError> {
        let blockhash = self.rpc.get_latest_blockhash().await?;
        Ok(build_unsigned_transaction(
            payer,
            instructions,
            blockhash,
            self.settings.cu_limit,
        ))
    }

    pub async fn build_compress_sol_tx(
        &self,
        payer: &Pubkey,
        recipient: &Pubkey,
        lamports: u64,
    ) -> Result<Transaction, ActionError> {
        let ix = create_compress_sol_instruction(
            payer,
            recipient,
            lamports,
            &self.settings.output_state_tree.tree,
        )?;
        info!("Compressing {} lamports from {} for {}", lamports, payer, recipient);
        self.finalize(payer, &[ix]).await
    }

    /// `amount` is in base units of `mint`.
    pub async fn build_compress_spl_token_tx(
        &self,
        payer: &Pubkey,
        recipient: &Pubkey,
        mint: &Pubkey,
        amount: u64,
        mint_info: &MintInfo,
    ) -> Result<Transaction, ActionError> {
        if amount == 0 {
            return Err(InstructionError::ZeroAmount.into());
        }
        let source = get_associated_token_address(payer, mint, &mint_info.token_program);
        let outputs = [TokenTransferOutput {
            owner: *recipient,
            amount,
            merkle_tree: self.settings.output_state_tree.tree,
        }];
        let ix = create_transfer_instruction(CreateTransferInstructionInputs {
            fee_payer: *payer,
            authority: *payer,
            mint: *mint,
            input_accounts: &[],
            root_indices: &[],
            proof: None,
            outputs: &outputs,
            compression: Some(SplCompression::Compress {
                amount,
                token_account: source,
                token_program: mint_info.token_program,
            }),
        })?;
        info!(
            "Compressing {} of mint {} from {} for {}",
            amount, mint, source, recipient
        );
        self.finalize(payer, &[ix]).await
    }

    /// Decompresses `amount` base units, or as much as one transaction can
    /// carry when `amount` is `None`, into the payer's associated token
    /// account.
    pub async fn build_decompress_spl_token_tx(
        &self,
        payer: &Pubkey,
        mint: &Pubkey,
        amount: Option<u64>,
        mint_info: &MintInfo,
    ) -> Result<DecompressTransaction, ActionError> {
        if amount == Some(0) {
            return Err(InstructionError::ZeroAmount.into());
        }
        let accounts = self.compressed_token_accounts(payer, Some(*mint)).await?;
        let selection = match amount {
            Some(amount) => select_min_compressed_token_accounts_for_transfer(
                &accounts,
                amount,
                self.settings.max_input_accounts,
            )?,
            None => select_max_amount(&accounts, self.settings.max_input_accounts),
        };
        if selection.accounts.is_empty() {
            return Err(ActionError::NoCompressedBalance(*mint));
        }
        let amount = amount.unwrap_or(selection.total_amount);

        let destination = get_associated_token_address(payer, mint, &mint_info.token_program);
        let outputs = self
            .change_output(payer, &selection, amount)
            .into_iter()
            .collect::<Vec<_>>();
        let transfer_ix = self
            .transfer_from_selection(
                payer,
                mint,
                &selection,
                &outputs,
                Some(SplCompression::Decompress {
                    amount,
                    token_account: destination,
                    token_program: mint_info.token_program,
                }),
            )
            .await?;
        let create_ata_ix = create_associated_token_account_idempotent(
            payer,
            payer,
            mint,
            &mint_info.token_program,
        );
        let transaction = self.finalize(payer, &[create_ata_ix, transfer_ix]).await?;
        let remaining = spendable_balance(&accounts).saturating_sub(amount);
        info!(
            "Decompressing {} of mint {} for {} from {} accounts, {} remaining",
            amount,
            mint,
            payer,
            selection.accounts.len(),
            remaining
        );

        Ok(DecompressTransaction {
            transaction,
            amount,
            remaining,
            decimals: mint_info.decimals,
        })
    }

    /// `amount` is in base units of `mint`.
    pub async fn build_transfer_compressed_token_tx(
        &self,
        payer: &Pubkey,
        recipient: &Pubkey,
        mint: &Pubkey,
        amount: u64,
    ) -> Result<Transaction, ActionError> {
        if amount == 0 {
            return Err(InstructionError::ZeroAmount.into());
        }
        let accounts = self.compressed_token_accounts(payer, Some(*mint)).await?;
        let selection = select_min_compressed_token_accounts_for_transfer(
            &accounts,
            amount,
            self.settings.max_input_accounts,
        )?;

        let tree = selection
            .accounts
            .first()
            .map(|account| account.merkle_context.merkle_tree)
            .ok_or(ActionError::NoCompressedBalance(*mint))?;
        let mut outputs = vec![TokenTransferOutput {
            owner: *recipient,
            amount,
            merkle_tree: tree,
        }];
        outputs.extend(self.change_output(payer, &selection, amount));
        let ix = self
            .transfer_from_selection(payer, mint, &selection, &outputs, None)
            .await?;
        info!(
            "Transferring {} of mint {} from {} to {}",
            amount, mint, payer, recipient
        );
        self.finalize(payer, &[ix]).await
    }

    pub async fn get_compressed_tokens(
        &self,
        owner: &Pubkey,
        mint: Option<Pubkey>,
    ) -> Result<CompressedTokens, ActionError> {
        let accounts = self.compressed_token_accounts(owner, mint).await?;
        Ok(CompressedTokens {
            owner: owner.to_string(),
            accounts: accounts.iter().map(CompressedTokenAccountInfo::from).collect(),
            balances: balances_by_mint(&accounts),
        })
    }

    async fn compressed_token_accounts(
        &self,
        owner: &Pubkey,
        mint: Option<Pubkey>,
    ) -> Result<Vec<CompressedTokenAccount>, ActionError> {
        let response = self
            .indexer
            .get_compressed_token_accounts_by_owner(owner, mint, self.indexer_config())
            .await?;
        debug!(
            "Indexer returned {} compressed token accounts for {} at slot {}",
            response.value.len(),
            owner,
            response.context.slot
        );
        Ok(response.value)
    }

    /// Change of `selection` after spending `amount`, kept in the first
    /// input's tree.
    fn change_output(
        &self,
        owner: &Pubkey,
        selection: &Selection,
        amount: u64,
    ) -> Option<TokenTransferOutput> {
        let change = selection.total_amount.saturating_sub(amount);
        let first = selection.accounts.first()?;
        (change > 0).then_some(TokenTransferOutput {
            owner: *owner,
            amount: change,
            merkle_tree: first.merkle_context.merkle_tree,
        })
    }

    async fn transfer_from_selection(
        &self,
        payer: &Pubkey,
        mint: &Pubkey,
        selection: &Selection,
        outputs: &[TokenTransferOutput],
        compression: Option<SplCompression>,
    ) -> Result<Instruction, ActionError> {
        let hashes = selection
            .accounts
            .iter()
            .map(|account| account.hash)
            .collect::<Vec<_>>();
        let proof = self
            .indexer
            .get_validity_proof(hashes, self.indexer_config())
            .await?
            .value;
        Ok(create_transfer_instruction(
            CreateTransferInstructionInputs {
                fee_payer: *payer,
                authority: *payer,
                mint: *mint,
                input_accounts: &selection.accounts,
                root_indices: &proof.root_indices,
                proof: proof.proof,
                outputs,
                compression,
            },
        )?)
    }
}

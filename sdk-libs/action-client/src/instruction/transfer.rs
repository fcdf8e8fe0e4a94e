use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

use super::{
    data::{
        anchor_instruction_data, CompressedProof, CompressedTokenInstructionDataTransfer,
        InputTokenDataWithContext, PackedMerkleContext, PackedTokenTransferOutputData,
    },
    InstructionError, PackedAccounts,
};
use crate::{
    constants::{
        ACCOUNT_COMPRESSION_PROGRAM_ID, COMPRESSED_TOKEN_PROGRAM_ID, LIGHT_SYSTEM_PROGRAM_ID,
        NOOP_PROGRAM_ID, REGISTERED_PROGRAM_PDA, TRANSFER_DISCRIMINATOR,
    },
    indexer::CompressedTokenAccount,
    pda::{get_account_compression_authority, get_cpi_authority_pda, get_token_pool_pda},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTransferOutput {
    pub owner: Pubkey,
    pub amount: u64,
    pub merkle_tree: Pubkey,
}

/// Movement between an spl token account and the token pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplCompression {
    /// Spl tokens leave `token_account` and are minted as compressed outputs.
    Compress {
        amount: u64,
        token_account: Pubkey,
        token_program: Pubkey,
    },
    /// Compressed inputs are burned and spl tokens are sent to
    /// `token_account`.
    Decompress {
        amount: u64,
        token_account: Pubkey,
        token_program: Pubkey,
    },
}

impl SplCompression {
    fn amount(&self) -> u64 {
        match self {
            SplCompression::Compress { amount, .. } | SplCompression::Decompress { amount, .. } => {
                *amount
            }
        }
    }

    fn is_compress(&self) -> bool {
        matches!(self, SplCompression::Compress { .. })
    }

    fn accounts(&self) -> (Pubkey, Pubkey) {
        match self {
            SplCompression::Compress {
                token_account,
                token_program,
                ..
            }
            | SplCompression::Decompress {
                token_account,
                token_program,
                ..
            } => (*token_account, *token_program),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateTransferInstructionInputs<'a> {
    pub fee_payer: Pubkey,
    /// Owner of every input account and of the spl source account.
    pub authority: Pubkey,
    pub mint: Pubkey,
    pub input_accounts: &'a [CompressedTokenAccount],
    /// Root index per input account, `None` proves by index.
    pub root_indices: &'a [Option<u16>],
    pub proof: Option<CompressedProof>,
    pub outputs: &'a [TokenTransferOutput],
    pub compression: Option<SplCompression>,
}

/// Builds a compressed token program `transfer`. The same instruction
/// compresses, decompresses and transfers compressed tokens; the token
/// amounts of inputs, outputs and `compression` must balance.
pub fn create_transfer_instruction(
    inputs: CreateTransferInstructionInputs<'_>,
) -> Result<Instruction, InstructionError> {
    let (remaining_accounts, instruction_data) = create_inputs_and_remaining_accounts(&inputs)?;
    let data = anchor_instruction_data(TRANSFER_DISCRIMINATOR, &instruction_data)?;

    let (token_pool_pda, compress_or_decompress_token_account, token_program) =
        match inputs.compression {
            Some(compression) => {
                let (token_account, token_program) = compression.accounts();
                (
                    AccountMeta::new(get_token_pool_pda(&inputs.mint), false),
                    AccountMeta::new(token_account, false),
                    AccountMeta::new_readonly(token_program, false),
                )
            }
            None => (
                unset_optional_account(),
                unset_optional_account(),
                unset_optional_account(),
            ),
        };

    let accounts = vec![
        AccountMeta::new(inputs.fee_payer, true),
        AccountMeta::new_readonly(inputs.authority, true),
        AccountMeta::new_readonly(get_cpi_authority_pda(), false),
        AccountMeta::new_readonly(LIGHT_SYSTEM_PROGRAM_ID, false),
        AccountMeta::new_readonly(REGISTERED_PROGRAM_PDA, false),
        AccountMeta::new_readonly(NOOP_PROGRAM_ID, false),
        AccountMeta::new_readonly(get_account_compression_authority(), false),
        AccountMeta::new_readonly(ACCOUNT_COMPRESSION_PROGRAM_ID, false),
        AccountMeta::new_readonly(COMPRESSED_TOKEN_PROGRAM_ID, false),
        token_pool_pda,
        compress_or_decompress_token_account,
        token_program,
        AccountMeta::new_readonly(system_program::ID, false),
    ];

    Ok(Instruction {
        program_id: COMPRESSED_TOKEN_PROGRAM_ID,
        accounts: [accounts, remaining_accounts.to_account_metas()].concat(),
        data,
    })
}

/// Anchor expects the program id in place of an omitted optional account.
fn unset_optional_account() -> AccountMeta {
    AccountMeta::new_readonly(COMPRESSED_TOKEN_PROGRAM_ID, false)
}

pub fn create_inputs_and_remaining_accounts(
    inputs: &CreateTransferInstructionInputs<'_>,
) -> Result<(PackedAccounts, CompressedTokenInstructionDataTransfer), InstructionError> {
    if inputs.input_accounts.len() != inputs.root_indices.len() {
        return Err(InstructionError::RootIndicesMismatch {
            accounts: inputs.input_accounts.len(),
            root_indices: inputs.root_indices.len(),
        });
    }
    if inputs.outputs.is_empty() && inputs.compression.is_none() {
        return Err(InstructionError::EmptyTransfer);
    }
    for account in inputs.input_accounts {
        if account.token.owner != inputs.authority {
            return Err(InstructionError::SignerCheckFailed {
                expected: inputs.authority,
                found: account.token.owner,
            });
        }
        if account.token.mint != inputs.mint {
            return Err(InstructionError::MintMismatch {
                expected: inputs.mint,
                found: account.token.mint,
            });
        }
    }
    sum_check(inputs)?;

    let mut remaining_accounts = PackedAccounts::new();
    let mut input_token_data_with_context = Vec::with_capacity(inputs.input_accounts.len());
    for (account, root_index) in inputs.input_accounts.iter().zip(inputs.root_indices) {
        let merkle_tree_pubkey_index =
            remaining_accounts.insert_or_get(account.merkle_context.merkle_tree)?;
        input_token_data_with_context.push(InputTokenDataWithContext {
            amount: account.token.amount,
            delegate_index: None,
            merkle_context: PackedMerkleContext {
                merkle_tree_pubkey_index,
                nullifier_queue_pubkey_index: 0,
                leaf_index: account.merkle_context.leaf_index,
                prove_by_index: root_index.is_none() || account.merkle_context.prove_by_index,
            },
            root_index: root_index.unwrap_or_default(),
            lamports: (account.lamports > 0).then_some(account.lamports),
            tlv: None,
        });
    }
    for (account, packed) in inputs
        .input_accounts
        .iter()
        .zip(input_token_data_with_context.iter_mut())
    {
        packed.merkle_context.nullifier_queue_pubkey_index =
            remaining_accounts.insert_or_get(account.merkle_context.queue)?;
    }
    // The delegate is part of the token data hash and has to be passed along.
    for (account, packed) in inputs
        .input_accounts
        .iter()
        .zip(input_token_data_with_context.iter_mut())
    {
        packed.delegate_index = account
            .token
            .delegate
            .map(|delegate| remaining_accounts.insert_or_get_read_only(delegate))
            .transpose()?;
    }

    let output_compressed_accounts = inputs
        .outputs
        .iter()
        .map(|output| {
            Ok(PackedTokenTransferOutputData {
                owner: output.owner,
                amount: output.amount,
                lamports: None,
                merkle_tree_index: remaining_accounts.insert_or_get(output.merkle_tree)?,
                tlv: None,
            })
        })
        .collect::<Result<Vec<_>, InstructionError>>()?;

    let input_lamports = inputs
        .input_accounts
        .iter()
        .try_fold(0u64, |sum, account| sum.checked_add(account.lamports))
        .ok_or(InstructionError::ArithmeticOverflow)?;
    let lamports_change_account_merkle_tree_index = if input_lamports > 0 {
        let change_tree = inputs
            .outputs
            .first()
            .map(|output| output.merkle_tree)
            .unwrap_or(inputs.input_accounts[0].merkle_context.merkle_tree);
        Some(remaining_accounts.insert_or_get(change_tree)?)
    } else {
        None
    };

    let instruction_data = CompressedTokenInstructionDataTransfer {
        proof: inputs.proof,
        mint: inputs.mint,
        delegated_transfer: None,
        input_token_data_with_context,
        output_compressed_accounts,
        is_compress: inputs
            .compression
            .map(|compression| compression.is_compress())
            .unwrap_or(false),
        compress_or_decompress_amount: inputs.compression.map(|compression| compression.amount()),
        cpi_context: None,
        lamports_change_account_merkle_tree_index,
    };
    Ok((remaining_accounts, instruction_data))
}

/// inputs + compressed amount == outputs + decompressed amount
fn sum_check(inputs: &CreateTransferInstructionInputs<'_>) -> Result<(), InstructionError> {
    let mut sum = inputs
        .input_accounts
        .iter()
        .try_fold(0u64, |sum, account| sum.checked_add(account.token.amount))
        .ok_or(InstructionError::ArithmeticOverflow)?;
    match inputs.compression {
        Some(SplCompression::Compress { amount, .. }) => {
            sum = sum
                .checked_add(amount)
                .ok_or(InstructionError::ArithmeticOverflow)?;
        }
        Some(SplCompression::Decompress { amount, .. }) => {
            sum = sum
                .checked_sub(amount)
                .ok_or(InstructionError::SumCheckFailed)?;
        }
        None => {}
    }
    for output in inputs.outputs {
        sum = sum
            .checked_sub(output.amount)
            .ok_or(InstructionError::SumCheckFailed)?;
    }
    if sum == 0 {
        Ok(())
    } else {
        Err(InstructionError::SumCheckFailed)
    }
}

#[cfg(test)]
mod tests {
    use borsh::BorshDeserialize;

    use super::*;
    use crate::indexer::{AccountState, MerkleContext, TokenData};

    fn token_account(
        owner: Pubkey,
        mint: Pubkey,
        tree: Pubkey,
        queue: Pubkey,
        amount: u64,
    ) -> CompressedTokenAccount {
        CompressedTokenAccount {
            hash: [amount as u8; 32],
            lamports: 0,
            merkle_context: MerkleContext {
                merkle_tree: tree,
                queue,
                leaf_index: amount as u32,
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

    fn decode(ix: &Instruction) -> CompressedTokenInstructionDataTransfer {
        assert_eq!(&ix.data[..8], &TRANSFER_DISCRIMINATOR);
        CompressedTokenInstructionDataTransfer::try_from_slice(&ix.data[12..]).unwrap()
    }

    #[test]
    fn test_compress_instruction_has_no_inputs() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let tree = Pubkey::new_unique();
        let source = Pubkey::new_unique();
        let outputs = [TokenTransferOutput {
            owner,
            amount: 500,
            merkle_tree: tree,
        }];
        let ix = create_transfer_instruction(CreateTransferInstructionInputs {
            fee_payer: owner,
            authority: owner,
            mint,
            input_accounts: &[],
            root_indices: &[],
            proof: None,
            outputs: &outputs,
            compression: Some(SplCompression::Compress {
                amount: 500,
                token_account: source,
                token_program: spl_token::ID,
            }),
        })
        .unwrap();

        assert_eq!(ix.program_id, COMPRESSED_TOKEN_PROGRAM_ID);
        assert_eq!(ix.accounts[9].pubkey, get_token_pool_pda(&mint));
        assert_eq!(ix.accounts[10].pubkey, source);
        assert_eq!(ix.accounts[11].pubkey, spl_token::ID);
        assert_eq!(ix.accounts[13].pubkey, tree);
        let data = decode(&ix);
        assert!(data.is_compress);
        assert_eq!(data.compress_or_decompress_amount, Some(500));
        assert!(data.input_token_data_with_context.is_empty());
        assert_eq!(data.output_compressed_accounts[0].merkle_tree_index, 0);
        assert_eq!(data.lamports_change_account_merkle_tree_index, None);
    }

    #[test]
    fn test_transfer_packs_trees_then_queues_then_outputs() {
        let owner = Pubkey::new_unique();
        let recipient = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let tree = Pubkey::new_unique();
        let queue = Pubkey::new_unique();
        let inputs = [
            token_account(owner, mint, tree, queue, 70),
            token_account(owner, mint, tree, queue, 40),
        ];
        let outputs = [
            TokenTransferOutput {
                owner: recipient,
                amount: 100,
                merkle_tree: tree,
            },
            TokenTransferOutput {
                owner,
                amount: 10,
                merkle_tree: tree,
            },
        ];
        let ix = create_transfer_instruction(CreateTransferInstructionInputs {
            fee_payer: owner,
            authority: owner,
            mint,
            input_accounts: &inputs,
            root_indices: &[Some(3), Some(4)],
            proof: Some(CompressedProof::default()),
            outputs: &outputs,
            compression: None,
        })
        .unwrap();

        // token pool, token account and token program are unset
        for meta in &ix.accounts[9..12] {
            assert_eq!(meta.pubkey, COMPRESSED_TOKEN_PROGRAM_ID);
            assert!(!meta.is_writable);
        }
        assert_eq!(ix.accounts.len(), 13 + 2);
        assert_eq!(ix.accounts[13].pubkey, tree);
        assert_eq!(ix.accounts[14].pubkey, queue);

        let data = decode(&ix);
        assert!(!data.is_compress);
        assert_eq!(data.compress_or_decompress_amount, None);
        assert_eq!(data.input_token_data_with_context.len(), 2);
        let first = &data.input_token_data_with_context[0];
        assert_eq!(first.amount, 70);
        assert_eq!(first.root_index, 3);
        assert_eq!(first.merkle_context.merkle_tree_pubkey_index, 0);
        assert_eq!(first.merkle_context.nullifier_queue_pubkey_index, 1);
        assert!(!first.merkle_context.prove_by_index);
        assert_eq!(data.output_compressed_accounts[0].owner, recipient);
        assert_eq!(data.output_compressed_accounts[1].amount, 10);
    }

    #[test]
    fn test_decompress_with_lamports_sets_change_index() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let tree = Pubkey::new_unique();
        let queue = Pubkey::new_unique();
        let delegate = Pubkey::new_unique();
        let mut input = token_account(owner, mint, tree, queue, 100);
        input.lamports = 5_000;
        input.token.delegate = Some(delegate);
        let ix = create_transfer_instruction(CreateTransferInstructionInputs {
            fee_payer: owner,
            authority: owner,
            mint,
            input_accounts: &[input],
            root_indices: &[None],
            proof: None,
            outputs: &[],
            compression: Some(SplCompression::Decompress {
                amount: 100,
                token_account: Pubkey::new_unique(),
                token_program: spl_token::ID,
            }),
        })
        .unwrap();

        let data = decode(&ix);
        let input = &data.input_token_data_with_context[0];
        assert!(input.merkle_context.prove_by_index);
        assert_eq!(input.lamports, Some(5_000));
        assert_eq!(input.delegate_index, Some(2));
        assert_eq!(data.lamports_change_account_merkle_tree_index, Some(0));
        assert_eq!(ix.accounts[13 + 2].pubkey, delegate);
        assert!(!ix.accounts[13 + 2].is_writable);
    }

    #[test]
    fn test_unbalanced_transfer_fails() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let tree = Pubkey::new_unique();
        let inputs = [token_account(owner, mint, tree, tree, 10)];
        let outputs = [TokenTransferOutput {
            owner,
            amount: 11,
            merkle_tree: tree,
        }];
        let result = create_transfer_instruction(CreateTransferInstructionInputs {
            fee_payer: owner,
            authority: owner,
            mint,
            input_accounts: &inputs,
            root_indices: &[Some(0)],
            proof: None,
            outputs: &outputs,
            compression: None,
        });
        assert!(matches!(result, Err(InstructionError::SumCheckFailed)));
    }

    #[test]
    fn test_foreign_input_fails_signer_check() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let tree = Pubkey::new_unique();
        let inputs = [token_account(Pubkey::new_unique(), mint, tree, tree, 10)];
        let outputs = [TokenTransferOutput {
            owner,
            amount: 10,
            merkle_tree: tree,
        }];
        let result = create_transfer_instruction(CreateTransferInstructionInputs {
            fee_payer: owner,
            authority: owner,
            mint,
            input_accounts: &inputs,
            root_indices: &[Some(0)],
            proof: None,
            outputs: &outputs,
            compression: None,
        });
        assert!(matches!(
            result,
            Err(InstructionError::SignerCheckFailed { .. })
        ));
    }
}

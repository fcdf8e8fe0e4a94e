use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

use super::{
    data::{
        anchor_instruction_data, CompressedAccount, InstructionDataInvoke,
        OutputCompressedAccountWithPackedContext,
    },
    InstructionError, PackedAccounts,
};
use crate::{
    constants::{
        ACCOUNT_COMPRESSION_PROGRAM_ID, INVOKE_DISCRIMINATOR, LIGHT_SYSTEM_PROGRAM_ID,
        NOOP_PROGRAM_ID, REGISTERED_PROGRAM_PDA,
    },
    pda::{get_account_compression_authority, get_sol_pool_pda},
};

/// Builds a light system program `invoke` that moves `lamports` from
/// `fee_payer` into the sol pool and creates one compressed account owned by
/// `recipient` in `output_merkle_tree`.
pub fn create_compress_sol_instruction(
    fee_payer: &Pubkey,
    recipient: &Pubkey,
    lamports: u64,
    output_merkle_tree: &Pubkey,
) -> Result<Instruction, InstructionError> {
    if lamports == 0 {
        return Err(InstructionError::ZeroAmount);
    }
    let mut remaining_accounts = PackedAccounts::new();
    let merkle_tree_index = remaining_accounts.insert_or_get(*output_merkle_tree)?;

    let inputs = InstructionDataInvoke {
        proof: None,
        input_compressed_accounts_with_merkle_context: Vec::new(),
        output_compressed_accounts: vec![OutputCompressedAccountWithPackedContext {
            compressed_account: CompressedAccount {
                owner: *recipient,
                lamports,
                address: None,
                data: None,
            },
            merkle_tree_index,
        }],
        relay_fee: None,
        new_address_params: Vec::new(),
        compress_or_decompress_lamports: Some(lamports),
        is_compress: true,
    };
    let data = anchor_instruction_data(INVOKE_DISCRIMINATOR, &inputs)?;

    let accounts = vec![
        AccountMeta::new(*fee_payer, true),
        AccountMeta::new_readonly(*fee_payer, true),
        AccountMeta::new_readonly(REGISTERED_PROGRAM_PDA, false),
        AccountMeta::new_readonly(NOOP_PROGRAM_ID, false),
        AccountMeta::new_readonly(get_account_compression_authority(), false),
        AccountMeta::new_readonly(ACCOUNT_COMPRESSION_PROGRAM_ID, false),
        AccountMeta::new(get_sol_pool_pda(), false),
        // decompression_recipient is unset
        AccountMeta::new_readonly(LIGHT_SYSTEM_PROGRAM_ID, false),
        AccountMeta::new_readonly(system_program::ID, false),
    ];

    Ok(Instruction {
        program_id: LIGHT_SYSTEM_PROGRAM_ID,
        accounts: [accounts, remaining_accounts.to_account_metas()].concat(),
        data,
    })
}

#[cfg(test)]
mod tests {
    use borsh::BorshDeserialize;

    use super::*;

    #[test]
    fn test_compress_sol_instruction() {
        let payer = Pubkey::new_unique();
        let recipient = Pubkey::new_unique();
        let tree = Pubkey::new_unique();
        let ix = create_compress_sol_instruction(&payer, &recipient, 100_000, &tree).unwrap();

        assert_eq!(ix.program_id, LIGHT_SYSTEM_PROGRAM_ID);
        assert_eq!(ix.accounts.len(), 10);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[6].pubkey, get_sol_pool_pda());
        assert!(ix.accounts[6].is_writable);
        assert_eq!(ix.accounts[9].pubkey, tree);
        assert_eq!(&ix.data[..8], &INVOKE_DISCRIMINATOR);

        // Skip the u32 length prefix of the `inputs: Vec<u8>` argument.
        let len = u32::from_le_bytes(ix.data[8..12].try_into().unwrap()) as usize;
        assert_eq!(len, ix.data.len() - 12);
        let inputs = InstructionDataInvoke::try_from_slice(&ix.data[12..]).unwrap();
        assert!(inputs.is_compress);
        assert_eq!(inputs.compress_or_decompress_lamports, Some(100_000));
        assert_eq!(inputs.output_compressed_accounts.len(), 1);
        let output = &inputs.output_compressed_accounts[0];
        assert_eq!(output.compressed_account.owner, recipient);
        assert_eq!(output.compressed_account.lamports, 100_000);
        assert_eq!(output.merkle_tree_index, 0);
    }

    #[test]
    fn test_compress_zero_lamports_fails() {
        let key = Pubkey::new_unique();
        assert!(matches!(
            create_compress_sol_instruction(&key, &key, 0, &key),
            Err(InstructionError::ZeroAmount)
        ));
    }
}

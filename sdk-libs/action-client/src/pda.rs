use solana_sdk::pubkey::Pubkey;

use crate::constants::{
    ACCOUNT_COMPRESSION_PROGRAM_ID, COMPRESSED_TOKEN_PROGRAM_ID, CPI_AUTHORITY_PDA_SEED,
    LIGHT_SYSTEM_PROGRAM_ID, POOL_SEED, SOL_POOL_PDA_SEED,
};

/// Signer pda the compressed token program uses to cpi into the light system
/// program.
pub fn get_cpi_authority_pda() -> Pubkey {
    Pubkey::find_program_address(&[CPI_AUTHORITY_PDA_SEED], &COMPRESSED_TOKEN_PROGRAM_ID).0
}

/// Signer pda the light system program uses to cpi into the account
/// compression program.
pub fn get_account_compression_authority() -> Pubkey {
    Pubkey::find_program_address(&[CPI_AUTHORITY_PDA_SEED], &LIGHT_SYSTEM_PROGRAM_ID).0
}

pub fn get_registered_program_pda(program_id: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[program_id.as_ref()], &ACCOUNT_COMPRESSION_PROGRAM_ID).0
}

pub fn get_sol_pool_pda() -> Pubkey {
    Pubkey::find_program_address(&[SOL_POOL_PDA_SEED], &LIGHT_SYSTEM_PROGRAM_ID).0
}

/// Spl token account holding the decompressed supply of `mint`.
pub fn get_token_pool_pda(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[POOL_SEED, mint.as_ref()], &COMPRESSED_TOKEN_PROGRAM_ID).0
}

pub fn get_associated_token_address(
    owner: &Pubkey,
    mint: &Pubkey,
    token_program: &Pubkey,
) -> Pubkey {
    spl_associated_token_account::get_associated_token_address_with_program_id(
        owner,
        mint,
        token_program,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::REGISTERED_PROGRAM_PDA;

    #[test]
    fn test_registered_program_pda_matches_constant() {
        assert_eq!(
            get_registered_program_pda(&LIGHT_SYSTEM_PROGRAM_ID),
            REGISTERED_PROGRAM_PDA
        );
    }

    #[test]
    fn test_token_pool_pda_is_per_mint() {
        let mint_a = Pubkey::new_unique();
        let mint_b = Pubkey::new_unique();
        assert_ne!(get_token_pool_pda(&mint_a), get_token_pool_pda(&mint_b));
        assert_eq!(get_token_pool_pda(&mint_a), get_token_pool_pda(&mint_a));
    }
}

use solana_sdk::{pubkey, pubkey::Pubkey};

pub const LIGHT_SYSTEM_PROGRAM_ID: Pubkey = pubkey!("SySTEM1eSU2p4BGQfQpimFEWWSC1XDFeun3Nqzz3rT7");
pub const COMPRESSED_TOKEN_PROGRAM_ID: Pubkey =
    pubkey!("cTokenmWW8bLPjZEBAUgYy3zKxQZW6VKi7bqNFEVv3m");
pub const ACCOUNT_COMPRESSION_PROGRAM_ID: Pubkey =
    pubkey!("compr6CUsB5m2jS4Y3831ztGSTnDpnKJTKS95d64XVq");
pub const NOOP_PROGRAM_ID: Pubkey = pubkey!("noopb9bkMVfRPU8AsbpTUg8AQkHtKwMYZiFUjNRtMmV");
pub const TOKEN_2022_PROGRAM_ID: Pubkey = pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");

/// Registered program pda of the light system program in the account
/// compression program.
pub const REGISTERED_PROGRAM_PDA: Pubkey = pubkey!("35hkDgaAKwMCaxRz2ocSZ6NaUrtKkyNqU6c4RV3tYJRh");

/// Default v1 state tree and its nullifier queue.
pub const DEFAULT_STATE_MERKLE_TREE: Pubkey =
    pubkey!("smt1NamzXdq4AMqS2fS2F1i5KTYPZRhoHgWx38d8WsT");
pub const DEFAULT_NULLIFIER_QUEUE: Pubkey = pubkey!("nfq1NvQDJ2GEgnS8zt9prAe8rjjpAW1zFkrvZoBR148");

pub const USDC_MINT: Pubkey = pubkey!("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");

pub const CPI_AUTHORITY_PDA_SEED: &[u8] = b"cpi_authority";
pub const SOL_POOL_PDA_SEED: &[u8] = b"sol_pool_pda";
pub const POOL_SEED: &[u8] = b"pool";

/// Anchor discriminator of `light_system_program::invoke`.
pub const INVOKE_DISCRIMINATOR: [u8; 8] = [26, 16, 169, 7, 21, 202, 242, 25];
/// Anchor discriminator of `light_compressed_token::transfer`.
pub const TRANSFER_DISCRIMINATOR: [u8; 8] = [163, 52, 200, 231, 140, 3, 69, 186];

pub const LAMPORTS_DECIMALS: u8 = 9;

/// The compressed token program accepts at most this many inputs per
/// transfer when a validity proof is used.
pub const MAX_INPUT_ACCOUNTS: usize = 4;

pub const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 1_000_000;

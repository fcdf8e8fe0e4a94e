//! Builds unsigned ZK Compression transactions: compress SOL, compress and
//! decompress spl tokens and transfer compressed tokens.

pub mod amount;
pub mod constants;
pub mod indexer;
pub mod instruction;
pub mod pda;
pub mod rpc;
pub mod selection;
pub mod transaction;

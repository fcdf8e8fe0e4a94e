use std::{net::SocketAddr, str::FromStr};

use light_action_client::{
    constants::{
        DEFAULT_COMPUTE_UNIT_LIMIT, DEFAULT_NULLIFIER_QUEUE, DEFAULT_STATE_MERKLE_TREE,
        MAX_INPUT_ACCOUNTS, USDC_MINT,
    },
    indexer::{RetryConfig, StateTreeInfo},
};
use solana_sdk::pubkey::Pubkey;

use crate::{cli::StartArgs, errors::ConfigError};

pub const MAINNET_BLOCKCHAIN_ID: &str = "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp";
pub const DEFAULT_ICON_URL: &str = "https://i.ibb.co/Gp235BN/zk-compression.jpg/880x864";

#[derive(Debug, Clone)]
pub struct ExternalServicesConfig {
    pub rpc_url: String,
    pub indexer_url: String,
    pub photon_api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ActionsConfig {
    pub external_services: ExternalServicesConfig,
    pub port: u16,
    pub allow_public_bind: bool,
    pub blockchain_id: String,
    pub icon_url: String,
    pub cu_limit: u32,
    pub max_input_accounts: usize,
    /// Tree that receives newly compressed accounts.
    pub output_state_tree: StateTreeInfo,
    pub default_mint: Pubkey,
    pub default_mint_symbol: String,
    pub indexer_retry_config: RetryConfig,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            external_services: ExternalServicesConfig {
                rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
                indexer_url: "https://api.mainnet-beta.solana.com".to_string(),
                photon_api_key: None,
            },
            port: 3000,
            allow_public_bind: false,
            blockchain_id: MAINNET_BLOCKCHAIN_ID.to_string(),
            icon_url: DEFAULT_ICON_URL.to_string(),
            cu_limit: DEFAULT_COMPUTE_UNIT_LIMIT,
            max_input_accounts: MAX_INPUT_ACCOUNTS,
            output_state_tree: StateTreeInfo::new(
                DEFAULT_STATE_MERKLE_TREE,
                DEFAULT_NULLIFIER_QUEUE,
            ),
            default_mint: USDC_MINT,
            default_mint_symbol: "USDC".to_string(),
            indexer_retry_config: RetryConfig::default(),
        }
    }
}

impl ActionsConfig {
    pub fn new_for_start(args: &StartArgs) -> Result<Self, ConfigError> {
        if args.max_input_accounts == 0 || args.max_input_accounts > MAX_INPUT_ACCOUNTS {
            return Err(ConfigError::InvalidValue {
                field: "max_input_accounts",
                error: format!("must be between 1 and {}", MAX_INPUT_ACCOUNTS),
            });
        }
        if args.cu_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cu_limit",
                error: "must be greater than zero".to_string(),
            });
        }

        let output_state_tree = match (&args.state_merkle_tree, &args.nullifier_queue) {
            (None, None) => StateTreeInfo::new(DEFAULT_STATE_MERKLE_TREE, DEFAULT_NULLIFIER_QUEUE),
            (Some(tree), Some(queue)) => StateTreeInfo::new(
                parse_pubkey("state_merkle_tree", tree)?,
                parse_pubkey("nullifier_queue", queue)?,
            ),
            (Some(_), None) => {
                return Err(ConfigError::MissingField {
                    field: "nullifier_queue",
                })
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingField {
                    field: "state_merkle_tree",
                })
            }
        };

        let default_mint = args
            .default_mint
            .as_deref()
            .map(|mint| parse_pubkey("default_mint", mint))
            .transpose()?
            .unwrap_or(USDC_MINT);

        Ok(Self {
            external_services: ExternalServicesConfig {
                rpc_url: args.rpc_url.clone(),
                indexer_url: args.indexer_url(),
                photon_api_key: args.photon_api_key.clone(),
            },
            port: args.port,
            allow_public_bind: args.allow_public_bind,
            blockchain_id: args.blockchain_id.clone(),
            icon_url: args.icon_url.clone(),
            cu_limit: args.cu_limit,
            max_input_accounts: args.max_input_accounts,
            output_state_tree,
            default_mint,
            default_mint_symbol: args.default_mint_symbol.clone(),
            indexer_retry_config: RetryConfig {
                num_retries: args.indexer_max_retries,
                delay_ms: args.indexer_retry_delay_ms,
                ..RetryConfig::default()
            },
        })
    }

    pub fn bind_address(&self) -> SocketAddr {
        if self.allow_public_bind {
            SocketAddr::from(([0, 0, 0, 0], self.port))
        } else {
            SocketAddr::from(([127, 0, 0, 1], self.port))
        }
    }

    /// Display symbol of `mint`. Only the default mint has a known symbol.
    pub fn symbol(&self, mint: &Pubkey) -> &str {
        if *mint == self.default_mint {
            &self.default_mint_symbol
        } else {
            "Token"
        }
    }
}

pub fn parse_pubkey(field: &'static str, value: &str) -> Result<Pubkey, ConfigError> {
    Pubkey::from_str(value).map_err(|e| ConfigError::InvalidPubkey {
        field,
        error: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Commands};

    fn start_args(args: &[&str]) -> StartArgs {
        let cli = Cli::try_parse_from(["actions-server", "start"].iter().chain(args)).unwrap();
        match cli.command {
            Commands::Start(args) => args,
            _ => panic!("expected start"),
        }
    }

    #[test]
    fn test_defaults() {
        let config = ActionsConfig::new_for_start(&start_args(&["--rpc-url", "http://rpc:8899"])).unwrap();
        assert_eq!(config.external_services.indexer_url, "http://rpc:8899");
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_address(), SocketAddr::from(([127, 0, 0, 1], 3000)));
        assert_eq!(config.cu_limit, 1_000_000);
        assert_eq!(config.max_input_accounts, 4);
        assert_eq!(config.output_state_tree.tree, DEFAULT_STATE_MERKLE_TREE);
        assert_eq!(config.symbol(&USDC_MINT), "USDC");
        assert_eq!(config.symbol(&Pubkey::new_unique()), "Token");
    }

    #[test]
    fn test_custom_tree_requires_queue() {
        let tree = Pubkey::new_unique().to_string();
        let err = ActionsConfig::new_for_start(&start_args(&["--state-merkle-tree", &tree]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                field: "nullifier_queue"
            }
        ));

        let err = ActionsConfig::new_for_start(&start_args(&["--default-mint", "not-a-key"]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidPubkey {
                field: "default_mint",
                ..
            }
        ));
    }

    #[test]
    fn test_public_bind_and_input_limit() {
        let config =
            ActionsConfig::new_for_start(&start_args(&["--allow-public-bind", "--port", "8080"]))
                .unwrap();
        assert_eq!(config.bind_address(), SocketAddr::from(([0, 0, 0, 0], 8080)));

        assert!(matches!(
            ActionsConfig::new_for_start(&start_args(&["--max-input-accounts", "5"])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}

use clap::{Parser, Subcommand};

use crate::telemetry::{LogFormat, TelemetryConfig};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory for hourly rotated log files. Logs go to stdout only when unset.
    #[arg(long, global = true, env = "ACTIONS_LOG_DIR")]
    pub log_dir: Option<String>,

    #[arg(
        long,
        global = true,
        env = "ACTIONS_LOG_FORMAT",
        value_enum,
        default_value = "text"
    )]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            log_dir: self.log_dir.clone(),
            format: self.log_format,
        }
    }
}

#[allow(clippy::large_enum_variant)]
#[derive(Subcommand)]
pub enum Commands {
    /// Serve the actions over http.
    Start(StartArgs),
    /// Print the compressed token balances of an owner.
    Balances(BalancesArgs),
}

#[derive(Parser, Clone, Debug)]
pub struct StartArgs {
    #[arg(
        long,
        env = "ACTIONS_RPC_URL",
        default_value = "https://api.mainnet-beta.solana.com"
    )]
    pub rpc_url: String,

    /// Photon indexer url, defaults to the rpc url.
    #[arg(long, env = "ACTIONS_INDEXER_URL")]
    pub indexer_url: Option<String>,

    #[arg(long, env = "ACTIONS_PHOTON_API_KEY")]
    pub photon_api_key: Option<String>,

    #[arg(long, env = "ACTIONS_PORT", default_value = "3000")]
    pub port: u16,

    /// Bind to 0.0.0.0 instead of 127.0.0.1.
    #[arg(long, env = "ACTIONS_ALLOW_PUBLIC_BIND", default_value = "false")]
    pub allow_public_bind: bool,

    /// CAIP-2 chain id returned in the X-Blockchain-Ids header.
    #[arg(
        long,
        env = "ACTIONS_BLOCKCHAIN_ID",
        default_value = "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp"
    )]
    pub blockchain_id: String,

    #[arg(long, env = "ACTIONS_CU_LIMIT", default_value = "1000000")]
    pub cu_limit: u32,

    #[arg(long, env = "ACTIONS_MAX_INPUT_ACCOUNTS", default_value = "4")]
    pub max_input_accounts: usize,

    #[arg(long, env = "ACTIONS_STATE_MERKLE_TREE")]
    pub state_merkle_tree: Option<String>,

    #[arg(long, env = "ACTIONS_NULLIFIER_QUEUE")]
    pub nullifier_queue: Option<String>,

    #[arg(long, env = "ACTIONS_DEFAULT_MINT")]
    pub default_mint: Option<String>,

    #[arg(long, env = "ACTIONS_DEFAULT_MINT_SYMBOL", default_value = "USDC")]
    pub default_mint_symbol: String,

    #[arg(
        long,
        env = "ACTIONS_ICON_URL",
        default_value = "https://i.ibb.co/Gp235BN/zk-compression.jpg/880x864"
    )]
    pub icon_url: String,

    #[arg(long, env = "ACTIONS_INDEXER_MAX_RETRIES", default_value = "10")]
    pub indexer_max_retries: u32,

    #[arg(long, env = "ACTIONS_INDEXER_RETRY_DELAY_MS", default_value = "400")]
    pub indexer_retry_delay_ms: u64,
}

#[derive(Parser, Clone, Debug)]
pub struct BalancesArgs {
    #[arg(
        long,
        env = "ACTIONS_RPC_URL",
        default_value = "https://api.mainnet-beta.solana.com"
    )]
    pub rpc_url: String,

    #[arg(long, env = "ACTIONS_INDEXER_URL")]
    pub indexer_url: Option<String>,

    #[arg(long, env = "ACTIONS_PHOTON_API_KEY")]
    pub photon_api_key: Option<String>,

    #[arg(long)]
    pub owner: String,

    #[arg(long)]
    pub mint: Option<String>,
}

impl StartArgs {
    pub fn indexer_url(&self) -> String {
        self.indexer_url
            .clone()
            .unwrap_or_else(|| self.rpc_url.clone())
    }
}

impl BalancesArgs {
    pub fn indexer_url(&self) -> String {
        self.indexer_url
            .clone()
            .unwrap_or_else(|| self.rpc_url.clone())
    }
}

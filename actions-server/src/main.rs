use std::str::FromStr;

use clap::Parser;
use light_actions_server::{
    api_server::run_server,
    build_state,
    cli::{BalancesArgs, Cli, Commands},
    config::{parse_pubkey, ActionsConfig, ExternalServicesConfig},
    telemetry::setup_telemetry,
};
use solana_sdk::pubkey::Pubkey;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_telemetry(&cli.telemetry_config());

    match cli.command {
        Commands::Start(args) => {
            let config = ActionsConfig::new_for_start(&args)?;
            let state = build_state(config);
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Failed to listen for ctrl-c: {}", e);
                    std::future::pending::<()>().await;
                }
                info!("Received ctrl-c, shutting down");
            };
            run_server(state, shutdown).await?;
        }
        Commands::Balances(args) => print_balances(&args).await?,
    }
    Ok(())
}

async fn print_balances(args: &BalancesArgs) -> anyhow::Result<()> {
    let owner = Pubkey::from_str(&args.owner)
        .map_err(|e| anyhow::anyhow!("Invalid owner {}: {}", args.owner, e))?;
    let mint = args
        .mint
        .as_deref()
        .map(|mint| parse_pubkey("mint", mint))
        .transpose()?;
    let state = build_state(ActionsConfig {
        external_services: ExternalServicesConfig {
            rpc_url: args.rpc_url.clone(),
            indexer_url: args.indexer_url(),
            photon_api_key: args.photon_api_key.clone(),
        },
        ..ActionsConfig::default()
    });
    let tokens = state.service.get_compressed_tokens(&owner, mint).await?;
    println!("{}", serde_json::to_string_pretty(&tokens)?);
    Ok(())
}

pub mod actions;
pub mod api_server;
pub mod cli;
pub mod compression;
pub mod config;
pub mod errors;
pub mod telemetry;

use std::sync::Arc;

use light_action_client::{indexer::PhotonIndexer, rpc::SolanaRpc};
use tracing::info;

use crate::{
    actions::ActionState,
    compression::{CompressionService, ServiceSettings},
    config::ActionsConfig,
};

/// Connects the service to the configured Photon indexer and Solana rpc.
pub fn build_state(config: ActionsConfig) -> ActionState {
    let services = &config.external_services;
    info!(
        "Using rpc {} and indexer {}",
        services.rpc_url, services.indexer_url
    );
    let indexer = PhotonIndexer::new(services.indexer_url.clone(), services.photon_api_key.clone())
        .with_state_trees([config.output_state_tree]);
    let rpc = SolanaRpc::new(&services.rpc_url);
    let service = CompressionService::new(
        Arc::new(indexer),
        Arc::new(rpc),
        ServiceSettings::from(&config),
    );
    ActionState {
        config: Arc::new(config),
        service: Arc::new(service),
    }
}

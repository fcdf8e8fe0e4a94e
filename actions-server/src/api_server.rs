use std::{convert::Infallible, future::Future, net::SocketAddr, str::FromStr};

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use tracing::{info, warn};
use warp::{
    http::{
        header::{HeaderMap, HeaderName, HeaderValue},
        Method, StatusCode,
    },
    reply::{self, Reply, Response},
    Filter, Rejection,
};

use crate::{
    actions::{
        compress_sol, compress_spl_token, decompress_spl_token, into_reply,
        query::{self, Query},
        transfer_compressed_token, ActionState, ActionsJson,
    },
    compression::CompressedTokens,
    errors::{ActionError, ErrorResponse},
};

pub const ACTION_VERSION: &str = "2.4";

/// Largest accepted POST body.
const MAX_BODY_BYTES: u64 = 16 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Headers every action response carries, including errors and preflights.
pub fn action_headers(blockchain_id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let static_headers = [
        ("access-control-allow-origin", "*"),
        ("access-control-allow-methods", "GET,POST,PUT,OPTIONS"),
        (
            "access-control-allow-headers",
            "Content-Type, Authorization, Content-Encoding, Accept-Encoding, X-Accept-Action-Version, X-Accept-Blockchain-Ids",
        ),
        (
            "access-control-expose-headers",
            "X-Action-Version, X-Blockchain-Ids",
        ),
        ("x-action-version", ACTION_VERSION),
    ];
    for (name, value) in static_headers {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    match HeaderValue::from_str(blockchain_id) {
        Ok(value) => {
            headers.insert(HeaderName::from_static("x-blockchain-ids"), value);
        }
        Err(e) => warn!("Invalid blockchain id {:?}: {}", blockchain_id, e),
    }
    headers
}

fn with_state(
    state: ActionState,
) -> impl Filter<Extract = (ActionState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn with_query() -> impl Filter<Extract = (Query,), Error = Rejection> + Clone {
    warp::query::<Query>()
}

fn with_body() -> impl Filter<Extract = (warp::hyper::body::Bytes,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::bytes())
}

async fn compressed_tokens(
    owner: String,
    query: Query,
    state: ActionState,
) -> Result<Response, Infallible> {
    into_reply(get_compressed_tokens(&owner, &query, &state).await)
}

async fn get_compressed_tokens(
    owner: &str,
    query: &Query,
    state: &ActionState,
) -> Result<CompressedTokens, ActionError> {
    let owner = Pubkey::from_str(owner).map_err(|_| ActionError::InvalidPathParameter("owner"))?;
    let mint = query::optional_pubkey(query, "mint")?;
    state.service.get_compressed_tokens(&owner, mint).await
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large")
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Content-Length required")
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "Invalid query string")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        warn!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };
    Ok(reply::with_status(
        reply::json(&ErrorResponse {
            message: message.to_string(),
        }),
        status,
    )
    .into_response())
}

pub fn routes(
    state: ActionState,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let headers = action_headers(&state.config.blockchain_id);

    // Other methods reject as not found, keeping 404 for unknown paths.
    let preflight = warp::method().and_then(|method: Method| async move {
        if method == Method::OPTIONS {
            Ok(warp::reply().into_response())
        } else {
            Err(warp::reject::not_found())
        }
    });

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| {
            reply::json(&HealthResponse {
                status: "ok".to_string(),
            })
            .into_response()
        });

    let actions_json = warp::path("actions.json")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| reply::json(&ActionsJson::default()).into_response());

    let compress_sol = warp::path!("api" / "actions" / "compress-sol").and(
        warp::get()
            .and(with_query())
            .and(with_state(state.clone()))
            .and_then(compress_sol::get)
            .or(warp::post()
                .and(with_query())
                .and(with_body())
                .and(with_state(state.clone()))
                .and_then(compress_sol::post))
            .unify(),
    );

    let compress_spl_token = warp::path!("api" / "actions" / "compress-spl-token").and(
        warp::get()
            .and(with_query())
            .and(with_state(state.clone()))
            .and_then(compress_spl_token::get)
            .or(warp::post()
                .and(with_query())
                .and(with_body())
                .and(with_state(state.clone()))
                .and_then(compress_spl_token::post))
            .unify(),
    );

    let decompress_spl_token = warp::path!("api" / "actions" / "decompress-spl-token").and(
        warp::get()
            .and(with_query())
            .and(with_state(state.clone()))
            .and_then(decompress_spl_token::get)
            .or(warp::post()
                .and(with_query())
                .and(with_body())
                .and(with_state(state.clone()))
                .and_then(decompress_spl_token::post))
            .unify(),
    );

    let transfer_compressed_token =
        warp::path!("api" / "actions" / "transfer-compressed-token").and(
            warp::get()
                .and(with_query())
                .and(with_state(state.clone()))
                .and_then(transfer_compressed_token::get)
                .or(warp::post()
                    .and(with_query())
                    .and(with_body())
                    .and(with_state(state.clone()))
                    .and_then(transfer_compressed_token::post))
                .unify(),
        );

    let compressed_tokens = warp::path!("api" / "compressed-tokens" / String)
        .and(warp::get())
        .and(with_query())
        .and(with_state(state))
        .and_then(compressed_tokens);

    preflight
        .or(health)
        .unify()
        .or(actions_json)
        .unify()
        .or(compress_sol)
        .unify()
        .or(compress_spl_token)
        .unify()
        .or(decompress_spl_token)
        .unify()
        .or(transfer_compressed_token)
        .unify()
        .or(compressed_tokens)
        .unify()
        .recover(handle_rejection)
        .with(warp::reply::with::headers(headers))
}

/// Serves the actions on the configured address until `shutdown` resolves.
pub async fn run_server(
    state: ActionState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<SocketAddr, warp::Error> {
    let addr = state.config.bind_address();
    if state.config.allow_public_bind {
        warn!(
            "Actions server binding to 0.0.0.0:{} - all endpoints will be publicly accessible",
            state.config.port
        );
    }
    let (addr, server) =
        warp::serve(routes(state)).try_bind_with_graceful_shutdown(addr, async move {
            shutdown.await;
            info!("Actions server received shutdown signal");
        })?;
    info!("Starting HTTP actions server on {}", addr);
    server.await;
    info!("Actions server shut down gracefully");
    Ok(addr)
}

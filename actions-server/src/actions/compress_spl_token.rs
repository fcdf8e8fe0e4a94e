use std::convert::Infallible;

use solana_sdk::pubkey::Pubkey;
use warp::{hyper::body::Bytes, reply::Response};

use super::{
    action_href, decompress_spl_token, into_reply, parse_account,
    query::{self, Query},
    transfer_compressed_token, ActionGetResponse, ActionLinks, ActionMetadata, ActionParameter,
    ActionPostResponse, ActionState, LinkedAction,
};
use crate::{config::ActionsConfig, errors::ActionError};

pub const ACTION: &str = "compress-spl-token";
const PRESET_AMOUNTS: [&str; 3] = ["0.0001", "0.0002", "0.0005"];

pub async fn get(query: Query, state: ActionState) -> Result<Response, Infallible> {
    into_reply(get_action(&query, &state.config))
}

pub async fn post(query: Query, body: Bytes, state: ActionState) -> Result<Response, Infallible> {
    into_reply(post_action(&query, &body, &state).await)
}

fn mint_or_default(query: &Query, config: &ActionsConfig) -> Result<Pubkey, ActionError> {
    Ok(query::optional_pubkey(query, "mint")?.unwrap_or(config.default_mint))
}

pub fn get_action(query: &Query, config: &ActionsConfig) -> Result<ActionGetResponse, ActionError> {
    let mint = mint_or_default(query, config)?;
    let to = query::optional_pubkey(query, "to")?;
    let symbol = config.symbol(&mint);

    let mut base_params = vec![("mint", mint.to_string())];
    if let Some(to) = to {
        base_params.push(("to", to.to_string()));
    }
    let href = |amount: &str| {
        let mut params = base_params.clone();
        params.push(("amount", amount.to_string()));
        action_href(ACTION, &params)
    };

    let mut actions = PRESET_AMOUNTS
        .iter()
        .copied()
        .map(|amount| {
            LinkedAction::transaction(format!("Compress {} {}", amount, symbol), href(amount))
        })
        .collect::<Vec<_>>();
    actions.push(
        LinkedAction::transaction("Compress Custom Amount", href("{amount}")).with_parameters(
            vec![ActionParameter::new(
                "amount",
                format!("Enter the amount of {} to compress", symbol),
                true,
            )],
        ),
    );

    Ok(ActionGetResponse::Action(ActionMetadata {
        icon: config.icon_url.clone(),
        title: format!("Compress {}", symbol),
        description: format!("Compress {} to save your rent fees.", symbol),
        label: format!("Compress {}", symbol),
        disabled: None,
        links: Some(ActionLinks { actions }),
    }))
}

pub async fn post_action(
    query: &Query,
    body: &Bytes,
    state: &ActionState,
) -> Result<ActionPostResponse, ActionError> {
    let config = &state.config;
    let mint = mint_or_default(query, config)?;
    let to = query::optional_pubkey(query, "to")?;
    let amount = query::amount_or_default(query, "amount")?;
    let account = parse_account(body)?;
    let recipient = to.unwrap_or(account);

    let mint_info = state.service.get_mint(&mint).await?;
    let units = query::to_base_units(&amount, mint_info.decimals, "amount")?;
    let transaction = state
        .service
        .build_compress_spl_token_tx(&account, &recipient, &mint, units, &mint_info)
        .await?;

    let symbol = config.symbol(&mint);
    let message = format!("Compressed {} {} for {}", amount, symbol, recipient);
    ActionPostResponse::new(&transaction, message, Some(next_action(config, &mint)))
}

/// Offered once tokens are compressed: move them on or take them back out.
pub fn next_action(config: &ActionsConfig, mint: &Pubkey) -> ActionGetResponse {
    let symbol = config.symbol(mint);
    ActionGetResponse::Action(ActionMetadata {
        icon: config.icon_url.clone(),
        title: format!("Compressed {}", symbol),
        description: format!(
            "Your {} is compressed. Transfer it or decompress it back to an spl token account.",
            symbol
        ),
        label: "Next".to_string(),
        disabled: None,
        links: Some(ActionLinks {
            actions: vec![
                transfer_compressed_token::linked_action(mint, symbol),
                decompress_spl_token::linked_action(mint, symbol),
            ],
        }),
    })
}

#[cfg(test)]
mod tests {
    use light_action_client::constants::USDC_MINT;

    use super::*;

    #[test]
    fn test_get_action_defaults_to_usdc() {
        let ActionGetResponse::Action(metadata) =
            get_action(&Query::new(), &ActionsConfig::default()).unwrap()
        else {
            panic!("expected action");
        };
        assert_eq!(metadata.title, "Compress USDC");
        let actions = metadata.links.unwrap().actions;
        assert_eq!(actions[2].label, "Compress 0.0005 USDC");
        assert_eq!(
            actions[2].href,
            format!("/api/actions/compress-spl-token?mint={}&amount=0.0005", USDC_MINT)
        );
    }

    #[test]
    fn test_get_action_for_other_mint() {
        let mint = Pubkey::new_unique();
        let query = Query::from([("mint".to_string(), mint.to_string())]);
        let ActionGetResponse::Action(metadata) =
            get_action(&query, &ActionsConfig::default()).unwrap()
        else {
            panic!("expected action");
        };
        assert_eq!(metadata.title, "Compress Token");
    }

    #[test]
    fn test_next_action_links() {
        let ActionGetResponse::Action(metadata) =
            next_action(&ActionsConfig::default(), &USDC_MINT)
        else {
            panic!("expected action");
        };
        let actions = metadata.links.unwrap().actions;
        assert_eq!(actions.len(), 2);
        assert!(actions[0]
            .href
            .starts_with("/api/actions/transfer-compressed-token?"));
        assert!(actions[1].href.starts_with("/api/actions/decompress-spl-token?"));
    }
}

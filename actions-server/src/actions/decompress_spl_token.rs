use std::convert::Infallible;

use light_action_client::amount::format_ui_amount;
use solana_sdk::pubkey::Pubkey;
use warp::{hyper::body::Bytes, reply::Response};

use super::{
    action_href, into_reply, parse_account,
    query::{self, Query},
    ActionGetResponse, ActionLinks, ActionMetadata, ActionParameter, ActionPostResponse,
    ActionState, LinkedAction,
};
use crate::{config::ActionsConfig, errors::ActionError};

pub const ACTION: &str = "decompress-spl-token";

pub async fn get(query: Query, state: ActionState) -> Result<Response, Infallible> {
    into_reply(get_action(&query, &state.config))
}

pub async fn post(query: Query, body: Bytes, state: ActionState) -> Result<Response, Infallible> {
    into_reply(post_action(&query, &body, &state).await)
}

/// Button of another action's chain. An empty amount decompresses as much as
/// one transaction carries.
pub fn linked_action(mint: &Pubkey, symbol: &str) -> LinkedAction {
    LinkedAction::transaction(
        format!("Decompress {}", symbol),
        action_href(
            ACTION,
            &[("mint", mint.to_string()), ("amount", "{amount}".to_string())],
        ),
    )
    .with_parameters(vec![ActionParameter::new(
        "amount",
        format!("Amount of {} to decompress, empty for all", symbol),
        false,
    )])
}

fn decompress_all(mint: &Pubkey, label: String) -> LinkedAction {
    LinkedAction::transaction(label, action_href(ACTION, &[("mint", mint.to_string())]))
}

pub fn get_action(query: &Query, config: &ActionsConfig) -> Result<ActionGetResponse, ActionError> {
    let mint = query::optional_pubkey(query, "mint")?.unwrap_or(config.default_mint);
    let symbol = config.symbol(&mint);

    let custom = LinkedAction::transaction(
        "Decompress Custom Amount",
        action_href(
            ACTION,
            &[("mint", mint.to_string()), ("amount", "{amount}".to_string())],
        ),
    )
    .with_parameters(vec![ActionParameter::new(
        "amount",
        format!("Enter the amount of {} to decompress", symbol),
        true,
    )]);

    Ok(ActionGetResponse::Action(ActionMetadata {
        icon: config.icon_url.clone(),
        title: format!("Decompress {}", symbol),
        description: format!(
            "Decompress compressed {} back to your associated token account.",
            symbol
        ),
        label: format!("Decompress {}", symbol),
        disabled: None,
        links: Some(ActionLinks {
            actions: vec![decompress_all(&mint, "Decompress All".to_string()), custom],
        }),
    }))
}

pub async fn post_action(
    query: &Query,
    body: &Bytes,
    state: &ActionState,
) -> Result<ActionPostResponse, ActionError> {
    let config = &state.config;
    let mint = query::optional_pubkey(query, "mint")?.unwrap_or(config.default_mint);
    let amount = query::optional_amount(query, "amount")?;
    let account = parse_account(body)?;

    let mint_info = state.service.get_mint(&mint).await?;
    let units = amount
        .as_ref()
        .map(|amount| query::to_base_units(amount, mint_info.decimals, "amount"))
        .transpose()?;
    let result = state
        .service
        .build_decompress_spl_token_tx(&account, &mint, units, &mint_info)
        .await?;

    let symbol = config.symbol(&mint);
    let message = format!(
        "Decompressed {} {} for {}",
        format_ui_amount(result.amount, result.decimals),
        symbol,
        account
    );
    let next = if result.remaining > 0 {
        let remaining = format_ui_amount(result.remaining, result.decimals);
        ActionGetResponse::Action(ActionMetadata {
            icon: config.icon_url.clone(),
            title: format!("Decompress remaining {}", symbol),
            description: format!("{} compressed {} remaining.", remaining, symbol),
            label: "Decompress remaining".to_string(),
            disabled: None,
            links: Some(ActionLinks {
                actions: vec![decompress_all(
                    &mint,
                    format!("Decompress remaining {} {}", remaining, symbol),
                )],
            }),
        })
    } else {
        ActionGetResponse::Completed(ActionMetadata {
            icon: config.icon_url.clone(),
            title: format!("{} decompressed", symbol),
            description: message.clone(),
            label: "Decompressed".to_string(),
            disabled: None,
            links: None,
        })
    };
    ActionPostResponse::new(&result.transaction, message, Some(next))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_action() {
        let mint = Pubkey::new_unique();
        let query = Query::from([("mint".to_string(), mint.to_string())]);
        let ActionGetResponse::Action(metadata) =
            get_action(&query, &ActionsConfig::default()).unwrap()
        else {
            panic!("expected action");
        };
        let actions = metadata.links.unwrap().actions;
        assert_eq!(
            actions[0].href,
            format!("/api/actions/decompress-spl-token?mint={}", mint)
        );
        assert_eq!(
            actions[1].href,
            format!("/api/actions/decompress-spl-token?mint={}&amount={{amount}}", mint)
        );
    }

    #[test]
    fn test_linked_action_amount_is_optional() {
        let action = linked_action(&Pubkey::new_unique(), "USDC");
        assert_eq!(action.label, "Decompress USDC");
        assert_eq!(action.parameters.unwrap()[0].required, Some(false));
    }
}

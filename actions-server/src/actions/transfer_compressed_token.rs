use std::convert::Infallible;

use solana_sdk::pubkey::Pubkey;
use warp::{hyper::body::Bytes, reply::Response};

use super::{
    action_href, into_reply, parse_account,
    query::{self, Query},
    ActionGetResponse, ActionLinks, ActionMetadata, ActionParameter, ActionPostResponse,
    ActionState, LinkedAction,
};
use crate::{config::ActionsConfig, errors::ActionError};

pub const ACTION: &str = "transfer-compressed-token";

pub async fn get(query: Query, state: ActionState) -> Result<Response, Infallible> {
    into_reply(get_action(&query, &state.config))
}

pub async fn post(query: Query, body: Bytes, state: ActionState) -> Result<Response, Infallible> {
    into_reply(post_action(&query, &body, &state).await)
}

pub fn linked_action(mint: &Pubkey, symbol: &str) -> LinkedAction {
    LinkedAction::transaction(
        format!("Transfer compressed {}", symbol),
        action_href(
            ACTION,
            &[
                ("mint", mint.to_string()),
                ("to", "{to}".to_string()),
                ("amount", "{amount}".to_string()),
            ],
        ),
    )
    .with_parameters(vec![
        ActionParameter::new("to", "Recipient address", true),
        ActionParameter::new("amount", format!("Amount of {} to send", symbol), true),
    ])
}

pub fn get_action(query: &Query, config: &ActionsConfig) -> Result<ActionGetResponse, ActionError> {
    let mint = query::optional_pubkey(query, "mint")?.unwrap_or(config.default_mint);
    let symbol = config.symbol(&mint);
    Ok(ActionGetResponse::Action(ActionMetadata {
        icon: config.icon_url.clone(),
        title: format!("Transfer compressed {}", symbol),
        description: format!("Send compressed {} to any address.", symbol),
        label: "Transfer".to_string(),
        disabled: None,
        links: Some(ActionLinks {
            actions: vec![linked_action(&mint, symbol)],
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
    let to = query::required_pubkey(query, "to")?;
    let amount = query::required_amount(query, "amount")?;
    let account = parse_account(body)?;

    let mint_info = state.service.get_mint(&mint).await?;
    let units = query::to_base_units(&amount, mint_info.decimals, "amount")?;
    let transaction = state
        .service
        .build_transfer_compressed_token_tx(&account, &to, &mint, units)
        .await?;

    let symbol = config.symbol(&mint);
    let message = format!("Transferred {} compressed {} to {}", amount, symbol, to);
    let next = ActionGetResponse::Completed(ActionMetadata {
        icon: config.icon_url.clone(),
        title: format!("Compressed {} sent", symbol),
        description: message.clone(),
        label: "Sent".to_string(),
        disabled: None,
        links: None,
    });
    ActionPostResponse::new(&transaction, message, Some(next))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linked_action_requires_recipient_and_amount() {
        let mint = Pubkey::new_unique();
        let action = linked_action(&mint, "Token");
        assert_eq!(
            action.href,
            format!(
                "/api/actions/transfer-compressed-token?mint={}&to={{to}}&amount={{amount}}",
                mint
            )
        );
        let parameters = action.parameters.unwrap();
        assert!(parameters.iter().all(|p| p.required == Some(true)));
    }
}

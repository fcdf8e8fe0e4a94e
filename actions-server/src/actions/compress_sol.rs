use std::convert::Infallible;

use light_action_client::constants::LAMPORTS_DECIMALS;
use warp::{hyper::body::Bytes, reply::Response};

use super::{
    action_href, into_reply, parse_account,
    query::{self, Query},
    ActionGetResponse, ActionMetadata, ActionLinks, ActionParameter, ActionPostResponse,
    ActionState, LinkedAction,
};
use crate::{config::ActionsConfig, errors::ActionError};

pub const ACTION: &str = "compress-sol";
const PRESET_AMOUNTS: [&str; 3] = ["0.0001", "0.0002", "0.0005"];

pub async fn get(query: Query, state: ActionState) -> Result<Response, Infallible> {
    into_reply(get_action(&query, &state.config))
}

pub async fn post(query: Query, body: Bytes, state: ActionState) -> Result<Response, Infallible> {
    into_reply(post_action(&query, &body, &state).await)
}

pub fn get_action(query: &Query, config: &ActionsConfig) -> Result<ActionGetResponse, ActionError> {
    let to = query::optional_pubkey(query, "to")?;
    let base_params = to
        .map(|to| vec![("to", to.to_string())])
        .unwrap_or_default();
    let href = |amount: &str| {
        let mut params = base_params.clone();
        params.push(("amount", amount.to_string()));
        action_href(ACTION, &params)
    };

    let mut actions = PRESET_AMOUNTS
        .iter()
        .copied()
        .map(|amount| LinkedAction::transaction(format!("Compress {} SOL", amount), href(amount)))
        .collect::<Vec<_>>();
    actions.push(
        LinkedAction::transaction("Compress Custom Amount", href("{amount}")).with_parameters(
            vec![ActionParameter::new(
                "amount",
                "Enter the amount of SOL to compress",
                true,
            )],
        ),
    );

    Ok(ActionGetResponse::Action(ActionMetadata {
        icon: config.icon_url.clone(),
        title: "Compress SOL".to_string(),
        description: "Compress SOL to save your rent fees.".to_string(),
        label: "Compress SOL".to_string(),
        disabled: None,
        links: Some(ActionLinks { actions }),
    }))
}

pub async fn post_action(
    query: &Query,
    body: &Bytes,
    state: &ActionState,
) -> Result<ActionPostResponse, ActionError> {
    let to = query::optional_pubkey(query, "to")?;
    let amount = query::amount_or_default(query, "amount")?;
    let lamports = query::to_base_units(&amount, LAMPORTS_DECIMALS, "amount")?;
    let account = parse_account(body)?;
    let recipient = to.unwrap_or(account);

    let transaction = state
        .service
        .build_compress_sol_tx(&account, &recipient, lamports)
        .await?;
    let message = format!("Compressed {} SOL for {}", amount, recipient);
    let next = ActionGetResponse::Completed(ActionMetadata {
        icon: state.config.icon_url.clone(),
        title: "SOL compressed".to_string(),
        description: message.clone(),
        label: "Compressed".to_string(),
        disabled: None,
        links: None,
    });
    ActionPostResponse::new(&transaction, message, Some(next))
}

#[cfg(test)]
mod tests {
    use solana_sdk::pubkey::Pubkey;

    use super::*;

    #[test]
    fn test_get_action_links() {
        let to = Pubkey::new_unique();
        let query = Query::from([("to".to_string(), to.to_string())]);
        let ActionGetResponse::Action(metadata) =
            get_action(&query, &ActionsConfig::default()).unwrap()
        else {
            panic!("expected action");
        };
        let actions = metadata.links.unwrap().actions;
        assert_eq!(actions.len(), 4);
        assert_eq!(
            actions[0].href,
            format!("/api/actions/compress-sol?to={}&amount=0.0001", to)
        );
        assert_eq!(actions[0].label, "Compress 0.0001 SOL");
        assert_eq!(
            actions[3].href,
            format!("/api/actions/compress-sol?to={}&amount={{amount}}", to)
        );
        assert_eq!(actions[3].parameters.as_ref().unwrap()[0].name, "amount");
    }

    #[test]
    fn test_get_action_without_recipient() {
        let ActionGetResponse::Action(metadata) =
            get_action(&Query::new(), &ActionsConfig::default()).unwrap()
        else {
            panic!("expected action");
        };
        assert_eq!(
            metadata.links.unwrap().actions[1].href,
            "/api/actions/compress-sol?amount=0.0002"
        );
    }

    #[test]
    fn test_get_action_rejects_invalid_recipient() {
        let query = Query::from([("to".to_string(), "invalid".to_string())]);
        assert!(matches!(
            get_action(&query, &ActionsConfig::default()),
            Err(ActionError::InvalidQueryParameter("to"))
        ));
    }
}

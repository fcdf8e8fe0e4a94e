//! Solana Actions wire types and the handlers of each action.

use std::{convert::Infallible, str::FromStr, sync::Arc};

use light_action_client::transaction::serialize_transaction_base64;
use serde::{Deserialize, Serialize};
use solana_sdk::{pubkey::Pubkey, transaction::Transaction};
use warp::{
    http::StatusCode,
    hyper::body::Bytes,
    reply::{self, Reply, Response},
};

use crate::{compression::CompressionService, config::ActionsConfig, errors::ActionError};

pub mod compress_sol;
pub mod compress_spl_token;
pub mod decompress_spl_token;
pub mod query;
pub mod transfer_compressed_token;

pub const ACTIONS_PATH: &str = "/api/actions";

/// Shared by every handler.
#[derive(Clone)]
pub struct ActionState {
    pub config: Arc<ActionsConfig>,
    pub service: Arc<CompressionService>,
}

/// Metadata shown by a wallet for an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMetadata {
    pub icon: String,
    pub title: String,
    pub description: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<ActionLinks>,
}

/// Body of a GET, also embedded as the next action of a POST.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActionGetResponse {
    Action(ActionMetadata),
    /// Terminal state of a chain, wallets render it without buttons.
    Completed(ActionMetadata),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionLinks {
    pub actions: Vec<LinkedAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkedActionType {
    Transaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedAction {
    #[serde(rename = "type")]
    pub kind: LinkedActionType,
    pub label: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<ActionParameter>>,
}

impl LinkedAction {
    pub fn transaction(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            kind: LinkedActionType::Transaction,
            label: label.into(),
            href: href.into(),
            parameters: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<ActionParameter>) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionParameter {
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

impl ActionParameter {
    pub fn new(name: &str, label: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            label: label.into(),
            required: Some(required),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPostRequest {
    pub account: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostResponseType {
    Transaction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPostResponse {
    #[serde(rename = "type")]
    pub kind: PostResponseType,
    /// Base64 encoded unsigned transaction.
    pub transaction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<PostResponseLinks>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostResponseLinks {
    pub next: NextActionLink,
}

/// The action a wallet shows after the transaction is confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NextActionLink {
    Inline { action: ActionGetResponse },
}

impl ActionPostResponse {
    pub fn new(
        transaction: &Transaction,
        message: String,
        next: Option<ActionGetResponse>,
    ) -> Result<Self, ActionError> {
        Ok(Self {
            kind: PostResponseType::Transaction,
            transaction: serialize_transaction_base64(transaction)?,
            message: Some(message),
            links: next.map(|action| PostResponseLinks {
                next: NextActionLink::Inline { action },
            }),
        })
    }
}

/// Body of `/actions.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionsJson {
    pub rules: Vec<ActionRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRule {
    pub path_pattern: String,
    pub api_path: String,
}

impl Default for ActionsJson {
    fn default() -> Self {
        let pattern = format!("{}/**", ACTIONS_PATH);
        Self {
            rules: vec![ActionRule {
                path_pattern: pattern.clone(),
                api_path: pattern,
            }],
        }
    }
}

pub fn action_href(action: &str, params: &[(&str, String)]) -> String {
    let mut href = format!("{}/{}", ACTIONS_PATH, action);
    for (i, (name, value)) in params.iter().enumerate() {
        href.push(if i == 0 { '?' } else { '&' });
        href.push_str(name);
        href.push('=');
        href.push_str(value);
    }
    href
}

/// Reads the signer from a POST body.
pub fn parse_account(body: &Bytes) -> Result<Pubkey, ActionError> {
    let request: ActionPostRequest =
        serde_json::from_slice(body).map_err(|_| ActionError::InvalidAccount)?;
    Pubkey::from_str(request.account.trim()).map_err(|_| ActionError::InvalidAccount)
}

pub fn json_response<T: Serialize>(value: &T) -> Response {
    reply::with_status(reply::json(value), StatusCode::OK).into_response()
}

/// Turns a handler result into a reply, errors become json error bodies.
pub fn into_reply<T: Serialize>(result: Result<T, ActionError>) -> Result<Response, Infallible> {
    Ok(match result {
        Ok(value) => json_response(&value),
        Err(e) => e.into_response(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn metadata() -> ActionMetadata {
        ActionMetadata {
            icon: "icon".to_string(),
            title: "title".to_string(),
            description: "description".to_string(),
            label: "label".to_string(),
            disabled: None,
            links: None,
        }
    }

    #[test]
    fn test_next_action_serialization() {
        let links = PostResponseLinks {
            next: NextActionLink::Inline {
                action: ActionGetResponse::Completed(metadata()),
            },
        };
        assert_eq!(
            serde_json::to_value(&links).unwrap(),
            json!({
                "next": {
                    "type": "inline",
                    "action": {
                        "type": "completed",
                        "icon": "icon",
                        "title": "title",
                        "description": "description",
                        "label": "label",
                    }
                }
            })
        );
    }

    #[test]
    fn test_linked_action_serialization() {
        let href = action_href("x", &[("amount", "{amount}".to_string())]);
        let action = LinkedAction::transaction("Send", href)
            .with_parameters(vec![ActionParameter::new("amount", "Amount", true)]);
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({
                "type": "transaction",
                "label": "Send",
                "href": "/api/actions/x?amount={amount}",
                "parameters": [{ "name": "amount", "label": "Amount", "required": true }],
            })
        );
    }

    #[test]
    fn test_parse_account() {
        let key = Pubkey::new_unique();
        let body = Bytes::from(format!(r#"{{"account":"{}"}}"#, key));
        assert_eq!(parse_account(&body).unwrap(), key);
        for body in [r#"{"account":"nope"}"#, "{}", "not json", ""] {
            assert!(matches!(
                parse_account(&Bytes::from(body)),
                Err(ActionError::InvalidAccount)
            ));
        }
    }

    #[test]
    fn test_actions_json() {
        assert_eq!(
            serde_json::to_value(ActionsJson::default()).unwrap(),
            json!({
                "rules": [{ "pathPattern": "/api/actions/**", "apiPath": "/api/actions/**" }]
            })
        );
    }
}

//! Validation of action query parameters. Empty values count as absent.

use std::{collections::HashMap, str::FromStr};

use light_action_client::amount::UiAmount;
use solana_sdk::pubkey::Pubkey;

use crate::errors::ActionError;

pub type Query = HashMap<String, String>;

pub const DEFAULT_UI_AMOUNT: &str = "0.001";

fn value<'a>(query: &'a Query, name: &str) -> Option<&'a str> {
    query
        .get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

pub fn optional_pubkey(query: &Query, name: &'static str) -> Result<Option<Pubkey>, ActionError> {
    value(query, name)
        .map(|value| {
            Pubkey::from_str(value).map_err(|_| ActionError::InvalidQueryParameter(name))
        })
        .transpose()
}

pub fn required_pubkey(query: &Query, name: &'static str) -> Result<Pubkey, ActionError> {
    optional_pubkey(query, name)?.ok_or(ActionError::InvalidQueryParameter(name))
}

/// A positive decimal amount. Zero and malformed values are rejected.
pub fn optional_amount(query: &Query, name: &'static str) -> Result<Option<UiAmount>, ActionError> {
    value(query, name)
        .map(|value| match UiAmount::from_str(value) {
            Ok(amount) if !amount.is_zero() => Ok(amount),
            _ => Err(ActionError::InvalidQueryParameter(name)),
        })
        .transpose()
}

pub fn amount_or_default(query: &Query, name: &'static str) -> Result<UiAmount, ActionError> {
    match optional_amount(query, name)? {
        Some(amount) => Ok(amount),
        None => UiAmount::from_str(DEFAULT_UI_AMOUNT)
            .map_err(|_| ActionError::InvalidQueryParameter(name)),
    }
}

pub fn required_amount(query: &Query, name: &'static str) -> Result<UiAmount, ActionError> {
    optional_amount(query, name)?.ok_or(ActionError::InvalidQueryParameter(name))
}

/// Converts a validated amount to base units of a token with `decimals`.
pub fn to_base_units(
    amount: &UiAmount,
    decimals: u8,
    name: &'static str,
) -> Result<u64, ActionError> {
    match amount.to_base_units(decimals) {
        Ok(units) if units > 0 => Ok(units),
        _ => Err(ActionError::InvalidQueryParameter(name)),
    }
}

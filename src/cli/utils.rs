//! Shared CLI utilities.

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Malformed parameter '{0}': expected key=value")]
    MalformedParam(String),

    #[error("The '{0}' action requires a script name")]
    MissingScript(&'static str),
}

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

/// Parse `key=value` tokens, splitting on the first `=`. Later keys win.
pub fn parse_params(tokens: &[String]) -> Result<BTreeMap<String, String>, InputError> {
    tokens
        .iter()
        .map(|token| match token.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(InputError::MalformedParam(token.clone())),
        })
        .collect()
}

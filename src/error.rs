//! Error type shared by the stores, the session controller and the wasm boundary.

use std::fmt;

use wasm_bindgen::JsValue;

#[derive(Clone, Debug, PartialEq)]
pub enum GameError {
    /// Configuration JSON could not be parsed or failed validation.
    Config(String),
    /// `fetch` rejected or a JS call threw.
    Network(String),
    /// The remote service answered with a non-success status.
    Status { status: u16, body: String },
    /// A document did not have the expected shape.
    Decode(String),
    AlreadyExists(String),
    Auth(String),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::Config(msg) => write!(f, "invalid configuration: {msg}"),
            GameError::Network(msg) => write!(f, "network error: {msg}"),
            GameError::Status { status, body } => write!(f, "remote returned {status}: {body}"),
            GameError::Decode(msg) => write!(f, "malformed document: {msg}"),
            GameError::AlreadyExists(key) => write!(f, "record '{key}' already exists"),
            GameError::Auth(msg) => write!(f, "sign-in failed: {msg}"),
        }
    }
}

impl std::error::Error for GameError {}

impl From<serde_json::Error> for GameError {
    fn from(err: serde_json::Error) -> Self {
        GameError::Decode(err.to_string())
    }
}

impl From<JsValue> for GameError {
    fn from(value: JsValue) -> Self {
        let msg = value.as_string().unwrap_or_else(|| format!("{value:?}"));
        GameError::Network(msg)
    }
}

impl From<GameError> for JsValue {
    fn from(err: GameError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_status_and_body() {
        let err = GameError::Status { status: 403, body: "denied".into() };
        assert_eq!(err.to_string(), "remote returned 403: denied");
    }

    #[test]
    fn json_errors_become_decode_errors() {
        let err: GameError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, GameError::Decode(_)));
    }
}

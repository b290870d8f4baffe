//! Hosted document store + anonymous auth over the REST APIs.
//!
//! Characters live in one collection keyed by name, scores in another keyed
//! by player name. Requests go through the browser's `fetch`; the ID token
//! returned by anonymous sign-up is attached to every later request.

pub mod codec;

use std::cell::RefCell;

use serde_json::{Value, json};
use tracing::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response, window};

use super::{AuthService, Identity, RosterStore, ScoreStore};
use crate::character::{Character, ScoreRecord};
use crate::config::FirestoreConfig;
use crate::error::GameError;

const FIRESTORE_ROOT: &str = "https://firestore.googleapis.com/v1";
const IDENTITY_ROOT: &str = "https://identitytoolkit.googleapis.com/v1";

pub struct FirestoreBackend {
    config: FirestoreConfig,
    id_token: RefCell<Option<String>>,
}

impl FirestoreBackend {
    pub fn new(config: FirestoreConfig) -> Result<Self, GameError> {
        if config.project_id.is_empty() {
            return Err(GameError::Config("firestore.project_id is required".into()));
        }
        Ok(Self { config, id_token: RefCell::new(None) })
    }

    fn documents_root(&self) -> String {
        documents_root(&self.config.project_id)
    }

    async fn call(&self, method: &str, url: &str, body: Option<&Value>) -> Result<(u16, Value), GameError> {
        let token = self.id_token.borrow().clone();
        send(method, url, body, token.as_deref()).await
    }
}

fn documents_root(project_id: &str) -> String {
    format!("{FIRESTORE_ROOT}/projects/{project_id}/databases/(default)/documents")
}

fn document_url(root: &str, collection: &str, id: &str) -> String {
    format!("{root}/{collection}/{}", encode_component(id))
}

fn encode_component(raw: &str) -> String {
    String::from(js_sys::encode_uri_component(raw))
}

/// Issue one JSON request. Non-2xx statuses are returned, not raised, so
/// callers can branch on 404 / 409.
async fn send(
    method: &str,
    url: &str,
    body: Option<&Value>,
    bearer: Option<&str>,
) -> Result<(u16, Value), GameError> {
    let win = window().ok_or_else(|| GameError::Network("no window".into()))?;

    let init = RequestInit::new();
    init.set_method(method);
    if let Some(body) = body {
        init.set_body(&wasm_bindgen::JsValue::from_str(&body.to_string()));
    }
    let request = Request::new_with_str_and_init(url, &init)?;
    request.headers().set("Content-Type", "application/json")?;
    if let Some(token) = bearer {
        request.headers().set("Authorization", &format!("Bearer {token}"))?;
    }

    debug!(method, url, "fetch");
    let response: Response = JsFuture::from(win.fetch_with_request(&request)).await?.dyn_into()?;
    let status = response.status();
    let text = JsFuture::from(response.text()?).await?.as_string().unwrap_or_default();
    let value = if text.trim().is_empty() { Value::Null } else { serde_json::from_str(&text)? };
    Ok((status, value))
}

fn unexpected(status: u16, body: &Value) -> GameError {
    GameError::Status { status, body: body.to_string() }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

impl RosterStore for FirestoreBackend {
    async fn fetch_all(&self) -> Result<Vec<Character>, GameError> {
        let url = format!("{}/{}", self.documents_root(), self.config.characters_collection);
        let (status, body) = self.call("GET", &url, None).await?;
        if !is_success(status) {
            return Err(unexpected(status, &body));
        }
        codec::list_documents(&body).iter().map(codec::decode_character).collect()
    }

    async fn fetch_one(&self, name: &str) -> Result<Option<Character>, GameError> {
        let url = document_url(&self.documents_root(), &self.config.characters_collection, name);
        match self.call("GET", &url, None).await? {
            (404, _) => Ok(None),
            (status, body) if is_success(status) => codec::decode_character(&body).map(Some),
            (status, body) => Err(unexpected(status, &body)),
        }
    }
}

impl ScoreStore for FirestoreBackend {
    async fn find_score(&self, name: &str) -> Result<Option<ScoreRecord>, GameError> {
        let url = document_url(&self.documents_root(), &self.config.users_collection, name);
        match self.call("GET", &url, None).await? {
            (404, _) => Ok(None),
            (status, body) if is_success(status) => codec::decode_score(&body).map(Some),
            (status, body) => Err(unexpected(status, &body)),
        }
    }

    async fn create_score(&self, record: &ScoreRecord) -> Result<(), GameError> {
        // `documentId` makes the create fail with 409 instead of overwriting.
        let url = format!(
            "{}/{}?documentId={}",
            self.documents_root(),
            self.config.users_collection,
            encode_component(&record.name)
        );
        let body = codec::encode_score(record);
        match self.call("POST", &url, Some(&body)).await? {
            (status, _) if is_success(status) => {
                info!(name = %record.name, score = record.score, "score saved");
                Ok(())
            }
            (409, _) => Err(GameError::AlreadyExists(record.name.clone())),
            (status, body) => Err(unexpected(status, &body)),
        }
    }

    async fn leaders(&self, limit: usize) -> Result<Vec<ScoreRecord>, GameError> {
        let url = format!("{}:runQuery", self.documents_root());
        let query = codec::leaders_query(&self.config.users_collection, limit);
        let (status, body) = self.call("POST", &url, Some(&query)).await?;
        if !is_success(status) {
            return Err(unexpected(status, &body));
        }
        let mut out = Vec::new();
        for doc in codec::query_documents(&body) {
            match codec::decode_score(doc) {
                Ok(record) => out.push(record),
                Err(err) => warn!(%err, "skipping malformed score document"),
            }
        }
        Ok(out)
    }
}

impl AuthService for FirestoreBackend {
    async fn sign_in_anonymously(&self) -> Result<Identity, GameError> {
        let url = format!("{IDENTITY_ROOT}/accounts:signUp?key={}", self.config.api_key);
        let body = json!({ "returnSecureToken": true });
        let (status, body) = send("POST", &url, Some(&body), None).await?;
        if !is_success(status) {
            let reason = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(GameError::Auth(format!("{status}: {reason}")));
        }
        let token = body.get("idToken").and_then(Value::as_str);
        let uid = body.get("localId").and_then(Value::as_str);
        match (token, uid) {
            (Some(token), Some(uid)) => {
                *self.id_token.borrow_mut() = Some(token.to_owned());
                info!(uid, "signed in anonymously");
                Ok(Identity { uid: uid.to_owned() })
            }
            _ => Err(GameError::Auth("sign-up response carried no identity".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_root_targets_default_database() {
        assert_eq!(
            documents_root("dino-hunt"),
            "https://firestore.googleapis.com/v1/projects/dino-hunt/databases/(default)/documents"
        );
    }

    #[test]
    fn missing_project_is_a_config_error() {
        let err = FirestoreBackend::new(FirestoreConfig::default()).err();
        assert!(matches!(err, Some(GameError::Config(_))));
    }

    #[test]
    fn success_range() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(!is_success(404));
        assert!(!is_success(409));
    }
}

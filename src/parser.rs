//! Mapping between request/response shapes and persisted entities.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::store::Entity;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("cannot encode {0}")]
    Blob(&'static str),
}

/// Converts between the API shapes of one entity type and the entity itself.
/// Parsers never touch a store.
pub trait Parser {
    type Entity: Entity;
    type Create: Send;
    type Update: Send;
    type Response: Serialize + Send;

    /// Mints the id and creation timestamp.
    fn to_entity(req: Self::Create) -> Result<Self::Entity, ParseError>;

    fn to_patch(req: Self::Update) -> Result<<Self::Entity as Entity>::Patch, ParseError>;

    fn to_response(entity: Self::Entity) -> Self::Response;
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

/// Trimmed value of a required text field.
pub fn require(field: &'static str, value: String) -> Result<String, ParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ParseError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Like [`require`] for patch fields: absent is fine, blank is not.
pub fn require_opt(field: &'static str, value: Option<String>) -> Result<Option<String>, ParseError> {
    value.map(|v| require(field, v)).transpose()
}

pub fn encode_blob(field: &'static str, value: Option<Value>) -> Result<Option<String>, ParseError> {
    value
        .map(|v| serde_json::to_string(&v).map_err(|_| ParseError::Blob(field)))
        .transpose()
}

/// Decodes a stored blob. Malformed text yields an empty object.
pub fn decode_blob(field: &'static str, raw: Option<String>) -> Option<Value> {
    let raw = raw?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(field, error = %e, "malformed blob, returning empty object");
            Some(Value::Object(Default::default()))
        }
    }
}

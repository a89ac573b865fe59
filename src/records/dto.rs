use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    pub user_id: String,
    pub doctor_id: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    /// Set by the upload flow, never by clients.
    #[serde(skip_deserializing)]
    pub file_path: Option<String>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRecordRequest {
    pub doctor_id: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub metadata: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordQuery {
    pub user_id: Option<String>,
    pub doctor_id: Option<String>,
    pub category: Option<String>,
}

/// A file received through multipart upload.
#[derive(Debug)]
pub struct UploadRequest {
    pub user_id: String,
    pub doctor_id: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub file_name: Option<String>,
    pub content_type: String,
    pub body: Bytes,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub id: String,
    pub user_id: String,
    pub doctor_id: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub file_path: Option<String>,
    pub metadata: Option<Value>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use super::summarize::SummaryMode;

#[derive(Debug, Deserialize)]
pub struct CreateAiResultRequest {
    pub user_id: String,
    pub result: Option<Value>,
    pub explanation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAiResultRequest {
    pub result: Option<Value>,
    pub explanation: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AiResultQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AiResultResponse {
    pub id: String,
    pub user_id: String,
    pub result: Option<Value>,
    pub explanation: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    pub record_id: String,
    #[serde(default)]
    pub mode: SummaryMode,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub record_id: String,
    pub question: String,
}

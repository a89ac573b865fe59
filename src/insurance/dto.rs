use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{Date, OffsetDateTime};

use super::repo_types::{ClaimStatus, PolicyStatus};

#[derive(Debug, Deserialize)]
pub struct CreatePolicyRequest {
    pub patient_id: String,
    pub provider: String,
    pub policy_number: String,
    pub sum_insured: i64,
    pub premium: f64,
    pub coverage: Option<Value>,
    #[serde(default, with = "crate::dates::iso_date")]
    pub valid_till: Option<Date>,
    #[serde(default)]
    pub status: PolicyStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePolicyRequest {
    pub provider: Option<String>,
    pub policy_number: Option<String>,
    pub sum_insured: Option<i64>,
    pub premium: Option<f64>,
    pub coverage: Option<Value>,
    #[serde(default, with = "crate::dates::iso_date")]
    pub valid_till: Option<Date>,
    pub status: Option<PolicyStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PolicyQuery {
    pub patient_id: Option<String>,
    pub status: Option<PolicyStatus>,
}

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub id: String,
    pub patient_id: String,
    pub provider: String,
    pub policy_number: String,
    pub sum_insured: i64,
    pub premium: f64,
    pub coverage: Option<Value>,
    #[serde(with = "crate::dates::iso_date")]
    pub valid_till: Option<Date>,
    pub status: PolicyStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct CreateClaimRequest {
    pub policy_id: String,
    /// Copied from the policy.
    #[serde(skip_deserializing)]
    pub patient_id: String,
    pub amount: f64,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateClaimRequest {
    pub amount: Option<f64>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProcessClaimRequest {
    pub processing: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClaimQuery {
    pub policy_id: Option<String>,
    pub patient_id: Option<String>,
    pub status: Option<ClaimStatus>,
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub id: String,
    pub policy_id: String,
    pub patient_id: String,
    pub amount: f64,
    pub description: Option<String>,
    pub status: ClaimStatus,
    pub processing: Option<Value>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub processed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

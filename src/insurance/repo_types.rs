use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

use crate::{
    store::{AnyStore, Entity, EntityKind, FieldValue, ResourceStore, StoreError, StoreResult},
    validation::check_not_blank,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStatus {
    #[default]
    Active,
    Expired,
    Cancelled,
}

impl PolicyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyStatus::Active => "active",
            PolicyStatus::Expired => "expired",
            PolicyStatus::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<String> for PolicyStatus {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "active" => Ok(PolicyStatus::Active),
            "expired" => Ok(PolicyStatus::Expired),
            "cancelled" => Ok(PolicyStatus::Cancelled),
            other => Err(StoreError::Validation(format!("unknown policy status `{other}`"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    #[default]
    Submitted,
    Processed,
}

impl ClaimStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ClaimStatus::Submitted => "submitted",
            ClaimStatus::Processed => "processed",
        }
    }
}

impl TryFrom<String> for ClaimStatus {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "submitted" => Ok(ClaimStatus::Submitted),
            "processed" => Ok(ClaimStatus::Processed),
            other => Err(StoreError::Validation(format!("unknown claim status `{other}`"))),
        }
    }
}

/// `coverage` is a JSON blob stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct InsurancePolicy {
    pub id: String,
    pub patient_id: String,
    pub provider: String,
    pub policy_number: String,
    pub sum_insured: i64,
    pub premium: f64,
    pub coverage: Option<String>,
    pub valid_till: Option<Date>,
    #[sqlx(try_from = "String")]
    pub status: PolicyStatus,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct PolicyPatch {
    pub provider: Option<String>,
    pub policy_number: Option<String>,
    pub sum_insured: Option<i64>,
    pub premium: Option<f64>,
    pub coverage: Option<String>,
    pub valid_till: Option<Date>,
    pub status: Option<PolicyStatus>,
}

pub fn check_amounts(sum_insured: Option<i64>, premium: Option<f64>) -> StoreResult<()> {
    if matches!(sum_insured, Some(s) if s < 0) {
        return Err(StoreError::Validation("sum_insured must not be negative".into()));
    }
    if matches!(premium, Some(p) if !(p >= 0.0 && p.is_finite())) {
        return Err(StoreError::Validation("premium must not be negative".into()));
    }
    Ok(())
}

impl Entity for InsurancePolicy {
    type Patch = PolicyPatch;

    const KIND: EntityKind = EntityKind::InsurancePolicy;
    const TABLE: &'static str = "insurance_policies";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "patient_id",
        "provider",
        "policy_number",
        "sum_insured",
        "premium",
        "coverage",
        "valid_till",
        "status",
        "created_at",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.clone().into(),
            self.patient_id.clone().into(),
            self.provider.clone().into(),
            self.policy_number.clone().into(),
            self.sum_insured.into(),
            self.premium.into(),
            self.coverage.clone().into(),
            self.valid_till.into(),
            self.status.as_str().into(),
            self.created_at.into(),
        ]
    }

    fn apply(&mut self, patch: PolicyPatch) -> StoreResult<()> {
        check_amounts(patch.sum_insured, patch.premium)?;
        if let Some(provider) = patch.provider {
            check_not_blank("provider", &provider)?;
            self.provider = provider;
        }
        if let Some(number) = patch.policy_number {
            check_not_blank("policy_number", &number)?;
            self.policy_number = number;
        }
        if let Some(sum) = patch.sum_insured {
            self.sum_insured = sum;
        }
        if let Some(premium) = patch.premium {
            self.premium = premium;
        }
        if patch.coverage.is_some() {
            self.coverage = patch.coverage;
        }
        if patch.valid_till.is_some() {
            self.valid_till = patch.valid_till;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        Ok(())
    }

    fn into_any(store: Arc<dyn ResourceStore<Self>>) -> AnyStore {
        AnyStore::InsurancePolicies(store)
    }

    fn from_any(store: &AnyStore) -> Option<Arc<dyn ResourceStore<Self>>> {
        match store {
            AnyStore::InsurancePolicies(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// `patient_id` is copied from the policy; `processing` is a JSON blob.
#[derive(Debug, Clone, FromRow)]
pub struct InsuranceClaim {
    pub id: String,
    pub policy_id: String,
    pub patient_id: String,
    pub amount: f64,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ClaimStatus,
    pub processing: Option<String>,
    pub processed_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct ClaimPatch {
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub status: Option<ClaimStatus>,
    pub processing: Option<String>,
    pub processed_at: Option<OffsetDateTime>,
}

pub fn check_claim_amount(amount: f64) -> StoreResult<()> {
    if amount > 0.0 && amount.is_finite() {
        Ok(())
    } else {
        Err(StoreError::Validation("amount must be positive".into()))
    }
}

impl Entity for InsuranceClaim {
    type Patch = ClaimPatch;

    const KIND: EntityKind = EntityKind::InsuranceClaim;
    const TABLE: &'static str = "insurance_claims";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "policy_id",
        "patient_id",
        "amount",
        "description",
        "status",
        "processing",
        "processed_at",
        "created_at",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.clone().into(),
            self.policy_id.clone().into(),
            self.patient_id.clone().into(),
            self.amount.into(),
            self.description.clone().into(),
            self.status.as_str().into(),
            self.processing.clone().into(),
            self.processed_at.into(),
            self.created_at.into(),
        ]
    }

    fn apply(&mut self, patch: ClaimPatch) -> StoreResult<()> {
        if let Some(next) = patch.status {
            if self.status == ClaimStatus::Processed && next != ClaimStatus::Processed {
                return Err(StoreError::Validation(
                    "a processed claim cannot be reopened".into(),
                ));
            }
        }
        if let Some(amount) = patch.amount {
            check_claim_amount(amount)?;
            self.amount = amount;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if patch.processing.is_some() {
            self.processing = patch.processing;
        }
        if patch.processed_at.is_some() {
            self.processed_at = patch.processed_at;
        }
        Ok(())
    }

    fn into_any(store: Arc<dyn ResourceStore<Self>>) -> AnyStore {
        AnyStore::InsuranceClaims(store)
    }

    fn from_any(store: &AnyStore) -> Option<Arc<dyn ResourceStore<Self>>> {
        match store {
            AnyStore::InsuranceClaims(s) => Some(s.clone()),
            _ => None,
        }
    }
}

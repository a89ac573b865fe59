use std::{fmt, str::FromStr, sync::Arc};

use sqlx::{postgres::PgRow, FromRow};
use time::{Date, OffsetDateTime};

use super::{AnyStore, ResourceStore, StoreError, StoreResult};

/// Tag naming one persisted entity type (and its table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Doctor,
    Record,
    Appointment,
    InsurancePolicy,
    InsuranceClaim,
    Notification,
    AiResult,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::User,
        EntityKind::Doctor,
        EntityKind::Record,
        EntityKind::Appointment,
        EntityKind::InsurancePolicy,
        EntityKind::InsuranceClaim,
        EntityKind::Notification,
        EntityKind::AiResult,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Doctor => "doctors",
            EntityKind::Record => "records",
            EntityKind::Appointment => "appointments",
            EntityKind::InsurancePolicy => "insurance_policies",
            EntityKind::InsuranceClaim => "insurance_claims",
            EntityKind::Notification => "notifications",
            EntityKind::AiResult => "ai_results",
        }
    }

    /// Human readable name used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::User => "User",
            EntityKind::Doctor => "Doctor",
            EntityKind::Record => "Record",
            EntityKind::Appointment => "Appointment",
            EntityKind::InsurancePolicy => "Insurance policy",
            EntityKind::InsuranceClaim => "Insurance claim",
            EntityKind::Notification => "Notification",
            EntityKind::AiResult => "AI result",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for EntityKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| StoreError::UnsupportedEntityType(s.to_string()))
    }
}

/// A single column value, as bound into SQL or compared by the memory backend.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(Option<String>),
    Int(Option<i32>),
    BigInt(Option<i64>),
    Float(Option<f64>),
    Bool(Option<bool>),
    Timestamp(Option<OffsetDateTime>),
    Date(Option<Date>),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        match self {
            FieldValue::Text(v) => v.is_none(),
            FieldValue::Int(v) => v.is_none(),
            FieldValue::BigInt(v) => v.is_none(),
            FieldValue::Float(v) => v.is_none(),
            FieldValue::Bool(v) => v.is_none(),
            FieldValue::Timestamp(v) => v.is_none(),
            FieldValue::Date(v) => v.is_none(),
        }
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(Some(v))
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(Some(v.to_string()))
    }
}

impl From<Option<String>> for FieldValue {
    fn from(v: Option<String>) -> Self {
        FieldValue::Text(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(Some(v))
    }
}

impl From<Option<i32>> for FieldValue {
    fn from(v: Option<i32>) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::BigInt(Some(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(Some(v))
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(Some(v))
    }
}

impl From<OffsetDateTime> for FieldValue {
    fn from(v: OffsetDateTime) -> Self {
        FieldValue::Timestamp(Some(v))
    }
}

impl From<Option<OffsetDateTime>> for FieldValue {
    fn from(v: Option<OffsetDateTime>) -> Self {
        FieldValue::Timestamp(v)
    }
}

impl From<Option<Date>> for FieldValue {
    fn from(v: Option<Date>) -> Self {
        FieldValue::Date(v)
    }
}

/// Attribute-equality filter: every condition must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(&'static str, FieldValue)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<FieldValue>) -> Self {
        self.conditions.push((column, value.into()));
        self
    }

    /// Adds the condition only when a value is present; handy for optional query params.
    pub fn eq_opt<V: Into<FieldValue>>(self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    pub fn conditions(&self) -> &[(&'static str, FieldValue)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn check_columns<E: Entity>(&self) -> StoreResult<()> {
        match self
            .conditions
            .iter()
            .find(|(column, _)| !E::COLUMNS.contains(column))
        {
            Some((column, _)) => Err(StoreError::Validation(format!(
                "{} cannot be filtered by `{}`",
                E::TABLE,
                column
            ))),
            None => Ok(()),
        }
    }

    pub fn matches<E: Entity>(&self, entity: &E) -> bool {
        self.conditions
            .iter()
            .all(|(column, value)| entity.field(column).as_ref() == Some(value))
    }
}

/// A persisted row type. `COLUMNS[0]` is always `id`.
pub trait Entity: Clone + Send + Sync + Unpin + for<'r> FromRow<'r, PgRow> + 'static {
    type Patch: Send + 'static;

    const KIND: EntityKind;
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Columns whose non-null values must be unique across the table.
    const UNIQUE: &'static [&'static str] = &[];

    fn id(&self) -> &str;

    /// Column values in `COLUMNS` order.
    fn values(&self) -> Vec<FieldValue>;

    /// Applies a partial update, rejecting values that break a field rule.
    fn apply(&mut self, patch: Self::Patch) -> StoreResult<()>;

    fn field(&self, column: &str) -> Option<FieldValue> {
        let idx = Self::COLUMNS.iter().position(|c| *c == column)?;
        self.values().into_iter().nth(idx)
    }

    fn into_any(store: Arc<dyn ResourceStore<Self>>) -> AnyStore;

    fn from_any(store: &AnyStore) -> Option<Arc<dyn ResourceStore<Self>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tags_and_rejects_unknown() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.tag().parse::<EntityKind>().unwrap(), kind);
        }
        let err = "prescriptions".parse::<EntityKind>().unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedEntityType(tag) if tag == "prescriptions"));
    }

    #[test]
    fn eq_opt_skips_missing_values() {
        let filter = Filter::new()
            .eq_opt("user_id", Some("u-1"))
            .eq_opt::<String>("doctor_id", None);
        assert_eq!(filter.conditions().len(), 1);
        assert_eq!(filter.conditions()[0].0, "user_id");
    }
}

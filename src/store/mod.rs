//! Persistence layer: one `ResourceStore` per entity type, opened through a
//! per-request `UnitOfWork`.

use async_trait::async_trait;
use sqlx::error::ErrorKind;
use thiserror::Error;
use tracing::warn;

mod entity;
pub mod memory;
pub mod postgres;
mod registry;

pub use entity::{Entity, EntityKind, FieldValue, Filter};
pub use registry::{AnyStore, Session, StoreBackend, StoreOpener, StoreRegistry, UnitOfWork};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported entity type: {0}")]
    UnsupportedEntityType(String),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Postgres `string_data_right_truncation`.
const VALUE_TOO_LONG: &str = "22001";

/// Client-facing error for a rejected statement. Constraint names and row
/// details only go to the log.
fn database_error(
    kind: ErrorKind,
    code: Option<&str>,
    constraint: Option<&str>,
    detail: &str,
) -> StoreError {
    let public = match kind {
        ErrorKind::UniqueViolation => StoreError::ConstraintViolation(
            "A record with the same unique value already exists".into(),
        ),
        ErrorKind::ForeignKeyViolation => StoreError::ConstraintViolation(
            "The change references a missing record or one that is still in use".into(),
        ),
        ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
            StoreError::Validation("A value is not allowed for its field".into())
        }
        _ if code == Some(VALUE_TOO_LONG) => {
            StoreError::Validation("A value is longer than its field allows".into())
        }
        _ => return StoreError::Storage(detail.to_string()),
    };
    warn!(?kind, constraint, detail, "statement rejected by the database");
    public
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => {
                database_error(db.kind(), db.code().as_deref(), db.constraint(), db.message())
            }
            _ => StoreError::Storage(err.to_string()),
        }
    }
}

/// CRUD over exactly one entity table.
///
/// Absence is never an error: `get_by_id` and `update` return `None`,
/// `delete` returns `false`.
#[async_trait]
pub trait ResourceStore<E: Entity>: Send + Sync {
    async fn insert(&self, entity: E) -> StoreResult<E>;
    async fn get_by_id(&self, id: &str) -> StoreResult<Option<E>>;
    async fn list_all(&self, filter: &Filter) -> StoreResult<Vec<E>>;
    async fn update(&self, id: &str, patch: E::Patch) -> StoreResult<Option<E>>;
    async fn delete(&self, id: &str) -> StoreResult<bool>;
}

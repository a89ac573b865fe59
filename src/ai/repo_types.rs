use std::sync::Arc;

use sqlx::FromRow;
use time::OffsetDateTime;

use crate::store::{AnyStore, Entity, EntityKind, FieldValue, ResourceStore, StoreResult};

/// Output of one model run. `result` is a JSON blob stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct AiResult {
    pub id: String,
    pub user_id: String,
    pub result: Option<String>,
    pub explanation: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct AiResultPatch {
    pub result: Option<String>,
    pub explanation: Option<String>,
}

impl Entity for AiResult {
    type Patch = AiResultPatch;

    const KIND: EntityKind = EntityKind::AiResult;
    const TABLE: &'static str = "ai_results";
    const COLUMNS: &'static [&'static str] =
        &["id", "user_id", "result", "explanation", "created_at"];

    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.clone().into(),
            self.user_id.clone().into(),
            self.result.clone().into(),
            self.explanation.clone().into(),
            self.created_at.into(),
        ]
    }

    fn apply(&mut self, patch: AiResultPatch) -> StoreResult<()> {
        if patch.result.is_some() {
            self.result = patch.result;
        }
        if patch.explanation.is_some() {
            self.explanation = patch.explanation;
        }
        Ok(())
    }

    fn into_any(store: Arc<dyn ResourceStore<Self>>) -> AnyStore {
        AnyStore::AiResults(store)
    }

    fn from_any(store: &AnyStore) -> Option<Arc<dyn ResourceStore<Self>>> {
        match store {
            AnyStore::AiResults(s) => Some(s.clone()),
            _ => None,
        }
    }
}

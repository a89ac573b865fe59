use std::sync::Arc;

use sqlx::FromRow;
use time::OffsetDateTime;

use crate::{
    store::{AnyStore, Entity, EntityKind, FieldValue, ResourceStore, StoreResult},
    validation::check_max_len,
};

pub const MAX_CATEGORY_LEN: usize = 100;
pub const MAX_TITLE_LEN: usize = 200;

/// Medical record. `metadata` holds a JSON object serialized as text.
#[derive(Debug, Clone, FromRow)]
pub struct Record {
    pub id: String,
    pub user_id: String,
    pub doctor_id: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub file_path: Option<String>,
    pub metadata: Option<String>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
pub struct RecordPatch {
    pub doctor_id: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub file_path: Option<String>,
    pub metadata: Option<String>,
}

pub fn check_lengths(category: Option<&str>, title: Option<&str>) -> StoreResult<()> {
    check_max_len("category", category, MAX_CATEGORY_LEN)?;
    check_max_len("title", title, MAX_TITLE_LEN)
}

impl Entity for Record {
    type Patch = RecordPatch;

    const KIND: EntityKind = EntityKind::Record;
    const TABLE: &'static str = "records";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "doctor_id",
        "category",
        "title",
        "content",
        "file_path",
        "metadata",
        "created_at",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.clone().into(),
            self.user_id.clone().into(),
            self.doctor_id.clone().into(),
            self.category.clone().into(),
            self.title.clone().into(),
            self.content.clone().into(),
            self.file_path.clone().into(),
            self.metadata.clone().into(),
            self.created_at.into(),
        ]
    }

    fn apply(&mut self, patch: RecordPatch) -> StoreResult<()> {
        check_lengths(patch.category.as_deref(), patch.title.as_deref())?;
        if patch.doctor_id.is_some() {
            self.doctor_id = patch.doctor_id;
        }
        if patch.category.is_some() {
            self.category = patch.category;
        }
        if patch.title.is_some() {
            self.title = patch.title;
        }
        if patch.content.is_some() {
            self.content = patch.content;
        }
        if patch.file_path.is_some() {
            self.file_path = patch.file_path;
        }
        if patch.metadata.is_some() {
            self.metadata = patch.metadata;
        }
        Ok(())
    }

    fn into_any(store: Arc<dyn ResourceStore<Self>>) -> AnyStore {
        AnyStore::Records(store)
    }

    fn from_any(store: &AnyStore) -> Option<Arc<dyn ResourceStore<Self>>> {
        match store {
            AnyStore::Records(s) => Some(s.clone()),
            _ => None,
        }
    }
}

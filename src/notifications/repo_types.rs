use std::sync::Arc;

use sqlx::FromRow;
use time::OffsetDateTime;

use crate::{
    store::{AnyStore, Entity, EntityKind, FieldValue, ResourceStore, StoreResult},
    validation::{check_max_len, check_not_blank},
};

pub const DEFAULT_KIND: &str = "general";
pub const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, FromRow)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub read: bool,
    pub created_at: OffsetDateTime,
    pub read_at: Option<OffsetDateTime>,
}

#[derive(Debug, Default)]
pub struct NotificationPatch {
    pub title: Option<String>,
    pub message: Option<String>,
    pub kind: Option<String>,
    pub read: Option<bool>,
}

impl Entity for Notification {
    type Patch = NotificationPatch;

    const KIND: EntityKind = EntityKind::Notification;
    const TABLE: &'static str = "notifications";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "title",
        "message",
        "kind",
        "read",
        "created_at",
        "read_at",
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            self.id.clone().into(),
            self.user_id.clone().into(),
            self.title.clone().into(),
            self.message.clone().into(),
            self.kind.clone().into(),
            self.read.into(),
            self.created_at.into(),
            self.read_at.into(),
        ]
    }

    /// Marking an unread notification as read stamps `read_at`; re-marking keeps the first stamp.
    fn apply(&mut self, patch: NotificationPatch) -> StoreResult<()> {
        if let Some(title) = patch.title {
            check_not_blank("title", &title)?;
            check_max_len("title", Some(title.as_str()), MAX_TITLE_LEN)?;
            self.title = title;
        }
        if let Some(message) = patch.message {
            check_not_blank("message", &message)?;
            self.message = message;
        }
        if let Some(kind) = patch.kind {
            check_not_blank("type", &kind)?;
            self.kind = kind;
        }
        match patch.read {
            Some(true) if !self.read => {
                self.read = true;
                self.read_at = Some(OffsetDateTime::now_utc());
            }
            Some(false) => {
                self.read = false;
                self.read_at = None;
            }
            _ => {}
        }
        Ok(())
    }

    fn into_any(store: Arc<dyn ResourceStore<Self>>) -> AnyStore {
        AnyStore::Notifications(store)
    }

    fn from_any(store: &AnyStore) -> Option<Arc<dyn ResourceStore<Self>>> {
        match store {
            AnyStore::Notifications(s) => Some(s.clone()),
            _ => None,
        }
    }
}

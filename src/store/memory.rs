use std::{
    any::Any,
    collections::{BTreeMap, HashMap},
    marker::PhantomData,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    AnyStore, Entity, EntityKind, Filter, ResourceStore, Session, StoreBackend, StoreError,
    StoreOpener, StoreResult,
};

type Table<E> = RwLock<BTreeMap<String, E>>;

/// Process-wide tables, shared by every unit of work.
#[derive(Default)]
pub struct MemoryDb {
    tables: Mutex<HashMap<EntityKind, Arc<dyn Any + Send + Sync>>>,
}

impl MemoryDb {
    fn table<E: Entity>(&self) -> StoreResult<Arc<Table<E>>> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Storage("memory tables lock poisoned".into()))?;
        let table = tables
            .entry(E::KIND)
            .or_insert_with(|| Arc::new(Table::<E>::default()) as Arc<dyn Any + Send + Sync>)
            .clone();
        table
            .downcast::<Table<E>>()
            .map_err(|_| StoreError::Storage(format!("table {} holds another row type", E::TABLE)))
    }
}

#[derive(Clone, Default)]
pub struct MemoryBackend {
    db: Arc<MemoryDb>,
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn begin(&self) -> StoreResult<Box<dyn Session>> {
        Ok(Box::new(MemorySession {
            db: self.db.clone(),
        }))
    }
}

struct MemorySession {
    db: Arc<MemoryDb>,
}

impl StoreOpener for MemorySession {
    fn open_entity<E: Entity>(&self) -> StoreResult<AnyStore> {
        let store = MemoryStore::<E> {
            table: self.db.table::<E>()?,
            _entity: PhantomData,
        };
        Ok(E::into_any(Arc::new(store)))
    }
}

#[async_trait]
impl Session for MemorySession {
    fn open(&self, kind: EntityKind) -> StoreResult<AnyStore> {
        self.open_kind(kind)
    }

    async fn commit(&self) -> StoreResult<()> {
        Ok(())
    }
}

pub struct MemoryStore<E: Entity> {
    table: Arc<Table<E>>,
    _entity: PhantomData<fn() -> E>,
}

fn unique_conflict<E: Entity>(rows: &BTreeMap<String, E>, candidate: &E) -> Option<&'static str> {
    E::UNIQUE.iter().copied().find(|column| {
        let value = candidate.field(column);
        match &value {
            Some(v) if !v.is_null() => rows
                .values()
                .any(|row| row.id() != candidate.id() && row.field(column) == value),
            _ => false,
        }
    })
}

#[async_trait]
impl<E: Entity> ResourceStore<E> for MemoryStore<E> {
    async fn insert(&self, entity: E) -> StoreResult<E> {
        let mut rows = self.table.write().await;
        if rows.contains_key(entity.id()) {
            return Err(StoreError::ConstraintViolation(format!(
                "{} {} already exists",
                E::KIND.label(),
                entity.id()
            )));
        }
        if let Some(column) = unique_conflict(&rows, &entity) {
            return Err(StoreError::ConstraintViolation(format!(
                "duplicate value for {}.{}",
                E::TABLE,
                column
            )));
        }
        rows.insert(entity.id().to_string(), entity.clone());
        Ok(entity)
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<E>> {
        Ok(self.table.read().await.get(id).cloned())
    }

    async fn list_all(&self, filter: &Filter) -> StoreResult<Vec<E>> {
        filter.check_columns::<E>()?;
        let rows = self.table.read().await;
        Ok(rows
            .values()
            .filter(|row| filter.matches(*row))
            .cloned()
            .collect())
    }

    async fn update(&self, id: &str, patch: E::Patch) -> StoreResult<Option<E>> {
        let mut rows = self.table.write().await;
        let Some(current) = rows.get(id) else {
            return Ok(None);
        };
        let mut updated = current.clone();
        updated.apply(patch)?;
        if let Some(column) = unique_conflict(&rows, &updated) {
            return Err(StoreError::ConstraintViolation(format!(
                "duplicate value for {}.{}",
                E::TABLE,
                column
            )));
        }
        rows.insert(id.to_string(), updated.clone());
        Ok(Some(updated))
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        Ok(self.table.write().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        parser::Parser,
        records::{dto::CreateRecordRequest, parser::RecordParser, repo_types::{Record, RecordPatch}},
        users::{
            parser::{NewUser, UserParser},
            repo_types::{Role, User, UserPatch},
        },
    };

    fn new_user(email: &str) -> User {
        UserParser::to_entity(NewUser {
            name: "Ada".into(),
            email: email.into(),
            password_hash: "$argon2id$fake".into(),
            role: Role::Patient,
            gender: None,
            age: Some(36),
            dob: None,
            blood_group: Some("O+".into()),
            address: None,
        })
        .unwrap()
    }

    fn new_record(user_id: &str, title: &str) -> Record {
        RecordParser::to_entity(CreateRecordRequest {
            user_id: user_id.into(),
            doctor_id: None,
            category: Some("lab".into()),
            title: Some(title.into()),
            content: Some("hemoglobin 13.5".into()),
            file_path: None,
            metadata: None,
        })
        .unwrap()
    }

    async fn user_store() -> Arc<dyn ResourceStore<User>> {
        let uow = MemoryBackend::default().begin().await.unwrap();
        let store = uow.open(EntityKind::User).unwrap();
        User::from_any(&store).unwrap()
    }

    async fn record_store() -> Arc<dyn ResourceStore<Record>> {
        let uow = MemoryBackend::default().begin().await.unwrap();
        let store = uow.open(EntityKind::Record).unwrap();
        Record::from_any(&store).unwrap()
    }

    #[tokio::test]
    async fn insert_then_get_returns_same_row() {
        let store = user_store().await;
        let user = store.insert(new_user("ada@example.com")).await.unwrap();
        let fetched = store.get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "ada@example.com");
        assert_eq!(fetched.created_at, user.created_at);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_constraint_violation() {
        let store = user_store().await;
        store.insert(new_user("ada@example.com")).await.unwrap();
        let err = store.insert(new_user("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
        assert_eq!(store.list_all(&Filter::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_existed() {
        let store = user_store().await;
        let user = store.insert(new_user("ada@example.com")).await.unwrap();
        assert!(store.delete(&user.id).await.unwrap());
        assert!(store.get_by_id(&user.id).await.unwrap().is_none());
        assert!(!store.delete(&user.id).await.unwrap());
    }

    #[tokio::test]
    async fn update_touches_only_patched_fields() {
        let store = user_store().await;
        let before = store.insert(new_user("ada@example.com")).await.unwrap();
        let after = store
            .update(
                &before.id,
                UserPatch {
                    address: Some("1 Analytical Way".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(after.address.as_deref(), Some("1 Analytical Way"));
        let changed: Vec<_> = User::COLUMNS
            .iter()
            .filter(|c| before.field(c) != after.field(c))
            .collect();
        assert_eq!(changed, vec![&"address"]);
    }

    #[tokio::test]
    async fn update_rejects_invalid_values_and_missing_ids() {
        let store = user_store().await;
        let user = store.insert(new_user("ada@example.com")).await.unwrap();
        let err = store
            .update(
                &user.id,
                UserPatch {
                    email: Some("not-an-email".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));

        let missing = store.update("nope", UserPatch::default()).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn update_cannot_steal_another_users_email() {
        let store = user_store().await;
        store.insert(new_user("ada@example.com")).await.unwrap();
        let grace = store.insert(new_user("grace@example.com")).await.unwrap();
        let err = store
            .update(
                &grace.id,
                UserPatch {
                    email: Some("ada@example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn list_all_filters_by_owner() {
        let store = record_store().await;
        store.insert(new_record("u-1", "CBC")).await.unwrap();
        store.insert(new_record("u-1", "X-ray")).await.unwrap();
        store.insert(new_record("u-2", "MRI")).await.unwrap();

        let mine = store
            .list_all(&Filter::new().eq("user_id", "u-1"))
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|r| r.user_id == "u-1"));

        let nobody = store
            .list_all(&Filter::new().eq("user_id", "u-404"))
            .await
            .unwrap();
        assert!(nobody.is_empty());

        let first = store.list_all(&Filter::new()).await.unwrap();
        let second = store.list_all(&Filter::new()).await.unwrap();
        let ids = |rows: &[Record]| rows.iter().map(|r| r.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }

    #[tokio::test]
    async fn unknown_filter_column_is_rejected() {
        let store = record_store().await;
        let err = store
            .list_all(&Filter::new().eq("owner", "u-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn record_patch_validates_title_length() {
        let store = record_store().await;
        let record = store.insert(new_record("u-1", "CBC")).await.unwrap();
        let err = store
            .update(
                &record.id,
                RecordPatch {
                    title: Some("x".repeat(201)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}

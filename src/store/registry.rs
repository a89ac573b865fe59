use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use super::{Entity, EntityKind, Filter, ResourceStore, StoreError, StoreResult};
use crate::{
    ai::repo_types::AiResult,
    appointments::repo_types::Appointment,
    doctors::repo_types::Doctor,
    insurance::repo_types::{InsuranceClaim, InsurancePolicy},
    notifications::repo_types::Notification,
    records::repo_types::Record,
    users::repo_types::User,
};

/// A store for any registered entity type.
#[derive(Clone)]
pub enum AnyStore {
    Users(Arc<dyn ResourceStore<User>>),
    Doctors(Arc<dyn ResourceStore<Doctor>>),
    Records(Arc<dyn ResourceStore<Record>>),
    Appointments(Arc<dyn ResourceStore<Appointment>>),
    InsurancePolicies(Arc<dyn ResourceStore<InsurancePolicy>>),
    InsuranceClaims(Arc<dyn ResourceStore<InsuranceClaim>>),
    Notifications(Arc<dyn ResourceStore<Notification>>),
    AiResults(Arc<dyn ResourceStore<AiResult>>),
}

impl AnyStore {
    pub fn kind(&self) -> EntityKind {
        match self {
            AnyStore::Users(_) => EntityKind::User,
            AnyStore::Doctors(_) => EntityKind::Doctor,
            AnyStore::Records(_) => EntityKind::Record,
            AnyStore::Appointments(_) => EntityKind::Appointment,
            AnyStore::InsurancePolicies(_) => EntityKind::InsurancePolicy,
            AnyStore::InsuranceClaims(_) => EntityKind::InsuranceClaim,
            AnyStore::Notifications(_) => EntityKind::Notification,
            AnyStore::AiResults(_) => EntityKind::AiResult,
        }
    }

    /// Number of rows matching `filter`, whatever the entity type.
    pub async fn count(&self, filter: &Filter) -> StoreResult<usize> {
        Ok(match self {
            AnyStore::Users(s) => s.list_all(filter).await?.len(),
            AnyStore::Doctors(s) => s.list_all(filter).await?.len(),
            AnyStore::Records(s) => s.list_all(filter).await?.len(),
            AnyStore::Appointments(s) => s.list_all(filter).await?.len(),
            AnyStore::InsurancePolicies(s) => s.list_all(filter).await?.len(),
            AnyStore::InsuranceClaims(s) => s.list_all(filter).await?.len(),
            AnyStore::Notifications(s) => s.list_all(filter).await?.len(),
            AnyStore::AiResults(s) => s.list_all(filter).await?.len(),
        })
    }

    pub fn same_instance(&self, other: &AnyStore) -> bool {
        self.kind() == other.kind() && self.addr() == other.addr()
    }

    fn addr(&self) -> *const () {
        match self {
            AnyStore::Users(s) => Arc::as_ptr(s) as *const (),
            AnyStore::Doctors(s) => Arc::as_ptr(s) as *const (),
            AnyStore::Records(s) => Arc::as_ptr(s) as *const (),
            AnyStore::Appointments(s) => Arc::as_ptr(s) as *const (),
            AnyStore::InsurancePolicies(s) => Arc::as_ptr(s) as *const (),
            AnyStore::InsuranceClaims(s) => Arc::as_ptr(s) as *const (),
            AnyStore::Notifications(s) => Arc::as_ptr(s) as *const (),
            AnyStore::AiResults(s) => Arc::as_ptr(s) as *const (),
        }
    }
}

/// Builds stores for a backend session; `open_kind` is the registry of
/// every entity type the service persists.
pub trait StoreOpener {
    fn open_entity<E: Entity>(&self) -> StoreResult<AnyStore>;

    fn open_kind(&self, kind: EntityKind) -> StoreResult<AnyStore>
    where
        Self: Sized,
    {
        match kind {
            EntityKind::User => self.open_entity::<User>(),
            EntityKind::Doctor => self.open_entity::<Doctor>(),
            EntityKind::Record => self.open_entity::<Record>(),
            EntityKind::Appointment => self.open_entity::<Appointment>(),
            EntityKind::InsurancePolicy => self.open_entity::<InsurancePolicy>(),
            EntityKind::InsuranceClaim => self.open_entity::<InsuranceClaim>(),
            EntityKind::Notification => self.open_entity::<Notification>(),
            EntityKind::AiResult => self.open_entity::<AiResult>(),
        }
    }
}

/// Backend-side state of one unit of work (e.g. an open transaction).
#[async_trait]
pub trait Session: Send + Sync {
    fn open(&self, kind: EntityKind) -> StoreResult<AnyStore>;
    async fn commit(&self) -> StoreResult<()>;
}

#[async_trait]
pub trait StoreBackend: Send + Sync {
    fn name(&self) -> &'static str;
    async fn begin(&self) -> StoreResult<Box<dyn Session>>;
}

/// Scope of one logical request. Stores opened through it are cached, so the
/// same kind always yields the same instance until the unit of work ends.
pub struct UnitOfWork {
    session: Box<dyn Session>,
    stores: Mutex<HashMap<EntityKind, AnyStore>>,
}

impl UnitOfWork {
    pub fn new(session: Box<dyn Session>) -> Self {
        Self {
            session,
            stores: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_store(&self, kind: EntityKind) -> StoreResult<AnyStore> {
        let mut stores = self
            .stores
            .lock()
            .map_err(|_| StoreError::Storage("store cache lock poisoned".into()))?;
        if let Some(store) = stores.get(&kind) {
            return Ok(store.clone());
        }
        let store = self.session.open(kind)?;
        stores.insert(kind, store.clone());
        Ok(store)
    }

    pub fn get_store_by_tag(&self, tag: &str) -> StoreResult<AnyStore> {
        self.get_store(tag.parse()?)
    }

    pub fn store<E: Entity>(&self) -> StoreResult<Arc<dyn ResourceStore<E>>> {
        let any = self.get_store(E::KIND)?;
        E::from_any(&any).ok_or_else(|| StoreError::UnsupportedEntityType(E::KIND.to_string()))
    }

    /// Makes every write of this unit of work durable. Dropping a unit of
    /// work without committing discards its writes where the backend supports it.
    pub async fn commit(self) -> StoreResult<()> {
        self.session.commit().await
    }
}

#[derive(Clone)]
pub struct StoreRegistry {
    backend: Arc<dyn StoreBackend>,
}

impl StoreRegistry {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    pub fn memory() -> Self {
        Self::new(Arc::new(super::memory::MemoryBackend::default()))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub async fn begin(&self) -> StoreResult<UnitOfWork> {
        Ok(UnitOfWork::new(self.backend.begin().await?))
    }
}

//! CRUD shared by every entity manager: parse, persist, map back.

use std::{marker::PhantomData, sync::Arc};

use tracing::info;

use crate::{
    error::{AppError, AppResult},
    parser::Parser,
    store::{Entity, Filter, ResourceStore, UnitOfWork},
};

pub struct ResourceManager<P: Parser> {
    store: Arc<dyn ResourceStore<P::Entity>>,
    _parser: PhantomData<fn() -> P>,
}

impl<P: Parser> ResourceManager<P> {
    pub fn open(uow: &UnitOfWork) -> AppResult<Self> {
        Ok(Self {
            store: uow.store::<P::Entity>()?,
            _parser: PhantomData,
        })
    }

    pub fn store(&self) -> &Arc<dyn ResourceStore<P::Entity>> {
        &self.store
    }

    pub async fn insert(&self, entity: P::Entity) -> AppResult<P::Entity> {
        let stored = self.store.insert(entity).await?;
        info!(kind = %<P::Entity as Entity>::KIND, id = %stored.id(), "created");
        Ok(stored)
    }

    pub async fn create(&self, req: P::Create) -> AppResult<P::Response> {
        let entity = P::to_entity(req)?;
        Ok(P::to_response(self.insert(entity).await?))
    }

    pub async fn find(&self, id: &str) -> AppResult<Option<P::Entity>> {
        Ok(self.store.get_by_id(id).await?)
    }

    pub async fn fetch(&self, id: &str) -> AppResult<P::Entity> {
        self.find(id)
            .await?
            .ok_or_else(|| AppError::not_found(<P::Entity as Entity>::KIND, id))
    }

    pub async fn get(&self, id: &str) -> AppResult<P::Response> {
        Ok(P::to_response(self.fetch(id).await?))
    }

    pub async fn list(&self, filter: &Filter) -> AppResult<Vec<P::Response>> {
        let rows = self.store.list_all(filter).await?;
        Ok(rows.into_iter().map(P::to_response).collect())
    }

    pub async fn patch(
        &self,
        id: &str,
        patch: <P::Entity as Entity>::Patch,
    ) -> AppResult<P::Entity> {
        let updated = self
            .store
            .update(id, patch)
            .await?
            .ok_or_else(|| AppError::not_found(<P::Entity as Entity>::KIND, id))?;
        info!(kind = %<P::Entity as Entity>::KIND, %id, "updated");
        Ok(updated)
    }

    pub async fn update(&self, id: &str, req: P::Update) -> AppResult<P::Response> {
        let patch = P::to_patch(req)?;
        Ok(P::to_response(self.patch(id, patch).await?))
    }

    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let deleted = self.store.delete(id).await?;
        if deleted {
            info!(kind = %<P::Entity as Entity>::KIND, %id, "deleted");
        }
        Ok(deleted)
    }
}

/// Loads a referenced row; a dangling reference is a constraint violation.
pub async fn require_related<E: Entity>(uow: &UnitOfWork, id: &str) -> AppResult<E> {
    uow.store::<E>()?
        .get_by_id(id)
        .await?
        .ok_or_else(|| {
            AppError::ConstraintViolation(format!("{} {} does not exist", E::KIND.label(), id))
        })
}

use async_trait::async_trait;

use crate::{
    store::{Filter, ResourceStore, StoreResult},
    users::repo_types::User,
    validation::normalize_email,
};

/// Email lookup, available on every user store.
#[async_trait]
pub trait EmailLookup {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
impl<S> EmailLookup for S
where
    S: ResourceStore<User> + ?Sized,
{
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let filter = Filter::new().eq("email", normalize_email(email));
        Ok(self.list_all(&filter).await?.into_iter().next())
    }
}

use tracing::info;

use super::{
    dto::{
        CreateNotificationRequest, NotificationQuery, NotificationResponse,
        UpdateNotificationRequest,
    },
    parser::NotificationParser,
    repo_types::NotificationPatch,
};
use crate::{
    error::AppResult,
    manager::{require_related, ResourceManager},
    parser::Parser,
    store::{Filter, UnitOfWork},
    users::repo_types::User,
};

pub struct NotificationManager<'a> {
    uow: &'a UnitOfWork,
    notifications: ResourceManager<NotificationParser>,
}

impl<'a> NotificationManager<'a> {
    pub fn new(uow: &'a UnitOfWork) -> AppResult<Self> {
        Ok(Self {
            uow,
            notifications: ResourceManager::open(uow)?,
        })
    }

    pub async fn create(&self, req: CreateNotificationRequest) -> AppResult<NotificationResponse> {
        require_related::<User>(self.uow, &req.user_id).await?;
        self.notifications.create(req).await
    }

    pub async fn get(&self, id: &str) -> AppResult<NotificationResponse> {
        self.notifications.get(id).await
    }

    pub async fn list(&self, query: NotificationQuery) -> AppResult<Vec<NotificationResponse>> {
        let filter = Filter::new()
            .eq_opt("user_id", query.user_id)
            .eq_opt("read", query.read);
        self.notifications.list(&filter).await
    }

    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<NotificationResponse>> {
        self.notifications
            .list(&Filter::new().eq("user_id", user_id))
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        req: UpdateNotificationRequest,
    ) -> AppResult<NotificationResponse> {
        self.notifications.update(id, req).await
    }

    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        self.notifications.delete(id).await
    }

    /// Idempotent: an already read notification keeps its `read_at`.
    pub async fn mark_as_read(&self, id: &str) -> AppResult<NotificationResponse> {
        let current = self.notifications.fetch(id).await?;
        if current.read {
            return Ok(NotificationParser::to_response(current));
        }
        let updated = self
            .notifications
            .patch(
                id,
                NotificationPatch {
                    read: Some(true),
                    ..Default::default()
                },
            )
            .await?;
        info!(notification_id = %id, "notification read");
        Ok(NotificationParser::to_response(updated))
    }
}

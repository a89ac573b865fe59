use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        CreateNotificationRequest, NotificationQuery, NotificationResponse,
        UpdateNotificationRequest,
    },
    services::NotificationManager,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    store::{EntityKind, UnitOfWork},
};

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            post(create_notification).get(list_notifications),
        )
        .route(
            "/notifications/:id",
            get(get_notification)
                .patch(update_notification)
                .delete(delete_notification),
        )
        .route("/notifications/:id/read", post(mark_as_read))
}

#[instrument(skip(uow, payload))]
pub async fn create_notification(
    uow: UnitOfWork,
    Json(payload): Json<CreateNotificationRequest>,
) -> AppResult<(StatusCode, Json<NotificationResponse>)> {
    let note = NotificationManager::new(&uow)?.create(payload).await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(note)))
}

#[instrument(skip(uow))]
pub async fn list_notifications(
    uow: UnitOfWork,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Vec<NotificationResponse>>> {
    Ok(Json(NotificationManager::new(&uow)?.list(query).await?))
}

#[instrument(skip(uow))]
pub async fn get_notification(
    uow: UnitOfWork,
    Path(id): Path<String>,
) -> AppResult<Json<NotificationResponse>> {
    Ok(Json(NotificationManager::new(&uow)?.get(&id).await?))
}

#[instrument(skip(uow, payload))]
pub async fn update_notification(
    uow: UnitOfWork,
    Path(id): Path<String>,
    Json(payload): Json<UpdateNotificationRequest>,
) -> AppResult<Json<NotificationResponse>> {
    let note = NotificationManager::new(&uow)?.update(&id, payload).await?;
    uow.commit().await?;
    Ok(Json(note))
}

#[instrument(skip(uow))]
pub async fn delete_notification(
    uow: UnitOfWork,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if !NotificationManager::new(&uow)?.delete(&id).await? {
        return Err(AppError::not_found(EntityKind::Notification, &id));
    }
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(uow))]
pub async fn mark_as_read(
    uow: UnitOfWork,
    Path(id): Path<String>,
) -> AppResult<Json<NotificationResponse>> {
    let note = NotificationManager::new(&uow)?.mark_as_read(&id).await?;
    uow.commit().await?;
    Ok(Json(note))
}

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateUserRequest, UpdateUserRequest, UserQuery, UserResponse},
    services::UserManager,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    store::{EntityKind, UnitOfWork},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route(
            "/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

#[instrument(skip(uow, payload))]
pub async fn create_user(
    uow: UnitOfWork,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = UserManager::new(&uow)?.create(payload).await?;
    uow.commit().await?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(uow))]
pub async fn list_users(
    uow: UnitOfWork,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<Vec<UserResponse>>> {
    Ok(Json(UserManager::new(&uow)?.list(query).await?))
}

#[instrument(skip(uow))]
pub async fn get_user(uow: UnitOfWork, Path(id): Path<String>) -> AppResult<Json<UserResponse>> {
    Ok(Json(UserManager::new(&uow)?.get(&id).await?))
}

#[instrument(skip(uow, payload))]
pub async fn update_user(
    uow: UnitOfWork,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = UserManager::new(&uow)?.update(&id, payload).await?;
    uow.commit().await?;
    Ok(Json(user))
}

#[instrument(skip(uow))]
pub async fn delete_user(uow: UnitOfWork, Path(id): Path<String>) -> AppResult<StatusCode> {
    if !UserManager::new(&uow)?.delete(&id).await? {
        return Err(AppError::not_found(EntityKind::User, &id));
    }
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, RefreshRequest},
        jwt::{AuthUser, JwtKeys},
    },
    error::{AppError, AppResult},
    notifications::{dto::NotificationResponse, services::NotificationManager},
    parser::Parser,
    state::AppState,
    store::UnitOfWork,
    users::{dto::UserResponse, parser::UserParser, repo_types::User, services::UserManager},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/me/notifications", get(my_notifications))
}

fn issue_tokens(keys: &JwtKeys, user: User) -> AppResult<AuthResponse> {
    Ok(AuthResponse {
        access_token: keys.sign_access(&user.id)?,
        refresh_token: keys.sign_refresh(&user.id)?,
        user: UserParser::to_response(user),
    })
}

/// A token whose user no longer exists is treated as invalid.
async fn token_user(uow: &UnitOfWork, user_id: &str) -> AppResult<User> {
    UserManager::new(uow)?.fetch(user_id).await.map_err(|e| match e {
        AppError::NotFound(_) => {
            warn!(%user_id, "token for unknown user");
            AppError::Unauthorized("User not found".into())
        }
        other => other,
    })
}

#[instrument(skip(state, uow, payload))]
pub async fn login(
    State(state): State<AppState>,
    uow: UnitOfWork,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = UserManager::new(&uow)?
        .authenticate(&payload.email, &payload.password)
        .await?;
    let keys = JwtKeys::from_ref(&state);
    info!(user_id = %user.id, "user logged in");
    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(state, uow, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    uow: UnitOfWork,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::Unauthorized("Invalid refresh token".into())
    })?;
    let user = token_user(&uow, &claims.sub).await?;
    Ok(Json(issue_tokens(&keys, user)?))
}

#[instrument(skip(uow, user_id))]
pub async fn get_me(AuthUser(user_id): AuthUser, uow: UnitOfWork) -> AppResult<Json<UserResponse>> {
    let user = token_user(&uow, &user_id).await?;
    Ok(Json(UserParser::to_response(user)))
}

#[instrument(skip(uow, user_id))]
pub async fn my_notifications(
    AuthUser(user_id): AuthUser,
    uow: UnitOfWork,
) -> AppResult<Json<Vec<NotificationResponse>>> {
    token_user(&uow, &user_id).await?;
    Ok(Json(
        NotificationManager::new(&uow)?
            .list_for_user(&user_id)
            .await?,
    ))
}

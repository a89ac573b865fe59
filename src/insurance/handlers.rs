use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        ClaimQuery, ClaimResponse, CreateClaimRequest, CreatePolicyRequest, PolicyQuery,
        PolicyResponse, ProcessClaimRequest, UpdateClaimRequest, UpdatePolicyRequest,
    },
    services::InsuranceManager,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    store::{EntityKind, UnitOfWork},
};

pub fn insurance_routes() -> Router<AppState> {
    Router::new()
        .route("/insurance/policies", post(create_policy).get(list_policies))
        .route(
            "/insurance/policies/:id",
            get(get_policy).patch(update_policy).delete(delete_policy),
        )
        .route("/insurance/claims", post(create_claim).get(list_claims))
        .route(
            "/insurance/claims/:id",
            get(get_claim).patch(update_claim).delete(delete_claim),
        )
        .route("/insurance/claims/:id/process", post(process_claim))
}

#[instrument(skip(uow, payload))]
pub async fn create_policy(
    uow: UnitOfWork,
    Json(payload): Json<CreatePolicyRequest>,
) -> AppResult<(StatusCode, Json<PolicyResponse>)> {
    let policy = InsuranceManager::new(&uow)?.create_policy(payload).await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(policy)))
}

#[instrument(skip(uow))]
pub async fn list_policies(
    uow: UnitOfWork,
    Query(query): Query<PolicyQuery>,
) -> AppResult<Json<Vec<PolicyResponse>>> {
    Ok(Json(InsuranceManager::new(&uow)?.list_policies(query).await?))
}

#[instrument(skip(uow))]
pub async fn get_policy(
    uow: UnitOfWork,
    Path(id): Path<String>,
) -> AppResult<Json<PolicyResponse>> {
    Ok(Json(InsuranceManager::new(&uow)?.get_policy(&id).await?))
}

#[instrument(skip(uow, payload))]
pub async fn update_policy(
    uow: UnitOfWork,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePolicyRequest>,
) -> AppResult<Json<PolicyResponse>> {
    let policy = InsuranceManager::new(&uow)?
        .update_policy(&id, payload)
        .await?;
    uow.commit().await?;
    Ok(Json(policy))
}

#[instrument(skip(uow))]
pub async fn delete_policy(uow: UnitOfWork, Path(id): Path<String>) -> AppResult<StatusCode> {
    if !InsuranceManager::new(&uow)?.delete_policy(&id).await? {
        return Err(AppError::not_found(EntityKind::InsurancePolicy, &id));
    }
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(uow, payload))]
pub async fn create_claim(
    uow: UnitOfWork,
    Json(payload): Json<CreateClaimRequest>,
) -> AppResult<(StatusCode, Json<ClaimResponse>)> {
    let claim = InsuranceManager::new(&uow)?.create_claim(payload).await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(claim)))
}

#[instrument(skip(uow))]
pub async fn list_claims(
    uow: UnitOfWork,
    Query(query): Query<ClaimQuery>,
) -> AppResult<Json<Vec<ClaimResponse>>> {
    Ok(Json(InsuranceManager::new(&uow)?.list_claims(query).await?))
}

#[instrument(skip(uow))]
pub async fn get_claim(uow: UnitOfWork, Path(id): Path<String>) -> AppResult<Json<ClaimResponse>> {
    Ok(Json(InsuranceManager::new(&uow)?.get_claim(&id).await?))
}

#[instrument(skip(uow, payload))]
pub async fn update_claim(
    uow: UnitOfWork,
    Path(id): Path<String>,
    Json(payload): Json<UpdateClaimRequest>,
) -> AppResult<Json<ClaimResponse>> {
    let claim = InsuranceManager::new(&uow)?.update_claim(&id, payload).await?;
    uow.commit().await?;
    Ok(Json(claim))
}

#[instrument(skip(uow))]
pub async fn delete_claim(uow: UnitOfWork, Path(id): Path<String>) -> AppResult<StatusCode> {
    if !InsuranceManager::new(&uow)?.delete_claim(&id).await? {
        return Err(AppError::not_found(EntityKind::InsuranceClaim, &id));
    }
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Body is optional; an empty body records `{}` as processing metadata.
#[instrument(skip(uow, payload))]
pub async fn process_claim(
    uow: UnitOfWork,
    Path(id): Path<String>,
    payload: Option<Json<ProcessClaimRequest>>,
) -> AppResult<Json<ClaimResponse>> {
    let req = payload.map(|Json(p)| p).unwrap_or_default();
    let claim = InsuranceManager::new(&uow)?.process_claim(&id, req).await?;
    uow.commit().await?;
    Ok(Json(claim))
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        AiResultQuery, AiResultResponse, AskRequest, CreateAiResultRequest, SummarizeRequest,
        UpdateAiResultRequest,
    },
    services::{AiResultManager, AiService},
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    store::{EntityKind, UnitOfWork},
};

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/ai/summarize", post(summarize))
        .route("/ai/ask", post(ask))
        .route("/ai/results", post(create_result).get(list_results))
        .route(
            "/ai/results/:id",
            get(get_result).patch(update_result).delete(delete_result),
        )
}

#[instrument(skip(state, payload))]
pub async fn summarize(
    State(state): State<AppState>,
    Json(payload): Json<SummarizeRequest>,
) -> AppResult<(StatusCode, Json<AiResultResponse>)> {
    let result = AiService::new(&state)
        .summarize_record(&payload.record_id, payload.mode)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

#[instrument(skip(state, payload))]
pub async fn ask(
    State(state): State<AppState>,
    Json(payload): Json<AskRequest>,
) -> AppResult<(StatusCode, Json<AiResultResponse>)> {
    let result = AiService::new(&state)
        .ask_record(&payload.record_id, &payload.question)
        .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

#[instrument(skip(uow, payload))]
pub async fn create_result(
    uow: UnitOfWork,
    Json(payload): Json<CreateAiResultRequest>,
) -> AppResult<(StatusCode, Json<AiResultResponse>)> {
    let result = AiResultManager::new(&uow)?.create(payload).await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(result)))
}

#[instrument(skip(uow))]
pub async fn list_results(
    uow: UnitOfWork,
    Query(query): Query<AiResultQuery>,
) -> AppResult<Json<Vec<AiResultResponse>>> {
    Ok(Json(AiResultManager::new(&uow)?.list(query).await?))
}

#[instrument(skip(uow))]
pub async fn get_result(
    uow: UnitOfWork,
    Path(id): Path<String>,
) -> AppResult<Json<AiResultResponse>> {
    Ok(Json(AiResultManager::new(&uow)?.get(&id).await?))
}

#[instrument(skip(uow, payload))]
pub async fn update_result(
    uow: UnitOfWork,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAiResultRequest>,
) -> AppResult<Json<AiResultResponse>> {
    let result = AiResultManager::new(&uow)?.update(&id, payload).await?;
    uow.commit().await?;
    Ok(Json(result))
}

#[instrument(skip(uow))]
pub async fn delete_result(uow: UnitOfWork, Path(id): Path<String>) -> AppResult<StatusCode> {
    if !AiResultManager::new(&uow)?.delete(&id).await? {
        return Err(AppError::not_found(EntityKind::AiResult, &id));
    }
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

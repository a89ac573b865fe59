use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateDoctorRequest, DoctorQuery, DoctorResponse, UpdateDoctorRequest},
    services::DoctorManager,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    store::{EntityKind, UnitOfWork},
};

pub fn doctor_routes() -> Router<AppState> {
    Router::new()
        .route("/doctors", post(create_doctor).get(list_doctors))
        .route(
            "/doctors/:id",
            get(get_doctor).patch(update_doctor).delete(delete_doctor),
        )
}

#[instrument(skip(uow, payload))]
pub async fn create_doctor(
    uow: UnitOfWork,
    Json(payload): Json<CreateDoctorRequest>,
) -> AppResult<(StatusCode, Json<DoctorResponse>)> {
    let doctor = DoctorManager::new(&uow)?.create(payload).await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(doctor)))
}

#[instrument(skip(uow))]
pub async fn list_doctors(
    uow: UnitOfWork,
    Query(query): Query<DoctorQuery>,
) -> AppResult<Json<Vec<DoctorResponse>>> {
    Ok(Json(DoctorManager::new(&uow)?.list(query).await?))
}

#[instrument(skip(uow))]
pub async fn get_doctor(
    uow: UnitOfWork,
    Path(id): Path<String>,
) -> AppResult<Json<DoctorResponse>> {
    Ok(Json(DoctorManager::new(&uow)?.get(&id).await?))
}

#[instrument(skip(uow, payload))]
pub async fn update_doctor(
    uow: UnitOfWork,
    Path(id): Path<String>,
    Json(payload): Json<UpdateDoctorRequest>,
) -> AppResult<Json<DoctorResponse>> {
    let doctor = DoctorManager::new(&uow)?.update(&id, payload).await?;
    uow.commit().await?;
    Ok(Json(doctor))
}

#[instrument(skip(uow))]
pub async fn delete_doctor(uow: UnitOfWork, Path(id): Path<String>) -> AppResult<StatusCode> {
    if !DoctorManager::new(&uow)?.delete(&id).await? {
        return Err(AppError::not_found(EntityKind::Doctor, &id));
    }
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

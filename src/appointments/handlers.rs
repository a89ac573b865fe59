use axum::{
    extract::{Path, Query},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        AppointmentQuery, AppointmentResponse, CreateAppointmentRequest, UpdateAppointmentRequest,
    },
    services::AppointmentManager,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    store::{EntityKind, UnitOfWork},
};

pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/appointments", post(create_appointment).get(list_appointments))
        .route(
            "/appointments/:id",
            get(get_appointment)
                .patch(update_appointment)
                .delete(delete_appointment),
        )
        .route("/appointments/:id/cancel", post(cancel_appointment))
        .route("/appointments/:id/complete", post(complete_appointment))
}

#[instrument(skip(uow, payload))]
pub async fn create_appointment(
    uow: UnitOfWork,
    Json(payload): Json<CreateAppointmentRequest>,
) -> AppResult<(StatusCode, Json<AppointmentResponse>)> {
    let appt = AppointmentManager::new(&uow)?.create(payload).await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(appt)))
}

#[instrument(skip(uow))]
pub async fn list_appointments(
    uow: UnitOfWork,
    Query(query): Query<AppointmentQuery>,
) -> AppResult<Json<Vec<AppointmentResponse>>> {
    Ok(Json(AppointmentManager::new(&uow)?.list(query).await?))
}

#[instrument(skip(uow))]
pub async fn get_appointment(
    uow: UnitOfWork,
    Path(id): Path<String>,
) -> AppResult<Json<AppointmentResponse>> {
    Ok(Json(AppointmentManager::new(&uow)?.get(&id).await?))
}

#[instrument(skip(uow, payload))]
pub async fn update_appointment(
    uow: UnitOfWork,
    Path(id): Path<String>,
    Json(payload): Json<UpdateAppointmentRequest>,
) -> AppResult<Json<AppointmentResponse>> {
    let appt = AppointmentManager::new(&uow)?.update(&id, payload).await?;
    uow.commit().await?;
    Ok(Json(appt))
}

#[instrument(skip(uow))]
pub async fn delete_appointment(
    uow: UnitOfWork,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if !AppointmentManager::new(&uow)?.delete(&id).await? {
        return Err(AppError::not_found(EntityKind::Appointment, &id));
    }
    uow.commit().await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(uow))]
pub async fn cancel_appointment(
    uow: UnitOfWork,
    Path(id): Path<String>,
) -> AppResult<Json<AppointmentResponse>> {
    let appt = AppointmentManager::new(&uow)?.cancel(&id).await?;
    uow.commit().await?;
    Ok(Json(appt))
}

#[instrument(skip(uow))]
pub async fn complete_appointment(
    uow: UnitOfWork,
    Path(id): Path<String>,
) -> AppResult<Json<AppointmentResponse>> {
    let appt = AppointmentManager::new(&uow)?.complete(&id).await?;
    uow.commit().await?;
    Ok(Json(appt))
}

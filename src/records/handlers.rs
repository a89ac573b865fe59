use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{CreateRecordRequest, RecordQuery, RecordResponse, UpdateRecordRequest, UploadRequest},
    services::{delete_and_commit, upload_and_commit, RecordManager},
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    store::{EntityKind, UnitOfWork},
};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/records", post(create_record).get(list_records))
        .route(
            "/records/upload",
            post(upload_record).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/records/:id",
            get(get_record).patch(update_record).delete(delete_record),
        )
        .route("/records/:id/file", get(download_record_file))
}

#[instrument(skip(state, uow, payload))]
pub async fn create_record(
    State(state): State<AppState>,
    uow: UnitOfWork,
    Json(payload): Json<CreateRecordRequest>,
) -> AppResult<(StatusCode, Json<RecordResponse>)> {
    let record = RecordManager::new(&uow, state.storage.clone())?
        .create(payload)
        .await?;
    uow.commit().await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /records/upload (multipart)
/// Parts: `file` (required), `user_id` (required), `doctor_id`, `category`, `title`.
#[instrument(skip(state, uow, mp))]
pub async fn upload_record(
    State(state): State<AppState>,
    uow: UnitOfWork,
    mut mp: Multipart,
) -> AppResult<(StatusCode, Json<RecordResponse>)> {
    let bad_part = |e: axum::extract::multipart::MultipartError| {
        warn!(error = %e, "malformed multipart body");
        AppError::Validation(format!("Malformed multipart body: {e}"))
    };

    let mut file = None;
    let mut user_id = None;
    let mut doctor_id = None;
    let mut category = None;
    let mut title = None;

    while let Some(field) = mp.next_field().await.map_err(bad_part)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let body = field.bytes().await.map_err(bad_part)?;
                file = Some((file_name, content_type, body));
            }
            "user_id" => user_id = Some(field.text().await.map_err(bad_part)?),
            "doctor_id" => doctor_id = Some(field.text().await.map_err(bad_part)?),
            "category" => category = Some(field.text().await.map_err(bad_part)?),
            "title" => title = Some(field.text().await.map_err(bad_part)?),
            _ => {}
        }
    }

    let Some((file_name, content_type, body)) = file else {
        return Err(AppError::Validation("Missing `file` part".into()));
    };
    let Some(user_id) = user_id.filter(|u| !u.trim().is_empty()) else {
        return Err(AppError::Validation("Missing `user_id` part".into()));
    };

    let record = upload_and_commit(
        uow,
        state.storage.clone(),
        UploadRequest {
            user_id,
            doctor_id: doctor_id.filter(|d| !d.is_empty()),
            category: category.filter(|c| !c.is_empty()),
            title: title.filter(|t| !t.is_empty()),
            file_name,
            content_type,
            body,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[instrument(skip(state, uow))]
pub async fn list_records(
    State(state): State<AppState>,
    uow: UnitOfWork,
    Query(query): Query<RecordQuery>,
) -> AppResult<Json<Vec<RecordResponse>>> {
    Ok(Json(
        RecordManager::new(&uow, state.storage.clone())?
            .list(query)
            .await?,
    ))
}

#[instrument(skip(state, uow))]
pub async fn get_record(
    State(state): State<AppState>,
    uow: UnitOfWork,
    Path(id): Path<String>,
) -> AppResult<Json<RecordResponse>> {
    Ok(Json(
        RecordManager::new(&uow, state.storage.clone())?
            .get(&id)
            .await?,
    ))
}

#[instrument(skip(state, uow))]
pub async fn download_record_file(
    State(state): State<AppState>,
    uow: UnitOfWork,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let (body, content_type) = RecordManager::new(&uow, state.storage.clone())?
        .read_file(&id)
        .await?;
    Ok(([(header::CONTENT_TYPE, content_type)], body))
}

#[instrument(skip(state, uow, payload))]
pub async fn update_record(
    State(state): State<AppState>,
    uow: UnitOfWork,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRecordRequest>,
) -> AppResult<Json<RecordResponse>> {
    let record = RecordManager::new(&uow, state.storage.clone())?
        .update(&id, payload)
        .await?;
    uow.commit().await?;
    Ok(Json(record))
}

#[instrument(skip(state, uow))]
pub async fn delete_record(
    State(state): State<AppState>,
    uow: UnitOfWork,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    if !delete_and_commit(uow, state.storage.clone(), &id).await? {
        return Err(AppError::not_found(EntityKind::Record, &id));
    }
    Ok(StatusCode::NO_CONTENT)
}

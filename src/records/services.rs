use std::sync::Arc;

use bytes::Bytes;
use serde_json::json;
use tracing::{error, info, warn};

use super::{
    dto::{CreateRecordRequest, RecordQuery, RecordResponse, UpdateRecordRequest, UploadRequest},
    parser::RecordParser,
    repo_types::Record,
};
use crate::{
    error::{AppError, AppResult},
    manager::{require_related, ResourceManager},
    parser::Parser,
    storage::StorageClient,
    store::{Filter, UnitOfWork},
    users::repo_types::User,
};

/// Upload types accepted for records, and the extension stored with them.
pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "application/pdf" => Some("pdf"),
        "text/plain" => Some("txt"),
        _ => None,
    }
}

pub fn mime_from_key(key: &str) -> &'static str {
    match key.rsplit_once('.').map(|(_, ext)| ext) {
        Some("jpg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// `text/plain; charset=utf-8` -> `text/plain`
fn base_mime(ct: &str) -> String {
    ct.split(';').next().unwrap_or_default().trim().to_lowercase()
}

fn storage_err(e: anyhow::Error) -> AppError {
    error!(error = %format!("{e:#}"), "object storage failure");
    AppError::Storage(format!("{e:#}"))
}

pub struct RecordManager<'a> {
    uow: &'a UnitOfWork,
    records: ResourceManager<RecordParser>,
    storage: Arc<dyn StorageClient>,
}

impl<'a> RecordManager<'a> {
    pub fn new(uow: &'a UnitOfWork, storage: Arc<dyn StorageClient>) -> AppResult<Self> {
        Ok(Self {
            uow,
            records: ResourceManager::open(uow)?,
            storage,
        })
    }

    pub async fn create(&self, req: CreateRecordRequest) -> AppResult<RecordResponse> {
        require_related::<User>(self.uow, &req.user_id).await?;
        self.records.create(req).await
    }

    /// Stores the file first, then the record pointing at it. The file is
    /// removed again when the record cannot be persisted.
    pub async fn upload(&self, req: UploadRequest) -> AppResult<RecordResponse> {
        let content_type = base_mime(&req.content_type);
        let Some(ext) = ext_from_mime(&content_type) else {
            warn!(%content_type, "unsupported upload type");
            return Err(AppError::Validation(format!(
                "Unsupported file type `{content_type}`"
            )));
        };
        if req.body.is_empty() {
            return Err(AppError::Validation("Uploaded file is empty".into()));
        }
        require_related::<User>(self.uow, &req.user_id).await?;

        let metadata = json!({
            "original_filename": req.file_name.clone(),
            "content_type": content_type,
            "size": req.body.len(),
        });
        let mut entity = RecordParser::to_entity(CreateRecordRequest {
            user_id: req.user_id,
            doctor_id: req.doctor_id,
            category: req.category,
            title: req.title.or(req.file_name),
            content: None,
            file_path: None,
            metadata: Some(metadata),
        })?;
        let key = format!("records/{}/{}.{}", entity.user_id, entity.id, ext);
        entity.file_path = Some(key.clone());

        self.storage
            .put_object(&key, req.body, &content_type)
            .await
            .map_err(storage_err)?;

        match self.records.insert(entity).await {
            Ok(record) => {
                info!(record_id = %record.id, %key, "record file uploaded");
                Ok(RecordParser::to_response(record))
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.delete_object(&key).await {
                    warn!(error = %cleanup, %key, "orphaned upload could not be removed");
                }
                Err(e)
            }
        }
    }

    pub async fn get(&self, id: &str) -> AppResult<RecordResponse> {
        self.records.get(id).await
    }

    pub async fn fetch(&self, id: &str) -> AppResult<Record> {
        self.records.fetch(id).await
    }

    pub async fn list(&self, query: RecordQuery) -> AppResult<Vec<RecordResponse>> {
        let filter = Filter::new()
            .eq_opt("user_id", query.user_id)
            .eq_opt("doctor_id", query.doctor_id)
            .eq_opt("category", query.category);
        self.records.list(&filter).await
    }

    pub async fn list_by_user(&self, user_id: &str) -> AppResult<Vec<RecordResponse>> {
        self.records
            .list(&Filter::new().eq("user_id", user_id))
            .await
    }

    pub async fn update(&self, id: &str, req: UpdateRecordRequest) -> AppResult<RecordResponse> {
        self.records.update(id, req).await
    }

    /// Bytes of the attached file and their content type.
    pub async fn read_file(&self, id: &str) -> AppResult<(Bytes, &'static str)> {
        let record = self.records.fetch(id).await?;
        let Some(key) = record.file_path else {
            return Err(AppError::NotFound(format!("Record {id} has no file")));
        };
        let body = self.storage.get_object(&key).await.map_err(storage_err)?;
        Ok((body, mime_from_key(&key)))
    }

    /// Removes the row and hands back what was removed. The file stays until
    /// the deletion is committed, see [`delete_and_commit`].
    pub async fn delete(&self, id: &str) -> AppResult<Option<Record>> {
        let Some(record) = self.records.find(id).await? else {
            return Ok(None);
        };
        if !self.records.delete(id).await? {
            return Ok(None);
        }
        Ok(Some(record))
    }
}

async fn discard_file(storage: &dyn StorageClient, key: &str) {
    if let Err(e) = storage.delete_object(key).await {
        warn!(error = %e, %key, "record file not removed");
    }
}

/// Uploads a file as a new record and commits. A failed commit removes the
/// stored object again.
pub async fn upload_and_commit(
    uow: UnitOfWork,
    storage: Arc<dyn StorageClient>,
    req: UploadRequest,
) -> AppResult<RecordResponse> {
    let record = RecordManager::new(&uow, storage.clone())?.upload(req).await?;
    if let Err(e) = uow.commit().await {
        error!(error = %e, record_id = %record.id, "upload commit failed");
        if let Some(key) = &record.file_path {
            discard_file(storage.as_ref(), key).await;
        }
        return Err(e.into());
    }
    Ok(record)
}

/// Deletes a record and commits. Its file is removed only once the deletion
/// is durable; a file that cannot be removed is logged.
pub async fn delete_and_commit(
    uow: UnitOfWork,
    storage: Arc<dyn StorageClient>,
    id: &str,
) -> AppResult<bool> {
    let Some(removed) = RecordManager::new(&uow, storage.clone())?.delete(id).await? else {
        return Ok(false);
    };
    uow.commit().await?;
    if let Some(key) = removed.file_path {
        discard_file(storage.as_ref(), &key).await;
    }
    Ok(true)
}

use std::sync::Arc;

use bytes::Bytes;
use serde_json::json;
use tokio::task;
use tracing::{info, warn};

use super::{
    dto::{AiResultQuery, AiResultResponse, CreateAiResultRequest, UpdateAiResultRequest},
    parser::AiResultParser,
    session::DocumentSession,
    summarize::SummaryMode,
};
use crate::{
    error::{AppError, AppResult},
    manager::{require_related, ResourceManager},
    records::{repo_types::Record, services::RecordManager},
    state::AppState,
    store::{Filter, UnitOfWork},
    users::repo_types::User,
};

pub struct AiResultManager<'a> {
    uow: &'a UnitOfWork,
    results: ResourceManager<AiResultParser>,
}

impl<'a> AiResultManager<'a> {
    pub fn new(uow: &'a UnitOfWork) -> AppResult<Self> {
        Ok(Self {
            uow,
            results: ResourceManager::open(uow)?,
        })
    }

    pub async fn create(&self, req: CreateAiResultRequest) -> AppResult<AiResultResponse> {
        require_related::<User>(self.uow, &req.user_id).await?;
        self.results.create(req).await
    }

    pub async fn get(&self, id: &str) -> AppResult<AiResultResponse> {
        self.results.get(id).await
    }

    pub async fn list(&self, query: AiResultQuery) -> AppResult<Vec<AiResultResponse>> {
        self.results
            .list(&Filter::new().eq_opt("user_id", query.user_id))
            .await
    }

    pub async fn update(&self, id: &str, req: UpdateAiResultRequest) -> AppResult<AiResultResponse> {
        self.results.update(id, req).await
    }

    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        self.results.delete(id).await
    }
}

/// Record summaries and question answering. Every run is stored as an
/// [`AiResult`](super::repo_types::AiResult) owned by the record's user.
///
/// The service opens its own units of work: one to read the record, closed
/// before any model call, and a fresh one to store the result.
pub struct AiService<'a> {
    state: &'a AppState,
}

impl<'a> AiService<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    async fn load_record(
        &self,
        record_id: &str,
    ) -> AppResult<(Record, Option<(Bytes, &'static str)>)> {
        let uow = self.state.registry.begin().await?;
        let loaded = {
            let records = RecordManager::new(&uow, self.state.storage.clone())?;
            let record = records.fetch(record_id).await?;
            let file = match record.file_path {
                Some(_) => Some(records.read_file(record_id).await?),
                None => None,
            };
            (record, file)
        };
        uow.commit().await?;
        Ok(loaded)
    }

    /// The attached file when there is one, the inline content otherwise.
    async fn open_document(&self, record_id: &str) -> AppResult<(Record, DocumentSession)> {
        let (record, file) = self.load_record(record_id).await?;
        let text = match file {
            Some((bytes, content_type)) => {
                let extractor = Arc::clone(&self.state.extractor);
                task::spawn_blocking(move || extractor.extract(&bytes, content_type))
                    .await
                    .map_err(|e| AppError::Internal(format!("extraction task: {e}")))??
            }
            None => record.content.clone().unwrap_or_default(),
        };

        let llm = &self.state.config.llm;
        let session = DocumentSession::new(&text, llm.chunk_size);
        if session.is_empty() {
            warn!(%record_id, "record has no text");
            return Err(AppError::Validation(
                "No text could be extracted from the record".into(),
            ));
        }
        if session.chunks().len() > llm.max_chunks {
            warn!(
                %record_id,
                chunks = session.chunks().len(),
                max = llm.max_chunks,
                "record too large for the model"
            );
            return Err(AppError::Validation(format!(
                "Record is too large to process: {} chunks, at most {} allowed",
                session.chunks().len(),
                llm.max_chunks
            )));
        }
        Ok((record, session))
    }

    async fn store_result(&self, req: CreateAiResultRequest) -> AppResult<AiResultResponse> {
        let uow = self.state.registry.begin().await?;
        let result = AiResultManager::new(&uow)?.create(req).await?;
        uow.commit().await?;
        Ok(result)
    }

    pub async fn summarize_record(
        &self,
        record_id: &str,
        mode: SummaryMode,
    ) -> AppResult<AiResultResponse> {
        let (record, session) = self.open_document(record_id).await?;
        let summary = session
            .summarize(self.state.summarizer.as_ref(), mode)
            .await?;

        let result = self
            .store_result(CreateAiResultRequest {
                user_id: record.user_id,
                result: Some(json!({
                    "kind": "summary",
                    "record_id": record.id,
                    "mode": mode,
                    "summary": summary,
                    "metrics": {
                        "word_count": session.word_count(),
                        "character_count": session.char_count(),
                        "chunks": session.chunks().len(),
                    },
                })),
                explanation: Some(format!("{mode} summary of record {}", record.id)),
            })
            .await?;
        info!(%record_id, result_id = %result.id, %mode, "record summarized");
        Ok(result)
    }

    pub async fn ask_record(&self, record_id: &str, question: &str) -> AppResult<AiResultResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("question is required".into()));
        }
        let (record, session) = self.open_document(record_id).await?;
        let (answer, used) = session
            .ask(self.state.summarizer.as_ref(), question)
            .await?;

        let result = self
            .store_result(CreateAiResultRequest {
                user_id: record.user_id,
                result: Some(json!({
                    "kind": "answer",
                    "record_id": record.id,
                    "question": question,
                    "answer": answer,
                    "chunks_used": used,
                })),
                explanation: Some(format!("answer from {used} excerpts of record {}", record.id)),
            })
            .await?;
        info!(%record_id, result_id = %result.id, "record question answered");
        Ok(result)
    }
}

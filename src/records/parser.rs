use super::{
    dto::{CreateRecordRequest, RecordResponse, UpdateRecordRequest},
    repo_types::{check_lengths, Record, RecordPatch},
};
use crate::parser::{decode_blob, encode_blob, new_id, now, require, ParseError, Parser};

pub struct RecordParser;

impl Parser for RecordParser {
    type Entity = Record;
    type Create = CreateRecordRequest;
    type Update = UpdateRecordRequest;
    type Response = RecordResponse;

    fn to_entity(req: CreateRecordRequest) -> Result<Record, ParseError> {
        check_lengths(req.category.as_deref(), req.title.as_deref()).map_err(|e| {
            ParseError::Invalid {
                field: "record",
                reason: e.to_string(),
            }
        })?;
        Ok(Record {
            id: new_id(),
            user_id: require("user_id", req.user_id)?,
            doctor_id: req.doctor_id,
            category: req.category,
            title: req.title,
            content: req.content,
            file_path: req.file_path,
            metadata: encode_blob("metadata", req.metadata)?,
            created_at: now(),
        })
    }

    fn to_patch(req: UpdateRecordRequest) -> Result<RecordPatch, ParseError> {
        Ok(RecordPatch {
            doctor_id: req.doctor_id,
            category: req.category,
            title: req.title,
            content: req.content,
            file_path: None,
            metadata: encode_blob("metadata", req.metadata)?,
        })
    }

    fn to_response(r: Record) -> RecordResponse {
        RecordResponse {
            metadata: decode_blob("metadata", r.metadata),
            id: r.id,
            user_id: r.user_id,
            doctor_id: r.doctor_id,
            category: r.category,
            title: r.title,
            content: r.content,
            file_path: r.file_path,
            created_at: r.created_at,
        }
    }
}

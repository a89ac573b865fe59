use super::{
    dto::{AiResultResponse, CreateAiResultRequest, UpdateAiResultRequest},
    repo_types::{AiResult, AiResultPatch},
};
use crate::parser::{decode_blob, encode_blob, new_id, now, require, ParseError, Parser};

pub struct AiResultParser;

impl Parser for AiResultParser {
    type Entity = AiResult;
    type Create = CreateAiResultRequest;
    type Update = UpdateAiResultRequest;
    type Response = AiResultResponse;

    fn to_entity(req: CreateAiResultRequest) -> Result<AiResult, ParseError> {
        Ok(AiResult {
            id: new_id(),
            user_id: require("user_id", req.user_id)?,
            result: encode_blob("result", req.result)?,
            explanation: req.explanation,
            created_at: now(),
        })
    }

    fn to_patch(req: UpdateAiResultRequest) -> Result<AiResultPatch, ParseError> {
        Ok(AiResultPatch {
            result: encode_blob("result", req.result)?,
            explanation: req.explanation,
        })
    }

    fn to_response(r: AiResult) -> AiResultResponse {
        AiResultResponse {
            result: decode_blob("result", r.result),
            id: r.id,
            user_id: r.user_id,
            explanation: r.explanation,
            created_at: r.created_at,
        }
    }
}

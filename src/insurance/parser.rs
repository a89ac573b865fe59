use super::{
    dto::{
        ClaimResponse, CreateClaimRequest, CreatePolicyRequest, PolicyResponse,
        UpdateClaimRequest, UpdatePolicyRequest,
    },
    repo_types::{
        check_amounts, check_claim_amount, ClaimPatch, ClaimStatus, InsuranceClaim,
        InsurancePolicy, PolicyPatch,
    },
};
use crate::parser::{
    decode_blob, encode_blob, new_id, now, require, require_opt, ParseError, Parser,
};

pub struct PolicyParser;

impl Parser for PolicyParser {
    type Entity = InsurancePolicy;
    type Create = CreatePolicyRequest;
    type Update = UpdatePolicyRequest;
    type Response = PolicyResponse;

    fn to_entity(req: CreatePolicyRequest) -> Result<InsurancePolicy, ParseError> {
        check_amounts(Some(req.sum_insured), Some(req.premium)).map_err(|e| {
            ParseError::Invalid {
                field: "policy",
                reason: e.to_string(),
            }
        })?;
        Ok(InsurancePolicy {
            id: new_id(),
            patient_id: require("patient_id", req.patient_id)?,
            provider: require("provider", req.provider)?,
            policy_number: require("policy_number", req.policy_number)?,
            sum_insured: req.sum_insured,
            premium: req.premium,
            coverage: encode_blob("coverage", req.coverage)?,
            valid_till: req.valid_till,
            status: req.status,
            created_at: now(),
        })
    }

    fn to_patch(req: UpdatePolicyRequest) -> Result<PolicyPatch, ParseError> {
        Ok(PolicyPatch {
            provider: require_opt("provider", req.provider)?,
            policy_number: require_opt("policy_number", req.policy_number)?,
            sum_insured: req.sum_insured,
            premium: req.premium,
            coverage: encode_blob("coverage", req.coverage)?,
            valid_till: req.valid_till,
            status: req.status,
        })
    }

    fn to_response(p: InsurancePolicy) -> PolicyResponse {
        PolicyResponse {
            coverage: decode_blob("coverage", p.coverage),
            id: p.id,
            patient_id: p.patient_id,
            provider: p.provider,
            policy_number: p.policy_number,
            sum_insured: p.sum_insured,
            premium: p.premium,
            valid_till: p.valid_till,
            status: p.status,
            created_at: p.created_at,
        }
    }
}

pub struct ClaimParser;

impl Parser for ClaimParser {
    type Entity = InsuranceClaim;
    type Create = CreateClaimRequest;
    type Update = UpdateClaimRequest;
    type Response = ClaimResponse;

    fn to_entity(req: CreateClaimRequest) -> Result<InsuranceClaim, ParseError> {
        check_claim_amount(req.amount).map_err(|e| ParseError::Invalid {
            field: "amount",
            reason: e.to_string(),
        })?;
        Ok(InsuranceClaim {
            id: new_id(),
            policy_id: require("policy_id", req.policy_id)?,
            patient_id: require("patient_id", req.patient_id)?,
            amount: req.amount,
            description: req.description,
            status: ClaimStatus::Submitted,
            processing: None,
            processed_at: None,
            created_at: now(),
        })
    }

    fn to_patch(req: UpdateClaimRequest) -> Result<ClaimPatch, ParseError> {
        Ok(ClaimPatch {
            amount: req.amount,
            description: req.description,
            ..Default::default()
        })
    }

    fn to_response(c: InsuranceClaim) -> ClaimResponse {
        ClaimResponse {
            processing: decode_blob("processing", c.processing),
            id: c.id,
            policy_id: c.policy_id,
            patient_id: c.patient_id,
            amount: c.amount,
            description: c.description,
            status: c.status,
            processed_at: c.processed_at,
            created_at: c.created_at,
        }
    }
}

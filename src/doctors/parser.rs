use super::{
    dto::{CreateDoctorRequest, DoctorResponse, UpdateDoctorRequest},
    repo_types::{Doctor, DoctorPatch},
};
use crate::parser::{new_id, now, require, require_opt, ParseError, Parser};

pub struct DoctorParser;

impl Parser for DoctorParser {
    type Entity = Doctor;
    type Create = CreateDoctorRequest;
    type Update = UpdateDoctorRequest;
    type Response = DoctorResponse;

    fn to_entity(req: CreateDoctorRequest) -> Result<Doctor, ParseError> {
        Ok(Doctor {
            id: new_id(),
            user_id: require("user_id", req.user_id)?,
            name: require("name", req.name.unwrap_or_default())?,
            specialization: req.specialization,
            qualifications: req.qualifications,
            languages: req.languages,
            clinic_address: req.clinic_address,
            created_at: now(),
        })
    }

    fn to_patch(req: UpdateDoctorRequest) -> Result<DoctorPatch, ParseError> {
        Ok(DoctorPatch {
            name: require_opt("name", req.name)?,
            specialization: req.specialization,
            qualifications: req.qualifications,
            languages: req.languages,
            clinic_address: req.clinic_address,
        })
    }

    fn to_response(d: Doctor) -> DoctorResponse {
        DoctorResponse {
            id: d.id,
            user_id: d.user_id,
            name: d.name,
            specialization: d.specialization,
            qualifications: d.qualifications,
            languages: d.languages,
            clinic_address: d.clinic_address,
            created_at: d.created_at,
        }
    }
}

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// `name` defaults to the linked user's name.
#[derive(Debug, Deserialize)]
pub struct CreateDoctorRequest {
    pub user_id: String,
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub qualifications: Option<String>,
    pub languages: Option<String>,
    pub clinic_address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub qualifications: Option<String>,
    pub languages: Option<String>,
    pub clinic_address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DoctorQuery {
    pub specialization: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DoctorResponse {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub specialization: Option<String>,
    pub qualifications: Option<String>,
    pub languages: Option<String>,
    pub clinic_address: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

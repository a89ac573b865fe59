use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::repo_types::Role;

/// Request body for creating a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    #[serde(default, with = "crate::dates::iso_date")]
    pub dob: Option<Date>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
}

/// Partial update; `password` is rehashed when present.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    #[serde(default, with = "crate::dates::iso_date")]
    pub dob: Option<Date>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub role: Option<Role>,
    pub email: Option<String>,
}

/// Public view of a user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub gender: Option<String>,
    pub age: Option<i32>,
    #[serde(with = "crate::dates::iso_date")]
    pub dob: Option<Date>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

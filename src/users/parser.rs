use time::Date;

use super::{
    dto::UserResponse,
    repo_types::{Role, User, UserPatch},
};
use crate::{
    parser::{new_id, now, require, require_opt, ParseError, Parser},
    validation::normalize_email,
};

/// A user ready to persist; the password is already hashed.
#[derive(Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub dob: Option<Date>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub gender: Option<String>,
    pub age: Option<i32>,
    pub dob: Option<Date>,
    pub blood_group: Option<String>,
    pub address: Option<String>,
}

pub struct UserParser;

impl Parser for UserParser {
    type Entity = User;
    type Create = NewUser;
    type Update = UserChanges;
    type Response = UserResponse;

    fn to_entity(req: NewUser) -> Result<User, ParseError> {
        let email = normalize_email(&require("email", req.email)?);
        Ok(User {
            id: new_id(),
            name: require("name", req.name)?,
            email,
            password_hash: require("password_hash", req.password_hash)?,
            role: req.role,
            gender: req.gender,
            age: req.age,
            dob: req.dob,
            blood_group: req.blood_group,
            address: req.address,
            created_at: now(),
        })
    }

    fn to_patch(req: UserChanges) -> Result<UserPatch, ParseError> {
        Ok(UserPatch {
            name: require_opt("name", req.name)?,
            email: require_opt("email", req.email)?,
            password_hash: req.password_hash,
            role: req.role,
            gender: req.gender,
            age: req.age,
            dob: req.dob,
            blood_group: req.blood_group,
            address: req.address,
        })
    }

    fn to_response(user: User) -> UserResponse {
        UserResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            gender: user.gender,
            age: user.age,
            dob: user.dob,
            blood_group: user.blood_group,
            address: user.address,
            created_at: user.created_at,
        }
    }
}

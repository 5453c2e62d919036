use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Role;

pub mod user;
pub mod course;

#[derive(Deserialize, Serialize, Debug)]
pub struct JWTClaims{
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

/// Identity attached to request extensions by the `protect` middleware.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser{
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser{
    pub fn can_manage_courses(&self) -> bool{
        matches!(self.role, Role::Instructor | Role::Admin)
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SignupResponse{
    pub message: String,
    pub id: String,
}

#[derive(Deserialize, Serialize)]
pub struct EmailAndPassword{
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct SigninResponse{
    pub message: String,
    pub token: String,
}

#[derive(Serialize, Deserialize)]
pub struct MessageResponse{
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct UploadResponse{
    pub url: String,
    pub message: String,
}

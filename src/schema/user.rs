use serde::{Deserialize, Serialize};

use crate::models::user::Role;

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateUser{
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

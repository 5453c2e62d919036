use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::errors::AppError;
use crate::schema::user::CreateUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role")]
pub enum Role {
    #[default]
    Student,
    Instructor,
    Admin,
}

// what signin needs to verify a credential and mint a token
#[derive(Debug, FromRow)]
pub struct AuthRecord {
    pub id: Uuid,
    pub password: String,
    pub role: Role,
}

pub async fn check_user_exists(pool: &Pool<Postgres>, email: &str) -> Result<bool, AppError> {
    let existing: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM user_table WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await?;

    Ok(existing.is_some())
}

/// `user_meta.password` must already be hashed by the caller.
pub async fn create_user(pool: &Pool<Postgres>, user_meta: CreateUser) -> Result<Uuid, AppError> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
            INSERT INTO user_table (id, name, email, password, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(&user_meta.name)
    .bind(&user_meta.email)
    .bind(&user_meta.password)
    .bind(user_meta.role.unwrap_or_default())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(id)
}

pub async fn get_auth_by_email(
    pool: &Pool<Postgres>,
    email: &str,
) -> Result<Option<AuthRecord>, AppError> {
    let record = sqlx::query_as::<_, AuthRecord>(
        "SELECT id, password, role FROM user_table WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

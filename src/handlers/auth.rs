use actix_web::{post, web::{self, Json}, HttpResponse};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};

use crate::{
    errors::AppError,
    models::user::{check_user_exists, create_user, get_auth_by_email},
    schema::{user::CreateUser, EmailAndPassword, JWTClaims, SigninResponse, SignupResponse},
    utils::{hash_password, verify_password},
    GlobalState,
};

#[post("/signup")]
pub async fn signup_user(
    data: web::Data<GlobalState>,
    user: Json<CreateUser>,
) -> Result<HttpResponse, AppError> {
    let pool = &data.pool;

    if check_user_exists(pool, &user.email).await? {
        return Err(AppError::BadRequest(
            "User exists already with this email".to_string(),
        ));
    }

    let password_hash =
        hash_password(&user.password).map_err(|_e| AppError::Internal)?;

    let user_meta = CreateUser {
        name: user.name.clone(),
        email: user.email.clone(),
        password: password_hash,
        role: user.role,
    };

    let id = create_user(pool, user_meta).await?;

    Ok(HttpResponse::Created().json(SignupResponse {
        message: String::from("Signed up successfully"),
        id: id.to_string(),
    }))
}

#[post("/signin")]
pub async fn signin_user(
    data: web::Data<GlobalState>,
    user_data: web::Json<EmailAndPassword>,
) -> Result<HttpResponse, AppError> {
    let pool = &data.pool;

    // same 400 whether the account is missing or the password is wrong
    let record = get_auth_by_email(pool, &user_data.email)
        .await?
        .ok_or_else(|| AppError::BadRequest("Signup first".to_string()))?;

    verify_password(&user_data.password, &record.password)
        .map_err(|_e| AppError::BadRequest("Enter a valid password".to_string()))?;

    let jwt_secret = std::env::var("JWT_SECRET").map_err(|_e| AppError::Internal)?;

    let tomorrow = Utc::now() + Duration::days(1);

    let claims = JWTClaims {
        sub: record.id.to_string(),
        role: record.role,
        exp: tomorrow.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|_e| AppError::Internal)?;

    Ok(HttpResponse::Ok().json(SigninResponse {
        message: String::from("Signed in successfully"),
        token,
    }))
}

use std::path::Path;

use actix_multipart::Multipart;
use actix_web::{post, HttpResponse};
use chrono::Utc;
use futures_util::TryStreamExt;

use crate::{errors::AppError, schema::UploadResponse};

const ALLOWED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
const ALLOWED_CONTENT_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

// both the filename extension and the declared content type must pass
fn allowed_image(filename: &str, content_type: Option<&str>) -> bool {
    let ext_ok = extension(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);

    let type_ok = content_type
        .map(|ct| ALLOWED_CONTENT_TYPES.contains(&ct))
        .unwrap_or(false);

    ext_ok && type_ok
}

fn bad_upload(e: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(e.to_string())
}

#[post("")]
pub async fn upload_course_image(mut payload: Multipart) -> Result<HttpResponse, AppError> {
    let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_e| "uploads".to_string());

    let mut saved_url: Option<String> = None;

    while let Some(mut field) = payload.try_next().await.map_err(bad_upload)? {
        let (field_name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_string),
                cd.get_filename().map(str::to_string),
            ),
            None => (None, None),
        };
        let content_type = field.content_type().map(|mime| mime.essence_str().to_string());

        if field_name.as_deref() != Some("image") {
            // drain unknown fields
            while (field.try_next().await.map_err(bad_upload)?).is_some() {}
            continue;
        }

        let filename = filename
            .ok_or_else(|| AppError::BadRequest("No file attached".to_string()))?;

        // rejected before any bytes hit the disk
        if !allowed_image(&filename, content_type.as_deref()) {
            return Err(AppError::BadRequest(
                "Images only! (jpg, jpeg, png)".to_string(),
            ));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(bad_upload)? {
            bytes.extend_from_slice(&chunk);
        }

        // field name plus a timestamp keeps stored names collision-free
        let stored_name = format!(
            "image-{}.{}",
            Utc::now().timestamp_millis(),
            extension(&filename).unwrap_or_else(|| "jpg".to_string()),
        );

        tokio::fs::create_dir_all(&upload_dir)
            .await
            .map_err(|_e| AppError::Internal)?;
        tokio::fs::write(format!("{}/{}", upload_dir, stored_name), &bytes)
            .await
            .map_err(|_e| AppError::Internal)?;

        saved_url = Some(format!("/uploads/{}", stored_name));
    }

    let url = saved_url.ok_or_else(|| AppError::BadRequest("No file attached".to_string()))?;

    Ok(HttpResponse::Ok().json(UploadResponse {
        url,
        message: String::from("Image uploaded"),
    }))
}

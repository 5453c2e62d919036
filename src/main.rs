use actix_files::Files;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use errors::AppError;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

mod errors;
mod handlers;
mod middlewares;
mod models;
mod schema;
#[cfg(test)]
mod test_init_app;
mod utils;

struct GlobalState{
    pool: Pool<Postgres>
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {

    dotenv().ok();
    env_logger::init();

    let port = std::env::var("PORT").unwrap_or_else(|_e| "8080".to_string());
    let address = format!("0.0.0.0:{}", port);
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let upload_dir = std::env::var("UPLOAD_DIR").unwrap_or_else(|_e| "uploads".to_string());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .map_err(|_e| AppError::DbConnect)?;

    tokio::fs::create_dir_all(&upload_dir)
        .await
        .map_err(|_e| AppError::ServerStart)?;

    let global_state = GlobalState{pool};

    let app_data = web::Data::new(global_state);

    log::info!("The server is running at {}", address);

    HttpServer::new(move || {
        App::new()
            .app_data(app_data.clone())
            .wrap(actix_cors::Cors::permissive())
            .service(Files::new("/uploads", upload_dir.as_str()))
            .configure(handlers::configure)
            .default_service(web::route().to(handlers::not_found))
    })
    .bind(address)
    .map_err(|_e| AppError::SocketBind)?
    .run()
    .await
    .map_err(|_e| AppError::ServerStart)?;

    Ok(())
}

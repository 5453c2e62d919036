use actix_web::{test, web, App, dev::ServiceResponse, Error};
use actix_service::Service;
use actix_http::Request;
use dotenv::dotenv;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::{handlers, GlobalState};

pub async fn init() -> (
    impl Service<Request, Response = ServiceResponse, Error = Error>,
    Pool<Postgres>,
) {
    dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Cant connect to the database");

    let global_state = GlobalState { pool: pool.clone() };
    let app_data = web::Data::new(global_state);

    let app = test::init_service(
        App::new()
            .app_data(app_data)
            .configure(handlers::configure)
            .default_service(web::route().to(handlers::not_found)),
    )
    .await;

    (app, pool)
}

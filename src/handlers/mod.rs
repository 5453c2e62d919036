pub mod auth;
pub mod course;
pub mod upload;

use actix_web::{guard, middleware::from_fn, web, HttpRequest, HttpResponse};

use crate::errors::CustomError;
use crate::middlewares;

/// Route table, shared by the server and the test harness.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/users")
                    .service(auth::signup_user)
                    .service(auth::signin_user),
            )
            // literal course paths go first, else /{id} would swallow them
            .service(
                web::scope("/courses/upload")
                    .wrap(from_fn(middlewares::auth::protect))
                    .service(upload::upload_course_image),
            )
            .service(
                web::scope("/courses/mycourses")
                    // wraps run in reverse registration order, protect first
                    .wrap(from_fn(middlewares::auth::require_instructor))
                    .wrap(from_fn(middlewares::auth::protect))
                    .service(course::my_courses_handler),
            )
            // the catalog reads are public; the same paths behind other
            // methods fall through the guard into the protected scope below
            .service(
                web::scope("/courses")
                    .guard(guard::Get())
                    .service(course::list_courses_handler)
                    .service(course::get_course_handler),
            )
            .service(
                web::scope("/courses")
                    .wrap(from_fn(middlewares::auth::protect))
                    .service(course::create_course_handler)
                    .service(course::update_course_handler)
                    .service(course::delete_course_handler),
            ),
    );
}

pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(CustomError::new(format!("Not Found - {}", req.path())))
}

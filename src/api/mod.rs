use actix_web::web;

pub mod handlers;
use handlers::{get_controls, get_view, index, post_view, robots};

pub use handlers::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/robots.txt", web::get().to(robots))
        .service(
            web::scope("/api")
                .route("/controls", web::get().to(get_controls))
                .route("/view", web::get().to(get_view))
                .route("/view", web::post().to(post_view)),
        );
}

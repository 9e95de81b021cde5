use actix_web::web;
use crate::web::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/models", web::get().to(handlers::list_models))
            .route("/models/{id}", web::get().to(handlers::get_model))
            .route("/categories", web::get().to(handlers::categories))
            .route("/trending", web::get().to(handlers::trending))
            .route("/recommendations", web::get().to(handlers::recommendations))
            .route("/chat", web::post().to(handlers::chat))
            .route("/chat/{session_id}", web::get().to(handlers::chat_log))
            .route("/generate", web::post().to(handlers::generate))
    )
    .route("/", web::get().to(handlers::index))
    .route("/health", web::get().to(handlers::health_check));
}

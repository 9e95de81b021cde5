use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use log::{debug, error, info, warn};
use serde_json::json;
use tera::Context;
use uuid::Uuid;

use crate::catalog::match_models;
use crate::model::GenerateError;
use crate::web::models::{
    ChatLogResponse, ChatRequest, ChatResponse, GenerateRequest, GenerateResponse,
    RecommendationQuery,
};
use crate::web::session::SessionError;
use crate::AppState;

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "error": message.to_string() }))
}

fn session_error(e: SessionError) -> HttpResponse {
    match e {
        SessionError::Busy => error_response(StatusCode::CONFLICT, e),
        SessionError::Poisoned => error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
    }
}

// Index page handler
pub async fn index(data: web::Data<AppState>) -> impl Responder {
    let mut context = Context::new();
    context.insert("models", data.catalog.records());
    context.insert("categories", &data.catalog.category_summaries());
    context.insert("trending", &data.catalog.trending());

    match data.tera.render("index.html", &context) {
        Ok(html) => HttpResponse::Ok().content_type("text/html").body(html),
        Err(e) => {
            error!("Template error: {}", e);
            HttpResponse::InternalServerError().body("Template error")
        }
    }
}

// Health check endpoint
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

pub async fn list_models(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(data.catalog.records())
}

pub async fn get_model(data: web::Data<AppState>, id: web::Path<String>) -> impl Responder {
    match data.catalog.get(&id) {
        Some(model) => HttpResponse::Ok().json(model),
        None => error_response(StatusCode::NOT_FOUND, format!("Unknown model '{}'", id)),
    }
}

pub async fn categories(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(data.catalog.category_summaries())
}

pub async fn trending(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(data.catalog.trending())
}

pub async fn recommendations(
    data: web::Data<AppState>,
    query: web::Query<RecommendationQuery>,
) -> impl Responder {
    let fields = [&query.use_case, &query.budget, &query.specificity];
    if fields.iter().any(|field| field.trim().is_empty()) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "use_case, budget and specificity must not be empty",
        );
    }

    let matches = match_models(&data.catalog, &query.use_case, &query.budget, &query.specificity);
    info!(
        "Recommendation query ({}, {}, {}) matched {} model(s)",
        query.use_case,
        query.budget,
        query.specificity,
        matches.len()
    );
    HttpResponse::Ok().json(matches)
}

// Conversation endpoint: one answer per request
pub async fn chat(data: web::Data<AppState>, req: web::Json<ChatRequest>) -> impl Responder {
    let catalog = &data.catalog;
    let result = data.sessions.with_chat(req.session_id, |session| {
        let appended = session.submit(catalog, &req.message).to_vec();
        (appended, session.state().step)
    });

    match result {
        Ok((session_id, (messages, step))) => {
            if messages.is_empty() {
                debug!("Ignoring blank chat message for session {}", session_id);
            } else {
                info!("Chat answer from session {} (now at step {})", session_id, step.index());
            }
            HttpResponse::Ok().json(ChatResponse {
                session_id,
                messages,
                step,
                quick_replies: step.quick_replies(),
            })
        }
        Err(e) => session_error(e),
    }
}

pub async fn chat_log(data: web::Data<AppState>, session_id: web::Path<Uuid>) -> impl Responder {
    let session_id = session_id.into_inner();
    let result = data.sessions.read_chat(session_id, |session| {
        (session.messages().to_vec(), session.state().step)
    });

    match result {
        Ok(Some((messages, step))) => HttpResponse::Ok().json(ChatLogResponse {
            session_id,
            messages,
            step,
            quick_replies: step.quick_replies(),
        }),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("Unknown session {}", session_id)),
        Err(e) => session_error(e),
    }
}

// Free-text recommendation through the generation service
pub async fn generate(data: web::Data<AppState>, req: web::Json<GenerateRequest>) -> impl Responder {
    if req.prompt.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, GenerateError::EmptyPrompt);
    }

    let in_flight = match data.sessions.begin_generation(req.session_id) {
        Ok(guard) => guard,
        Err(e) => {
            warn!("Rejected generation request: {}", e);
            return session_error(e);
        }
    };
    let session_id = in_flight.session_id();
    info!("Generation request from session {}", session_id);

    match data.generator.generate(&req.prompt, &data.catalog).await {
        Ok(output) => HttpResponse::Ok().json(GenerateResponse { output, session_id }),
        Err(e @ GenerateError::EmptyPrompt) => error_response(StatusCode::BAD_REQUEST, e),
        Err(e) => {
            error!("Generation error for session {}: {}", session_id, e);
            error_response(
                StatusCode::BAD_GATEWAY,
                format!("Failed to generate response: {}", e),
            )
        }
    }
}

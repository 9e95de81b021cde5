mod catalog;
mod config;
mod conversation;
mod model;
mod web;

use actix_web::{App, HttpServer, web::Data};
use actix_files as fs;
use anyhow::Context;
use dotenv::dotenv;
use log::{info, error};
use std::sync::Arc;
use tera::Tera;

use catalog::Catalog;
use config::Config;
use model::GeminiClient;
use web::routes;
use web::session::SessionStore;

// App state structure
struct AppState {
    tera: Tera,
    catalog: Catalog,
    generator: GeminiClient,
    sessions: Arc<SessionStore>,
}

fn bootstrap(config: &Config) -> anyhow::Result<AppState> {
    let catalog = Catalog::load(&config.catalog_path)
        .with_context(|| format!("invalid model catalog at {}", config.catalog_path))?;

    let mut tera = Tera::new("templates/**/*").context("template parsing error")?;
    tera.autoescape_on(vec![".html", ".sql"]);

    Ok(AppState {
        tera,
        catalog,
        generator: GeminiClient::new(config.gemini.clone()),
        sessions: Arc::new(SessionStore::new()),
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting model advisor");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = match bootstrap(&config) {
        Ok(state) => Data::new(state),
        Err(e) => {
            error!("Failed to initialize: {:#}", e);
            std::process::exit(1);
        }
    };

    info!("Listening on {}:{}", config.host, config.port);

    // Start web server
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
            .service(fs::Files::new("/static", "./static"))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

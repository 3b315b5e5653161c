use actix_cors::Cors;
use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{http::header, web, App, HttpServer};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::{error, info};
use tracing_actix_web::TracingLogger;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use category_settings::auth::TokenVerifier;
use category_settings::config::AppConfig;
use category_settings::{category, health, openapi};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    // Initialize tracing subscriber for structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(msg) => {
            error!("Invalid configuration: {msg}");
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, msg));
        }
    };

    let verifier = TokenVerifier::new(config.jwt_secret.clone(), config.jwt_audience.clone());
    let allowed_origins = config.allowed_origins.clone();

    // Configure connection pool with production-ready settings
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(3))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            error!("Failed to create pool: {e}");
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e.to_string())
        })?;

    info!(
        "Starting server at http://{}:{}",
        config.bind_address, config.port
    );

    // Rate limiting for category writes: one request per second, bursts of 30
    let write_governor_config = GovernorConfigBuilder::default()
        .seconds_per_request(1)
        .burst_size(30)
        .finish()
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Failed to create rate limiter config",
            )
        })?;

    HttpServer::new(move || {
        let allowed_origins = allowed_origins.clone();

        // Configure CORS
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origin_str = origin.to_str().unwrap_or("");
                allowed_origins.iter().any(|allowed| allowed == origin_str)
            })
            .allowed_methods(vec!["GET", "POST", "PATCH", "OPTIONS"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            // Middleware (order matters: outer to inner)
            .wrap(TracingLogger::default())
            .wrap(cors)
            // Shared state
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(verifier.clone()))
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
            )
            // Health endpoint (no rate limiting)
            .service(health::health_check)
            // Category reads
            .service(category::list_categories)
            .service(category::get_category)
            // Category writes with rate limiting (must be last to avoid catching all routes)
            .service(
                web::scope("")
                    .wrap(Governor::new(&write_governor_config))
                    .service(category::reorder_categories)
                    .service(category::create_category)
                    .service(category::update_category),
            )
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use storage::Database;
use storage::repository::sports::PgSportSource;
use storage::services::sport_registry::SportRegistry;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod features;
mod middleware;
mod state;

use config::Config;
use middleware::auth::ApiKeys;
use state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::matches::handlers::submit_match,
        features::matches::handlers::list_pending,
        features::matches::handlers::get_match,
        features::matches::handlers::confirm_match,
        features::matches::handlers::deny_match,
        features::matches::handlers::cancel_match,
        features::admin::handlers::revert_match,
        features::admin::handlers::edit_match,
        features::admin::handlers::ban_user,
        features::admin::handlers::unban_user,
        features::admin::handlers::override_rating,
        features::admin::handlers::invalidate_sport_cache,
        features::leaderboard::handlers::get_leaderboard,
        features::sports::handlers::list_sports,
    ),
    components(
        schemas(
            storage::dto::matches::SubmitMatchRequest,
            storage::dto::matches::EditMatchRequest,
            storage::dto::matches::MatchResponse,
            storage::dto::matches::RevertResponse,
            storage::dto::admin::RatingOverrideRequest,
            storage::dto::leaderboard::LeaderboardEntry,
            storage::dto::common::PaginationMeta,
            storage::models::MatchStatus,
            storage::models::MatchRatings,
            storage::models::PlayerRating,
            storage::models::SportConfig,
            storage::models::User,
        )
    ),
    tags(
        (name = "matches", description = "Match reporting and confirmation"),
        (name = "admin", description = "Moderation endpoints"),
        (name = "leaderboard", description = "Public leaderboard endpoints"),
        (name = "sports", description = "Public sport configuration"),
    ),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}

fn app(state: AppState, api_keys: ApiKeys) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .nest("/api/matches", features::matches::routes::routes(api_keys.clone()))
        .nest("/api/admin", features::admin::routes::routes(api_keys))
        .nest("/api/leaderboard", features::leaderboard::routes::routes())
        .nest("/api/sports", features::sports::routes::routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting match rating API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    tracing::info!(
        "Connecting to database at: {}",
        config
            .database_url
            .split('@')
            .next_back()
            .unwrap_or("unknown")
    );
    let db = Database::with_max_connections(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to initialize database")?;
    tracing::info!("Database connection established");

    tracing::info!("Running database migrations");
    db.run_migrations()
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed successfully");

    let sports = SportRegistry::new(PgSportSource::new(db.pool().clone()))
        .with_ttl(config.sport_cache_ttl)
        .with_default_k_factor(config.default_k_factor);
    tracing::info!(
        ttl_secs = config.sport_cache_ttl.as_secs(),
        default_k_factor = config.default_k_factor,
        "Sport registry configured"
    );

    let api_keys = ApiKeys::from_comma_separated(&config.api_keys);
    if api_keys.is_empty() {
        tracing::warn!("API_KEYS is empty, every protected route will reject requests");
    }

    let state = AppState::new(db, Arc::new(sports));

    let bind_address = format!("{}:{}", config.host, config.port);
    tracing::info!("Starting server at http://{}", bind_address);

    tracing::info!(
        "Swagger UI available at http://{}/swagger-ui/",
        bind_address
    );

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    axum::serve(listener, app(state, api_keys)).await?;

    Ok(())
}

//! Sales Race Backend
//!
//! Division rosters for the sales race dashboard, backed by Supabase.

mod api;
mod auth;
mod config;
mod errors;
mod models;
mod roster;
mod store;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use roster::RosterController;
use store::{MemoryStore, RemoteStore, SupabaseStore, TeamService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub roster: Arc<RosterController>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Sales Race Backend");
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (RACE_API_PSK). Authentication is disabled!");
    }

    let store: Arc<dyn RemoteStore> = match config.supabase() {
        Some((url, key)) => {
            tracing::info!(url, table = %config.members_table, "Using Supabase store");
            Arc::new(SupabaseStore::new(url, key, &config.members_table))
        }
        None => {
            tracing::warn!("SUPABASE_URL or SUPABASE_API_KEY not set; using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let roster = RosterController::new(TeamService::new(store), config.celebration_window);
    let state = AppState {
        roster: Arc::new(roster),
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_psk = state.config.api_psk.clone();
    let legacy_psk = api_psk.clone();

    let api_routes = Router::new()
        // Divisions
        .route("/divisions", get(api::list_divisions))
        .route("/divisions/{id}", get(api::get_division))
        // Roster
        .route("/roster", get(api::get_roster))
        .route(
            "/roster/division",
            put(api::select_division).delete(api::clear_division),
        )
        .route("/roster/refresh", post(api::refresh_roster))
        .route("/roster/summary", get(api::get_summary))
        .route("/roster/leaderboard", get(api::get_leaderboard))
        // Members
        .route("/roster/members", post(api::add_member))
        .route(
            "/roster/members/{id}",
            put(api::edit_member).delete(api::delete_member),
        )
        .route(
            "/roster/members/{id}/fields/{field}",
            patch(api::update_field),
        )
        .route("/roster/members/{id}/stats", post(api::update_stats))
        .route("/roster/members/{id}/points", post(api::adjust_points))
        .route(
            "/roster/members/{id}/activities/{kind}",
            post(api::adjust_activity),
        )
        .layer(middleware::from_fn(move |req, next| {
            auth::require_psk(api_psk.clone(), req, next)
        }));

    let legacy_routes = Router::new()
        .route("/get_team", get(api::get_team))
        .route("/post_sales", post(api::post_sales))
        .route("/post_lead", post(api::post_lead))
        .layer(middleware::from_fn(move |req, next| {
            auth::require_psk(legacy_psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .nest("/legacy", legacy_routes)
        .merge(health_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

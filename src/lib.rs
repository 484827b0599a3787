//! Foodgram: a recipe-sharing backend.
//!
//! Users publish recipes built from a shared ingredient and tag catalog,
//! favorite them, collect them in a shopping cart and follow other authors.
//! The cart folds into a downloadable shopping list.
//!
//! All state lives in one [`storage::Database`] snapshot guarded by
//! [`storage::Storage`], which makes every write a single atomic transaction.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod assets;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod import;
pub mod models;
pub mod recipes;
pub mod relations;
pub mod routes;
pub mod shopping_list;
pub mod state;
pub mod storage;
pub mod user_models;
pub mod user_routes;
pub mod user_storage;

use config::Config;
use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let api = Router::new()
        .route(
            "/users",
            get(user_routes::list_users).post(user_routes::register),
        )
        .route("/users/me", get(user_routes::me))
        .route("/users/set_password", post(user_routes::set_password))
        .route("/users/subscriptions", get(user_routes::subscriptions))
        .route("/users/:id", get(user_routes::get_user))
        .route(
            "/users/:id/subscribe",
            post(user_routes::subscribe).delete(user_routes::unsubscribe),
        )
        .route("/auth/token/login", post(user_routes::login))
        .route("/auth/token/logout", post(user_routes::logout))
        .route("/tags", get(routes::list_tags))
        .route("/tags/:id", get(routes::get_tag))
        .route("/ingredients", get(routes::list_ingredients))
        .route("/ingredients/:id", get(routes::get_ingredient))
        .route(
            "/recipes",
            get(routes::list_recipes).post(routes::create_recipe),
        )
        .route(
            "/recipes/download_shopping_cart",
            get(routes::download_shopping_cart),
        )
        .route(
            "/recipes/:id",
            get(routes::get_recipe)
                .patch(routes::update_recipe)
                .delete(routes::delete_recipe),
        )
        .route(
            "/recipes/:id/favorite",
            post(routes::add_favorite).delete(routes::remove_favorite),
        )
        .route(
            "/recipes/:id/shopping_cart",
            post(routes::add_to_cart).delete(routes::remove_from_cart),
        );

    let media = ServeDir::new(state.assets.root());

    Router::new()
        .nest("/api", api)
        .nest_service("/media", media)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

pub async fn start_server() -> Result<()> {
    init_tracing();

    let config = Config::load()?;
    let address = config.address();

    info!("Initializing state...");
    let state = AppState::new(config)?;
    let router = app(state);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind to {address}"))?;
    info!("Foodgram running on http://{address}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::warn!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

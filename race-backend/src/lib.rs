//! Progress server for the syllabus race.
//!
//! Serves the JSON API under `/api` and the static front end everywhere
//! else. All progress lives in a single JSON file; see [`store`].
//!
//! ```sh
//! RUST_LOG=debug cargo run -p race-backend -- --port 5000 --data-dir ./data
//! ```

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    Router,
    handler::HandlerWithoutStateExt,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use tokio::{
    net::TcpListener,
    signal::{self, ctrl_c},
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
};

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod store;

use config::Config;
use routes::{create_user, get_progress, toggle_unit, update_player};
use state::AppState;

pub fn app(state: Arc<AppState>, public_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/progress", get(get_progress))
        .route("/create-user", post(create_user))
        .route("/toggle-unit", post(toggle_unit))
        .route("/update-player", post(update_player));

    // single-page app: anything that isn't an API route or a real file gets
    // index.html, whatever the method
    let index_html = public_dir.join("index.html");
    let entry_point = move || serve_index(index_html.clone());
    let front_end = ServeDir::new(public_dir)
        .call_fallback_on_method_not_allowed(true)
        .fallback(entry_point.into_service());

    Router::new()
        .nest("/api", api)
        .fallback_service(front_end)
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

async fn serve_index(path: PathBuf) -> Response {
    match tokio::fs::read(&path).await {
        Ok(bytes) => Html(bytes).into_response(),
        Err(e) => {
            log::warn!("Failed to read {}: {e}", path.display());
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

pub async fn start_server(config: Config) -> std::io::Result<()> {
    let state = AppState::from_config(&config);

    // surface an unreadable progress file at startup rather than on the first request
    if let Err(e) = state.store.get_all().await {
        log::error!("Progress file is not usable yet: {e}");
    }

    let app = app(state, &config.public_dir);

    let address = config.address();
    log::info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    log::info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        log::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                log::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                log::error!("Failed to install terminate handler: {e}");
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

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::AppState;

/// Build the axum router with all filechain endpoints.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(
            "/api/files",
            get(handler::list_files_handler).post(handler::upload_handler),
        )
        .route(
            "/api/files/:address",
            get(handler::get_file_handler).delete(handler::delete_handler),
        )
        .route("/api/files/:address/content", get(handler::download_handler))
        .route("/api/blockchain", get(handler::blockchain_handler))
        .route("/api/verify", get(handler::verify_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

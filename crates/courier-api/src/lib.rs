pub mod coordinator;
pub mod ingest;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::coordinator::DualWriteCoordinator;

pub type AppState = Arc<DualWriteCoordinator>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(ingest::health))
        .route("/message", post(ingest::post_message))
        .with_state(state)
}

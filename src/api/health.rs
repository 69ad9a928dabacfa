//! Health check endpoint

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{config::StorageBackend, AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    /// Current status of the service
    pub status: String,
    /// Version of the service
    pub version: String,
    /// Configured catalog storage
    pub storage: StorageBackend,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.config.catalog.storage,
    })
}

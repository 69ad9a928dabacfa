//! Catalog home page

use axum::{extract::State, response::Response};

use super::views::render;
use crate::{error::AppResult, AppState};

pub async fn index(State(state): State<AppState>) -> AppResult<Response> {
    let page = state.services.catalog.index().await?;
    Ok(render(&page))
}

//! Genre pages

use axum::{extract::State, response::Response};

use super::{
    form_response,
    views::{render, see_other},
    EntityId, FormBody,
};
use crate::{error::AppResult, AppState};

const GENRE_LIST: &str = "/catalog/genres";

pub async fn list(State(state): State<AppState>) -> AppResult<Response> {
    let page = state.services.genres.list().await?;
    Ok(render(&page))
}

pub async fn detail(State(state): State<AppState>, EntityId(id): EntityId) -> AppResult<Response> {
    let page = state.services.genres.detail(id).await?;
    Ok(render(&page))
}

pub async fn create_form(State(state): State<AppState>) -> Response {
    render(&state.services.genres.create_form())
}

pub async fn create(
    State(state): State<AppState>,
    FormBody(raw): FormBody,
) -> AppResult<Response> {
    let outcome = state.services.genres.create(&raw).await?;
    Ok(form_response(outcome))
}

pub async fn update_form(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Response> {
    let page = state.services.genres.update_form(id).await?;
    Ok(render(&page))
}

pub async fn update(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    FormBody(raw): FormBody,
) -> AppResult<Response> {
    let outcome = state.services.genres.update(id, &raw).await?;
    Ok(form_response(outcome))
}

pub async fn delete_form(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Response> {
    match state.services.genres.delete_page(id).await? {
        Some(page) => Ok(render(&page)),
        None => Ok(see_other(GENRE_LIST)),
    }
}

pub async fn delete(State(state): State<AppState>, EntityId(id): EntityId) -> AppResult<Response> {
    state.services.genres.delete(id).await?;
    Ok(see_other(GENRE_LIST))
}

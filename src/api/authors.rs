//! Author pages

use axum::{extract::State, response::Response};

use super::{
    form_response,
    views::{render, see_other},
    EntityId, FormBody,
};
use crate::{
    error::AppResult,
    services::{authors::AuthorDeletePage, integrity::RemovalOutcome},
    AppState,
};

const AUTHOR_LIST: &str = "/catalog/authors";

pub async fn list(State(state): State<AppState>) -> AppResult<Response> {
    let page = state.services.authors.list().await?;
    Ok(render(&page))
}

pub async fn detail(State(state): State<AppState>, EntityId(id): EntityId) -> AppResult<Response> {
    let page = state.services.authors.detail(id).await?;
    Ok(render(&page))
}

pub async fn create_form(State(state): State<AppState>) -> Response {
    render(&state.services.authors.create_form())
}

pub async fn create(
    State(state): State<AppState>,
    FormBody(raw): FormBody,
) -> AppResult<Response> {
    let outcome = state.services.authors.create(&raw).await?;
    Ok(form_response(outcome))
}

pub async fn update_form(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Response> {
    let page = state.services.authors.update_form(id).await?;
    Ok(render(&page))
}

pub async fn update(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    FormBody(raw): FormBody,
) -> AppResult<Response> {
    let outcome = state.services.authors.update(id, &raw).await?;
    Ok(form_response(outcome))
}

/// Confirmation page; back to the list when the author is gone
pub async fn delete_form(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Response> {
    match state.services.authors.delete_page(id).await? {
        Some(page) => Ok(render(&page)),
        None => Ok(see_other(AUTHOR_LIST)),
    }
}

pub async fn delete(State(state): State<AppState>, EntityId(id): EntityId) -> AppResult<Response> {
    match state.services.authors.delete(id).await? {
        RemovalOutcome::Blocked { entity, blocking } => {
            Ok(render(&AuthorDeletePage::new(entity, blocking)))
        }
        RemovalOutcome::Removed | RemovalOutcome::Missing => Ok(see_other(AUTHOR_LIST)),
    }
}

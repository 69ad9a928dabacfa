//! Book pages

use axum::{extract::State, response::Response};

use super::{
    form_response,
    views::{render, see_other},
    EntityId, FormBody,
};
use crate::{
    error::AppResult,
    services::{books::BookDeletePage, integrity::RemovalOutcome},
    AppState,
};

const BOOK_LIST: &str = "/catalog/books";

pub async fn list(State(state): State<AppState>) -> AppResult<Response> {
    let page = state.services.books.list().await?;
    Ok(render(&page))
}

pub async fn detail(State(state): State<AppState>, EntityId(id): EntityId) -> AppResult<Response> {
    let page = state.services.books.detail(id).await?;
    Ok(render(&page))
}

pub async fn create_form(State(state): State<AppState>) -> AppResult<Response> {
    let page = state.services.books.create_form().await?;
    Ok(render(&page))
}

pub async fn create(
    State(state): State<AppState>,
    FormBody(raw): FormBody,
) -> AppResult<Response> {
    let outcome = state.services.books.create(&raw).await?;
    Ok(form_response(outcome))
}

pub async fn update_form(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Response> {
    let page = state.services.books.update_form(id).await?;
    Ok(render(&page))
}

pub async fn update(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    FormBody(raw): FormBody,
) -> AppResult<Response> {
    let outcome = state.services.books.update(id, &raw).await?;
    Ok(form_response(outcome))
}

pub async fn delete_form(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Response> {
    match state.services.books.delete_page(id).await? {
        Some(page) => Ok(render(&page)),
        None => Ok(see_other(BOOK_LIST)),
    }
}

pub async fn delete(State(state): State<AppState>, EntityId(id): EntityId) -> AppResult<Response> {
    match state.services.books.delete(id).await? {
        RemovalOutcome::Blocked { entity, blocking } => {
            Ok(render(&BookDeletePage::new(entity, blocking)))
        }
        RemovalOutcome::Removed | RemovalOutcome::Missing => Ok(see_other(BOOK_LIST)),
    }
}

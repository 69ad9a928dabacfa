//! Book copy pages

use axum::{extract::State, response::Response};

use super::{
    form_response,
    views::{render, see_other},
    EntityId, FormBody,
};
use crate::{error::AppResult, AppState};

const BOOKINSTANCE_LIST: &str = "/catalog/bookinstances";

pub async fn list(State(state): State<AppState>) -> AppResult<Response> {
    let page = state.services.book_instances.list().await?;
    Ok(render(&page))
}

pub async fn detail(State(state): State<AppState>, EntityId(id): EntityId) -> AppResult<Response> {
    let page = state.services.book_instances.detail(id).await?;
    Ok(render(&page))
}

pub async fn create_form(State(state): State<AppState>) -> AppResult<Response> {
    let page = state.services.book_instances.create_form().await?;
    Ok(render(&page))
}

pub async fn create(
    State(state): State<AppState>,
    FormBody(raw): FormBody,
) -> AppResult<Response> {
    let outcome = state.services.book_instances.create(&raw).await?;
    Ok(form_response(outcome))
}

pub async fn update_form(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Response> {
    let page = state.services.book_instances.update_form(id).await?;
    Ok(render(&page))
}

pub async fn update(
    State(state): State<AppState>,
    EntityId(id): EntityId,
    FormBody(raw): FormBody,
) -> AppResult<Response> {
    let outcome = state.services.book_instances.update(id, &raw).await?;
    Ok(form_response(outcome))
}

pub async fn delete_form(
    State(state): State<AppState>,
    EntityId(id): EntityId,
) -> AppResult<Response> {
    match state.services.book_instances.delete_page(id).await? {
        Some(page) => Ok(render(&page)),
        None => Ok(see_other(BOOKINSTANCE_LIST)),
    }
}

pub async fn delete(State(state): State<AppState>, EntityId(id): EntityId) -> AppResult<Response> {
    state.services.book_instances.delete(id).await?;
    Ok(see_other(BOOKINSTANCE_LIST))
}

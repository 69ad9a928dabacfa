//! HTTP handlers for the catalog pages

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod catalog;
pub mod genres;
pub mod health;
pub mod views;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    response::Response,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::Entity,
    services::{forms::FormOutcome, validation::RawForm, Page},
    AppState,
};

/// `:id` path segment parsed as a UUID
pub struct EntityId(pub Uuid);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for EntityId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(EntityId(id))
    }
}

/// Submitted form fields as a JSON object
pub struct FormBody(pub RawForm);

#[async_trait]
impl<S: Send + Sync> FromRequest<S> for FormBody {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(raw) = Json::<RawForm>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(FormBody(raw))
    }
}

/// Redirect to a saved entity, or re-display the rejected form
pub(crate) fn form_response<E: Entity, P: Page>(outcome: FormOutcome<E, P>) -> Response {
    match outcome {
        FormOutcome::Saved(entity) => views::see_other(&entity.url()),
        FormOutcome::Rejected(page) => views::render(&page),
    }
}

/// Catalog routes under `/catalog` plus `/health`
pub fn router(state: AppState) -> Router {
    let catalog = Router::new()
        .route("/", get(catalog::index))
        // Books
        .route("/book/create", get(books::create_form).post(books::create))
        .route("/book/:id/delete", get(books::delete_form).post(books::delete))
        .route("/book/:id/update", get(books::update_form).post(books::update))
        .route("/book/:id", get(books::detail))
        .route("/books", get(books::list))
        // Authors
        .route("/author/create", get(authors::create_form).post(authors::create))
        .route("/author/:id/delete", get(authors::delete_form).post(authors::delete))
        .route("/author/:id/update", get(authors::update_form).post(authors::update))
        .route("/author/:id", get(authors::detail))
        .route("/authors", get(authors::list))
        // Genres
        .route("/genre/create", get(genres::create_form).post(genres::create))
        .route("/genre/:id/delete", get(genres::delete_form).post(genres::delete))
        .route("/genre/:id/update", get(genres::update_form).post(genres::update))
        .route("/genre/:id", get(genres::detail))
        .route("/genres", get(genres::list))
        // Book copies
        .route(
            "/bookinstance/create",
            get(book_instances::create_form).post(book_instances::create),
        )
        .route(
            "/bookinstance/:id/delete",
            get(book_instances::delete_form).post(book_instances::delete),
        )
        .route(
            "/bookinstance/:id/update",
            get(book_instances::update_form).post(book_instances::update),
        )
        .route("/bookinstance/:id", get(book_instances::detail))
        .route("/bookinstances", get(book_instances::list));

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/catalog", catalog)
        .with_state(state)
}

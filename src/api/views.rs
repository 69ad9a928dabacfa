//! JSON presentation of pages.
//!
//! Every page answers `{"view": <name>, "data": <page>}`; successful writes
//! answer `303 See Other` to the saved entity.

use axum::{
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::Page;

#[derive(Serialize)]
pub struct Rendered<'a, T: Serialize> {
    pub view: &'a str,
    pub data: &'a T,
}

/// Render a data bag under a view name
pub fn render_view<T: Serialize>(view: &str, data: &T) -> Response {
    Json(Rendered { view, data }).into_response()
}

pub fn render<P: Page>(page: &P) -> Response {
    render_view(P::VIEW, page)
}

pub fn see_other(location: &str) -> Response {
    (StatusCode::SEE_OTHER, [(LOCATION, location.to_string())]).into_response()
}

//! Catalog home page

use serde::Serialize;

use super::{aggregate::join_named, Page};
use crate::{
    error::{AppError, AppResult},
    models::{AuthorFilter, BookFilter, BookInstanceFilter, BookInstanceStatus, GenreFilter},
    repository::Repository,
};

/// Record counts shown on the home page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexPage {
    pub title: String,
    pub book_count: i64,
    pub book_instance_count: i64,
    pub book_instance_available_count: i64,
    pub author_count: i64,
    pub genre_count: i64,
}

impl Page for IndexPage {
    const VIEW: &'static str = "index";
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Count every kind concurrently
    pub async fn index(&self) -> AppResult<IndexPage> {
        let books = BookFilter::default();
        let copies = BookInstanceFilter::default();
        let available = BookInstanceFilter::with_status(BookInstanceStatus::Available);
        let authors = AuthorFilter::default();
        let genres = GenreFilter::default();

        let counts = join_named(vec![
            ("book_count", self.repository.books.count(&books)),
            ("book_instance_count", self.repository.book_instances.count(&copies)),
            (
                "book_instance_available_count",
                self.repository.book_instances.count(&available),
            ),
            ("author_count", self.repository.authors.count(&authors)),
            ("genre_count", self.repository.genres.count(&genres)),
        ])
        .await?;

        let count = |name: &str| {
            counts
                .get(name)
                .copied()
                .ok_or_else(|| AppError::Internal(format!("missing count {}", name)))
        };

        Ok(IndexPage {
            title: "Local Library Home".to_string(),
            book_count: count("book_count")?,
            book_instance_count: count("book_instance_count")?,
            book_instance_available_count: count("book_instance_available_count")?,
            author_count: count("author_count")?,
            genre_count: count("genre_count")?,
        })
    }
}

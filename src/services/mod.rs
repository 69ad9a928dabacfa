//! Business logic services

pub mod aggregate;
pub mod authors;
pub mod book_instances;
pub mod books;
pub mod catalog;
pub mod forms;
pub mod genres;
pub mod integrity;
pub mod validation;

use serde::Serialize;

use crate::{config::CatalogConfig, error::AppError, models::EntityKind, repository::Repository};

/// Data bag handed to the presentation layer under a view name
pub trait Page: Serialize {
    const VIEW: &'static str;
}

/// "<Kind> not found"
pub(crate) fn not_found(kind: EntityKind) -> AppError {
    AppError::NotFound(format!("{} not found", kind))
}

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub authors: authors::AuthorsService,
    pub genres: genres::GenresService,
    pub books: books::BooksService,
    pub book_instances: book_instances::BookInstancesService,
}

impl Services {
    /// Create all services over one repository
    pub fn new(repository: Repository, config: &CatalogConfig) -> Self {
        let guard = integrity::IntegrityGuard::new(repository.clone(), config.clone());

        Self {
            catalog: catalog::CatalogService::new(repository.clone()),
            authors: authors::AuthorsService::new(repository.clone(), guard.clone()),
            genres: genres::GenresService::new(repository.clone()),
            books: books::BooksService::new(repository.clone(), guard),
            book_instances: book_instances::BookInstancesService::new(repository),
        }
    }
}

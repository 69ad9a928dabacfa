//! Repository layer: the storage boundary for catalog entities

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod genres;
pub mod memory;

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Author, Book, BookInstance, Entity, Genre, Ref},
};

pub use memory::MemoryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Sort<K> {
    pub key: K,
    pub order: SortOrder,
}

/// Projection and ordering for `EntityStore::find`.
///
/// Only the reference fields listed in `expand` come back expanded.
#[derive(Debug, Clone)]
pub struct FindOptions<E: Entity> {
    pub expand: Vec<E::Field>,
    pub sort: Option<Sort<E::SortKey>>,
}

impl<E: Entity> Default for FindOptions<E> {
    fn default() -> Self {
        Self {
            expand: Vec::new(),
            sort: None,
        }
    }
}

impl<E: Entity> FindOptions<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expand(mut self, field: E::Field) -> Self {
        if !self.expand.contains(&field) {
            self.expand.push(field);
        }
        self
    }

    pub fn sort_by(mut self, key: E::SortKey, order: SortOrder) -> Self {
        self.sort = Some(Sort { key, order });
        self
    }
}

/// Expanded reference when the target was loaded, the bare id otherwise
pub(crate) fn expand_ref<T: Clone>(id: Uuid, loaded: &HashMap<Uuid, T>) -> Ref<T> {
    loaded
        .get(&id)
        .map(|entity| Ref::Expanded(Box::new(entity.clone())))
        .unwrap_or(Ref::Id(id))
}

/// Typed store over one entity kind.
///
/// An absent entity is `Ok(None)` / `Ok(false)`; only failures of the
/// backend itself are errors.
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    async fn find(&self, filter: &E::Filter, options: &FindOptions<E>) -> AppResult<Vec<E>>;

    async fn find_by_id(&self, id: Uuid, expand: &[E::Field]) -> AppResult<Option<E>>;

    async fn find_one(&self, filter: &E::Filter) -> AppResult<Option<E>>;

    async fn count(&self, filter: &E::Filter) -> AppResult<i64>;

    async fn create(&self, record: &E::Record) -> AppResult<E>;

    /// Replace every field of the entity with `record`
    async fn update_by_id(&self, id: Uuid, record: &E::Record) -> AppResult<Option<E>>;

    async fn remove_by_id(&self, id: Uuid) -> AppResult<bool>;
}

/// Store handles for every entity kind, built once at start-up
#[derive(Clone)]
pub struct Repository {
    pub authors: Arc<dyn EntityStore<Author>>,
    pub genres: Arc<dyn EntityStore<Genre>>,
    pub books: Arc<dyn EntityStore<Book>>,
    pub book_instances: Arc<dyn EntityStore<BookInstance>>,
}

impl Repository {
    /// Create a Postgres-backed repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: Arc::new(authors::AuthorsRepository::new(pool.clone())),
            genres: Arc::new(genres::GenresRepository::new(pool.clone())),
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            book_instances: Arc::new(book_instances::BookInstancesRepository::new(pool)),
        }
    }

    /// Create a repository over a fresh in-process store
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::new()))
    }

    /// Use one store value for every entity kind
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: EntityStore<Author>
            + EntityStore<Genre>
            + EntityStore<Book>
            + EntityStore<BookInstance>
            + 'static,
    {
        Self {
            authors: store.clone(),
            genres: store.clone(),
            books: store.clone(),
            book_instances: store,
        }
    }
}

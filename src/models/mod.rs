//! Data models for the catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;

use serde::{Serialize, Serializer};
use uuid::Uuid;

// Re-export commonly used types
pub use author::{Author, AuthorFilter, AuthorRecord, AuthorSort};
pub use book::{Book, BookField, BookFilter, BookRecord, BookSort};
pub use book_instance::{
    BookInstance, BookInstanceField, BookInstanceFilter, BookInstanceRecord, BookInstanceSort,
    BookInstanceStatus,
};
pub use genre::{Genre, GenreFilter, GenreRecord, GenreSort};

/// The four kinds of catalog entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Author,
    Book,
    Genre,
    BookInstance,
}

impl EntityKind {
    /// Path segment used in canonical detail urls
    pub fn path(&self) -> &'static str {
        match self {
            EntityKind::Author => "author",
            EntityKind::Book => "book",
            EntityKind::Genre => "genre",
            EntityKind::BookInstance => "bookinstance",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EntityKind::Author => "Author",
            EntityKind::Book => "Book",
            EntityKind::Genre => "Genre",
            EntityKind::BookInstance => "Book copy",
        };
        write!(f, "{}", label)
    }
}

/// A stored catalog entity.
///
/// `Record` is the writable field set (everything but the id) used for create
/// and full-record replace. `Field` enumerates the reference fields a read may
/// ask to expand.
pub trait Entity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    type Record: Clone + Send + Sync + 'static;
    type Filter: Default + Clone + Send + Sync + 'static;
    type SortKey: Copy + std::fmt::Debug + Send + Sync + 'static;
    type Field: Copy + PartialEq + std::fmt::Debug + Send + Sync + 'static;

    fn id(&self) -> Uuid;

    fn from_record(id: Uuid, record: &Self::Record) -> Self;

    fn to_record(&self) -> Self::Record;

    /// Canonical detail-page path, derived from the id on every call
    fn url(&self) -> String {
        entity_url(Self::KIND, self.id())
    }
}

pub fn entity_url(kind: EntityKind, id: Uuid) -> String {
    format!("/catalog/{}/{}", kind.path(), id)
}

/// Reference field marker for kinds that hold no references
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoReference {}

/// A stored reference to another entity, optionally expanded in place.
#[derive(Debug, Clone, PartialEq)]
pub enum Ref<T> {
    Id(Uuid),
    Expanded(Box<T>),
}

impl<T: Entity> Ref<T> {
    pub fn id(&self) -> Uuid {
        match self {
            Ref::Id(id) => *id,
            Ref::Expanded(entity) => entity.id(),
        }
    }

    pub fn expanded(&self) -> Option<&T> {
        match self {
            Ref::Id(_) => None,
            Ref::Expanded(entity) => Some(entity.as_ref()),
        }
    }
}

impl<T: Serialize> Serialize for Ref<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ref::Id(id) => id.serialize(serializer),
            Ref::Expanded(entity) => entity.serialize(serializer),
        }
    }
}

/// Medium date format used by every rendered date ("Jan 5, 1950")
pub(crate) fn format_date_med(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_entity_url() {
        let id = Uuid::nil();
        assert_eq!(
            entity_url(EntityKind::BookInstance, id),
            "/catalog/bookinstance/00000000-0000-0000-0000-000000000000"
        );
    }

    #[test]
    fn test_format_date_med() {
        assert_eq!(format_date_med(NaiveDate::from_ymd_opt(1950, 1, 5)), "Jan 5, 1950");
        assert_eq!(format_date_med(None), "");
    }

    #[test]
    fn test_unexpanded_ref_serializes_as_id() {
        let id = Uuid::new_v4();
        let reference: Ref<Genre> = Ref::Id(id);
        assert_eq!(serde_json::to_value(&reference).unwrap(), serde_json::json!(id));
    }
}

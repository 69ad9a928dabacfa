//! Book (catalog title) model

use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use super::{Author, Entity, EntityKind, Genre, Ref};

/// Book as read from storage.
///
/// `author` and `genre` hold ids unless the read expanded them.
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Ref<Author>,
    pub genre: Vec<Ref<Genre>>,
}

/// Writable book fields; references are stored as ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Uuid,
    pub genre: Vec<Uuid>,
}

/// Reference fields of a book that a read may expand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Author,
    Genre,
}

#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub author: Option<Uuid>,
    /// Books whose genre set contains this id
    pub genre: Option<Uuid>,
    pub title: Option<String>,
}

impl BookFilter {
    pub fn by_author(author: Uuid) -> Self {
        Self {
            author: Some(author),
            ..Default::default()
        }
    }

    pub fn by_genre(genre: Uuid) -> Self {
        Self {
            genre: Some(genre),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSort {
    Title,
}

impl Book {
    pub fn genre_ids(&self) -> Vec<Uuid> {
        self.genre.iter().map(Ref::id).collect()
    }
}

impl Entity for Book {
    const KIND: EntityKind = EntityKind::Book;

    type Record = BookRecord;
    type Filter = BookFilter;
    type SortKey = BookSort;
    type Field = BookField;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_record(id: Uuid, record: &BookRecord) -> Self {
        Self {
            id,
            title: record.title.clone(),
            summary: record.summary.clone(),
            isbn: record.isbn.clone(),
            author: Ref::Id(record.author),
            genre: record.genre.iter().copied().map(Ref::Id).collect(),
        }
    }

    fn to_record(&self) -> BookRecord {
        BookRecord {
            title: self.title.clone(),
            summary: self.summary.clone(),
            isbn: self.isbn.clone(),
            author: self.author.id(),
            genre: self.genre_ids(),
        }
    }
}

impl Serialize for Book {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct BookView<'a> {
            id: Uuid,
            title: &'a str,
            summary: &'a str,
            isbn: &'a str,
            author: &'a Ref<Author>,
            genre: &'a [Ref<Genre>],
            url: String,
        }

        BookView {
            id: self.id,
            title: &self.title,
            summary: &self.summary,
            isbn: &self.isbn,
            author: &self.author,
            genre: &self.genre,
            url: self.url(),
        }
        .serialize(serializer)
    }
}

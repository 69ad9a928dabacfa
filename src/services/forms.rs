//! Candidate entities and selection state for re-displayed forms.
//!
//! Nothing here talks to storage: a candidate is rebuilt from sanitized
//! values alone, and selection state is computed from option lists the
//! caller already loaded.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::validation::{parse_iso_date, SanitizedValues};
use crate::models::{
    AuthorRecord, BookInstanceRecord, BookInstanceStatus, BookRecord, Entity, GenreRecord,
};

/// Result of a create or update submission
#[derive(Debug)]
pub enum FormOutcome<E, V> {
    /// Stored entity; the caller redirects to its url
    Saved(E),
    /// Form page to re-display with the user's input and messages
    Rejected(V),
}

/// Field set of an unsaved entity, rebuilt from a submission
pub trait Draft: Sized {
    type Record;

    fn from_values(values: &SanitizedValues) -> Self;

    fn from_record(record: &Self::Record) -> Self;

    /// Writable record, when every required field is usable
    fn into_record(self) -> Option<Self::Record>;
}

/// Unsaved entity shown on a form; keeps the id when editing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate<D> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(flatten)]
    pub draft: D,
}

impl<D: Draft> Candidate<D> {
    pub fn from_values(id: Option<Uuid>, values: &SanitizedValues) -> Self {
        Self {
            id,
            draft: D::from_values(values),
        }
    }

    /// Candidate prefilled from a stored entity
    pub fn of<E>(entity: &E) -> Self
    where
        E: Entity<Record = D::Record>,
    {
        Self {
            id: Some(entity.id()),
            draft: D::from_record(&entity.to_record()),
        }
    }
}

/// One option of a relationship picker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selectable<T> {
    #[serde(flatten)]
    pub item: T,
    pub selected: bool,
}

/// Pair every option with whether its id is among `chosen`
pub fn selection_state<T: Entity>(options: Vec<T>, chosen: &[Uuid]) -> Vec<Selectable<T>> {
    options
        .into_iter()
        .map(|item| {
            let selected = chosen.contains(&item.id());
            Selectable { item, selected }
        })
        .collect()
}

fn parse_id(value: &str) -> Option<Uuid> {
    Uuid::parse_str(value).ok()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthorDraft {
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Draft for AuthorDraft {
    type Record = AuthorRecord;

    fn from_values(values: &SanitizedValues) -> Self {
        Self {
            first_name: values.text("first_name").to_string(),
            family_name: values.text("family_name").to_string(),
            date_of_birth: parse_iso_date(values.text("date_of_birth")),
            date_of_death: parse_iso_date(values.text("date_of_death")),
        }
    }

    fn from_record(record: &AuthorRecord) -> Self {
        Self {
            first_name: record.first_name.clone(),
            family_name: record.family_name.clone(),
            date_of_birth: record.date_of_birth,
            date_of_death: record.date_of_death,
        }
    }

    fn into_record(self) -> Option<AuthorRecord> {
        Some(AuthorRecord {
            first_name: self.first_name,
            family_name: self.family_name,
            date_of_birth: self.date_of_birth,
            date_of_death: self.date_of_death,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenreDraft {
    pub name: String,
}

impl Draft for GenreDraft {
    type Record = GenreRecord;

    fn from_values(values: &SanitizedValues) -> Self {
        Self {
            name: values.text("name").to_string(),
        }
    }

    fn from_record(record: &GenreRecord) -> Self {
        Self {
            name: record.name.clone(),
        }
    }

    fn into_record(self) -> Option<GenreRecord> {
        Some(GenreRecord { name: self.name })
    }
}

/// Book draft; the author stays unset when the submitted id is unusable
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookDraft {
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Option<Uuid>,
    pub genre: Vec<Uuid>,
}

impl Draft for BookDraft {
    type Record = BookRecord;

    fn from_values(values: &SanitizedValues) -> Self {
        Self {
            title: values.text("title").to_string(),
            summary: values.text("summary").to_string(),
            isbn: values.text("isbn").to_string(),
            author: parse_id(values.text("author")),
            genre: values
                .list("genre")
                .into_iter()
                .filter_map(parse_id)
                .collect(),
        }
    }

    fn from_record(record: &BookRecord) -> Self {
        Self {
            title: record.title.clone(),
            summary: record.summary.clone(),
            isbn: record.isbn.clone(),
            author: Some(record.author),
            genre: record.genre.clone(),
        }
    }

    fn into_record(self) -> Option<BookRecord> {
        Some(BookRecord {
            title: self.title,
            summary: self.summary,
            isbn: self.isbn,
            author: self.author?,
            genre: self.genre,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookInstanceDraft {
    pub book: Option<Uuid>,
    pub imprint: String,
    pub status: Option<BookInstanceStatus>,
    pub due_back: Option<NaiveDate>,
}

impl Draft for BookInstanceDraft {
    type Record = BookInstanceRecord;

    fn from_values(values: &SanitizedValues) -> Self {
        Self {
            book: parse_id(values.text("book")),
            imprint: values.text("imprint").to_string(),
            status: values.text("status").parse().ok(),
            due_back: parse_iso_date(values.text("due_back")),
        }
    }

    fn from_record(record: &BookInstanceRecord) -> Self {
        Self {
            book: Some(record.book),
            imprint: record.imprint.clone(),
            status: Some(record.status),
            due_back: record.due_back,
        }
    }

    fn into_record(self) -> Option<BookInstanceRecord> {
        Some(BookInstanceRecord {
            book: self.book?,
            imprint: self.imprint,
            status: self.status?,
            due_back: self.due_back,
        })
    }
}

//! Book instance (physical copy) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use super::{format_date_med, Book, Entity, EntityKind, Ref};

/// Copy availability status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BookInstanceStatus {
    Available,
    #[default]
    Maintenance,
    Loaned,
    Reserved,
}

impl BookInstanceStatus {
    pub const ALL: [BookInstanceStatus; 4] = [
        BookInstanceStatus::Available,
        BookInstanceStatus::Maintenance,
        BookInstanceStatus::Loaned,
        BookInstanceStatus::Reserved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookInstanceStatus::Available => "Available",
            BookInstanceStatus::Maintenance => "Maintenance",
            BookInstanceStatus::Loaned => "Loaned",
            BookInstanceStatus::Reserved => "Reserved",
        }
    }
}

impl std::str::FromStr for BookInstanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown status: {}", s))
    }
}

impl std::fmt::Display for BookInstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookInstance {
    pub id: Uuid,
    pub book: Ref<Book>,
    pub imprint: String,
    pub status: BookInstanceStatus,
    pub due_back: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookInstanceRecord {
    pub book: Uuid,
    pub imprint: String,
    pub status: BookInstanceStatus,
    pub due_back: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookInstanceField {
    Book,
}

#[derive(Debug, Clone, Default)]
pub struct BookInstanceFilter {
    pub book: Option<Uuid>,
    pub status: Option<BookInstanceStatus>,
}

impl BookInstanceFilter {
    pub fn by_book(book: Uuid) -> Self {
        Self {
            book: Some(book),
            ..Default::default()
        }
    }

    pub fn with_status(status: BookInstanceStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookInstanceSort {
    Imprint,
    Status,
}

impl Entity for BookInstance {
    const KIND: EntityKind = EntityKind::BookInstance;

    type Record = BookInstanceRecord;
    type Filter = BookInstanceFilter;
    type SortKey = BookInstanceSort;
    type Field = BookInstanceField;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_record(id: Uuid, record: &BookInstanceRecord) -> Self {
        Self {
            id,
            book: Ref::Id(record.book),
            imprint: record.imprint.clone(),
            status: record.status,
            due_back: record.due_back,
        }
    }

    fn to_record(&self) -> BookInstanceRecord {
        BookInstanceRecord {
            book: self.book.id(),
            imprint: self.imprint.clone(),
            status: self.status,
            due_back: self.due_back,
        }
    }
}

impl Serialize for BookInstance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct BookInstanceView<'a> {
            id: Uuid,
            book: &'a Ref<Book>,
            imprint: &'a str,
            status: BookInstanceStatus,
            due_back: Option<NaiveDate>,
            due_back_formatted: String,
            url: String,
        }

        BookInstanceView {
            id: self.id,
            book: &self.book,
            imprint: &self.imprint,
            status: self.status,
            due_back: self.due_back,
            due_back_formatted: format_date_med(self.due_back),
            url: self.url(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "Loaned".parse::<BookInstanceStatus>(),
            Ok(BookInstanceStatus::Loaned)
        );
        assert!("loaned".parse::<BookInstanceStatus>().is_err());
        assert!("".parse::<BookInstanceStatus>().is_err());
    }

    #[test]
    fn test_due_back_formatted() {
        let copy = BookInstance {
            id: Uuid::nil(),
            book: Ref::Id(Uuid::nil()),
            imprint: "Gollancz, 2011".to_string(),
            status: BookInstanceStatus::Loaned,
            due_back: NaiveDate::from_ymd_opt(2024, 3, 9),
        };
        let json = serde_json::to_value(&copy).unwrap();
        assert_eq!(json["due_back_formatted"], "Mar 9, 2024");
        assert_eq!(json["status"], "Loaned");
    }
}

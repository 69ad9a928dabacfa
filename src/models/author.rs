//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;
use uuid::Uuid;

use super::{format_date_med, Entity, EntityKind, NoReference};

/// Full author model from storage
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Author {
    pub id: Uuid,
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

/// Writable author fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorRecord {
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

/// Author filter; `None` fields match everything
#[derive(Debug, Clone, Default)]
pub struct AuthorFilter {
    pub family_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorSort {
    FamilyName,
}

/// "family, first"
pub fn display_name(author: &AuthorRecord) -> String {
    format!("{}, {}", author.family_name, author.first_name)
}

/// "<birth> - <death>", either side empty when unknown
pub fn lifespan(author: &AuthorRecord) -> String {
    format!(
        "{} - {}",
        format_date_med(author.date_of_birth),
        format_date_med(author.date_of_death)
    )
}

impl Entity for Author {
    const KIND: EntityKind = EntityKind::Author;

    type Record = AuthorRecord;
    type Filter = AuthorFilter;
    type SortKey = AuthorSort;
    type Field = NoReference;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_record(id: Uuid, record: &AuthorRecord) -> Self {
        Self {
            id,
            first_name: record.first_name.clone(),
            family_name: record.family_name.clone(),
            date_of_birth: record.date_of_birth,
            date_of_death: record.date_of_death,
        }
    }

    fn to_record(&self) -> AuthorRecord {
        AuthorRecord {
            first_name: self.first_name.clone(),
            family_name: self.family_name.clone(),
            date_of_birth: self.date_of_birth,
            date_of_death: self.date_of_death,
        }
    }
}

impl Serialize for Author {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct AuthorView<'a> {
            id: Uuid,
            first_name: &'a str,
            family_name: &'a str,
            date_of_birth: Option<NaiveDate>,
            date_of_death: Option<NaiveDate>,
            name: String,
            lifespan: String,
            url: String,
        }

        let record = self.to_record();
        AuthorView {
            id: self.id,
            first_name: &self.first_name,
            family_name: &self.family_name,
            date_of_birth: self.date_of_birth,
            date_of_death: self.date_of_death,
            name: display_name(&record),
            lifespan: lifespan(&record),
            url: self.url(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(birth: Option<NaiveDate>, death: Option<NaiveDate>) -> AuthorRecord {
        AuthorRecord {
            first_name: "Ursula".to_string(),
            family_name: "LeGuin".to_string(),
            date_of_birth: birth,
            date_of_death: death,
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(&record(None, None)), "LeGuin, Ursula");
    }

    #[test]
    fn test_lifespan() {
        let birth = NaiveDate::from_ymd_opt(1929, 10, 21);
        let death = NaiveDate::from_ymd_opt(2018, 1, 22);
        assert_eq!(lifespan(&record(birth, death)), "Oct 21, 1929 - Jan 22, 2018");
        assert_eq!(lifespan(&record(birth, None)), "Oct 21, 1929 - ");
        assert_eq!(lifespan(&record(None, None)), " - ");
    }

    #[test]
    fn test_serialized_author_carries_derived_fields() {
        let author = Author::from_record(Uuid::nil(), &record(None, None));
        let json = serde_json::to_value(&author).unwrap();
        assert_eq!(json["name"], "LeGuin, Ursula");
        assert_eq!(
            json["url"],
            "/catalog/author/00000000-0000-0000-0000-000000000000"
        );
    }
}

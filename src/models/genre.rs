//! Genre model

use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Entity, EntityKind, NoReference};

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenreRecord {
    pub name: String,
}

/// Genre filter; `name` matches exactly
#[derive(Debug, Clone, Default)]
pub struct GenreFilter {
    pub name: Option<String>,
}

impl GenreFilter {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenreSort {
    Name,
}

impl Entity for Genre {
    const KIND: EntityKind = EntityKind::Genre;

    type Record = GenreRecord;
    type Filter = GenreFilter;
    type SortKey = GenreSort;
    type Field = NoReference;

    fn id(&self) -> Uuid {
        self.id
    }

    fn from_record(id: Uuid, record: &GenreRecord) -> Self {
        Self {
            id,
            name: record.name.clone(),
        }
    }

    fn to_record(&self) -> GenreRecord {
        GenreRecord {
            name: self.name.clone(),
        }
    }
}

impl Serialize for Genre {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct GenreView<'a> {
            id: Uuid,
            name: &'a str,
            url: String,
        }

        GenreView {
            id: self.id,
            name: &self.name,
            url: self.url(),
        }
        .serialize(serializer)
    }
}

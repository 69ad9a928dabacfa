//! In-process entity store.
//!
//! Every kind lives in an insertion-ordered table behind one lock, so a
//! single read sees a consistent snapshot of all four tables while it
//! resolves references.

use std::cmp::Ordering;

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EntityStore, FindOptions, SortOrder};
use crate::{
    error::AppResult,
    models::{
        Author, AuthorSort, Book, BookField, BookInstance, BookInstanceField, BookInstanceSort,
        BookSort, Entity, Genre, GenreSort, Ref,
    },
};

#[derive(Default)]
pub struct Tables {
    authors: IndexMap<Uuid, Author>,
    genres: IndexMap<Uuid, Genre>,
    books: IndexMap<Uuid, Book>,
    book_instances: IndexMap<Uuid, BookInstance>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Table access, filtering, ordering and reference expansion for one kind
pub trait MemoryEntity: Entity {
    fn table(tables: &Tables) -> &IndexMap<Uuid, Self>;

    fn table_mut(tables: &mut Tables) -> &mut IndexMap<Uuid, Self>;

    fn matches(&self, filter: &Self::Filter) -> bool;

    fn compare(&self, other: &Self, key: Self::SortKey) -> Ordering;

    fn expand(self, _tables: &Tables, _fields: &[Self::Field]) -> Self {
        self
    }
}

/// Swap an id for the referenced entity when it still exists
fn resolve<T: Entity>(reference: Ref<T>, table: &IndexMap<Uuid, T>) -> Ref<T> {
    match table.get(&reference.id()) {
        Some(entity) => Ref::Expanded(Box::new(entity.clone())),
        None => reference,
    }
}

fn field_matches<T: PartialEq>(wanted: &Option<T>, actual: &T) -> bool {
    wanted.as_ref().map_or(true, |w| w == actual)
}

impl MemoryEntity for Author {
    fn table(tables: &Tables) -> &IndexMap<Uuid, Self> {
        &tables.authors
    }

    fn table_mut(tables: &mut Tables) -> &mut IndexMap<Uuid, Self> {
        &mut tables.authors
    }

    fn matches(&self, filter: &Self::Filter) -> bool {
        field_matches(&filter.family_name, &self.family_name)
    }

    fn compare(&self, other: &Self, key: AuthorSort) -> Ordering {
        match key {
            AuthorSort::FamilyName => self.family_name.cmp(&other.family_name),
        }
    }
}

impl MemoryEntity for Genre {
    fn table(tables: &Tables) -> &IndexMap<Uuid, Self> {
        &tables.genres
    }

    fn table_mut(tables: &mut Tables) -> &mut IndexMap<Uuid, Self> {
        &mut tables.genres
    }

    fn matches(&self, filter: &Self::Filter) -> bool {
        field_matches(&filter.name, &self.name)
    }

    fn compare(&self, other: &Self, key: GenreSort) -> Ordering {
        match key {
            GenreSort::Name => self.name.cmp(&other.name),
        }
    }
}

impl MemoryEntity for Book {
    fn table(tables: &Tables) -> &IndexMap<Uuid, Self> {
        &tables.books
    }

    fn table_mut(tables: &mut Tables) -> &mut IndexMap<Uuid, Self> {
        &mut tables.books
    }

    fn matches(&self, filter: &Self::Filter) -> bool {
        field_matches(&filter.author, &self.author.id())
            && field_matches(&filter.title, &self.title)
            && filter
                .genre
                .map_or(true, |genre| self.genre.iter().any(|g| g.id() == genre))
    }

    fn compare(&self, other: &Self, key: BookSort) -> Ordering {
        match key {
            BookSort::Title => self.title.cmp(&other.title),
        }
    }

    fn expand(mut self, tables: &Tables, fields: &[BookField]) -> Self {
        if fields.contains(&BookField::Author) {
            self.author = resolve(self.author, &tables.authors);
        }
        if fields.contains(&BookField::Genre) {
            self.genre = self
                .genre
                .into_iter()
                .map(|g| resolve(g, &tables.genres))
                .collect();
        }
        self
    }
}

impl MemoryEntity for BookInstance {
    fn table(tables: &Tables) -> &IndexMap<Uuid, Self> {
        &tables.book_instances
    }

    fn table_mut(tables: &mut Tables) -> &mut IndexMap<Uuid, Self> {
        &mut tables.book_instances
    }

    fn matches(&self, filter: &Self::Filter) -> bool {
        field_matches(&filter.book, &self.book.id()) && field_matches(&filter.status, &self.status)
    }

    fn compare(&self, other: &Self, key: BookInstanceSort) -> Ordering {
        match key {
            BookInstanceSort::Imprint => self.imprint.cmp(&other.imprint),
            BookInstanceSort::Status => self.status.as_str().cmp(other.status.as_str()),
        }
    }

    fn expand(mut self, tables: &Tables, fields: &[BookInstanceField]) -> Self {
        if fields.contains(&BookInstanceField::Book) {
            self.book = resolve(self.book, &tables.books);
        }
        self
    }
}

#[async_trait]
impl<E: MemoryEntity> EntityStore<E> for MemoryStore {
    async fn find(&self, filter: &E::Filter, options: &FindOptions<E>) -> AppResult<Vec<E>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<E> = E::table(&tables)
            .values()
            .filter(|entity| entity.matches(filter))
            .cloned()
            .collect();

        if let Some(sort) = options.sort {
            rows.sort_by(|a, b| {
                let ordering = a.compare(b, sort.key);
                match sort.order {
                    SortOrder::Ascending => ordering,
                    SortOrder::Descending => ordering.reverse(),
                }
            });
        }

        Ok(rows
            .into_iter()
            .map(|entity| entity.expand(&tables, &options.expand))
            .collect())
    }

    async fn find_by_id(&self, id: Uuid, expand: &[E::Field]) -> AppResult<Option<E>> {
        let tables = self.tables.read().await;
        Ok(E::table(&tables)
            .get(&id)
            .cloned()
            .map(|entity| entity.expand(&tables, expand)))
    }

    async fn find_one(&self, filter: &E::Filter) -> AppResult<Option<E>> {
        let tables = self.tables.read().await;
        Ok(E::table(&tables)
            .values()
            .find(|entity| entity.matches(filter))
            .cloned())
    }

    async fn count(&self, filter: &E::Filter) -> AppResult<i64> {
        let tables = self.tables.read().await;
        let count = E::table(&tables)
            .values()
            .filter(|entity| entity.matches(filter))
            .count();
        Ok(count as i64)
    }

    async fn create(&self, record: &E::Record) -> AppResult<E> {
        let entity = E::from_record(Uuid::new_v4(), record);
        let mut tables = self.tables.write().await;
        E::table_mut(&mut tables).insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn update_by_id(&self, id: Uuid, record: &E::Record) -> AppResult<Option<E>> {
        let mut tables = self.tables.write().await;
        match E::table_mut(&mut tables).get_mut(&id) {
            Some(slot) => {
                *slot = E::from_record(id, record);
                Ok(Some(slot.clone()))
            }
            None => Ok(None),
        }
    }

    async fn remove_by_id(&self, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(E::table_mut(&mut tables).shift_remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AuthorFilter, AuthorRecord, BookFilter, BookInstanceFilter, BookInstanceRecord,
        BookInstanceStatus, BookRecord, GenreFilter, GenreRecord,
    };

    type Authors = dyn EntityStore<Author>;
    type Genres = dyn EntityStore<Genre>;
    type Books = dyn EntityStore<Book>;
    type Copies = dyn EntityStore<BookInstance>;

    fn author(first: &str, family: &str) -> AuthorRecord {
        AuthorRecord {
            first_name: first.to_string(),
            family_name: family.to_string(),
            ..Default::default()
        }
    }

    fn genre(name: &str) -> GenreRecord {
        GenreRecord {
            name: name.to_string(),
        }
    }

    fn book(title: &str, author: Uuid, genre: Vec<Uuid>) -> BookRecord {
        BookRecord {
            title: title.to_string(),
            summary: "summary".to_string(),
            isbn: "isbn".to_string(),
            author,
            genre,
        }
    }

    #[tokio::test]
    async fn test_find_sorts_and_filters() {
        let store = MemoryStore::new();
        for (first, family) in [("Isaac", "Asimov"), ("Ben", "Bova"), ("Bob", "Billings")] {
            Authors::create(&store, &author(first, family)).await.unwrap();
        }

        let ascending = FindOptions::<Author>::new().sort_by(AuthorSort::FamilyName, SortOrder::Ascending);
        let authors = Authors::find(&store, &AuthorFilter::default(), &ascending)
            .await
            .unwrap();
        let names: Vec<_> = authors.iter().map(|a| a.family_name.as_str()).collect();
        assert_eq!(names, vec!["Asimov", "Billings", "Bova"]);

        let descending = FindOptions::<Author>::new().sort_by(AuthorSort::FamilyName, SortOrder::Descending);
        let authors = Authors::find(&store, &AuthorFilter::default(), &descending)
            .await
            .unwrap();
        assert_eq!(authors[0].family_name, "Bova");

        let filter = AuthorFilter {
            family_name: Some("Bova".to_string()),
        };
        assert_eq!(Authors::count(&store, &filter).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_expansion_is_explicit() {
        let store = MemoryStore::new();
        let writer = Authors::create(&store, &author("Patrick", "Rothfuss"))
            .await
            .unwrap();
        let fantasy = Genres::create(&store, &genre("Fantasy")).await.unwrap();
        let created = Books::create(
            &store,
            &book("The Name of the Wind", writer.id, vec![fantasy.id]),
        )
        .await
        .unwrap();

        let plain = Books::find_by_id(&store, created.id, &[])
            .await
            .unwrap()
            .unwrap();
        assert!(plain.author.expanded().is_none());
        assert!(plain.genre[0].expanded().is_none());

        let only_author = Books::find_by_id(&store, created.id, &[BookField::Author])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            only_author.author.expanded().unwrap().family_name,
            "Rothfuss"
        );
        assert!(only_author.genre[0].expanded().is_none());
    }

    #[tokio::test]
    async fn test_dangling_genre_stays_an_id() {
        let store = MemoryStore::new();
        let writer = Authors::create(&store, &author("Patrick", "Rothfuss"))
            .await
            .unwrap();
        let missing = Uuid::new_v4();
        let created = Books::create(&store, &book("The Wise Man's Fear", writer.id, vec![missing]))
            .await
            .unwrap();

        let found = Books::find_by_id(&store, created.id, &[BookField::Genre])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.genre, vec![Ref::Id(missing)]);
    }

    #[tokio::test]
    async fn test_book_filter_by_genre_membership() {
        let store = MemoryStore::new();
        let writer = Authors::create(&store, &author("Ann", "Leckie")).await.unwrap();
        let sf = Uuid::new_v4();
        Books::create(&store, &book("Ancillary Justice", writer.id, vec![Uuid::new_v4(), sf]))
            .await
            .unwrap();
        Books::create(&store, &book("Provenance", writer.id, vec![]))
            .await
            .unwrap();

        let found = Books::find(&store, &BookFilter::by_genre(sf), &FindOptions::new())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Ancillary Justice");
    }

    #[tokio::test]
    async fn test_update_replaces_whole_record_in_place() {
        let store = MemoryStore::new();
        let first = Genres::create(&store, &genre("Poetry")).await.unwrap();
        Genres::create(&store, &genre("Drama")).await.unwrap();

        let renamed = Genres::update_by_id(&store, first.id, &genre("Verse"))
            .await
            .unwrap();
        assert_eq!(renamed.unwrap().name, "Verse");

        let all = Genres::find(&store, &GenreFilter::default(), &FindOptions::new())
            .await
            .unwrap();
        assert_eq!(all[0].id, first.id);

        let missing = Genres::update_by_id(&store, Uuid::new_v4(), &genre("x"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_remove_reports_absence() {
        let store = MemoryStore::new();
        let copy = Copies::create(
            &store,
            &BookInstanceRecord {
                book: Uuid::new_v4(),
                imprint: "Tor, 2007".to_string(),
                status: BookInstanceStatus::Available,
                due_back: None,
            },
        )
        .await
        .unwrap();

        assert!(Copies::remove_by_id(&store, copy.id).await.unwrap());
        assert!(!Copies::remove_by_id(&store, copy.id).await.unwrap());
        let available = BookInstanceFilter::with_status(BookInstanceStatus::Available);
        assert_eq!(Copies::count(&store, &available).await.unwrap(), 0);
    }
}

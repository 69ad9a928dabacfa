//! Book pages and forms.
//!
//! The book form picks one author and any number of genres. A rejected
//! submission reloads both option lists and marks the submitted choices as
//! selected.

use serde::Serialize;
use uuid::Uuid;

use super::{
    aggregate::with_primary,
    forms::{selection_state, BookDraft, Candidate, Draft, FormOutcome, Selectable},
    integrity::{IntegrityGuard, RemovalOutcome},
    validation::{book_form, FieldError, RawForm},
    not_found, Page,
};
use crate::{
    error::AppResult,
    models::{
        Author, AuthorFilter, AuthorSort, Book, BookField, BookFilter, BookInstance,
        BookInstanceFilter, BookSort, EntityKind, Genre, GenreFilter, GenreSort,
    },
    repository::{FindOptions, Repository, SortOrder},
};

#[derive(Debug, Clone, Serialize)]
pub struct BookListPage {
    pub title: String,
    pub book_list: Vec<Book>,
}

impl Page for BookListPage {
    const VIEW: &'static str = "book_list";
}

#[derive(Debug, Clone, Serialize)]
pub struct BookDetailPage {
    pub title: String,
    pub book: Book,
    pub copy_list: Vec<BookInstance>,
}

impl Page for BookDetailPage {
    const VIEW: &'static str = "book_detail";
}

#[derive(Debug, Clone, Serialize)]
pub struct BookFormPage {
    pub title: String,
    pub authors: Vec<Selectable<Author>>,
    pub genres: Vec<Selectable<Genre>>,
    pub book: Option<Candidate<BookDraft>>,
    pub errors: Vec<FieldError>,
}

impl Page for BookFormPage {
    const VIEW: &'static str = "book_form";
}

/// Delete confirmation; lists the copies that block the removal
#[derive(Debug, Clone, Serialize)]
pub struct BookDeletePage {
    pub title: String,
    pub book: Book,
    pub book_instances: Vec<BookInstance>,
}

impl BookDeletePage {
    pub fn new(book: Book, book_instances: Vec<BookInstance>) -> Self {
        Self {
            title: "Delete Book".to_string(),
            book,
            book_instances,
        }
    }
}

impl Page for BookDeletePage {
    const VIEW: &'static str = "book_delete";
}

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    guard: IntegrityGuard,
}

impl BooksService {
    pub fn new(repository: Repository, guard: IntegrityGuard) -> Self {
        Self { repository, guard }
    }

    /// All books by title, author expanded
    pub async fn list(&self) -> AppResult<BookListPage> {
        let options = FindOptions::new()
            .expand(BookField::Author)
            .sort_by(BookSort::Title, SortOrder::Ascending);
        let book_list = self
            .repository
            .books
            .find(&BookFilter::default(), &options)
            .await?;

        Ok(BookListPage {
            title: "Book List".to_string(),
            book_list,
        })
    }

    /// A book with author, genres and copies
    pub async fn detail(&self, id: Uuid) -> AppResult<BookDetailPage> {
        let filter = BookInstanceFilter::by_book(id);
        let options = FindOptions::new();
        let (book, copy_list) = with_primary(
            self.repository
                .books
                .find_by_id(id, &[BookField::Author, BookField::Genre]),
            self.repository.book_instances.find(&filter, &options),
            EntityKind::Book,
        )
        .await?;

        Ok(BookDetailPage {
            title: book.title.clone(),
            book,
            copy_list,
        })
    }

    /// Every author and genre, for the pickers
    async fn options(&self) -> AppResult<(Vec<Author>, Vec<Genre>)> {
        let author_options =
            FindOptions::new().sort_by(AuthorSort::FamilyName, SortOrder::Ascending);
        let genre_options = FindOptions::new().sort_by(GenreSort::Name, SortOrder::Ascending);
        let author_filter = AuthorFilter::default();
        let genre_filter = GenreFilter::default();

        tokio::try_join!(
            self.repository.authors.find(&author_filter, &author_options),
            self.repository.genres.find(&genre_filter, &genre_options),
        )
    }

    fn form_page(
        title: &str,
        authors: Vec<Author>,
        genres: Vec<Genre>,
        book: Option<Candidate<BookDraft>>,
        errors: Vec<FieldError>,
    ) -> BookFormPage {
        let chosen_author: Vec<Uuid> = book
            .as_ref()
            .and_then(|candidate| candidate.draft.author)
            .into_iter()
            .collect();
        let chosen_genres: &[Uuid] = book
            .as_ref()
            .map(|candidate| candidate.draft.genre.as_slice())
            .unwrap_or(&[]);

        BookFormPage {
            title: title.to_string(),
            authors: selection_state(authors, &chosen_author),
            genres: selection_state(genres, chosen_genres),
            book,
            errors,
        }
    }

    pub async fn create_form(&self) -> AppResult<BookFormPage> {
        let (authors, genres) = self.options().await?;
        Ok(Self::form_page("Create Book", authors, genres, None, Vec::new()))
    }

    pub async fn update_form(&self, id: Uuid) -> AppResult<BookFormPage> {
        let author_options =
            FindOptions::new().sort_by(AuthorSort::FamilyName, SortOrder::Ascending);
        let genre_options = FindOptions::new().sort_by(GenreSort::Name, SortOrder::Ascending);
        let author_filter = AuthorFilter::default();
        let genre_filter = GenreFilter::default();

        let (book, authors, genres) = tokio::try_join!(
            self.repository.books.find_by_id(id, &[]),
            self.repository.authors.find(&author_filter, &author_options),
            self.repository.genres.find(&genre_filter, &genre_options),
        )?;
        let book = book.ok_or_else(|| not_found(EntityKind::Book))?;

        Ok(Self::form_page(
            "Update Book",
            authors,
            genres,
            Some(Candidate::of(&book)),
            Vec::new(),
        ))
    }

    pub async fn create(&self, raw: &RawForm) -> AppResult<FormOutcome<Book, BookFormPage>> {
        self.submit(None, raw).await
    }

    /// Replace every field of the book; `NotFound` when absent
    pub async fn update(&self, id: Uuid, raw: &RawForm) -> AppResult<FormOutcome<Book, BookFormPage>> {
        self.submit(Some(id), raw).await
    }

    async fn submit(
        &self,
        id: Option<Uuid>,
        raw: &RawForm,
    ) -> AppResult<FormOutcome<Book, BookFormPage>> {
        if let Some(id) = id {
            if self.repository.books.find_by_id(id, &[]).await?.is_none() {
                return Err(not_found(EntityKind::Book));
            }
        }

        let outcome = book_form().run(raw);
        let candidate = Candidate::<BookDraft>::from_values(id, &outcome.values);
        let mut errors = outcome.errors;

        let record = match candidate.draft.clone().into_record() {
            Some(record) if errors.is_empty() => {
                errors.extend(self.guard.check_book_references(&record).await?);
                Some(record)
            }
            _ => None,
        };

        let title = if id.is_some() { "Update Book" } else { "Create Book" };
        let record = match record {
            Some(record) if errors.is_empty() => record,
            _ => {
                tracing::debug!("Book form rejected: {:?}", errors);
                let (authors, genres) = self.options().await?;
                return Ok(FormOutcome::Rejected(Self::form_page(
                    title,
                    authors,
                    genres,
                    Some(candidate),
                    errors,
                )));
            }
        };

        let book = match id {
            Some(id) => {
                let book = self
                    .repository
                    .books
                    .update_by_id(id, &record)
                    .await?
                    .ok_or_else(|| not_found(EntityKind::Book))?;
                tracing::info!("Updated book {}", id);
                book
            }
            None => {
                let book = self.repository.books.create(&record).await?;
                tracing::info!("Created book {}", book.id);
                book
            }
        };
        Ok(FormOutcome::Saved(book))
    }

    /// Delete confirmation page, or `None` when the book is already gone
    pub async fn delete_page(&self, id: Uuid) -> AppResult<Option<BookDeletePage>> {
        let filter = BookInstanceFilter::by_book(id);
        let options = FindOptions::new();
        let (book, copies) = tokio::try_join!(
            self.repository
                .books
                .find_by_id(id, &[BookField::Author, BookField::Genre]),
            self.repository.book_instances.find(&filter, &options),
        )?;

        Ok(book.map(|book| BookDeletePage::new(book, copies)))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<RemovalOutcome<Book, BookInstance>> {
        self.guard.remove_book(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::CatalogConfig,
        error::AppError,
        models::{AuthorRecord, GenreRecord, Ref},
        services::validation::FieldValue,
    };

    struct Fixture {
        service: BooksService,
        repository: Repository,
        author: Author,
        genres: Vec<Genre>,
    }

    async fn fixture() -> Fixture {
        let repository = Repository::in_memory();
        let guard = IntegrityGuard::new(repository.clone(), CatalogConfig::default());
        let author = repository
            .authors
            .create(&AuthorRecord {
                first_name: "Ursula".to_string(),
                family_name: "LeGuin".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let mut genres = Vec::new();
        for name in ["Fantasy", "Poetry", "Science Fiction"] {
            genres.push(
                repository
                    .genres
                    .create(&GenreRecord {
                        name: name.to_string(),
                    })
                    .await
                    .unwrap(),
            );
        }

        Fixture {
            service: BooksService::new(repository.clone(), guard),
            repository,
            author,
            genres,
        }
    }

    fn raw(title: &str, author: Uuid, genre: &[Uuid]) -> RawForm {
        let genre: Vec<String> = genre.iter().map(Uuid::to_string).collect();
        RawForm::from([
            ("title".to_string(), FieldValue::from(title)),
            ("summary".to_string(), FieldValue::from("S")),
            ("isbn".to_string(), FieldValue::from("123")),
            ("author".to_string(), FieldValue::One(author.to_string())),
            ("genre".to_string(), FieldValue::Many(genre)),
        ])
    }

    fn selected_genres(page: &BookFormPage) -> Vec<Uuid> {
        page.genres
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.item.id)
            .collect()
    }

    #[tokio::test]
    async fn test_rejected_form_keeps_selection() {
        let f = fixture().await;
        let chosen = [f.genres[0].id, f.genres[2].id];

        for _ in 0..2 {
            let outcome = f.service.create(&raw("", f.author.id, &chosen)).await.unwrap();
            let FormOutcome::Rejected(page) = outcome else {
                panic!("blank title accepted");
            };
            assert_eq!(selected_genres(&page), chosen.to_vec());
            assert_eq!(page.errors[0], FieldError::new("title", "Book must have title"));
            assert!(page.authors.iter().all(|a| a.selected == (a.item.id == f.author.id)));
        }

        let count = f.repository.books.count(&BookFilter::default()).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_unknown_author_rejected() {
        let f = fixture().await;
        let outcome = f.service.create(&raw("Title", Uuid::new_v4(), &[])).await.unwrap();
        let FormOutcome::Rejected(page) = outcome else {
            panic!("dangling author accepted");
        };
        assert_eq!(page.errors, vec![FieldError::new("author", "Author does not exist")]);
    }

    #[tokio::test]
    async fn test_create_and_detail() {
        let f = fixture().await;
        let outcome = f
            .service
            .create(&raw("The Dispossessed", f.author.id, &[f.genres[2].id]))
            .await
            .unwrap();
        let FormOutcome::Saved(book) = outcome else {
            panic!("valid book rejected");
        };

        let page = f.service.detail(book.id).await.unwrap();
        assert_eq!(page.book.author.expanded().map(|a| a.id), Some(f.author.id));
        assert!(matches!(page.book.genre.as_slice(), [Ref::Expanded(g)] if g.name == "Science Fiction"));
        assert!(page.copy_list.is_empty());
    }

    #[tokio::test]
    async fn test_update_form_selects_stored_genres() {
        let f = fixture().await;
        let FormOutcome::Saved(book) = f
            .service
            .create(&raw("Always Coming Home", f.author.id, &[f.genres[1].id]))
            .await
            .unwrap()
        else {
            panic!("valid book rejected");
        };

        let page = f.service.update_form(book.id).await.unwrap();
        assert_eq!(selected_genres(&page), vec![f.genres[1].id]);
        assert_eq!(page.book.and_then(|c| c.id), Some(book.id));

        let missing = f.service.update_form(Uuid::new_v4()).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_of_missing_book_is_not_found() {
        let f = fixture().await;
        let id = Uuid::new_v4();

        let invalid = f.service.update(id, &raw("", f.author.id, &[])).await;
        assert!(matches!(invalid, Err(AppError::NotFound(ref msg)) if msg == "Book not found"));

        let dangling = f.service.update(id, &raw("Lavinia", Uuid::new_v4(), &[])).await;
        assert!(matches!(dangling, Err(AppError::NotFound(_))));

        let valid = f.service.update(id, &raw("Lavinia", f.author.id, &[])).await;
        assert!(matches!(valid, Err(AppError::NotFound(_))));
        assert!(f.service.list().await.unwrap().book_list.is_empty());
    }
}

//! Author pages and forms

use serde::Serialize;
use uuid::Uuid;

use super::{
    aggregate::with_primary,
    forms::{AuthorDraft, Candidate, Draft, FormOutcome},
    integrity::{IntegrityGuard, RemovalOutcome},
    validation::{author_form, FieldError, RawForm},
    not_found, Page,
};
use crate::{
    error::{AppError, AppResult},
    models::{Author, AuthorFilter, AuthorSort, Book, BookFilter, EntityKind},
    repository::{FindOptions, Repository, SortOrder},
};

#[derive(Debug, Clone, Serialize)]
pub struct AuthorListPage {
    pub title: String,
    pub author_list: Vec<Author>,
}

impl Page for AuthorListPage {
    const VIEW: &'static str = "author_list";
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorDetailPage {
    pub title: String,
    pub author: Author,
    pub book_list: Vec<Book>,
}

impl Page for AuthorDetailPage {
    const VIEW: &'static str = "author_detail";
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorFormPage {
    pub title: String,
    pub author: Option<Candidate<AuthorDraft>>,
    pub errors: Vec<FieldError>,
}

impl Page for AuthorFormPage {
    const VIEW: &'static str = "author_form";
}

/// Delete confirmation; lists the books that block the removal
#[derive(Debug, Clone, Serialize)]
pub struct AuthorDeletePage {
    pub title: String,
    pub author: Author,
    pub author_books: Vec<Book>,
}

impl AuthorDeletePage {
    pub fn new(author: Author, author_books: Vec<Book>) -> Self {
        Self {
            title: "Delete Author".to_string(),
            author,
            author_books,
        }
    }
}

impl Page for AuthorDeletePage {
    const VIEW: &'static str = "author_delete";
}

#[derive(Clone)]
pub struct AuthorsService {
    repository: Repository,
    guard: IntegrityGuard,
}

impl AuthorsService {
    pub fn new(repository: Repository, guard: IntegrityGuard) -> Self {
        Self { repository, guard }
    }

    /// All authors by family name
    pub async fn list(&self) -> AppResult<AuthorListPage> {
        let options = FindOptions::new().sort_by(AuthorSort::FamilyName, SortOrder::Ascending);
        let author_list = self
            .repository
            .authors
            .find(&AuthorFilter::default(), &options)
            .await?;

        Ok(AuthorListPage {
            title: "Author List".to_string(),
            author_list,
        })
    }

    /// An author with their books; `NotFound` when the author is absent
    pub async fn detail(&self, id: Uuid) -> AppResult<AuthorDetailPage> {
        let filter = BookFilter::by_author(id);
        let options = FindOptions::new();
        let (author, book_list) = with_primary(
            self.repository.authors.find_by_id(id, &[]),
            self.repository.books.find(&filter, &options),
            EntityKind::Author,
        )
        .await?;

        Ok(AuthorDetailPage {
            title: "Author Detail".to_string(),
            author,
            book_list,
        })
    }

    pub fn create_form(&self) -> AuthorFormPage {
        AuthorFormPage {
            title: "Create Author".to_string(),
            author: None,
            errors: Vec::new(),
        }
    }

    pub async fn create(&self, raw: &RawForm) -> AppResult<FormOutcome<Author, AuthorFormPage>> {
        let outcome = author_form().run(raw);
        let candidate = Candidate::<AuthorDraft>::from_values(None, &outcome.values);

        if !outcome.is_valid() {
            tracing::debug!("Author form rejected: {:?}", outcome.failed_fields());
            return Ok(FormOutcome::Rejected(AuthorFormPage {
                title: "Create Author".to_string(),
                author: Some(candidate),
                errors: outcome.errors,
            }));
        }

        let record = candidate
            .draft
            .into_record()
            .ok_or_else(|| AppError::Internal("incomplete author draft".to_string()))?;
        let author = self.repository.authors.create(&record).await?;
        tracing::info!("Created author {}", author.id);
        Ok(FormOutcome::Saved(author))
    }

    /// Form prefilled with the stored author
    pub async fn update_form(&self, id: Uuid) -> AppResult<AuthorFormPage> {
        let author = self
            .repository
            .authors
            .find_by_id(id, &[])
            .await?
            .ok_or_else(|| not_found(EntityKind::Author))?;

        Ok(AuthorFormPage {
            title: "Update Author".to_string(),
            author: Some(Candidate::of(&author)),
            errors: Vec::new(),
        })
    }

    /// Replace every field of the author; `NotFound` when absent
    pub async fn update(
        &self,
        id: Uuid,
        raw: &RawForm,
    ) -> AppResult<FormOutcome<Author, AuthorFormPage>> {
        if self.repository.authors.find_by_id(id, &[]).await?.is_none() {
            return Err(not_found(EntityKind::Author));
        }

        let outcome = author_form().run(raw);
        let candidate = Candidate::<AuthorDraft>::from_values(Some(id), &outcome.values);

        if !outcome.is_valid() {
            tracing::debug!("Author form rejected for {}: {:?}", id, outcome.failed_fields());
            return Ok(FormOutcome::Rejected(AuthorFormPage {
                title: "Update Author".to_string(),
                author: Some(candidate),
                errors: outcome.errors,
            }));
        }

        let record = candidate
            .draft
            .into_record()
            .ok_or_else(|| AppError::Internal("incomplete author draft".to_string()))?;
        let author = self
            .repository
            .authors
            .update_by_id(id, &record)
            .await?
            .ok_or_else(|| not_found(EntityKind::Author))?;
        tracing::info!("Updated author {}", id);
        Ok(FormOutcome::Saved(author))
    }

    /// Delete confirmation page, or `None` when the author is already gone
    pub async fn delete_page(&self, id: Uuid) -> AppResult<Option<AuthorDeletePage>> {
        let filter = BookFilter::by_author(id);
        let options = FindOptions::new();
        let (author, books) = tokio::try_join!(
            self.repository.authors.find_by_id(id, &[]),
            self.repository.books.find(&filter, &options),
        )?;

        Ok(author.map(|author| AuthorDeletePage::new(author, books)))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<RemovalOutcome<Author, Book>> {
        self.guard.remove_author(id).await
    }
}

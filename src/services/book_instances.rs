//! Book copy pages and forms

use serde::Serialize;
use uuid::Uuid;

use super::{
    forms::{selection_state, BookInstanceDraft, Candidate, Draft, FormOutcome, Selectable},
    validation::{book_instance_form, FieldError, RawForm},
    not_found, Page,
};
use crate::{
    error::AppResult,
    models::{
        Book, BookFilter, BookInstance, BookInstanceField, BookInstanceFilter, BookInstanceStatus,
        BookSort, EntityKind,
    },
    repository::{FindOptions, Repository, SortOrder},
};

#[derive(Debug, Clone, Serialize)]
pub struct BookInstanceListPage {
    pub title: String,
    pub bookinstance_list: Vec<BookInstance>,
}

impl Page for BookInstanceListPage {
    const VIEW: &'static str = "bookinstance_list";
}

#[derive(Debug, Clone, Serialize)]
pub struct BookInstanceDetailPage {
    pub title: String,
    pub bookinstance: BookInstance,
}

impl Page for BookInstanceDetailPage {
    const VIEW: &'static str = "bookinstance_detail";
}

#[derive(Debug, Clone, Serialize)]
pub struct BookInstanceFormPage {
    pub title: String,
    pub book_list: Vec<Selectable<Book>>,
    pub statuses: [BookInstanceStatus; 4],
    pub bookinstance: Option<Candidate<BookInstanceDraft>>,
    pub errors: Vec<FieldError>,
}

impl Page for BookInstanceFormPage {
    const VIEW: &'static str = "bookinstance_form";
}

#[derive(Debug, Clone, Serialize)]
pub struct BookInstanceDeletePage {
    pub title: String,
    pub bookinstance: BookInstance,
}

impl Page for BookInstanceDeletePage {
    const VIEW: &'static str = "bookinstance_delete";
}

#[derive(Clone)]
pub struct BookInstancesService {
    repository: Repository,
}

impl BookInstancesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Every copy with its book expanded
    pub async fn list(&self) -> AppResult<BookInstanceListPage> {
        let options = FindOptions::new().expand(BookInstanceField::Book);
        let bookinstance_list = self
            .repository
            .book_instances
            .find(&BookInstanceFilter::default(), &options)
            .await?;

        Ok(BookInstanceListPage {
            title: "Book Instance List".to_string(),
            bookinstance_list,
        })
    }

    async fn find_expanded(&self, id: Uuid) -> AppResult<Option<BookInstance>> {
        self.repository
            .book_instances
            .find_by_id(id, &[BookInstanceField::Book])
            .await
    }

    pub async fn detail(&self, id: Uuid) -> AppResult<BookInstanceDetailPage> {
        let bookinstance = self
            .find_expanded(id)
            .await?
            .ok_or_else(|| not_found(EntityKind::BookInstance))?;

        let title = match bookinstance.book.expanded() {
            Some(book) => format!("Copy: {}", book.title),
            None => "Copy".to_string(),
        };
        Ok(BookInstanceDetailPage {
            title,
            bookinstance,
        })
    }

    async fn books(&self) -> AppResult<Vec<Book>> {
        let options = FindOptions::new().sort_by(BookSort::Title, SortOrder::Ascending);
        self.repository
            .books
            .find(&BookFilter::default(), &options)
            .await
    }

    fn form_page(
        title: &str,
        books: Vec<Book>,
        bookinstance: Option<Candidate<BookInstanceDraft>>,
        errors: Vec<FieldError>,
    ) -> BookInstanceFormPage {
        let chosen: Vec<Uuid> = bookinstance
            .as_ref()
            .and_then(|candidate| candidate.draft.book)
            .into_iter()
            .collect();

        BookInstanceFormPage {
            title: title.to_string(),
            book_list: selection_state(books, &chosen),
            statuses: BookInstanceStatus::ALL,
            bookinstance,
            errors,
        }
    }

    pub async fn create_form(&self) -> AppResult<BookInstanceFormPage> {
        let books = self.books().await?;
        Ok(Self::form_page("Create BookInstance", books, None, Vec::new()))
    }

    pub async fn update_form(&self, id: Uuid) -> AppResult<BookInstanceFormPage> {
        let (bookinstance, books) = tokio::try_join!(
            self.repository.book_instances.find_by_id(id, &[]),
            self.books(),
        )?;
        let bookinstance =
            bookinstance.ok_or_else(|| not_found(EntityKind::BookInstance))?;

        Ok(Self::form_page(
            "Update BookInstance",
            books,
            Some(Candidate::of(&bookinstance)),
            Vec::new(),
        ))
    }

    pub async fn create(
        &self,
        raw: &RawForm,
    ) -> AppResult<FormOutcome<BookInstance, BookInstanceFormPage>> {
        self.submit(None, raw).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        raw: &RawForm,
    ) -> AppResult<FormOutcome<BookInstance, BookInstanceFormPage>> {
        self.submit(Some(id), raw).await
    }

    async fn submit(
        &self,
        id: Option<Uuid>,
        raw: &RawForm,
    ) -> AppResult<FormOutcome<BookInstance, BookInstanceFormPage>> {
        if let Some(id) = id {
            if self.repository.book_instances.find_by_id(id, &[]).await?.is_none() {
                return Err(not_found(EntityKind::BookInstance));
            }
        }

        let outcome = book_instance_form().run(raw);
        let candidate = Candidate::<BookInstanceDraft>::from_values(id, &outcome.values);

        let record = match candidate.draft.clone().into_record() {
            Some(record) if outcome.is_valid() => record,
            _ => {
                tracing::debug!("Book copy form rejected: {:?}", outcome.failed_fields());
                let title = if id.is_some() {
                    "Update BookInstance"
                } else {
                    "Create BookInstance"
                };
                let books = self.books().await?;
                return Ok(FormOutcome::Rejected(Self::form_page(
                    title,
                    books,
                    Some(candidate),
                    outcome.errors,
                )));
            }
        };

        let bookinstance = match id {
            Some(id) => {
                let bookinstance = self
                    .repository
                    .book_instances
                    .update_by_id(id, &record)
                    .await?
                    .ok_or_else(|| not_found(EntityKind::BookInstance))?;
                tracing::info!("Updated book copy {}", id);
                bookinstance
            }
            None => {
                let bookinstance = self.repository.book_instances.create(&record).await?;
                tracing::info!("Created book copy {}", bookinstance.id);
                bookinstance
            }
        };
        Ok(FormOutcome::Saved(bookinstance))
    }

    pub async fn delete_page(&self, id: Uuid) -> AppResult<Option<BookInstanceDeletePage>> {
        Ok(self
            .find_expanded(id)
            .await?
            .map(|bookinstance| BookInstanceDeletePage {
                title: "Delete BookInstance".to_string(),
                bookinstance,
            }))
    }

    /// Unguarded: nothing references a copy
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let removed = self.repository.book_instances.remove_by_id(id).await?;
        if removed {
            tracing::info!("Removed book copy {}", id);
        }
        Ok(removed)
    }
}

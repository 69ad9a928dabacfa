//! Write-time referential checks.
//!
//! A blocked removal is a [`RemovalOutcome::Blocked`] carrying the entities
//! that still reference the target, never an error.

use futures::future::try_join_all;
use uuid::Uuid;

use super::validation::FieldError;
use crate::{
    config::CatalogConfig,
    error::AppResult,
    models::{Author, Book, BookField, BookFilter, BookInstance, BookInstanceFilter, BookRecord},
    repository::{FindOptions, Repository},
};

/// Outcome of a guarded removal
#[derive(Debug, Clone, PartialEq)]
pub enum RemovalOutcome<E, B> {
    Removed,
    /// Nothing was stored under the id
    Missing,
    /// Refused while `blocking` still reference `entity`
    Blocked { entity: E, blocking: Vec<B> },
}

impl<E, B> RemovalOutcome<E, B> {
    pub fn is_blocked(&self) -> bool {
        matches!(self, RemovalOutcome::Blocked { .. })
    }
}

#[derive(Clone)]
pub struct IntegrityGuard {
    repository: Repository,
    config: CatalogConfig,
}

impl IntegrityGuard {
    pub fn new(repository: Repository, config: CatalogConfig) -> Self {
        Self { repository, config }
    }

    /// Remove an author unless books still reference it
    pub async fn remove_author(&self, id: Uuid) -> AppResult<RemovalOutcome<Author, Book>> {
        let filter = BookFilter::by_author(id);
        let options = FindOptions::new();
        let (author, books) = tokio::try_join!(
            self.repository.authors.find_by_id(id, &[]),
            self.repository.books.find(&filter, &options),
        )?;

        let Some(author) = author else {
            return Ok(RemovalOutcome::Missing);
        };
        if !books.is_empty() {
            tracing::info!(
                "Refusing to remove author {}: referenced by {} book(s)",
                id,
                books.len()
            );
            return Ok(RemovalOutcome::Blocked {
                entity: author,
                blocking: books,
            });
        }

        let removed = self.repository.authors.remove_by_id(id).await?;
        Ok(removal(removed, "author", id))
    }

    /// Remove a book unless copies still reference it (when guarded)
    pub async fn remove_book(&self, id: Uuid) -> AppResult<RemovalOutcome<Book, BookInstance>> {
        if self.config.guard_book_removal {
            let filter = BookInstanceFilter::by_book(id);
            let options = FindOptions::new();
            let (book, copies) = tokio::try_join!(
                self.repository
                    .books
                    .find_by_id(id, &[BookField::Author, BookField::Genre]),
                self.repository.book_instances.find(&filter, &options),
            )?;

            let Some(book) = book else {
                return Ok(RemovalOutcome::Missing);
            };
            if !copies.is_empty() {
                tracing::info!(
                    "Refusing to remove book {}: referenced by {} copies",
                    id,
                    copies.len()
                );
                return Ok(RemovalOutcome::Blocked {
                    entity: book,
                    blocking: copies,
                });
            }
        }

        let removed = self.repository.books.remove_by_id(id).await?;
        Ok(removal(removed, "book", id))
    }

    /// Messages for a book whose author or genres do not exist
    pub async fn check_book_references(&self, record: &BookRecord) -> AppResult<Vec<FieldError>> {
        if !self.config.strict_references {
            return Ok(Vec::new());
        }

        let genre_lookups = record
            .genre
            .iter()
            .map(|genre| self.repository.genres.find_by_id(*genre, &[]));
        let (author, genres) = tokio::try_join!(
            self.repository.authors.find_by_id(record.author, &[]),
            try_join_all(genre_lookups),
        )?;

        let mut errors = Vec::new();
        if author.is_none() {
            errors.push(FieldError::new("author", "Author does not exist"));
        }
        for (genre_id, genre) in record.genre.iter().zip(genres) {
            if genre.is_none() {
                tracing::debug!("Book references unknown genre {}", genre_id);
                errors.push(FieldError::new("genre", "Genre does not exist"));
            }
        }
        Ok(errors)
    }
}

fn removal<E, B>(removed: bool, kind: &str, id: Uuid) -> RemovalOutcome<E, B> {
    if removed {
        tracing::info!("Removed {} {}", kind, id);
        RemovalOutcome::Removed
    } else {
        RemovalOutcome::Missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorRecord, BookInstanceRecord, BookInstanceStatus, GenreRecord};

    fn guard(config: CatalogConfig) -> (IntegrityGuard, Repository) {
        let repository = Repository::in_memory();
        (IntegrityGuard::new(repository.clone(), config), repository)
    }

    fn author_record() -> AuthorRecord {
        AuthorRecord {
            first_name: "Ursula".to_string(),
            family_name: "LeGuin".to_string(),
            date_of_birth: None,
            date_of_death: None,
        }
    }

    fn book_record(author: Uuid, genre: Vec<Uuid>) -> BookRecord {
        BookRecord {
            title: "The Dispossessed".to_string(),
            summary: "An ambiguous utopia".to_string(),
            isbn: "9780061054884".to_string(),
            author,
            genre,
        }
    }

    #[tokio::test]
    async fn test_author_without_books_is_removed() {
        let (guard, repository) = guard(CatalogConfig::default());
        let author = repository.authors.create(&author_record()).await.unwrap();

        let outcome = guard.remove_author(author.id).await.unwrap();
        assert_eq!(outcome, RemovalOutcome::Removed);
        assert_eq!(repository.authors.find_by_id(author.id, &[]).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_author_with_books_is_blocked() {
        let (guard, repository) = guard(CatalogConfig::default());
        let author = repository.authors.create(&author_record()).await.unwrap();
        let book = repository
            .books
            .create(&book_record(author.id, vec![]))
            .await
            .unwrap();

        let outcome = guard.remove_author(author.id).await.unwrap();
        match outcome {
            RemovalOutcome::Blocked { entity, blocking } => {
                assert_eq!(entity.id, author.id);
                assert_eq!(blocking.iter().map(|b| b.id).collect::<Vec<_>>(), vec![book.id]);
            }
            other => panic!("expected a blocked removal, got {:?}", other),
        }
        assert!(repository.authors.find_by_id(author.id, &[]).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_author() {
        let (guard, _) = guard(CatalogConfig::default());
        let outcome = guard.remove_author(Uuid::new_v4()).await.unwrap();
        assert_eq!(outcome, RemovalOutcome::Missing);
    }

    #[tokio::test]
    async fn test_book_removal_guard_follows_config() {
        let copy = |book| BookInstanceRecord {
            book,
            imprint: "Harper, 1974".to_string(),
            status: BookInstanceStatus::Available,
            due_back: None,
        };

        let (strict, repository) = guard(CatalogConfig::default());
        let book = repository
            .books
            .create(&book_record(Uuid::new_v4(), vec![]))
            .await
            .unwrap();
        repository.book_instances.create(&copy(book.id)).await.unwrap();
        assert!(strict.remove_book(book.id).await.unwrap().is_blocked());

        let (lenient, repository) = guard(CatalogConfig {
            guard_book_removal: false,
            ..CatalogConfig::default()
        });
        let book = repository
            .books
            .create(&book_record(Uuid::new_v4(), vec![]))
            .await
            .unwrap();
        repository.book_instances.create(&copy(book.id)).await.unwrap();
        assert_eq!(lenient.remove_book(book.id).await.unwrap(), RemovalOutcome::Removed);
    }

    #[tokio::test]
    async fn test_unknown_references_reported() {
        let (guard, repository) = guard(CatalogConfig::default());
        let author = repository.authors.create(&author_record()).await.unwrap();
        let genre = repository
            .genres
            .create(&GenreRecord {
                name: "Fiction".to_string(),
            })
            .await
            .unwrap();

        let valid = book_record(author.id, vec![genre.id]);
        assert!(guard.check_book_references(&valid).await.unwrap().is_empty());

        let dangling = book_record(Uuid::new_v4(), vec![genre.id, Uuid::new_v4()]);
        let errors = guard.check_book_references(&dangling).await.unwrap();
        assert_eq!(
            errors,
            vec![
                FieldError::new("author", "Author does not exist"),
                FieldError::new("genre", "Genre does not exist"),
            ]
        );
    }

    #[tokio::test]
    async fn test_lenient_references_skip_lookup() {
        let (guard, _) = guard(CatalogConfig {
            strict_references: false,
            ..CatalogConfig::default()
        });
        let record = book_record(Uuid::new_v4(), vec![Uuid::new_v4()]);
        assert!(guard.check_book_references(&record).await.unwrap().is_empty());
    }
}

//! Genre pages and forms

use serde::Serialize;
use uuid::Uuid;

use super::{
    aggregate::with_primary,
    forms::{Candidate, Draft, FormOutcome, GenreDraft},
    validation::{genre_form, FieldError, RawForm},
    not_found, Page,
};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookFilter, EntityKind, Genre, GenreFilter, GenreSort},
    repository::{FindOptions, Repository, SortOrder},
};

#[derive(Debug, Clone, Serialize)]
pub struct GenreListPage {
    pub title: String,
    pub genre_list: Vec<Genre>,
}

impl Page for GenreListPage {
    const VIEW: &'static str = "genre_list";
}

#[derive(Debug, Clone, Serialize)]
pub struct GenreDetailPage {
    pub title: String,
    pub genre: Genre,
    pub genre_books: Vec<Book>,
}

impl Page for GenreDetailPage {
    const VIEW: &'static str = "genre_detail";
}

#[derive(Debug, Clone, Serialize)]
pub struct GenreFormPage {
    pub title: String,
    pub genre: Option<Candidate<GenreDraft>>,
    pub errors: Vec<FieldError>,
}

impl Page for GenreFormPage {
    const VIEW: &'static str = "genre_form";
}

#[derive(Debug, Clone, Serialize)]
pub struct GenreDeletePage {
    pub title: String,
    pub genre: Genre,
    pub genre_books: Vec<Book>,
}

impl Page for GenreDeletePage {
    const VIEW: &'static str = "genre_delete";
}

#[derive(Clone)]
pub struct GenresService {
    repository: Repository,
}

impl GenresService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<GenreListPage> {
        let options = FindOptions::new().sort_by(GenreSort::Name, SortOrder::Ascending);
        let genre_list = self
            .repository
            .genres
            .find(&GenreFilter::default(), &options)
            .await?;

        Ok(GenreListPage {
            title: "Genre List".to_string(),
            genre_list,
        })
    }

    pub async fn detail(&self, id: Uuid) -> AppResult<GenreDetailPage> {
        let filter = BookFilter::by_genre(id);
        let options = FindOptions::new();
        let (genre, genre_books) = with_primary(
            self.repository.genres.find_by_id(id, &[]),
            self.repository.books.find(&filter, &options),
            EntityKind::Genre,
        )
        .await?;

        Ok(GenreDetailPage {
            title: "Genre Detail".to_string(),
            genre,
            genre_books,
        })
    }

    pub fn create_form(&self) -> GenreFormPage {
        GenreFormPage {
            title: "Create Genre".to_string(),
            genre: None,
            errors: Vec::new(),
        }
    }

    /// Create a genre, or hand back the stored one with the same name
    pub async fn create(&self, raw: &RawForm) -> AppResult<FormOutcome<Genre, GenreFormPage>> {
        let outcome = genre_form().run(raw);
        let candidate = Candidate::<GenreDraft>::from_values(None, &outcome.values);

        if !outcome.is_valid() {
            tracing::debug!("Genre form rejected: {:?}", outcome.failed_fields());
            return Ok(FormOutcome::Rejected(GenreFormPage {
                title: "Create Genre".to_string(),
                genre: Some(candidate),
                errors: outcome.errors,
            }));
        }

        let record = candidate
            .draft
            .into_record()
            .ok_or_else(|| AppError::Internal("incomplete genre draft".to_string()))?;

        if let Some(existing) = self
            .repository
            .genres
            .find_one(&GenreFilter::named(record.name.as_str()))
            .await?
        {
            tracing::debug!("Reusing genre {} for name {:?}", existing.id, existing.name);
            return Ok(FormOutcome::Saved(existing));
        }

        let genre = self.repository.genres.create(&record).await?;
        tracing::info!("Created genre {}", genre.id);
        Ok(FormOutcome::Saved(genre))
    }

    pub async fn update_form(&self, id: Uuid) -> AppResult<GenreFormPage> {
        let genre = self
            .repository
            .genres
            .find_by_id(id, &[])
            .await?
            .ok_or_else(|| not_found(EntityKind::Genre))?;

        Ok(GenreFormPage {
            title: "Update Genre".to_string(),
            genre: Some(Candidate::of(&genre)),
            errors: Vec::new(),
        })
    }

    pub async fn update(&self, id: Uuid, raw: &RawForm) -> AppResult<FormOutcome<Genre, GenreFormPage>> {
        if self.repository.genres.find_by_id(id, &[]).await?.is_none() {
            return Err(not_found(EntityKind::Genre));
        }

        let outcome = genre_form().run(raw);
        let candidate = Candidate::<GenreDraft>::from_values(Some(id), &outcome.values);

        if !outcome.is_valid() {
            tracing::debug!("Genre form rejected for {}: {:?}", id, outcome.failed_fields());
            return Ok(FormOutcome::Rejected(GenreFormPage {
                title: "Update Genre".to_string(),
                genre: Some(candidate),
                errors: outcome.errors,
            }));
        }

        let record = candidate
            .draft
            .into_record()
            .ok_or_else(|| AppError::Internal("incomplete genre draft".to_string()))?;
        let genre = self
            .repository
            .genres
            .update_by_id(id, &record)
            .await?
            .ok_or_else(|| not_found(EntityKind::Genre))?;
        tracing::info!("Updated genre {}", id);
        Ok(FormOutcome::Saved(genre))
    }

    pub async fn delete_page(&self, id: Uuid) -> AppResult<Option<GenreDeletePage>> {
        let filter = BookFilter::by_genre(id);
        let options = FindOptions::new();
        let (genre, genre_books) = tokio::try_join!(
            self.repository.genres.find_by_id(id, &[]),
            self.repository.books.find(&filter, &options),
        )?;

        Ok(genre.map(|genre| GenreDeletePage {
            title: "Delete Genre".to_string(),
            genre,
            genre_books,
        }))
    }

    /// Unguarded: books keep a dangling genre id
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let removed = self.repository.genres.remove_by_id(id).await?;
        if removed {
            tracing::info!("Removed genre {}", id);
        }
        Ok(removed)
    }
}

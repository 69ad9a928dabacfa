//! Books repository (Postgres).
//!
//! The genre set is kept in `book_genres` with an explicit position so the
//! submitted order survives a round trip.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, Pool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use super::{
    authors::AuthorsRepository, expand_ref, genres::GenresRepository, EntityStore, FindOptions,
};
use crate::{
    error::AppResult,
    models::{Book, BookField, BookFilter, BookRecord, BookSort, Entity},
};

#[derive(Debug, FromRow)]
struct BookRow {
    id: Uuid,
    title: String,
    summary: String,
    isbn: String,
    author_id: Uuid,
}

/// `book_genres.position` of the genre at `index`
fn genre_position(index: usize) -> Result<i32, sqlx::Error> {
    i32::try_from(index).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
    authors: AuthorsRepository,
    genres: GenresRepository,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: AuthorsRepository::new(pool.clone()),
            genres: GenresRepository::new(pool.clone()),
            pool,
        }
    }

    /// Load the books with the given ids (references not expanded), keyed by id
    pub async fn get_many(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, Book>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, BookRow>(
            "SELECT id, title, summary, isbn, author_id FROM books WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let books = self.assemble(rows, &[]).await?;
        Ok(books.into_iter().map(|b| (b.id, b)).collect())
    }

    /// Ordered genre ids per book
    async fn genre_links(&self, book_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<Uuid>>> {
        if book_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT book_id, genre_id FROM book_genres
            WHERE book_id = ANY($1)
            ORDER BY book_id, position
            "#,
        )
        .bind(book_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut links: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (book_id, genre_id) in rows {
            links.entry(book_id).or_default().push(genre_id);
        }
        Ok(links)
    }

    /// Attach genre sets and expand the requested references
    async fn assemble(&self, rows: Vec<BookRow>, expand: &[BookField]) -> AppResult<Vec<Book>> {
        let book_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut links = self.genre_links(&book_ids).await?;

        let authors = if expand.contains(&BookField::Author) {
            let author_ids: Vec<Uuid> = rows.iter().map(|r| r.author_id).collect();
            self.authors.get_many(&author_ids).await?
        } else {
            HashMap::new()
        };

        let genres = if expand.contains(&BookField::Genre) {
            let genre_ids: Vec<Uuid> = links.values().flatten().copied().collect();
            self.genres.get_many(&genre_ids).await?
        } else {
            HashMap::new()
        };

        Ok(rows
            .into_iter()
            .map(|row| {
                let genre_ids = links.remove(&row.id).unwrap_or_default();
                Book {
                    id: row.id,
                    title: row.title,
                    summary: row.summary,
                    isbn: row.isbn,
                    author: expand_ref(row.author_id, &authors),
                    genre: genre_ids
                        .into_iter()
                        .map(|genre_id| expand_ref(genre_id, &genres))
                        .collect(),
                }
            })
            .collect())
    }

    fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
        builder.push(" WHERE 1=1");
        if let Some(author) = filter.author {
            builder.push(" AND author_id = ").push_bind(author);
        }
        if let Some(genre) = filter.genre {
            builder
                .push(" AND EXISTS (SELECT 1 FROM book_genres bg WHERE bg.book_id = books.id AND bg.genre_id = ")
                .push_bind(genre)
                .push(")");
        }
        if let Some(ref title) = filter.title {
            builder.push(" AND title = ").push_bind(title.clone());
        }
    }

    /// Replace the genre links of a book within an existing transaction
    async fn set_genres_inner(
        tx: &mut Transaction<'_, Postgres>,
        book_id: Uuid,
        genre_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut **tx)
            .await?;

        for (index, genre_id) in genre_ids.iter().enumerate() {
            sqlx::query("INSERT INTO book_genres (book_id, genre_id, position) VALUES ($1, $2, $3)")
                .bind(book_id)
                .bind(genre_id)
                .bind(genre_position(index)?)
                .execute(&mut **tx)
                .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl EntityStore<Book> for BooksRepository {
    async fn find(&self, filter: &BookFilter, options: &FindOptions<Book>) -> AppResult<Vec<Book>> {
        let mut builder = QueryBuilder::new("SELECT id, title, summary, isbn, author_id FROM books");
        Self::push_filter(&mut builder, filter);
        match options.sort {
            Some(sort) => {
                let column = match sort.key {
                    BookSort::Title => "title",
                };
                builder.push(format!(" ORDER BY {} {}, id", column, sort.order.as_sql()));
            }
            None => {
                builder.push(" ORDER BY created_at, id");
            }
        }

        let rows = builder
            .build_query_as::<BookRow>()
            .fetch_all(&self.pool)
            .await?;
        self.assemble(rows, &options.expand).await
    }

    async fn find_by_id(&self, id: Uuid, expand: &[BookField]) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, BookRow>(
            "SELECT id, title, summary, isbn, author_id FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.assemble(vec![row], expand).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_one(&self, filter: &BookFilter) -> AppResult<Option<Book>> {
        let mut builder = QueryBuilder::new("SELECT id, title, summary, isbn, author_id FROM books");
        Self::push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at, id LIMIT 1");

        let rows = builder
            .build_query_as::<BookRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(self.assemble(rows, &[]).await?.pop())
    }

    async fn count(&self, filter: &BookFilter) -> AppResult<i64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM books");
        Self::push_filter(&mut builder, filter);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create(&self, record: &BookRecord) -> AppResult<Book> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO books (id, title, summary, isbn, author_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(&record.title)
        .bind(&record.summary)
        .bind(&record.isbn)
        .bind(record.author)
        .execute(&mut *tx)
        .await?;

        Self::set_genres_inner(&mut tx, id, &record.genre).await?;
        tx.commit().await?;

        Ok(Book::from_record(id, record))
    }

    async fn update_by_id(&self, id: Uuid, record: &BookRecord) -> AppResult<Option<Book>> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $2, summary = $3, isbn = $4, author_id = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&record.title)
        .bind(&record.summary)
        .bind(&record.isbn)
        .bind(record.author)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        Self::set_genres_inner(&mut tx, id, &record.genre).await?;
        tx.commit().await?;

        Ok(Some(Book::from_record(id, record)))
    }

    async fn remove_by_id(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genre_position() {
        assert_eq!(genre_position(0).unwrap(), 0);
        assert_eq!(genre_position(40_000).unwrap(), 40_000);
        assert!(matches!(genre_position(usize::MAX), Err(sqlx::Error::Encode(_))));
    }
}

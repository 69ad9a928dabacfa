//! Book instances repository (Postgres)

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{books::BooksRepository, expand_ref, EntityStore, FindOptions};
use crate::{
    error::{AppError, AppResult},
    models::{
        BookInstance, BookInstanceField, BookInstanceFilter, BookInstanceRecord,
        BookInstanceSort, BookInstanceStatus,
    },
};

const INSTANCE_COLUMNS: &str = "id, book_id, imprint, status, due_back";

#[derive(Debug, FromRow)]
struct BookInstanceRow {
    id: Uuid,
    book_id: Uuid,
    imprint: String,
    status: String,
    due_back: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
    books: BooksRepository,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: BooksRepository::new(pool.clone()),
            pool,
        }
    }

    async fn assemble(
        &self,
        rows: Vec<BookInstanceRow>,
        expand: &[BookInstanceField],
    ) -> AppResult<Vec<BookInstance>> {
        let books = if expand.contains(&BookInstanceField::Book) {
            let book_ids: Vec<Uuid> = rows.iter().map(|r| r.book_id).collect();
            self.books.get_many(&book_ids).await?
        } else {
            HashMap::new()
        };

        rows.into_iter()
            .map(|row| {
                let status = row
                    .status
                    .parse::<BookInstanceStatus>()
                    .map_err(AppError::Internal)?;
                Ok(BookInstance {
                    id: row.id,
                    book: expand_ref(row.book_id, &books),
                    imprint: row.imprint,
                    status,
                    due_back: row.due_back,
                })
            })
            .collect()
    }

    fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &BookInstanceFilter) {
        builder.push(" WHERE 1=1");
        if let Some(book) = filter.book {
            builder.push(" AND book_id = ").push_bind(book);
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
    }
}

#[async_trait]
impl EntityStore<BookInstance> for BookInstancesRepository {
    async fn find(
        &self,
        filter: &BookInstanceFilter,
        options: &FindOptions<BookInstance>,
    ) -> AppResult<Vec<BookInstance>> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {} FROM book_instances", INSTANCE_COLUMNS));
        Self::push_filter(&mut builder, filter);
        match options.sort {
            Some(sort) => {
                let column = match sort.key {
                    BookInstanceSort::Imprint => "imprint",
                    BookInstanceSort::Status => "status",
                };
                builder.push(format!(" ORDER BY {} {}, id", column, sort.order.as_sql()));
            }
            None => {
                builder.push(" ORDER BY created_at, id");
            }
        }

        let rows = builder
            .build_query_as::<BookInstanceRow>()
            .fetch_all(&self.pool)
            .await?;
        self.assemble(rows, &options.expand).await
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        expand: &[BookInstanceField],
    ) -> AppResult<Option<BookInstance>> {
        let row = sqlx::query_as::<_, BookInstanceRow>(&format!(
            "SELECT {} FROM book_instances WHERE id = $1",
            INSTANCE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.assemble(vec![row], expand).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_one(&self, filter: &BookInstanceFilter) -> AppResult<Option<BookInstance>> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {} FROM book_instances", INSTANCE_COLUMNS));
        Self::push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at, id LIMIT 1");

        let rows = builder
            .build_query_as::<BookInstanceRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(self.assemble(rows, &[]).await?.pop())
    }

    async fn count(&self, filter: &BookInstanceFilter) -> AppResult<i64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM book_instances");
        Self::push_filter(&mut builder, filter);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create(&self, record: &BookInstanceRecord) -> AppResult<BookInstance> {
        let row = sqlx::query_as::<_, BookInstanceRow>(&format!(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, status, due_back)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            INSTANCE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(record.book)
        .bind(&record.imprint)
        .bind(record.status.as_str())
        .bind(record.due_back)
        .fetch_one(&self.pool)
        .await?;

        Ok(self.assemble(vec![row], &[]).await?.remove(0))
    }

    async fn update_by_id(
        &self,
        id: Uuid,
        record: &BookInstanceRecord,
    ) -> AppResult<Option<BookInstance>> {
        let row = sqlx::query_as::<_, BookInstanceRow>(&format!(
            r#"
            UPDATE book_instances
            SET book_id = $2, imprint = $3, status = $4, due_back = $5
            WHERE id = $1
            RETURNING {}
            "#,
            INSTANCE_COLUMNS
        ))
        .bind(id)
        .bind(record.book)
        .bind(&record.imprint)
        .bind(record.status.as_str())
        .bind(record.due_back)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.assemble(vec![row], &[]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn remove_by_id(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

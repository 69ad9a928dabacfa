//! Authors repository (Postgres)

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{EntityStore, FindOptions};
use crate::{
    error::AppResult,
    models::{Author, AuthorFilter, AuthorRecord, AuthorSort, NoReference},
};

const AUTHOR_COLUMNS: &str = "id, first_name, family_name, date_of_birth, date_of_death";

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Load the authors with the given ids, keyed by id
    pub async fn get_many(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, Author>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, Author>(&format!(
            "SELECT {} FROM authors WHERE id = ANY($1)",
            AUTHOR_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|a| (a.id, a)).collect())
    }

    fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &AuthorFilter) {
        builder.push(" WHERE 1=1");
        if let Some(ref family_name) = filter.family_name {
            builder.push(" AND family_name = ").push_bind(family_name.clone());
        }
    }
}

#[async_trait]
impl EntityStore<Author> for AuthorsRepository {
    async fn find(
        &self,
        filter: &AuthorFilter,
        options: &FindOptions<Author>,
    ) -> AppResult<Vec<Author>> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM authors", AUTHOR_COLUMNS));
        Self::push_filter(&mut builder, filter);
        match options.sort {
            Some(sort) => {
                let column = match sort.key {
                    AuthorSort::FamilyName => "family_name",
                };
                builder.push(format!(" ORDER BY {} {}, id", column, sort.order.as_sql()));
            }
            None => {
                builder.push(" ORDER BY created_at, id");
            }
        }

        let rows = builder
            .build_query_as::<Author>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid, _expand: &[NoReference]) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(&format!(
            "SELECT {} FROM authors WHERE id = $1",
            AUTHOR_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(author)
    }

    async fn find_one(&self, filter: &AuthorFilter) -> AppResult<Option<Author>> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM authors", AUTHOR_COLUMNS));
        Self::push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at, id LIMIT 1");

        let author = builder
            .build_query_as::<Author>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(author)
    }

    async fn count(&self, filter: &AuthorFilter) -> AppResult<i64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM authors");
        Self::push_filter(&mut builder, filter);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create(&self, record: &AuthorRecord) -> AppResult<Author> {
        let author = sqlx::query_as::<_, Author>(&format!(
            r#"
            INSERT INTO authors (id, first_name, family_name, date_of_birth, date_of_death)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            AUTHOR_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&record.first_name)
        .bind(&record.family_name)
        .bind(record.date_of_birth)
        .bind(record.date_of_death)
        .fetch_one(&self.pool)
        .await?;
        Ok(author)
    }

    async fn update_by_id(&self, id: Uuid, record: &AuthorRecord) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(&format!(
            r#"
            UPDATE authors
            SET first_name = $2, family_name = $3, date_of_birth = $4, date_of_death = $5
            WHERE id = $1
            RETURNING {}
            "#,
            AUTHOR_COLUMNS
        ))
        .bind(id)
        .bind(&record.first_name)
        .bind(&record.family_name)
        .bind(record.date_of_birth)
        .bind(record.date_of_death)
        .fetch_optional(&self.pool)
        .await?;
        Ok(author)
    }

    async fn remove_by_id(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

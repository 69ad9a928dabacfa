//! Genres repository (Postgres)

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{EntityStore, FindOptions};
use crate::{
    error::AppResult,
    models::{Genre, GenreFilter, GenreRecord, GenreSort, NoReference},
};

#[derive(Clone)]
pub struct GenresRepository {
    pool: Pool<Postgres>,
}

impl GenresRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Load the genres with the given ids, keyed by id
    pub async fn get_many(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, Genre>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|g| (g.id, g)).collect())
    }

    fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &GenreFilter) {
        builder.push(" WHERE 1=1");
        if let Some(ref name) = filter.name {
            builder.push(" AND name = ").push_bind(name.clone());
        }
    }
}

#[async_trait]
impl EntityStore<Genre> for GenresRepository {
    async fn find(&self, filter: &GenreFilter, options: &FindOptions<Genre>) -> AppResult<Vec<Genre>> {
        let mut builder = QueryBuilder::new("SELECT id, name FROM genres");
        Self::push_filter(&mut builder, filter);
        match options.sort {
            Some(sort) => {
                let column = match sort.key {
                    GenreSort::Name => "name",
                };
                builder.push(format!(" ORDER BY {} {}, id", column, sort.order.as_sql()));
            }
            None => {
                builder.push(" ORDER BY created_at, id");
            }
        }

        let rows = builder
            .build_query_as::<Genre>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid, _expand: &[NoReference]) -> AppResult<Option<Genre>> {
        let genre = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(genre)
    }

    async fn find_one(&self, filter: &GenreFilter) -> AppResult<Option<Genre>> {
        let mut builder = QueryBuilder::new("SELECT id, name FROM genres");
        Self::push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at, id LIMIT 1");

        let genre = builder
            .build_query_as::<Genre>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(genre)
    }

    async fn count(&self, filter: &GenreFilter) -> AppResult<i64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM genres");
        Self::push_filter(&mut builder, filter);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn create(&self, record: &GenreRecord) -> AppResult<Genre> {
        let genre = sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(Uuid::new_v4())
        .bind(&record.name)
        .fetch_one(&self.pool)
        .await?;
        Ok(genre)
    }

    async fn update_by_id(&self, id: Uuid, record: &GenreRecord) -> AppResult<Option<Genre>> {
        let genre = sqlx::query_as::<_, Genre>(
            "UPDATE genres SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id)
        .bind(&record.name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(genre)
    }

    async fn remove_by_id(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM genres WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

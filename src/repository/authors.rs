//! Authors repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder, Row};

use super::AuthorsRepository;
use crate::{
    error::AppResult,
    models::{Author, AuthorInput},
    query::{sql, QuerySpec},
};

#[derive(Clone)]
pub struct PgAuthorsRepository {
    pool: Pool<Postgres>,
}

impl PgAuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorsRepository for PgAuthorsRepository {
    async fn search(&self, spec: &QuerySpec) -> AppResult<(Vec<Author>, i64)> {
        // Count and page read the same snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM authors");
        sql::push_filters(&mut count, spec);
        let total: i64 = count.build().fetch_one(&mut *tx).await?.try_get(0)?;

        let mut select = QueryBuilder::<Postgres>::new("SELECT id, first_name, last_name, birth_date FROM authors");
        sql::push_filters(&mut select, spec);
        sql::push_order(&mut select, spec);
        sql::push_page(&mut select, spec);
        let authors = select.build_query_as::<Author>().fetch_all(&mut *tx).await?;

        tx.commit().await?;

        Ok((authors, total))
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Author>> {
        let author = sqlx::query_as::<_, Author>(
            "SELECT id, first_name, last_name, birth_date FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(author)
    }

    async fn create(&self, author: &AuthorInput) -> AppResult<Author> {
        let created = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (first_name, last_name, birth_date)
            VALUES ($1, $2, $3)
            RETURNING id, first_name, last_name, birth_date
            "#,
        )
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(author.birth_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update(&self, id: i32, author: &AuthorInput) -> AppResult<Option<Author>> {
        let updated = sqlx::query_as::<_, Author>(
            r#"
            UPDATE authors SET first_name = $2, last_name = $3, birth_date = $4
            WHERE id = $1
            RETURNING id, first_name, last_name, birth_date
            "#,
        )
        .bind(id)
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(author.birth_date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        // books.author_id is ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

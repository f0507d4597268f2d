//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder, Row};

use super::BooksRepository;
use crate::{
    error::{AppError, AppResult},
    models::{Book, BookInput, BookWithAuthor},
    query::{sql, QuerySpec},
};

/// Book columns plus the author names, over `books b JOIN authors a`
const BOOK_WITH_AUTHOR_COLUMNS: &str = "b.id, b.title, b.isbn, b.number_of_pages, b.description, b.author_id, \
     a.first_name AS author_first_name, a.last_name AS author_last_name";

#[derive(Clone)]
pub struct PgBooksRepository {
    pool: Pool<Postgres>,
}

impl PgBooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_write_error(e: sqlx::Error, book: &BookInput) -> AppError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict(format!("Book with isbn {} already exists!", book.isbn))
        }
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
            AppError::NotFound("Author not found!".to_string())
        }
        e => AppError::Database(e),
    }
}

#[async_trait]
impl BooksRepository for PgBooksRepository {
    async fn search(&self, spec: &QuerySpec) -> AppResult<(Vec<BookWithAuthor>, i64)> {
        // Count and page read the same snapshot
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let mut count =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books b JOIN authors a ON a.id = b.author_id");
        sql::push_filters(&mut count, spec);
        let total: i64 = count.build().fetch_one(&mut *tx).await?.try_get(0)?;

        let mut select = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM books b JOIN authors a ON a.id = b.author_id",
            BOOK_WITH_AUTHOR_COLUMNS
        ));
        sql::push_filters(&mut select, spec);
        sql::push_order(&mut select, spec);
        sql::push_page(&mut select, spec);
        let books = select.build_query_as::<BookWithAuthor>().fetch_all(&mut *tx).await?;

        tx.commit().await?;

        Ok((books, total))
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<BookWithAuthor>> {
        let book = sqlx::query_as::<_, BookWithAuthor>(&format!(
            "SELECT {} FROM books b JOIN authors a ON a.id = b.author_id WHERE b.id = $1",
            BOOK_WITH_AUTHOR_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    async fn list_by_authors(&self, author_ids: &[i32]) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT id, title, isbn, number_of_pages, description, author_id
            FROM books
            WHERE author_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(author_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    async fn isbn_exists(&self, isbn: i64, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND id != $2)")
                .bind(isbn)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1)")
                .bind(isbn)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    async fn create(&self, author_id: i32, book: &BookInput) -> AppResult<BookWithAuthor> {
        sqlx::query_as::<_, BookWithAuthor>(&format!(
            r#"
            WITH b AS (
                INSERT INTO books (title, isbn, number_of_pages, description, author_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT {} FROM b JOIN authors a ON a.id = b.author_id
            "#,
            BOOK_WITH_AUTHOR_COLUMNS
        ))
        .bind(&book.title)
        .bind(book.isbn)
        .bind(book.number_of_pages)
        .bind(&book.description)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, book))
    }

    async fn update(&self, id: i32, book: &BookInput) -> AppResult<Option<BookWithAuthor>> {
        sqlx::query_as::<_, BookWithAuthor>(&format!(
            r#"
            WITH b AS (
                UPDATE books
                SET title = $2, isbn = $3, number_of_pages = $4,
                    description = COALESCE($5, description),
                    author_id = COALESCE($6, author_id)
                WHERE id = $1
                RETURNING *
            )
            SELECT {} FROM b JOIN authors a ON a.id = b.author_id
            "#,
            BOOK_WITH_AUTHOR_COLUMNS
        ))
        .bind(id)
        .bind(&book.title)
        .bind(book.isbn)
        .bind(book.number_of_pages)
        .bind(&book.description)
        .bind(book.author_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, book))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

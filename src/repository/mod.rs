//! Repository layer: persistence seams and their implementations

pub mod accounts;
pub mod authors;
pub mod books;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{Account, Author, AuthorInput, Book, BookInput, BookWithAuthor},
    query::QuerySpec,
};

/// Account persistence
#[async_trait]
pub trait AccountsRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<Option<Account>>;

    async fn get_by_username(&self, username: &str) -> AppResult<Option<Account>>;

    /// Whether `username` is taken by an account other than `exclude_id`
    async fn username_exists(&self, username: &str, exclude_id: Option<i32>) -> AppResult<bool>;

    /// Whether `email` is taken by an account other than `exclude_id`
    async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool>;

    async fn create(&self, username: &str, email: &str, password_hash: &str) -> AppResult<Account>;

    async fn update_password(&self, id: i32, password_hash: &str) -> AppResult<Option<Account>>;

    async fn update_profile(&self, id: i32, username: &str, email: &str) -> AppResult<Option<Account>>;
}

/// Author persistence. Deleting an author removes their books.
#[async_trait]
pub trait AuthorsRepository: Send + Sync {
    /// One page of authors matching `spec`, plus the filtered total
    async fn search(&self, spec: &QuerySpec) -> AppResult<(Vec<Author>, i64)>;

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Author>>;

    async fn create(&self, author: &AuthorInput) -> AppResult<Author>;

    async fn update(&self, id: i32, author: &AuthorInput) -> AppResult<Option<Author>>;

    /// Returns false when no such author existed
    async fn delete(&self, id: i32) -> AppResult<bool>;
}

/// Book persistence
#[async_trait]
pub trait BooksRepository: Send + Sync {
    /// One page of books matching `spec`, plus the filtered total
    async fn search(&self, spec: &QuerySpec) -> AppResult<(Vec<BookWithAuthor>, i64)>;

    async fn get_by_id(&self, id: i32) -> AppResult<Option<BookWithAuthor>>;

    /// Books of the given authors, in identifier order
    async fn list_by_authors(&self, author_ids: &[i32]) -> AppResult<Vec<Book>>;

    /// Whether `isbn` is used by a book other than `exclude_id`
    async fn isbn_exists(&self, isbn: i64, exclude_id: Option<i32>) -> AppResult<bool>;

    async fn create(&self, author_id: i32, book: &BookInput) -> AppResult<BookWithAuthor>;

    /// Replace a book's fields; `author_id` and `description` are only changed when set
    async fn update(&self, id: i32, book: &BookInput) -> AppResult<Option<BookWithAuthor>>;

    /// Returns false when no such book existed
    async fn delete(&self, id: i32) -> AppResult<bool>;
}

/// Main repository struct holding one handle per resource
#[derive(Clone)]
pub struct Repository {
    pub accounts: Arc<dyn AccountsRepository>,
    pub authors: Arc<dyn AuthorsRepository>,
    pub books: Arc<dyn BooksRepository>,
    pool: Option<Pool<Postgres>>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            accounts: Arc::new(accounts::PgAccountsRepository::new(pool.clone())),
            authors: Arc::new(authors::PgAuthorsRepository::new(pool.clone())),
            books: Arc::new(books::PgBooksRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Repository over a single shared in-memory store
    pub fn in_memory() -> Self {
        let store = memory::MemoryStore::new();
        Self {
            accounts: Arc::new(store.clone()),
            authors: Arc::new(store.clone()),
            books: Arc::new(store),
            pool: None,
        }
    }

    /// Round-trip to the database, if there is one
    pub async fn ping(&self) -> AppResult<()> {
        if let Some(ref pool) = self.pool {
            sqlx::query("SELECT 1").execute(pool).await?;
        }
        Ok(())
    }
}

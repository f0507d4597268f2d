//! In-memory implementation of every repository, for tests and development.
//!
//! One lock guards all tables so multi-table writes (cascading deletes,
//! author checks on book writes) are atomic.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{AccountsRepository, AuthorsRepository, BooksRepository};
use crate::{
    error::{AppError, AppResult},
    models::{Account, Author, AuthorInput, Book, BookInput, BookWithAuthor},
    query::{eval, QuerySpec},
};

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<i32, Account>,
    authors: BTreeMap<i32, Author>,
    books: BTreeMap<i32, Book>,
    next_account_id: i32,
    next_author_id: i32,
    next_book_id: i32,
}

impl Tables {
    fn join(&self, book: &Book) -> AppResult<BookWithAuthor> {
        let author = self
            .authors
            .get(&book.author_id)
            .ok_or_else(|| AppError::Internal(format!("Book {} references a missing author", book.id)))?;
        Ok(BookWithAuthor {
            book: book.clone(),
            author_first_name: author.first_name.clone(),
            author_last_name: author.last_name.clone(),
        })
    }

    fn account_taken(&self, username: &str, email: &str, exclude_id: Option<i32>) -> bool {
        self.accounts
            .values()
            .any(|a| Some(a.id) != exclude_id && (a.username == username || a.email == email))
    }

    fn isbn_taken(&self, isbn: i64, exclude_id: Option<i32>) -> bool {
        self.books.values().any(|b| Some(b.id) != exclude_id && b.isbn == isbn)
    }
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

/// Shared in-memory store; clones see the same data
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> AppResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| AppError::Internal(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> AppResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| AppError::Internal(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl AccountsRepository for MemoryStore {
    async fn get_by_id(&self, id: i32) -> AppResult<Option<Account>> {
        Ok(self.read()?.accounts.get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<Account>> {
        Ok(self.read()?.accounts.values().find(|a| a.username == username).cloned())
    }

    async fn username_exists(&self, username: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        Ok(self
            .read()?
            .accounts
            .values()
            .any(|a| Some(a.id) != exclude_id && a.username == username))
    }

    async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        Ok(self
            .read()?
            .accounts
            .values()
            .any(|a| Some(a.id) != exclude_id && a.email == email))
    }

    async fn create(&self, username: &str, email: &str, password_hash: &str) -> AppResult<Account> {
        let mut tables = self.write()?;
        if tables.account_taken(username, email, None) {
            return Err(AppError::Conflict("Username or email already exists!".to_string()));
        }

        let account = Account {
            id: next_id(&mut tables.next_account_id),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            creation_date: Utc::now(),
        };
        tables.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> AppResult<Option<Account>> {
        let mut tables = self.write()?;
        Ok(tables.accounts.get_mut(&id).map(|account| {
            account.password_hash = password_hash.to_string();
            account.clone()
        }))
    }

    async fn update_profile(&self, id: i32, username: &str, email: &str) -> AppResult<Option<Account>> {
        let mut tables = self.write()?;
        if tables.account_taken(username, email, Some(id)) {
            return Err(AppError::Conflict("Username or email already exists!".to_string()));
        }

        Ok(tables.accounts.get_mut(&id).map(|account| {
            account.username = username.to_string();
            account.email = email.to_string();
            account.clone()
        }))
    }
}

#[async_trait]
impl AuthorsRepository for MemoryStore {
    async fn search(&self, spec: &QuerySpec) -> AppResult<(Vec<Author>, i64)> {
        let tables = self.read()?;
        Ok(eval::apply(tables.authors.values().cloned(), spec))
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<Author>> {
        Ok(self.read()?.authors.get(&id).cloned())
    }

    async fn create(&self, author: &AuthorInput) -> AppResult<Author> {
        let mut tables = self.write()?;
        let created = Author {
            id: next_id(&mut tables.next_author_id),
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
            birth_date: author.birth_date,
        };
        tables.authors.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i32, author: &AuthorInput) -> AppResult<Option<Author>> {
        let mut tables = self.write()?;
        Ok(tables.authors.get_mut(&id).map(|existing| {
            existing.first_name = author.first_name.clone();
            existing.last_name = author.last_name.clone();
            existing.birth_date = author.birth_date;
            existing.clone()
        }))
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        let mut tables = self.write()?;
        if tables.authors.remove(&id).is_none() {
            return Ok(false);
        }
        tables.books.retain(|_, book| book.author_id != id);
        Ok(true)
    }
}

#[async_trait]
impl BooksRepository for MemoryStore {
    async fn search(&self, spec: &QuerySpec) -> AppResult<(Vec<BookWithAuthor>, i64)> {
        let tables = self.read()?;
        let joined = tables
            .books
            .values()
            .map(|book| tables.join(book))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(eval::apply(joined, spec))
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<BookWithAuthor>> {
        let tables = self.read()?;
        tables.books.get(&id).map(|book| tables.join(book)).transpose()
    }

    async fn list_by_authors(&self, author_ids: &[i32]) -> AppResult<Vec<Book>> {
        Ok(self
            .read()?
            .books
            .values()
            .filter(|book| author_ids.contains(&book.author_id))
            .cloned()
            .collect())
    }

    async fn isbn_exists(&self, isbn: i64, exclude_id: Option<i32>) -> AppResult<bool> {
        Ok(self.read()?.isbn_taken(isbn, exclude_id))
    }

    async fn create(&self, author_id: i32, book: &BookInput) -> AppResult<BookWithAuthor> {
        let mut tables = self.write()?;
        if !tables.authors.contains_key(&author_id) {
            return Err(AppError::NotFound("Author not found!".to_string()));
        }
        if tables.isbn_taken(book.isbn, None) {
            return Err(AppError::Conflict(format!("Book with isbn {} already exists!", book.isbn)));
        }

        let created = Book {
            id: next_id(&mut tables.next_book_id),
            title: book.title.clone(),
            isbn: book.isbn,
            number_of_pages: book.number_of_pages,
            description: book.description.clone(),
            author_id,
        };
        tables.books.insert(created.id, created.clone());
        tables.join(&created)
    }

    async fn update(&self, id: i32, book: &BookInput) -> AppResult<Option<BookWithAuthor>> {
        let mut tables = self.write()?;
        if !tables.books.contains_key(&id) {
            return Ok(None);
        }
        if let Some(author_id) = book.author_id {
            if !tables.authors.contains_key(&author_id) {
                return Err(AppError::NotFound("Author not found!".to_string()));
            }
        }
        if tables.isbn_taken(book.isbn, Some(id)) {
            return Err(AppError::Conflict(format!("Book with isbn {} already exists!", book.isbn)));
        }

        let updated = match tables.books.get_mut(&id) {
            Some(existing) => {
                existing.title = book.title.clone();
                existing.isbn = book.isbn;
                existing.number_of_pages = book.number_of_pages;
                if let Some(description) = &book.description {
                    existing.description = Some(description.clone());
                }
                if let Some(author_id) = book.author_id {
                    existing.author_id = author_id;
                }
                existing.clone()
            }
            None => return Ok(None),
        };
        tables.join(&updated).map(Some)
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        Ok(self.write()?.books.remove(&id).is_some())
    }
}

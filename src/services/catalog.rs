//! Catalog service: authors and their books

use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{AuthorDetailView, AuthorInput, Book, BookInput, BookSummaryView, BookView},
    query::{Page, Pagination, QuerySpec},
    repository::Repository,
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

fn author_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Author with id {} not found!", id))
}

fn book_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Book with id {} not found!", id))
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Whether the backing store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    /// One page of authors with their books; links are rooted at `base_path`
    pub async fn list_authors(&self, spec: &QuerySpec, base_path: &str) -> AppResult<Page<AuthorDetailView>> {
        let (authors, total) = self.repository.authors.search(spec).await?;

        let ids: Vec<i32> = authors.iter().map(|a| a.id).collect();
        let mut books_by_author: HashMap<i32, Vec<Book>> = HashMap::new();
        if !ids.is_empty() {
            for book in self.repository.books.list_by_authors(&ids).await? {
                books_by_author.entry(book.author_id).or_default().push(book);
            }
        }

        let records = authors
            .into_iter()
            .map(|author| {
                let books = books_by_author.remove(&author.id).unwrap_or_default();
                AuthorDetailView::new(author, books)
            })
            .collect();

        Ok(Page {
            records,
            pagination: Pagination::new(spec, total, base_path),
        })
    }

    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetailView> {
        let author = self
            .repository
            .authors
            .get_by_id(id)
            .await?
            .ok_or_else(|| author_not_found(id))?;
        let books = self.repository.books.list_by_authors(&[id]).await?;
        Ok(AuthorDetailView::new(author, books))
    }

    pub async fn create_author(&self, input: AuthorInput) -> AppResult<AuthorDetailView> {
        let author = self.repository.authors.create(&input).await?;
        tracing::info!("Created author {}", author.id);
        Ok(AuthorDetailView::new(author, Vec::new()))
    }

    pub async fn update_author(&self, id: i32, input: AuthorInput) -> AppResult<AuthorDetailView> {
        let author = self
            .repository
            .authors
            .update(id, &input)
            .await?
            .ok_or_else(|| author_not_found(id))?;
        let books = self.repository.books.list_by_authors(&[id]).await?;
        Ok(AuthorDetailView::new(author, books))
    }

    /// Delete an author together with their books
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        if !self.repository.authors.delete(id).await? {
            return Err(author_not_found(id));
        }
        tracing::info!("Deleted author {} and their books", id);
        Ok(())
    }

    /// Every book of an author, unpaginated
    pub async fn author_books(&self, id: i32) -> AppResult<Vec<BookSummaryView>> {
        if self.repository.authors.get_by_id(id).await?.is_none() {
            return Err(author_not_found(id));
        }
        let books = self.repository.books.list_by_authors(&[id]).await?;
        Ok(books.into_iter().map(BookSummaryView::from).collect())
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    /// One page of books with their authors; links are rooted at `base_path`
    pub async fn list_books(&self, spec: &QuerySpec, base_path: &str) -> AppResult<Page<BookView>> {
        let (books, total) = self.repository.books.search(spec).await?;
        Ok(Page {
            records: books.into_iter().map(BookView::from).collect(),
            pagination: Pagination::new(spec, total, base_path),
        })
    }

    pub async fn get_book(&self, id: i32) -> AppResult<BookView> {
        self.repository
            .books
            .get_by_id(id)
            .await?
            .map(BookView::from)
            .ok_or_else(|| book_not_found(id))
    }

    /// Add a book to an existing author
    pub async fn create_book(&self, author_id: i32, input: BookInput) -> AppResult<BookView> {
        if self.repository.authors.get_by_id(author_id).await?.is_none() {
            return Err(author_not_found(author_id));
        }
        self.ensure_isbn_free(input.isbn, None).await?;

        let book = self.repository.books.create(author_id, &input).await?;
        tracing::info!("Created book {} for author {}", book.book.id, author_id);
        Ok(BookView::from(book))
    }

    pub async fn update_book(&self, id: i32, input: BookInput) -> AppResult<BookView> {
        if self.repository.books.get_by_id(id).await?.is_none() {
            return Err(book_not_found(id));
        }
        if let Some(author_id) = input.author_id {
            if self.repository.authors.get_by_id(author_id).await?.is_none() {
                return Err(author_not_found(author_id));
            }
        }
        self.ensure_isbn_free(input.isbn, Some(id)).await?;

        self.repository
            .books
            .update(id, &input)
            .await?
            .map(BookView::from)
            .ok_or_else(|| book_not_found(id))
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        if !self.repository.books.delete(id).await? {
            return Err(book_not_found(id));
        }
        tracing::info!("Deleted book {}", id);
        Ok(())
    }

    async fn ensure_isbn_free(&self, isbn: i64, exclude_id: Option<i32>) -> AppResult<()> {
        if self.repository.books.isbn_exists(isbn, exclude_id).await? {
            return Err(AppError::Conflict(format!("Book with isbn {} already exists!", isbn)));
        }
        Ok(())
    }
}

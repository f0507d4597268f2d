//! Book model, request schema and views

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::author::AuthorSummaryView;
use super::validation::{field_errors, push, Schema};
use crate::{
    error::FieldErrors,
    query::{eval::Queryable, FieldCatalog, FieldDef, FieldKind, FieldValue},
};

/// Smallest and largest 13 digit numbers
const ISBN_MIN: i64 = 1_000_000_000_000;
const ISBN_MAX: i64 = 9_999_999_999_999;

/// Fields of `books` open to filtering and ordering. Columns are qualified
/// because book queries join their author.
pub static BOOK_FIELDS: FieldCatalog = FieldCatalog {
    resource: "books",
    fields: &[
        FieldDef { name: "id", column: "b.id", kind: FieldKind::Integer },
        FieldDef { name: "title", column: "b.title", kind: FieldKind::String },
        FieldDef { name: "isbn", column: "b.isbn", kind: FieldKind::Integer },
        FieldDef { name: "number_of_pages", column: "b.number_of_pages", kind: FieldKind::Integer },
        FieldDef { name: "description", column: "b.description", kind: FieldKind::String },
        FieldDef { name: "author_id", column: "b.author_id", kind: FieldKind::Integer },
    ],
};

/// Full book model from database
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub isbn: i64,
    pub number_of_pages: i32,
    pub description: Option<String>,
    pub author_id: i32,
}

/// Book joined with its author's names
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct BookWithAuthor {
    #[sqlx(flatten)]
    pub book: Book,
    pub author_first_name: String,
    pub author_last_name: String,
}

impl Queryable for Book {
    fn field_value(&self, field: &str) -> FieldValue {
        match field {
            "id" => FieldValue::Integer(i64::from(self.id)),
            "title" => FieldValue::Text(self.title.clone()),
            "isbn" => FieldValue::Integer(self.isbn),
            "number_of_pages" => FieldValue::Integer(i64::from(self.number_of_pages)),
            "description" => self
                .description
                .clone()
                .map(FieldValue::Text)
                .unwrap_or(FieldValue::Null),
            "author_id" => FieldValue::Integer(i64::from(self.author_id)),
            _ => FieldValue::Null,
        }
    }
}

impl Queryable for BookWithAuthor {
    fn field_value(&self, field: &str) -> FieldValue {
        self.book.field_value(field)
    }
}

/// Validated book data for create and update
#[derive(Debug, Clone, PartialEq)]
pub struct BookInput {
    pub title: String,
    pub isbn: i64,
    pub number_of_pages: i32,
    pub description: Option<String>,
    /// Only honoured on update; creation takes the author from the path
    pub author_id: Option<i32>,
}

/// Create/update book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookRequest {
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 1, max = 50, message = "Length must be between 1 and 50.")
    )]
    pub title: Option<String>,
    /// 13 digit ISBN
    #[validate(required(message = "Missing data for required field."))]
    pub isbn: Option<i64>,
    #[validate(
        required(message = "Missing data for required field."),
        range(min = 1, message = "Must be greater than or equal to 1.")
    )]
    pub number_of_pages: Option<i32>,
    pub description: Option<String>,
    pub author_id: Option<i32>,
}

impl Schema for BookRequest {
    type Output = BookInput;

    fn into_valid(self) -> Result<BookInput, FieldErrors> {
        let mut errors = field_errors(&self);

        if let Some(isbn) = self.isbn {
            if !(ISBN_MIN..=ISBN_MAX).contains(&isbn) {
                push(&mut errors, "isbn", "ISBN must contain 13 digits");
            }
        }

        match (self.title, self.isbn, self.number_of_pages) {
            (Some(title), Some(isbn), Some(number_of_pages)) if errors.is_empty() => Ok(BookInput {
                title,
                isbn,
                number_of_pages,
                description: self.description,
                author_id: self.author_id,
            }),
            _ => Err(errors),
        }
    }
}

/// Book without its author, nested inside author details
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookSummaryView {
    pub id: i32,
    pub title: String,
    pub isbn: i64,
    pub number_of_pages: i32,
    pub description: Option<String>,
}

impl From<Book> for BookSummaryView {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            isbn: book.isbn,
            number_of_pages: book.number_of_pages,
            description: book.description,
        }
    }
}

/// Book with a reduced rendering of its author
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct BookView {
    pub id: i32,
    pub title: String,
    pub isbn: i64,
    pub number_of_pages: i32,
    pub description: Option<String>,
    pub author: AuthorSummaryView,
}

impl From<BookWithAuthor> for BookView {
    fn from(row: BookWithAuthor) -> Self {
        Self {
            author: AuthorSummaryView {
                id: row.book.author_id,
                first_name: row.author_first_name,
                last_name: row.author_last_name,
            },
            id: row.book.id,
            title: row.book.title,
            isbn: row.book.isbn,
            number_of_pages: row.book.number_of_pages,
            description: row.book.description,
        }
    }
}

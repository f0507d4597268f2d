//! Author model, request schema and views

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::{Book, BookSummaryView};
use super::validation::{field_errors, parse_wire_date, push, wire_date, Schema};
use crate::{
    error::FieldErrors,
    query::{eval::Queryable, FieldCatalog, FieldDef, FieldKind, FieldValue},
};

/// Fields of `authors` open to filtering and ordering
pub static AUTHOR_FIELDS: FieldCatalog = FieldCatalog {
    resource: "authors",
    fields: &[
        FieldDef { name: "id", column: "id", kind: FieldKind::Integer },
        FieldDef { name: "first_name", column: "first_name", kind: FieldKind::String },
        FieldDef { name: "last_name", column: "last_name", kind: FieldKind::String },
        FieldDef { name: "birth_date", column: "birth_date", kind: FieldKind::Date },
    ],
};

/// Full author model from database
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
}

impl Queryable for Author {
    fn field_value(&self, field: &str) -> FieldValue {
        match field {
            "id" => FieldValue::Integer(i64::from(self.id)),
            "first_name" => FieldValue::Text(self.first_name.clone()),
            "last_name" => FieldValue::Text(self.last_name.clone()),
            "birth_date" => FieldValue::Date(self.birth_date),
            _ => FieldValue::Null,
        }
    }
}

/// Validated author data for create and update
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorInput {
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
}

/// Create/update author request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AuthorRequest {
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 1, max = 10, message = "Length must be between 1 and 10.")
    )]
    pub first_name: Option<String>,
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 1, max = 10, message = "Length must be between 1 and 10.")
    )]
    pub last_name: Option<String>,
    /// Birth date as `DD-MM-YYYY`
    #[validate(required(message = "Missing data for required field."))]
    #[schema(example = "24-12-1798")]
    pub birth_date: Option<String>,
}

impl Schema for AuthorRequest {
    type Output = AuthorInput;

    fn into_valid(self) -> Result<AuthorInput, FieldErrors> {
        let mut errors = field_errors(&self);

        let birth_date = match self.birth_date.as_deref() {
            Some(raw) => match parse_wire_date(raw) {
                Some(date) if date > Utc::now().date_naive() => {
                    push(
                        &mut errors,
                        "birth_date",
                        format!("Birth date must not be later than {}", Utc::now().date_naive()),
                    );
                    None
                }
                Some(date) => Some(date),
                None => {
                    push(&mut errors, "birth_date", "Not a valid date.");
                    None
                }
            },
            None => None,
        };

        match (self.first_name, self.last_name, birth_date) {
            (Some(first_name), Some(last_name), Some(birth_date)) if errors.is_empty() => Ok(AuthorInput {
                first_name,
                last_name,
                birth_date,
            }),
            _ => Err(errors),
        }
    }
}

/// Reduced author rendering, nested inside books
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuthorSummaryView {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

impl From<&Author> for AuthorSummaryView {
    fn from(author: &Author) -> Self {
        Self {
            id: author.id,
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
        }
    }
}

/// Author with their books (books carry no author back-reference)
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetailView {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    #[serde(serialize_with = "wire_date::serialize")]
    #[schema(value_type = String, example = "24-12-1798")]
    pub birth_date: NaiveDate,
    pub books: Vec<BookSummaryView>,
}

impl AuthorDetailView {
    pub fn new(author: Author, books: Vec<Book>) -> Self {
        Self {
            id: author.id,
            first_name: author.first_name,
            last_name: author.last_name,
            birth_date: author.birth_date,
            books: books.into_iter().map(BookSummaryView::from).collect(),
        }
    }
}

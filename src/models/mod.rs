//! Data models: persisted records, request schemas and wire views

pub mod account;
pub mod author;
pub mod book;
pub mod validation;

// Re-export commonly used types
pub use account::{Account, AccountView};
pub use author::{Author, AuthorDetailView, AuthorInput, AuthorSummaryView};
pub use book::{Book, BookInput, BookSummaryView, BookView, BookWithAuthor};
pub use validation::Schema;

//! Wire shapes for list and page responses, plus the page request sent with
//! paginated listings.
//!
//! The personnel API is inconsistent about list responses: some endpoints
//! return a bare JSON array, others a Spring-style page object
//! (`{"content": [...], "totalElements": N, ...}`). Everything that decodes a
//! list goes through [`ListBody`] so the ambiguity stays here.

pub mod list;
pub mod page;
pub mod request;

pub use list::{decode_list, ListBody};
pub use page::{Page, PageInfo};
pub use request::{PageRequest, SortDir};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("list body is neither an array nor a page object: {0}")]
    Shape(#[source] serde_json::Error),

    #[error("invalid sort direction: {0}")]
    InvalidSortDir(String),
}

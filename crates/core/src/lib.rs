//! `smartparking-core`: pure client building blocks.
//!
//! Identifiers, the normalized pagination model and the shared error shapes.
//! No IO lives here.

pub mod error;
pub mod id;
pub mod pagination;

pub use error::{ApiErrorBody, CoreError, CoreResult, FieldError, ServerErrorBody};
pub use id::{ResourceId, UserId};
pub use pagination::{Page, PageRequest, PagedPayload, Sort, SortDirection};

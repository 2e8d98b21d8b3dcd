//! Shared API types

pub mod envelope;
pub mod erp;
pub mod error;
pub mod json;

pub use envelope::{ApiResponse, Envelope, Paginated};
pub use error::{ApiError, FieldErrors};
pub use json::{Json, ValidatedJson, ValidatedRequest};

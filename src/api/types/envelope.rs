//! Response envelope shared by every endpoint
//!
//! Every body has the shape `{ "success": bool, "message": string, "data": any|null }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::pagination::{Page, PaginationMeta};

/// The JSON envelope
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
}

/// A successful response: status plus envelope
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    envelope: Envelope<T>,
}

impl<T: Serialize> ApiResponse<T> {
    fn new(status: StatusCode, data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            status,
            envelope: Envelope {
                success: true,
                message: message.into(),
                data,
            },
        }
    }

    /// 200 with data
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, Some(data), message)
    }

    /// 201 with data
    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CREATED, Some(data), message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl ApiResponse<()> {
    /// 200 with `data: null`
    pub fn empty(message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, None, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

/// Data block of a paginated listing
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn from_page(page: Page<T>, base_path: &str) -> Self {
        let pagination = PaginationMeta::from_page(&page, base_path);

        Self {
            items: page.into_items(),
            pagination,
        }
    }
}

//! Standard response envelopes
//!
//! Success bodies are wrapped in one of three shapes: a single item
//! ([`ApiResponse`]), an offset-paginated list ([`PaginatedResponse`]) or a
//! cursor-paginated list ([`CursorPaginatedResponse`]). The query DTOs that
//! feed them validate their bounds with `validator`.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::error_response::timestamp_now;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

fn default_page() -> u32 {
    DEFAULT_PAGE
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// Envelope for a single item
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
            timestamp: timestamp_now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Offset pagination query (`?page=2&limit=20`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationQuery {
    /// 1-based page number
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must not be less than 1"))]
    pub page: u32,
    /// Items per page
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: u32,
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PaginationQuery {
    /// Number of items to skip
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PaginationMeta {
    pub fn new(total: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };

        Self {
            total,
            page,
            limit,
            total_pages,
            has_next_page: u64::from(page) < total_pages,
            has_previous_page: page > 1,
        }
    }
}

/// Envelope for an offset-paginated list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: u64, query: &PaginationQuery) -> Self {
        Self {
            success: true,
            data,
            meta: PaginationMeta::new(total, query.page, query.limit),
        }
    }
}

/// Cursor pagination query (`?cursor=abc&limit=20`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CursorPaginationQuery {
    /// Opaque cursor returned by the previous page
    #[serde(default)]
    #[validate(length(min = 1, message = "cursor must not be empty"))]
    pub cursor: Option<String>,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: u32,
}

impl Default for CursorPaginationQuery {
    fn default() -> Self {
        Self {
            cursor: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CursorMeta {
    pub limit: u32,
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_cursor: Option<String>,
}

/// Envelope for a cursor-paginated list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CursorPaginatedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub meta: CursorMeta,
}

impl<T> CursorPaginatedResponse<T> {
    /// Build a page from up to `limit + 1` fetched rows
    ///
    /// The extra row only signals that another page exists; it is dropped and
    /// `cursor_of` is applied to the last kept row to form `nextCursor`.
    pub fn from_overfetch<F>(
        mut rows: Vec<T>,
        query: &CursorPaginationQuery,
        cursor_of: F,
    ) -> Self
    where
        F: Fn(&T) -> String,
    {
        let limit = query.limit as usize;
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let next_cursor = if has_more {
            rows.last().map(&cursor_of)
        } else {
            None
        };

        Self {
            success: true,
            data: rows,
            meta: CursorMeta {
                limit: query.limit,
                has_more,
                next_cursor,
                previous_cursor: query.cursor.clone(),
            },
        }
    }
}

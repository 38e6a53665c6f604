//! Shared query parameter types for API handlers.

use blendopt_core::error::CoreError;
use blendopt_core::pagination::{PageRequest, SortOrder};
use blendopt_core::types::DbId;
use serde::Deserialize;

/// `GET /tasks?owner_id=&limit=&offset=`.
///
/// `limit` and `offset` are clamped in the repository layer.
#[derive(Debug, Deserialize)]
pub struct TaskListParams {
    pub owner_id: DbId,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Result view parameters (`?page=&page_size=&sort_path=&sort_order=`).
#[derive(Debug, Default, Deserialize)]
pub struct ResultPageParams {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_path: Option<String>,
    pub sort_order: Option<String>,
}

impl ResultPageParams {
    /// Validate and clamp into a [`PageRequest`].
    pub fn into_page_request(self) -> Result<PageRequest, CoreError> {
        let sort_order = match self.sort_order.as_deref() {
            Some(raw) => raw.parse::<SortOrder>()?,
            None => SortOrder::default(),
        };
        Ok(PageRequest::new(
            self.page,
            self.page_size,
            self.sort_path,
            sort_order,
        ))
    }
}

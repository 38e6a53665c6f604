//! Sorting and pagination of result records.
//!
//! Results are served identically whether they come from the live cache
//! or from the persisted row: sort (optional, stable) then slice one page.

use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::path::value_at;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// First page number.
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when the requested one is missing or below 1.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Sort direction for result views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(CoreError::Validation(format!(
                "sort_order must be 'asc' or 'desc', got '{other}'"
            ))),
        }
    }
}

/// A normalized page request. Construct with [`PageRequest::new`] so the
/// clamping rules always apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub page_size: i64,
    pub sort_path: Option<String>,
    pub sort_order: SortOrder,
}

impl PageRequest {
    /// Clamp `page` below 1 to 1 and `page_size` below 1 to
    /// [`DEFAULT_PAGE_SIZE`]. Blank sort paths are treated as absent.
    pub fn new(
        page: Option<i64>,
        page_size: Option<i64>,
        sort_path: Option<String>,
        sort_order: SortOrder,
    ) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(DEFAULT_PAGE);
        let page_size = page_size.filter(|s| *s >= 1).unwrap_or(DEFAULT_PAGE_SIZE);
        let sort_path = sort_path
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        Self {
            page,
            page_size,
            sort_path,
            sort_order,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None, None, SortOrder::Asc)
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// One page of records plus the counters clients need to navigate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub page_size: i64,
    pub total: usize,
    pub total_pages: usize,
}

/// Number of pages needed for `total` items (0 when there are none).
pub fn total_pages(total: usize, page_size: i64) -> usize {
    let size = page_size.max(1) as usize;
    total.div_ceil(size)
}

/// Sort (when a path is given) and slice one page out of `records`.
///
/// Only the records on the returned page are cloned.
pub fn build_page(records: &[Value], request: &PageRequest) -> Page<Value> {
    let mut ordered: Vec<&Value> = records.iter().collect();
    if let Some(path) = &request.sort_path {
        sort_by_path(&mut ordered, path, request.sort_order);
    }

    let total = ordered.len();
    let size = request.page_size.max(1) as usize;
    let start = (request.page.max(1) as usize - 1).saturating_mul(size);
    let items = ordered
        .into_iter()
        .skip(start)
        .take(size)
        .cloned()
        .collect();

    Page {
        items,
        page: request.page,
        page_size: request.page_size,
        total,
        total_pages: total_pages(total, request.page_size),
    }
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Stable sort of record references by the value found at `path`.
pub fn sort_by_path(records: &mut [&Value], path: &str, order: SortOrder) {
    records.sort_by(|a, b| {
        let ord = compare_values(value_at(a, path), value_at(b, path));
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

/// Compare two resolved sort keys.
///
/// Keys rank in three bands: missing or JSON `null` lowest, then values
/// that read as numbers (compared numerically), then everything else
/// (compared as text). A number never compares as text against a string,
/// so mixed columns still form a total order.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (SortKey::of(a), SortKey::of(b)) {
        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(&y),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(&y),
        (x, y) => x.band().cmp(&y.band()),
    }
}

enum SortKey {
    Missing,
    Number(f64),
    Text(String),
}

impl SortKey {
    fn of(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Missing,
            Some(v) => match as_number(v) {
                Some(n) => Self::Number(n),
                None => Self::Text(as_text(v)),
            },
        }
    }

    fn band(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

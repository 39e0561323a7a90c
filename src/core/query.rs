//! Query parameters, table-scoped list queries and pagination utilities

use crate::core::error::{DashError, RequestError};
use crate::core::store;
use crate::core::Data;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Query parameters for listing records
///
/// Extracted from URL query strings. All parameters have sensible defaults.
///
/// # Example
/// ```text
/// GET /deals?page=2&limit=10
/// GET /deals?q=acme&status=closed_won
/// GET /invoices?filter={"status": "open", "total>": 100}&sort=due_date:asc
/// GET /backup_jobs?include_deleted=true
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct QueryParams {
    /// Page number (starts at 1)
    #[serde(default = "default_page")]
    pub page: usize,

    /// Number of items per page
    pub limit: Option<usize>,

    /// Free-text search over the indexed columns
    pub q: Option<String>,

    /// Exact status label
    pub status: Option<String>,

    /// Restrict to rows of one owner (the `X-User-Id` header is used otherwise)
    pub owner_id: Option<Uuid>,

    /// Include soft-deleted rows
    pub include_deleted: bool,

    /// Filters as JSON object
    ///
    /// - Exact match: `{"field": "value"}`
    /// - Comparison: `{"field>": value, "field<": value, "field>=": value, "field<=": value}`
    pub filter: Option<String>,

    /// Sort field and direction: `field`, `field:asc` or `field:desc`
    pub sort: Option<String>,
}

fn default_page() -> usize {
    1
}

impl QueryParams {
    /// Get page number, ensuring minimum of 1
    pub fn page(&self) -> usize {
        self.page.max(1)
    }

    /// Get limit, clamped to `1..=max`
    pub fn limit(&self, default: usize, max: usize) -> usize {
        self.limit.unwrap_or(default).clamp(1, max.max(1))
    }

    /// Parse the filter JSON string; it must be an object
    pub fn filter_value(&self) -> Result<Option<Value>, DashError> {
        let Some(raw) = self.filter.as_deref() else {
            return Ok(None);
        };
        let value: Value = serde_json::from_str(raw).map_err(|e| RequestError::InvalidQuery {
            message: format!("filter is not valid JSON: {}", e),
        })?;
        if !value.is_object() {
            return Err(RequestError::InvalidQuery {
                message: "filter must be a JSON object".to_string(),
            }
            .into());
        }
        Ok(Some(value))
    }

    /// Build the typed list query (without pagination)
    pub fn to_list_query(&self, owner_header: Option<Uuid>) -> Result<ListQuery, DashError> {
        let mut query = ListQuery::new();
        // The caller's own id always wins over a requested owner
        query.owner_id = owner_header.or(self.owner_id);
        query.include_deleted = self.include_deleted;
        query.search = self.q.clone().filter(|q| !q.trim().is_empty());
        query.status = self.status.clone().filter(|s| !s.is_empty() && s != "all");
        query.filter = self.filter_value()?;
        if let Some(sort) = self.sort.as_deref() {
            query.sort = SortSpec::parse(sort);
        }
        Ok(query)
    }
}

/// Sort field and direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Parse `field`, `field:asc` or `field:desc`
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((field, dir)) => Self {
                field: field.trim().to_string(),
                descending: dir.trim().eq_ignore_ascii_case("desc"),
            },
            None => Self::asc(raw.trim()),
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::desc("created_at")
    }
}

/// A table-scoped read query
///
/// Mirrors what every dashboard page asks its backend: rows of one owner,
/// without soft-deleted rows, optionally matching a search string and a
/// status, ordered newest first, capped by a limit.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub owner_id: Option<Uuid>,
    pub include_deleted: bool,
    pub search: Option<String>,
    pub status: Option<String>,
    pub filter: Option<Value>,
    pub sort: SortSpec,
    pub limit: Option<usize>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn owner(mut self, owner_id: Uuid) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    pub fn search(mut self, needle: impl Into<String>) -> Self {
        self.search = Some(needle.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a single row satisfies every predicate of this query
    ///
    /// Search and status are a conjunction: a row is kept iff it matches both.
    pub fn matches<T: Data>(&self, row: &T) -> bool {
        if !self.include_deleted && row.is_deleted() {
            return false;
        }
        if let Some(owner) = self.owner_id
            && row.owner_id() != Some(owner)
        {
            return false;
        }
        if let Some(status) = self.status.as_deref()
            && row.status_label() != status
        {
            return false;
        }
        if let Some(needle) = self.search.as_deref()
            && !row.matches_search(needle)
        {
            return false;
        }
        match &self.filter {
            Some(filter) => store::matches_filter(row, filter),
            None => true,
        }
    }

    /// Filter, sort and cap a row collection
    pub fn apply<T: Data>(&self, rows: impl IntoIterator<Item = T>) -> Vec<T> {
        let rows: Vec<T> = rows.into_iter().filter(|row| self.matches(row)).collect();
        let mut rows = store::sort_rows(rows, &self.sort);
        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
        rows
    }
}

/// Paginated response structure
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    /// The paginated data
    pub data: Vec<T>,

    /// Pagination metadata
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    /// Slice one page out of an already filtered and sorted collection
    pub fn paginate(rows: Vec<T>, page: usize, limit: usize) -> Self {
        let total = rows.len();
        let page = page.max(1);
        let limit = limit.max(1);
        let data = rows
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();
        Self {
            data,
            pagination: PaginationMeta::new(page, limit, total),
        }
    }
}

/// Pagination metadata
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let limit = limit.max(1);
        let page = page.max(1);
        let total_pages = if total == 0 { 0 } else { total.div_ceil(limit) };

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

//! Common types used across the catalog service

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Roles
// =============================================================================

/// Role carried by every credential record and every issued token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Parse a role string. Matching is exact: only `admin` and `user` are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    /// Authority string granted to an authenticated request, e.g. `ROLE_ADMIN`
    pub fn authority(&self) -> String {
        format!("ROLE_{}", self.as_str().to_uppercase())
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Records
// =============================================================================

/// Credential record. The password hash never leaves the service layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Data needed to create a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Category together with the number of products referencing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub product_count: i64,
}

/// Category fields accepted on create and update
#[derive(Debug, Clone)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
}

/// Product record joined with its category name.
///
/// `code` is stored as an integer; presentation adapters decide how it is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub status: bool,
    pub code: Option<i32>,
    pub category_id: i64,
    pub category_name: Option<String>,
}

/// Product fields accepted on create and update
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub status: bool,
    pub code: Option<i32>,
    pub category_id: i64,
}

// =============================================================================
// Paging
// =============================================================================

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Case-insensitive; anything other than `desc` sorts ascending
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A validated page request. `sort_column` is always one of the resource's
/// whitelisted SQL columns, so it can be interpolated into ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort_column: &'static str,
    pub direction: SortDirection,
}

impl PageRequest {
    /// Build a page request, resolving `sort_by` against `allowed`
    /// (pairs of public field name and SQL column).
    pub fn resolve(
        page: u32,
        size: u32,
        sort_by: &str,
        direction: SortDirection,
        allowed: &[(&str, &'static str)],
    ) -> Result<Self, PagingError> {
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(PagingError::InvalidSize(size));
        }

        let sort_column = allowed
            .iter()
            .find(|(field, _)| *field == sort_by)
            .map(|(_, column)| *column)
            .ok_or_else(|| PagingError::InvalidSortField(sort_by.to_string()))?;

        Ok(Self {
            page,
            size,
            sort_column,
            direction,
        })
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PagingError {
    #[error("Page size must be between 1 and {MAX_PAGE_SIZE}, got {0}")]
    InvalidSize(u32),
    #[error("Cannot sort by '{0}'")]
    InvalidSortField(String),
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        let size = i64::from(request.size);
        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages: (total_elements + size - 1) / size,
        }
    }

    /// Convert the page content while keeping the paging metadata
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const FIELDS: &[(&str, &str)] = &[("id", "p.id"), ("name", "p.name")];

    #[test]
    fn test_role_parse_is_exact() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("ADMIN"), None);
        assert_eq!(Role::parse("owner"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_role_authority() {
        assert_eq!(Role::Admin.authority(), "ROLE_ADMIN");
        assert_eq!(Role::User.authority(), "ROLE_USER");
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let parsed: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(parsed, Role::User);
    }

    #[test]
    fn test_page_request_resolves_whitelisted_column() {
        let request =
            PageRequest::resolve(2, 10, "name", SortDirection::parse("DESC"), FIELDS).unwrap();
        assert_eq!(request.sort_column, "p.name");
        assert_eq!(request.direction, SortDirection::Desc);
        assert_eq!(request.offset(), 20);
        assert_eq!(request.limit(), 10);
    }

    #[test]
    fn test_page_request_rejects_unknown_sort_field() {
        let result = PageRequest::resolve(0, 20, "price; DROP TABLE", SortDirection::Asc, FIELDS);
        assert!(matches!(result, Err(PagingError::InvalidSortField(_))));
    }

    #[test]
    fn test_page_request_rejects_bad_size() {
        assert!(matches!(
            PageRequest::resolve(0, 0, "id", SortDirection::Asc, FIELDS),
            Err(PagingError::InvalidSize(0))
        ));
        assert!(matches!(
            PageRequest::resolve(0, MAX_PAGE_SIZE + 1, "id", SortDirection::Asc, FIELDS),
            Err(PagingError::InvalidSize(_))
        ));
    }

    #[test]
    fn test_page_total_pages() {
        let request = PageRequest::resolve(0, 20, "id", SortDirection::Asc, FIELDS).unwrap();
        let page = Page::new(vec![1, 2, 3], &request, 41);
        assert_eq!(page.total_pages, 3);

        let empty: Page<i32> = Page::new(vec![], &request, 0);
        assert_eq!(empty.total_pages, 0);

        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.content, vec![10, 20, 30]);
        assert_eq!(mapped.total_elements, 41);
    }
}

//! Pagination: one internal page type behind two wire contracts.
//!
//! The auth service answers list endpoints Spring-style, with the metadata
//! nested under `page`:
//!
//! ```json
//! { "content": [..], "page": { "number": 0, "size": 10, "totalElements": 42,
//!   "totalPages": 5, "first": true, "last": false, "empty": false } }
//! ```
//!
//! The parking service flattens it and names things differently:
//!
//! ```json
//! { "content": [..], "pageNumber": 0, "pageSize": 10, "totalElements": 42,
//!   "totalPages": 5, "first": true, "last": false, "hasNext": true, "hasPrevious": false }
//! ```
//!
//! `PagedPayload` accepts either and converts into [`Page`]. Navigation flags
//! are recomputed from the numbers so both services agree on them.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Normalized page of results. `page_number` is 0-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(
        items: Vec<T>,
        page_number: u32,
        page_size: u32,
        total_elements: u64,
        total_pages: u32,
    ) -> CoreResult<Self> {
        // The backend answers an empty unpaged listing with size 0.
        if page_size == 0 && total_elements > 0 {
            return Err(CoreError::validation(
                "page size must be positive when the listing is not empty",
            ));
        }
        Ok(Self {
            items,
            page_number,
            page_size,
            total_elements,
            total_pages,
        })
    }

    /// An empty first page.
    pub fn empty(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            page_number: 0,
            page_size,
            total_elements: 0,
            total_pages: 0,
        }
    }

    /// All items as a single page.
    pub fn single(items: Vec<T>) -> Self {
        let len = items.len();
        Self {
            items,
            page_number: 0,
            page_size: u32::try_from(len).unwrap_or(u32::MAX),
            total_elements: len as u64,
            total_pages: 1,
        }
    }

    pub fn is_first(&self) -> bool {
        self.page_number == 0
    }

    pub fn is_last(&self) -> bool {
        self.page_number.saturating_add(1) >= self.total_pages
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_next(&self) -> bool {
        !self.is_last()
    }

    pub fn has_previous(&self) -> bool {
        self.page_number > 0
    }

    /// 1-based page number, as list screens display it.
    pub fn display_page(&self) -> u32 {
        self.page_number.saturating_add(1)
    }

    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

/// Metadata block of the auth-service shape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedPageInfo {
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
    #[serde(default)]
    pub empty: bool,
}

/// Auth-service list response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NestedPage<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    pub page: NestedPageInfo,
}

/// Parking-service list response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatPage<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(alias = "currentPage")]
    pub page_number: u32,
    pub page_size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_previous: bool,
}

/// Either list response shape, as received.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PagedPayload<T> {
    Nested(NestedPage<T>),
    Flat(FlatPage<T>),
}

impl<T> TryFrom<NestedPage<T>> for Page<T> {
    type Error = CoreError;

    fn try_from(value: NestedPage<T>) -> Result<Self, Self::Error> {
        let info = value.page;
        Page::new(
            value.content,
            info.number,
            info.size,
            info.total_elements,
            info.total_pages,
        )
    }
}

impl<T> TryFrom<FlatPage<T>> for Page<T> {
    type Error = CoreError;

    fn try_from(value: FlatPage<T>) -> Result<Self, Self::Error> {
        Page::new(
            value.content,
            value.page_number,
            value.page_size,
            value.total_elements,
            value.total_pages,
        )
    }
}

impl<T> TryFrom<PagedPayload<T>> for Page<T> {
    type Error = CoreError;

    fn try_from(value: PagedPayload<T>) -> Result<Self, Self::Error> {
        match value {
            PagedPayload::Nested(page) => page.try_into(),
            PagedPayload::Flat(page) => page.try_into(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Page request parameters sent as query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Option<Sort>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            sort: None,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size,
            sort: None,
        }
    }

    pub fn sorted(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Replace a size that is not one of `options` with `default_size`.
    pub fn clamped(mut self, options: &[u32], default_size: u32) -> Self {
        if !options.contains(&self.size) {
            self.size = default_size;
        }
        self
    }

    /// Query pairs: `page`, `size` and `sort=field,direction`.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        if let Some(sort) = &self.sort {
            pairs.push(("sort", format!("{},{}", sort.field, sort.direction.as_str())));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Page<String> {
        let payload: PagedPayload<String> = serde_json::from_value(value).unwrap();
        Page::try_from(payload).unwrap()
    }

    #[test]
    fn both_shapes_normalize_to_the_same_page() {
        let nested = parse(json!({
            "content": ["a", "b"],
            "page": { "number": 1, "size": 2, "totalElements": 6, "totalPages": 3,
                      "first": false, "last": false, "empty": false }
        }));
        let flat = parse(json!({
            "content": ["a", "b"],
            "pageNumber": 1, "pageSize": 2, "totalElements": 6, "totalPages": 3,
            "first": false, "last": false, "hasNext": true, "hasPrevious": true
        }));

        assert_eq!(nested, flat);
        assert!(nested.has_next());
        assert!(nested.has_previous());
        assert_eq!(nested.display_page(), 2);
    }

    #[test]
    fn current_page_alias_is_accepted() {
        let page = parse(json!({
            "content": [], "currentPage": 0, "pageSize": 10, "totalElements": 0,
            "totalPages": 0, "first": true, "last": true, "hasNext": false, "hasPrevious": false
        }));
        assert!(page.is_first());
        assert!(page.is_last());
        assert!(page.is_empty());
    }

    #[test]
    fn server_flags_are_recomputed() {
        // Server claims "last" but there are more pages.
        let page = parse(json!({
            "content": ["x"], "pageNumber": 0, "pageSize": 1, "totalElements": 2,
            "totalPages": 2, "first": true, "last": true, "hasNext": false, "hasPrevious": false
        }));
        assert!(!page.is_last());
        assert!(page.has_next());
    }

    #[test]
    fn zero_size_is_rejected_for_non_empty_listing() {
        let payload: PagedPayload<String> = serde_json::from_value(json!({
            "content": ["x"], "pageNumber": 0, "pageSize": 0, "totalElements": 1, "totalPages": 1
        }))
        .unwrap();
        assert!(matches!(Page::try_from(payload), Err(CoreError::Validation(_))));
    }

    #[test]
    fn zero_size_is_accepted_for_empty_unpaged_listing() {
        let page = parse(json!({
            "content": [], "pageNumber": 0, "pageSize": 0, "totalElements": 0, "totalPages": 1
        }));
        assert!(page.is_empty());
        assert!(page.is_last());
    }

    #[test]
    fn single_page_holds_everything() {
        let page = Page::single(vec![1, 2, 3]);
        assert_eq!(page.total_elements, 3);
        assert!(page.is_first() && page.is_last());
        let doubled = page.map(|n| n * 2);
        assert_eq!(doubled.items, vec![2, 4, 6]);
    }

    #[test]
    fn page_request_query_pairs() {
        let req = PageRequest::new(2, 25).sorted(Sort::desc("createdAt"));
        assert_eq!(
            req.query_pairs(),
            vec![
                ("page", "2".to_string()),
                ("size", "25".to_string()),
                ("sort", "createdAt,desc".to_string()),
            ]
        );
    }

    #[test]
    fn page_request_clamps_unknown_size() {
        let req = PageRequest::new(0, 7).clamped(&[5, 10, 25, 50, 100], 10);
        assert_eq!(req.size, 10);
        let req = PageRequest::new(0, 50).clamped(&[5, 10, 25, 50, 100], 10);
        assert_eq!(req.size, 50);
    }
}

/// Page-number pagination with a restricted page-size menu
///
/// List endpoints accept `page` and `page_size` query parameters. Only the
/// sizes 5, 10, and 50 are honored; any other value, including non-integer
/// garbage, silently falls back to the default of 10. Responses use the
/// `{count, next, previous, results}` envelope with page numbers.

use serde::{Deserialize, Serialize};

/// Page sizes a client may request
pub const ALLOWED_PAGE_SIZES: [i64; 3] = [5, 10, 50];

/// Page size used when the client asks for anything else
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Raw pagination query parameters
///
/// Values are kept as strings so that a non-integer `page_size` falls back
/// to the default instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    /// Requested page number (1-based)
    pub page: Option<String>,

    /// Requested page size; restricted to [`ALLOWED_PAGE_SIZES`]
    pub page_size: Option<String>,
}

impl PageQuery {
    /// Resolves the raw query into sanitized parameters
    pub fn params(&self) -> PageParams {
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);

        let page_size = self
            .page_size
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .filter(|s| ALLOWED_PAGE_SIZES.contains(s))
            .unwrap_or(DEFAULT_PAGE_SIZE);

        PageParams { page, page_size }
    }
}

/// Sanitized pagination parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    /// Page number (1-based)
    pub page: i64,

    /// Page size (one of [`ALLOWED_PAGE_SIZES`])
    pub page_size: i64,
}

impl PageParams {
    /// Row offset for the LIMIT/OFFSET query
    ///
    /// Saturates instead of overflowing, so an absurd `page` value yields
    /// an empty page rather than a negative OFFSET.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// Row limit for the LIMIT/OFFSET query
    pub fn limit(&self) -> i64 {
        self.page_size
    }
}

/// Paginated response envelope
#[derive(Debug, Serialize)]
pub struct Page<T> {
    /// Total number of rows across all pages
    pub count: i64,

    /// Next page number, if any
    pub next: Option<i64>,

    /// Previous page number, if any
    pub previous: Option<i64>,

    /// Rows for this page
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Builds the envelope from a page of rows and the total count
    pub fn new(count: i64, params: PageParams, results: Vec<T>) -> Self {
        let has_next = params.offset().saturating_add(results.len() as i64) < count;

        Self {
            count,
            next: has_next.then_some(params.page.saturating_add(1)),
            previous: (params.page > 1).then_some(params.page - 1),
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, page_size: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(String::from),
            page_size: page_size.map(String::from),
        }
    }

    #[test]
    fn test_defaults() {
        let params = PageQuery::default().params();
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_allowed_sizes_honored() {
        for size in ["5", "10", "50"] {
            let params = query(None, Some(size)).params();
            assert_eq!(params.page_size, size.parse::<i64>().unwrap());
        }
    }

    #[test]
    fn test_disallowed_size_falls_back_to_default() {
        // page_size=7 is not in the menu
        assert_eq!(query(None, Some("7")).params().page_size, 10);
        assert_eq!(query(None, Some("100")).params().page_size, 10);
        assert_eq!(query(None, Some("0")).params().page_size, 10);
        assert_eq!(query(None, Some("-5")).params().page_size, 10);
    }

    #[test]
    fn test_non_integer_size_falls_back_to_default() {
        assert_eq!(query(None, Some("abc")).params().page_size, 10);
        assert_eq!(query(None, Some("")).params().page_size, 10);
        assert_eq!(query(None, Some("10.5")).params().page_size, 10);
    }

    #[test]
    fn test_bad_page_falls_back_to_first() {
        assert_eq!(query(Some("0"), None).params().page, 1);
        assert_eq!(query(Some("-3"), None).params().page, 1);
        assert_eq!(query(Some("x"), None).params().page, 1);
        assert_eq!(query(Some("3"), None).params().page, 3);
    }

    #[test]
    fn test_offset_calculation() {
        let params = query(Some("3"), Some("5")).params();
        assert_eq!(params.offset(), 10);
        assert_eq!(params.limit(), 5);
    }

    #[test]
    fn test_huge_page_number_saturates() {
        let big = i64::MAX.to_string();
        let params = query(Some(big.as_str()), Some("50")).params();
        assert_eq!(params.page, i64::MAX);
        assert_eq!(params.offset(), i64::MAX);

        let page = Page::new(12, params, Vec::<i32>::new());
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_envelope_links() {
        let params = query(Some("2"), Some("5")).params();
        let page = Page::new(12, params, vec![1, 2, 3, 4, 5]);

        assert_eq!(page.count, 12);
        assert_eq!(page.next, Some(3));
        assert_eq!(page.previous, Some(1));

        let params = query(Some("3"), Some("5")).params();
        let page = Page::new(12, params, vec![1, 2]);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, Some(2));

        let params = query(None, None).params();
        let page = Page::new(3, params, vec![1, 2, 3]);
        assert_eq!(page.next, None);
        assert_eq!(page.previous, None);
    }
}

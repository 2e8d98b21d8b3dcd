//! Offset pagination primitives shared by repositories and list endpoints

use serde::Serialize;

/// A request for one page of results (pages are 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    per_page: u64,
}

impl PageRequest {
    /// Create a page request; page and page size are clamped to at least 1
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Number of rows to skip before this page
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }
}

/// One page of results together with the total row count
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    items: Vec<T>,
    total: u64,
    request: PageRequest,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            request,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn current_page(&self) -> u64 {
        self.request.page()
    }

    pub fn per_page(&self) -> u64 {
        self.request.per_page()
    }

    /// Last page number; an empty result still has one (empty) page
    pub fn last_page(&self) -> u64 {
        self.total.div_ceil(self.per_page()).max(1)
    }

    /// 1-based index of the first item on this page
    pub fn from(&self) -> Option<u64> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.request.offset() + 1)
        }
    }

    /// 1-based index of the last item on this page
    pub fn to(&self) -> Option<u64> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.request.offset() + self.items.len() as u64)
        }
    }

    pub fn has_next(&self) -> bool {
        self.current_page() < self.last_page()
    }

    pub fn has_previous(&self) -> bool {
        self.current_page() > 1
    }

    /// Convert every item, keeping the pagination metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }
}

/// Serialized pagination block of a list response
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaginationMeta {
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
    pub from: Option<u64>,
    pub to: Option<u64>,
    pub next_page_url: Option<String>,
    pub prev_page_url: Option<String>,
}

impl PaginationMeta {
    /// Build the metadata block, producing page links from `base_path`
    pub fn from_page<T>(page: &Page<T>, base_path: &str) -> Self {
        let link = |number: u64| format!("{}?page={}", base_path, number);

        Self {
            total: page.total(),
            per_page: page.per_page(),
            current_page: page.current_page(),
            last_page: page.last_page(),
            from: page.from(),
            to: page.to(),
            next_page_url: page.has_next().then(|| link(page.current_page() + 1)),
            prev_page_url: page.has_previous().then(|| link(page.current_page() - 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps_to_one() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.page(), 1);
        assert_eq!(request.per_page(), 1);
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn test_page_request_offset() {
        assert_eq!(PageRequest::new(3, 20).offset(), 40);
    }

    #[test]
    fn test_middle_page_metadata() {
        let page = Page::new(vec![1; 20], 45, PageRequest::new(2, 20));

        assert_eq!(page.last_page(), 3);
        assert_eq!(page.from(), Some(21));
        assert_eq!(page.to(), Some(40));
        assert!(page.has_next());
        assert!(page.has_previous());

        let meta = PaginationMeta::from_page(&page, "/api/tokens");
        assert_eq!(meta.next_page_url.as_deref(), Some("/api/tokens?page=3"));
        assert_eq!(meta.prev_page_url.as_deref(), Some("/api/tokens?page=1"));
    }

    #[test]
    fn test_empty_page_metadata() {
        let page: Page<u8> = Page::new(vec![], 0, PageRequest::new(1, 20));
        let meta = PaginationMeta::from_page(&page, "/api/tokens");

        assert_eq!(meta.last_page, 1);
        assert_eq!(meta.from, None);
        assert_eq!(meta.to, None);
        assert!(meta.next_page_url.is_none());
        assert!(meta.prev_page_url.is_none());
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let page: Page<u8> = Page::new(vec![], 5, PageRequest::new(4, 20));
        assert_eq!(page.last_page(), 1);
        assert_eq!(page.from(), None);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn test_map_keeps_metadata() {
        let page = Page::new(vec![1, 2], 2, PageRequest::new(1, 20)).map(|n| n * 10);
        assert_eq!(page.items(), &[10, 20]);
        assert_eq!(page.total(), 2);
    }
}

//! Pull-based pagination over the remote list endpoints.

use super::types::MAX_PAGE_SIZE;

/// One page to fetch. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page: page.max(1), limit: limit.clamp(1, MAX_PAGE_SIZE) }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, MAX_PAGE_SIZE)
    }
}

/// Items of one page, plus the total page count when the remote reported it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_count: Option<u32>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items, page_count: None }
    }

    pub fn with_page_count(mut self, page_count: Option<u32>) -> Self {
        self.page_count = page_count;
        self
    }
}

/// Restartable cursor over a paginated collection.
///
/// The page size stays fixed for the whole walk. The walk ends on an empty
/// page, a short page, or once the reported page count has been reached.
#[derive(Debug, Clone)]
pub struct Pager {
    limit: u32,
    next_page: u32,
    finished: bool,
}

impl Default for Pager {
    fn default() -> Self {
        Self { limit: MAX_PAGE_SIZE, next_page: 1, finished: false }
    }
}

impl Pager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_request(&self) -> Option<PageRequest> {
        if self.finished {
            None
        } else {
            Some(PageRequest { page: self.next_page, limit: self.limit })
        }
    }

    /// Record the page just fetched for the current request.
    pub fn advance(&mut self, received: usize, page_count: Option<u32>) {
        if self.finished {
            return;
        }
        let current = self.next_page;
        let short = received == 0 || received < self.limit as usize;
        let last_reported = page_count.is_some_and(|count| current >= count);
        if short || last_reported {
            self.finished = true;
        } else {
            self.next_page = current.saturating_add(1);
        }
    }

    /// Stop the walk early, e.g. once a match or result cap was reached.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn reset(&mut self) {
        self.next_page = 1;
        self.finished = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_page_ends_walk() {
        let mut pager = Pager::new();
        assert_eq!(pager.next_request(), Some(PageRequest { page: 1, limit: 100 }));
        pager.advance(100, None);
        assert_eq!(pager.next_request(), Some(PageRequest { page: 2, limit: 100 }));
        pager.advance(50, None);
        assert_eq!(pager.next_request(), None);
    }

    #[test]
    fn empty_page_ends_walk() {
        let mut pager = Pager::new();
        pager.advance(0, None);
        assert_eq!(pager.next_request(), None);
    }

    #[test]
    fn reported_page_count_ends_full_last_page() {
        let mut pager = Pager::new();
        pager.advance(100, Some(1));
        assert_eq!(pager.next_request(), None);

        let mut pager = Pager::new();
        pager.advance(100, Some(2));
        assert_eq!(pager.next_request().map(|r| r.page), Some(2));
    }

    #[test]
    fn reset_restarts_from_first_page() {
        let mut pager = Pager::new();
        pager.advance(100, None);
        pager.finish();
        assert_eq!(pager.next_request(), None);
        pager.reset();
        assert_eq!(pager.next_request(), Some(PageRequest { page: 1, limit: 100 }));
    }
}

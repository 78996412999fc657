use serde::Serialize;
use std::ops::Range;

pub const DEFAULT_PAGE_SIZE: usize = 12;

/// 1-based page cursor over a result list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub current: usize,
    pub page_size: usize,
    pub total: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            current: 1,
            page_size: page_size.max(1),
            total: 0,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.page_size)
    }

    /// Jump to `page`, clamped to the available pages
    pub fn go_to(&mut self, page: usize) {
        self.current = page.clamp(1, self.total_pages().max(1));
    }

    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size.max(1);
        self.current = 1;
    }

    /// New result set: back to the first page
    pub fn reset(&mut self, total: usize) {
        self.total = total;
        self.current = 1;
    }

    pub fn range(&self) -> Range<usize> {
        let start = ((self.current - 1) * self.page_size).min(self.total);
        let end = (start + self.page_size).min(self.total);
        start..end
    }

    pub fn page<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.range();
        let end = range.end.min(items.len());
        &items[range.start.min(end)..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_and_clamping() {
        let items: Vec<u32> = (0..25).collect();
        let mut pages = Pagination::new(10);
        pages.reset(items.len());

        assert_eq!(pages.total_pages(), 3);
        assert_eq!(pages.page(&items), &items[0..10]);

        pages.go_to(3);
        assert_eq!(pages.page(&items), &items[20..25]);

        pages.go_to(99);
        assert_eq!(pages.current, 3);
        pages.go_to(0);
        assert_eq!(pages.current, 1);
    }

    #[test]
    fn test_empty_and_resize() {
        let mut pages = Pagination::default();
        assert_eq!(pages.total_pages(), 0);
        assert!(pages.page::<u32>(&[]).is_empty());

        pages.reset(30);
        pages.go_to(2);
        pages.set_page_size(0);
        assert_eq!(pages.page_size, 1);
        assert_eq!(pages.current, 1);
    }
}

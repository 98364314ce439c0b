use std::ops::Range;

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Number of pages for `total` rows. Never less than one, an empty table
/// still has an (empty) first page.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_index: usize,
    page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_index: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self, total: usize) -> usize {
        page_count(total, self.page_size)
    }

    /// Pulls the page index back onto the last valid page.
    pub fn clamp(&mut self, total: usize) {
        self.page_index = self.page_index.min(self.page_count(total) - 1);
    }

    /// Row range of the current page within `total` rows.
    pub fn range(&self, total: usize) -> Range<usize> {
        let start = (self.page_index * self.page_size).min(total);
        let end = (start + self.page_size).min(total);
        start..end
    }

    pub fn can_prev(&self) -> bool {
        self.page_index > 0
    }

    pub fn can_next(&self, total: usize) -> bool {
        self.page_index + 1 < self.page_count(total)
    }

    pub fn go_to(&mut self, page_index: usize, total: usize) {
        self.page_index = page_index;
        self.clamp(total);
    }

    pub fn first(&mut self) {
        self.page_index = 0;
    }

    pub fn prev(&mut self) {
        self.page_index = self.page_index.saturating_sub(1);
    }

    pub fn next(&mut self, total: usize) {
        self.go_to(self.page_index + 1, total);
    }

    pub fn last(&mut self, total: usize) {
        self.page_index = self.page_count(total) - 1;
    }

    /// Changes the page size keeping the first row of the current page in view.
    pub fn set_page_size(&mut self, page_size: usize, total: usize) {
        let first_row = self.page_index * self.page_size;
        self.page_size = page_size.max(1);
        self.page_index = first_row / self.page_size;
        self.clamp(total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn page_count_has_a_floor_of_one() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(5, 2), 3);
        assert_eq!(page_count(6, 2), 3);
        assert_eq!(page_count(7, 0), 7);
    }

    #[test]
    fn five_rows_in_pages_of_two() {
        let mut p = Pagination::new(2);
        assert_eq!(p.page_count(5), 3);
        assert_eq!(p.range(5), 0..2);
        p.last(5);
        assert_eq!(p.page_index(), 2);
        assert_eq!(p.range(5), 4..5);
    }

    #[test]
    fn pages_cover_all_rows() {
        for total in 0..30 {
            for size in 1..8 {
                let mut p = Pagination::new(size);
                let pages = p.page_count(total);
                let mut seen = 0;
                for idx in 0..pages {
                    p.go_to(idx, total);
                    let len = p.range(total).len();
                    if idx + 1 < pages {
                        assert_eq!(len, size);
                    }
                    seen += len;
                }
                assert_eq!(seen, total);
            }
        }
    }

    #[test]
    fn navigation_clamps_at_the_edges() {
        let mut p = Pagination::new(2);
        p.prev();
        assert_eq!(p.page_index(), 0);
        assert!(!p.can_prev());
        p.next(5);
        p.next(5);
        p.next(5);
        assert_eq!(p.page_index(), 2);
        assert!(!p.can_next(5));
        p.go_to(99, 5);
        assert_eq!(p.page_index(), 2);
        p.first();
        assert_eq!(p.page_index(), 0);
    }

    #[test]
    fn empty_table_has_one_empty_page() {
        let mut p = Pagination::new(3);
        p.last(0);
        assert_eq!(p.page_index(), 0);
        assert_eq!(p.range(0), 0..0);
        assert!(!p.can_next(0));
        assert!(!p.can_prev());
    }

    #[test]
    fn shrinking_data_clamps_page_index() {
        let mut p = Pagination::new(2);
        p.go_to(4, 10);
        assert_eq!(p.page_index(), 4);
        p.clamp(3);
        assert_eq!(p.page_index(), 1);
    }

    #[test]
    fn page_size_change_keeps_first_row_visible() {
        let mut p = Pagination::new(10);
        p.go_to(3, 100);
        p.set_page_size(25, 100);
        assert_eq!(p.page_index(), 1);
        p.set_page_size(0, 100);
        assert_eq!(p.page_size(), 1);
        assert_eq!(p.page_index(), 25);
    }
}

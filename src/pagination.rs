use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub rows: &'a [T],
    /// 1-based page number that was requested.
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    /// Zero-based offset of the first row on this page.
    pub start: usize,
}

impl<T> Page<'_, T> {
    /// Page count as shown to users: never below one.
    pub fn display_total_pages(&self) -> usize {
        self.total_pages.max(1)
    }

    pub fn end(&self) -> usize {
        self.start + self.rows.len()
    }

    pub fn range_label(&self) -> String {
        if self.total_rows == 0 {
            return "Showing 0 of 0 rows".to_string();
        }
        format!(
            "Showing {}-{} of {} rows",
            self.start + 1,
            (self.start + self.page_size).min(self.total_rows),
            self.total_rows
        )
    }
}

/// Slices `rows` into the `page`-th window of `page_size` rows.
///
/// Out-of-range pages yield an empty slice; keeping `page` in range is up to
/// the caller. Panics if `page_size` is zero.
pub fn paginate<T>(rows: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    assert!(page_size > 0, "page size must be greater than zero");
    let total_rows = rows.len();
    let total_pages = total_rows.div_ceil(page_size);
    let start = page.saturating_sub(1).saturating_mul(page_size).min(total_rows);
    let end = start.saturating_add(page_size).min(total_rows);
    Page {
        rows: &rows[start..end],
        page,
        page_size,
        total_pages,
        total_rows,
        start,
    }
}

/// Requested page and page size for a table view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    page: usize,
    page_size: usize,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageCursor {
    pub fn new(page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be greater than zero");
        Self { page: 1, page_size }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Changing the page size always returns to the first page.
    pub fn set_page_size(&mut self, page_size: usize) {
        assert!(page_size > 0, "page size must be greater than zero");
        self.page_size = page_size;
        self.page = 1;
    }

    pub fn first(&mut self) {
        self.page = 1;
    }

    pub fn previous(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn next(&mut self, total_pages: usize) {
        self.page = (self.page + 1).min(total_pages.max(1));
    }

    pub fn last(&mut self, total_pages: usize) {
        self.page = total_pages.max(1);
    }

    /// Jumps to `page`, clamped to `[1, total_pages]`.
    pub fn go_to(&mut self, page: usize, total_pages: usize) {
        self.page = page.clamp(1, total_pages.max(1));
    }

    pub fn slice<'a, T>(&self, rows: &'a [T]) -> Page<'a, T> {
        paginate(rows, self.page, self.page_size)
    }
}

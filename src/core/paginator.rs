use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Derived page state. Never stored apart from the result set it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageView {
    pub page_number: usize,
    pub page_size: usize,
    pub total_items: usize,
}

impl PageView {
    pub fn new(page_number: usize, page_size: usize, total_items: usize) -> Self {
        Self {
            page_number,
            page_size: page_size.max(1),
            total_items,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size)
    }

    /// 0-indexed, clamped to the item count.
    pub fn start_index(&self) -> usize {
        self.page_number
            .saturating_sub(1)
            .saturating_mul(self.page_size)
            .min(self.total_items)
    }

    pub fn end_index(&self) -> usize {
        self.start_index().saturating_add(self.page_size).min(self.total_items)
    }

    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages()
    }

    /// Controls are only drawn when there is more than one page.
    pub fn controls(&self) -> Option<PaginationControls> {
        if self.total_items <= self.page_size {
            return None;
        }
        Some(PaginationControls {
            page_number: self.page_number,
            total_pages: self.total_pages(),
            first_item: self.start_index() + 1,
            last_item: self.end_index(),
            total_items: self.total_items,
            previous_enabled: self.has_previous(),
            next_enabled: self.has_next(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationControls {
    pub page_number: usize,
    pub total_pages: usize,
    pub first_item: usize,
    pub last_item: usize,
    pub total_items: usize,
    pub previous_enabled: bool,
    pub next_enabled: bool,
}

impl PaginationControls {
    pub fn range_text(&self) -> String {
        format!(
            "Mostrando {} - {} de {} resultados",
            self.first_item, self.last_item, self.total_items
        )
    }

    pub fn page_text(&self) -> String {
        format!("Pagina {} de {}", self.page_number, self.total_pages)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSlice<'a, T> {
    pub items: &'a [T],
    pub view: PageView,
}

impl<T> PageSlice<'_, T> {
    pub fn total_pages(&self) -> usize {
        self.view.total_pages()
    }

    pub fn start_index(&self) -> usize {
        self.view.start_index()
    }

    pub fn end_index(&self) -> usize {
        self.view.end_index()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn view(&self, total_items: usize, page_number: usize) -> PageView {
        PageView::new(page_number, self.page_size, total_items)
    }

    /// Contiguous, order-preserving slice for a 1-indexed page. Pages past
    /// the end yield an empty slice.
    pub fn paginate<'a, T>(&self, items: &'a [T], page_number: usize) -> PageSlice<'a, T> {
        let view = self.view(items.len(), page_number);
        PageSlice {
            items: &items[view.start_index()..view.end_index()],
            view,
        }
    }
}

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Zero-based page index.
    pub number: u64,
    pub size: u64,
    pub total_elements: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page_info: PageInfo) -> Self {
        Self { items, page_info }
    }

    /// Number of pages implied by `total_elements` and `size`.
    pub fn total_pages(&self) -> u64 {
        let PageInfo {
            size,
            total_elements,
            ..
        } = self.page_info;
        if size == 0 {
            return if total_elements == 0 { 0 } else { 1 };
        }
        total_elements.div_ceil(size)
    }

    pub fn has_next(&self) -> bool {
        self.page_info.number + 1 < self.total_pages()
    }

    /// Map items while preserving page_info
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_info: self.page_info,
        }
    }
}

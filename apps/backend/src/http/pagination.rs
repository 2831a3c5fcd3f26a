//! Page-number pagination over query params.
//!
//! Response shape is `{items, total, page, size, pages}` with a 1-based
//! `page`.

use serde::{Deserialize, Serialize};

const DEFAULT_SIZE: u64 = 50;
const MAX_SIZE: u64 = 100;

/// `page`/`size` query parameters, both optional.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u64>,
    pub size: Option<u64>,
}

impl PageParams {
    /// 1-based page number.
    pub fn page(&self) -> u64 {
        self.page.filter(|p| *p >= 1).unwrap_or(1)
    }

    /// Items per page, clamped to [1, 100].
    pub fn size(&self) -> u64 {
        self.size
            .filter(|s| *s >= 1)
            .unwrap_or(DEFAULT_SIZE)
            .min(MAX_SIZE)
    }

    /// 0-based page index for sea-orm's paginator.
    pub fn index(&self) -> u64 {
        self.page() - 1
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
    pub pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, params: &PageParams) -> Self {
        let size = params.size();
        Self {
            items,
            total,
            page: params.page(),
            size,
            pages: total.div_ceil(size),
        }
    }

    /// Paginate an already-filtered in-memory list.
    pub fn slice(all: Vec<T>, params: &PageParams) -> Self {
        let total = all.len() as u64;
        let size = params.size();
        let start = params.index().saturating_mul(size);
        let items = all
            .into_iter()
            .skip(start as usize)
            .take(size as usize)
            .collect();
        Self::new(items, total, params)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            size: self.size,
            pages: self.pages,
        }
    }
}

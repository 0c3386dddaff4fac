use std::{fmt, ops::Range, str::FromStr};

use serde::{Deserialize, Serialize};
use shared::protocol::PageQuery;
use thiserror::Error;

pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const ROWS_PER_PAGE_OPTIONS: [usize; 4] = [5, 10, 25, 100];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageWindowError {
    #[error("page size must be greater than zero")]
    ZeroPageSize,
}

/// Which slice of the collection is visible. `size` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageWindow {
    index: usize,
    size: usize,
}

impl PageWindow {
    pub fn new(index: usize, size: usize) -> Result<Self, PageWindowError> {
        if size == 0 {
            return Err(PageWindowError::ZeroPageSize);
        }
        Ok(Self { index, size })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn with_index(self, index: usize) -> Self {
        Self { index, ..self }
    }

    /// New size, back on the first page.
    pub fn with_size(self, size: usize) -> Result<Self, PageWindowError> {
        Self::new(0, size)
    }

    /// `[index*size, index*size+size)` clipped to `len`.
    pub fn range(&self, len: usize) -> Range<usize> {
        let start = self.index.saturating_mul(self.size).min(len);
        let end = start.saturating_add(self.size).min(len);
        start..end
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.range(items.len())]
    }

    pub fn page_count(&self, total: usize) -> usize {
        total.div_ceil(self.size)
    }

    pub fn as_query(&self) -> PageQuery {
        PageQuery {
            page: self.index,
            size: self.size,
        }
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            index: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Where windowing happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagingMode {
    /// The list fetch returns everything; pages are sliced locally.
    #[default]
    Client,
    /// The list fetch sends the window and gets one page plus a total.
    Server,
}

impl FromStr for PagingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" => Ok(PagingMode::Client),
            "server" => Ok(PagingMode::Server),
            other => Err(format!("unknown paging mode '{other}' (expected client or server)")),
        }
    }
}

impl fmt::Display for PagingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagingMode::Client => f.write_str("client"),
            PagingMode::Server => f.write_str("server"),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::domain::Record;

/// Query sent with a server-paged list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub page: usize,
    pub size: usize,
}

/// Response body of a server-paged list request.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordPage {
    pub items: Vec<Record>,
    pub total: usize,
}

/// A fetched collection plus the total the pagination control should show.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordCollection {
    pub records: Vec<Record>,
    pub total: usize,
}

impl RecordCollection {
    /// Whole result set held in memory; the total is its length.
    pub fn complete(records: Vec<Record>) -> Self {
        let total = records.len();
        Self { records, total }
    }

    /// One server page out of `total` records.
    pub fn page(records: Vec<Record>, total: usize) -> Self {
        Self { records, total }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<RecordPage> for RecordCollection {
    fn from(page: RecordPage) -> Self {
        Self::page(page.items, page.total)
    }
}

//! Renderable projection of the controller state.

use serde::Serialize;
use shared::{
    domain::{RecordDetail, RecordId},
    error::ApiError,
};

use crate::columns::Align;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No list request issued yet.
    Idle,
    /// First list request in flight; show a loading indicator only.
    Bootstrapping,
    ListReady,
    /// List request failed and there is nothing to fall back on.
    ListFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CellView {
    Text { text: String, align: Align },
    Action { record_id: RecordId },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    pub id: RecordId,
    pub cells: Vec<CellView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderView {
    pub id: &'static str,
    pub label: &'static str,
    pub align: Align,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailView {
    Hidden,
    Loading { id: RecordId },
    Ready { detail: RecordDetail },
    Failed { id: RecordId, error: ApiError },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub phase: Phase,
    pub headers: Vec<HeaderView>,
    pub rows: Vec<RowView>,
    /// Count shown by the pagination control: the whole collection, not the page.
    pub total: usize,
    pub page_index: usize,
    pub page_size: usize,
    /// Zero while the collection is empty.
    pub page_count: usize,
    pub rows_per_page_options: &'static [usize],
    /// A list request is in flight while older rows are shown.
    pub refreshing: bool,
    pub list_error: Option<ApiError>,
    pub detail: DetailView,
}

impl TableView {
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Bootstrapping
    }
}

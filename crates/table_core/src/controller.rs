use client_core::ListQuery;
use shared::{
    domain::{Identity, RecordDetail, RecordId},
    error::ApiError,
    protocol::RecordCollection,
};
use tracing::{debug, info, warn};

use crate::{
    columns::{resolve_for_identity, ColumnSet},
    fetch::{Completion, FetchSlot, FetchState, Ticket},
    page::{PageWindow, PageWindowError, PagingMode, ROWS_PER_PAGE_OPTIONS},
    view::{DetailView, HeaderView, Phase, RowView, TableView},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    pub paging: PagingMode,
    pub page_size: usize,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            paging: PagingMode::Client,
            page_size: PageWindow::default().size(),
        }
    }
}

/// List fetch the owner must perform and report back with [`TableController::complete_list`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRequest {
    pub ticket: Ticket,
    pub query: ListQuery,
}

/// Detail fetch the owner must perform and report back with [`TableController::complete_detail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailRequest {
    pub ticket: Ticket,
    pub id: RecordId,
}

/// Pagination, selection and the two fetch slots of the order table.
///
/// The controller never performs I/O. Every transition that needs data
/// returns a request; the result comes back through `complete_*` together
/// with the request's ticket, and results for superseded tickets are dropped.
#[derive(Debug)]
pub struct TableController {
    identity: Identity,
    columns: ColumnSet,
    paging: PagingMode,
    window: PageWindow,
    list: FetchSlot<RecordCollection>,
    detail: FetchSlot<RecordDetail>,
    selected: Option<RecordId>,
}

impl TableController {
    pub fn new(identity: Identity, options: TableOptions) -> Result<Self, PageWindowError> {
        let window = PageWindow::new(0, options.page_size)?;
        let columns = resolve_for_identity(&identity);
        info!(
            role = ?identity.role(),
            columns = columns.len(),
            paging = %options.paging,
            page_size = window.size(),
            "order table initialized"
        );
        Ok(Self {
            identity,
            columns,
            paging: options.paging,
            window,
            list: FetchSlot::default(),
            detail: FetchSlot::default(),
            selected: None,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn paging(&self) -> PagingMode {
        self.paging
    }

    pub fn window(&self) -> PageWindow {
        self.window
    }

    pub fn selected(&self) -> Option<RecordId> {
        self.selected
    }

    pub fn list_state(&self) -> &FetchState<RecordCollection> {
        self.list.state()
    }

    pub fn detail_state(&self) -> &FetchState<RecordDetail> {
        self.detail.state()
    }

    /// First list load when the table is mounted.
    pub fn bootstrap(&mut self) -> ListRequest {
        self.issue_list()
    }

    /// Explicit reload. Rows already shown stay visible until the result lands.
    pub fn refresh(&mut self) -> ListRequest {
        self.issue_list()
    }

    /// Client paging re-slices the collection already held; server paging
    /// needs the new page.
    pub fn on_page_change(&mut self, index: usize) -> Option<ListRequest> {
        if index == self.window.index() {
            return None;
        }
        self.window = self.window.with_index(index);
        debug!(page = index, "page changed");
        match self.paging {
            PagingMode::Client => None,
            PagingMode::Server => Some(self.issue_list()),
        }
    }

    pub fn on_rows_per_page_change(
        &mut self,
        size: usize,
    ) -> Result<Option<ListRequest>, PageWindowError> {
        let previous = self.window;
        self.window = self.window.with_size(size)?;
        debug!(page_size = size, "rows per page changed");
        if self.window == previous {
            return Ok(None);
        }
        Ok(match self.paging {
            PagingMode::Client => None,
            PagingMode::Server => Some(self.issue_list()),
        })
    }

    /// Selecting the row already shown is a no-op unless its last attempt failed.
    pub fn on_row_action_click(&mut self, id: RecordId) -> Option<DetailRequest> {
        if self.selected == Some(id) && !matches!(self.detail.state(), FetchState::Failed(_)) {
            debug!(record_id = id.0, "row already selected");
            return None;
        }
        let ticket = if self.selected == Some(id) {
            self.detail.begin()
        } else {
            self.detail.begin_fresh()
        };
        self.selected = Some(id);
        debug!(
            record_id = id.0,
            generation = ticket.generation(),
            "detail requested"
        );
        Some(DetailRequest { ticket, id })
    }

    pub fn complete_list(
        &mut self,
        ticket: Ticket,
        result: Result<RecordCollection, ApiError>,
    ) -> Completion {
        if let Err(err) = &result {
            warn!(
                code = ?err.code,
                status = err.status,
                generation = ticket.generation(),
                "order list fetch failed"
            );
        }
        let completion = self.list.complete(ticket, result);
        if completion == Completion::Stale {
            debug!(
                generation = ticket.generation(),
                latest = self.list.generation(),
                "discarding stale order list response"
            );
        }
        completion
    }

    pub fn complete_detail(
        &mut self,
        ticket: Ticket,
        result: Result<RecordDetail, ApiError>,
    ) -> Completion {
        if let Err(err) = &result {
            warn!(
                code = ?err.code,
                status = err.status,
                generation = ticket.generation(),
                "order detail fetch failed"
            );
        }
        let completion = self.detail.complete(ticket, result);
        if completion == Completion::Stale {
            debug!(
                generation = ticket.generation(),
                latest = self.detail.generation(),
                "discarding stale order detail response"
            );
        }
        completion
    }

    pub fn phase(&self) -> Phase {
        match (self.list.state(), self.list.last_good()) {
            (FetchState::Idle, _) => Phase::Idle,
            (FetchState::Loading, None) => Phase::Bootstrapping,
            (FetchState::Failed(_), None) => Phase::ListFailed,
            _ => Phase::ListReady,
        }
    }

    /// Count for the pagination control.
    pub fn total(&self) -> usize {
        self.list.last_good().map_or(0, |collection| collection.total)
    }

    pub fn view(&self) -> TableView {
        let rows = match self.list.last_good() {
            Some(collection) => {
                let visible = match self.paging {
                    PagingMode::Client => self.window.slice(&collection.records),
                    PagingMode::Server => &collection.records[..],
                };
                visible
                    .iter()
                    .map(|record| RowView {
                        id: record.id(),
                        cells: self.columns.render_row(record),
                    })
                    .collect()
            }
            None => Vec::new(),
        };

        TableView {
            phase: self.phase(),
            headers: self
                .columns
                .iter()
                .map(|c| HeaderView {
                    id: c.id,
                    label: c.label,
                    align: c.align.unwrap_or_default(),
                })
                .collect(),
            rows,
            total: self.total(),
            page_index: self.window.index(),
            page_size: self.window.size(),
            page_count: self.window.page_count(self.total()),
            rows_per_page_options: &ROWS_PER_PAGE_OPTIONS,
            refreshing: self.list.state().is_loading() && self.list.last_good().is_some(),
            list_error: self.list.state().error().cloned(),
            detail: self.detail_view(),
        }
    }

    fn detail_view(&self) -> DetailView {
        let Some(id) = self.selected else {
            return DetailView::Hidden;
        };
        match self.detail.state() {
            FetchState::Idle => DetailView::Hidden,
            FetchState::Loading => DetailView::Loading { id },
            FetchState::Ready(detail) => DetailView::Ready {
                detail: detail.clone(),
            },
            FetchState::Failed(error) => DetailView::Failed {
                id,
                error: error.clone(),
            },
        }
    }

    fn issue_list(&mut self) -> ListRequest {
        let ticket = self.list.begin();
        let query = match self.paging {
            PagingMode::Client => ListQuery::All,
            PagingMode::Server => ListQuery::Page(self.window.as_query()),
        };
        debug!(generation = ticket.generation(), ?query, "order list requested");
        ListRequest { ticket, query }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;

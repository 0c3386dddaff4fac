//! Async glue between the controller and a [`RecordSource`].
//!
//! Each request runs as its own tokio task; results come back over a channel
//! and are applied by whoever owns the driver, one at a time.

use std::{future::Future, sync::Arc};

use client_core::RecordSource;
use shared::{
    domain::{RecordDetail, RecordId},
    error::ApiError,
    protocol::RecordCollection,
};
use tokio::{
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    task::{AbortHandle, JoinError},
};
use tracing::{debug, error};

use crate::{
    controller::{DetailRequest, ListRequest, TableController},
    fetch::{Completion, Ticket},
    page::PageWindowError,
    view::TableView,
};

pub enum TableEvent {
    ListLoaded {
        ticket: Ticket,
        result: Result<RecordCollection, ApiError>,
    },
    DetailLoaded {
        ticket: Ticket,
        id: RecordId,
        result: Result<RecordDetail, ApiError>,
    },
}

/// What applying one event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    List(Completion),
    Detail { id: RecordId, completion: Completion },
}

pub struct TableDriver {
    source: Arc<dyn RecordSource>,
    controller: TableController,
    events_tx: UnboundedSender<TableEvent>,
    events_rx: UnboundedReceiver<TableEvent>,
    tasks: Vec<AbortHandle>,
    in_flight: usize,
}

impl TableDriver {
    pub fn new(source: Arc<dyn RecordSource>, controller: TableController) -> Self {
        let (events_tx, events_rx) = unbounded_channel();
        Self {
            source,
            controller,
            events_tx,
            events_rx,
            tasks: Vec::new(),
            in_flight: 0,
        }
    }

    pub fn controller(&self) -> &TableController {
        &self.controller
    }

    pub fn view(&self) -> TableView {
        self.controller.view()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn start(&mut self) {
        let request = self.controller.bootstrap();
        self.spawn_list(request);
    }

    pub fn refresh(&mut self) {
        let request = self.controller.refresh();
        self.spawn_list(request);
    }

    pub fn change_page(&mut self, index: usize) {
        if let Some(request) = self.controller.on_page_change(index) {
            self.spawn_list(request);
        }
    }

    pub fn change_rows_per_page(&mut self, size: usize) -> Result<(), PageWindowError> {
        if let Some(request) = self.controller.on_rows_per_page_change(size)? {
            self.spawn_list(request);
        }
        Ok(())
    }

    /// Returns whether a detail fetch was started.
    pub fn select_row(&mut self, id: RecordId) -> bool {
        match self.controller.on_row_action_click(id) {
            Some(request) => {
                self.spawn_detail(request);
                true
            }
            None => false,
        }
    }

    /// Waits for the next completion and applies it. `None` once nothing is in flight.
    pub async fn next_event(&mut self) -> Option<Outcome> {
        if self.in_flight == 0 {
            return None;
        }
        let event = self.events_rx.recv().await?;
        self.in_flight -= 1;
        Some(self.apply(event))
    }

    /// Drains every outstanding request.
    pub async fn settle(&mut self) {
        while self.next_event().await.is_some() {}
    }

    pub fn apply(&mut self, event: TableEvent) -> Outcome {
        match event {
            TableEvent::ListLoaded { ticket, result } => {
                Outcome::List(self.controller.complete_list(ticket, result))
            }
            TableEvent::DetailLoaded { ticket, id, result } => Outcome::Detail {
                id,
                completion: self.controller.complete_detail(ticket, result),
            },
        }
    }

    fn spawn_list(&mut self, request: ListRequest) {
        let source = Arc::clone(&self.source);
        let ListRequest { ticket, query } = request;
        self.spawn_fetch(
            "order list",
            async move { source.fetch_list(query).await },
            move |result| TableEvent::ListLoaded { ticket, result },
        );
    }

    fn spawn_detail(&mut self, request: DetailRequest) {
        let source = Arc::clone(&self.source);
        let DetailRequest { ticket, id } = request;
        self.spawn_fetch(
            "order detail",
            async move { source.fetch_detail(id).await },
            move |result| TableEvent::DetailLoaded { ticket, id, result },
        );
    }

    /// Runs `fetch` as its own task and reports its result, or the reason the
    /// task died, so every spawned request produces exactly one event.
    fn spawn_fetch<T, F, E>(&mut self, operation: &'static str, fetch: F, event: E)
    where
        T: Send + 'static,
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
        E: FnOnce(Result<T, ApiError>) -> TableEvent + Send + 'static,
    {
        let fetch = tokio::spawn(fetch);
        let fetch_abort = fetch.abort_handle();
        let events = self.events_tx.clone();
        let reporter = tokio::spawn(async move {
            let result = fetch.await.unwrap_or_else(|err| {
                error!(operation, error = %err, "fetch task ended without a result");
                Err(task_failure(operation, &err))
            });
            let _ = events.send(event(result));
        });

        self.tasks.retain(|task| !task.is_finished());
        self.tasks.push(fetch_abort);
        self.tasks.push(reporter.abort_handle());
        self.in_flight += 1;
        debug!(operation, in_flight = self.in_flight, "table fetch spawned");
    }
}

fn task_failure(operation: &str, err: &JoinError) -> ApiError {
    if err.is_panic() {
        ApiError::transport(format!("{operation} fetch panicked"))
    } else {
        ApiError::transport(format!("{operation} fetch was cancelled"))
    }
}

impl Drop for TableDriver {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/driver_tests.rs"]
mod tests;

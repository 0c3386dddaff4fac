use super::*;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use client_core::ListQuery;
use shared::{
    domain::{CellValue, Identity, Record, Role},
    error::ErrorCode,
};
use tokio::{
    sync::{oneshot, Mutex},
    time::{timeout, Duration},
};

use crate::{
    controller::TableOptions,
    fetch::FetchState,
    view::{DetailView, Phase},
};

type DetailGate = oneshot::Receiver<Result<RecordDetail, ApiError>>;

struct GatedSource {
    list_result: Result<RecordCollection, ApiError>,
    list_calls: AtomicUsize,
    detail_gates: Mutex<HashMap<RecordId, DetailGate>>,
}

impl GatedSource {
    fn ok(count: i64) -> Self {
        Self::with_list(Ok(RecordCollection::complete(
            (1..=count).map(order).collect(),
        )))
    }

    fn with_list(list_result: Result<RecordCollection, ApiError>) -> Self {
        Self {
            list_result,
            list_calls: AtomicUsize::new(0),
            detail_gates: Mutex::new(HashMap::new()),
        }
    }

    async fn gate(&self, id: RecordId) -> oneshot::Sender<Result<RecordDetail, ApiError>> {
        let (tx, rx) = oneshot::channel();
        self.detail_gates.lock().await.insert(id, rx);
        tx
    }
}

#[async_trait]
impl RecordSource for GatedSource {
    async fn fetch_list(&self, _query: ListQuery) -> Result<RecordCollection, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.list_result.clone()
    }

    async fn fetch_detail(&self, id: RecordId) -> Result<RecordDetail, ApiError> {
        let gate = self.detail_gates.lock().await.remove(&id);
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ApiError::transport("gate dropped"))),
            None => Ok(detail(id.0)),
        }
    }
}

struct PanickingSource;

#[async_trait]
impl RecordSource for PanickingSource {
    async fn fetch_list(&self, _query: ListQuery) -> Result<RecordCollection, ApiError> {
        panic!("backend client bug");
    }

    async fn fetch_detail(&self, _id: RecordId) -> Result<RecordDetail, ApiError> {
        panic!("backend client bug");
    }
}

fn order(id: i64) -> Record {
    Record::new(
        RecordId(id),
        [("total".to_string(), CellValue::Number(id as f64))],
    )
}

fn detail(id: i64) -> RecordDetail {
    RecordDetail::new(RecordId(id), serde_json::json!({ "id": id }))
}

fn driver(source: Arc<GatedSource>, role: Role) -> TableDriver {
    let controller = TableController::new(Identity::user(None, role), TableOptions::default())
        .expect("controller");
    TableDriver::new(source, controller)
}

#[tokio::test]
async fn start_loads_first_page() {
    let source = Arc::new(GatedSource::ok(12));
    let mut driver = driver(Arc::clone(&source), Role::Standard);

    driver.start();
    assert_eq!(driver.view().phase, Phase::Bootstrapping);
    assert_eq!(driver.next_event().await, Some(Outcome::List(Completion::Applied)));
    assert_eq!(driver.next_event().await, None);

    let view = driver.view();
    assert_eq!(view.phase, Phase::ListReady);
    assert_eq!(view.rows.len(), 5);
    assert_eq!(view.total, 12);
}

#[tokio::test]
async fn client_paging_does_not_refetch() {
    let source = Arc::new(GatedSource::ok(12));
    let mut driver = driver(Arc::clone(&source), Role::Standard);
    driver.start();
    driver.settle().await;

    driver.change_page(2);
    driver.change_rows_per_page(10).expect("size");
    driver.change_page(1);
    assert_eq!(driver.in_flight(), 0);
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        driver.view().rows.iter().map(|r| r.id.0).collect::<Vec<_>>(),
        vec![11, 12]
    );

    driver.refresh();
    driver.settle().await;
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unauthorized_list_is_surfaced_as_failed_state() {
    let source = Arc::new(GatedSource::with_list(Err(ApiError::from_status(
        401,
        "token expired",
    ))));
    let mut driver = driver(source, Role::Standard);
    driver.start();
    driver.settle().await;

    assert!(matches!(
        driver.controller().list_state(),
        FetchState::Failed(err) if err.code == ErrorCode::Unauthorized
    ));
    let view = driver.view();
    assert_eq!(view.phase, Phase::ListFailed);
    assert!(view.rows.is_empty());
}

#[tokio::test]
async fn late_detail_for_previous_selection_is_discarded() {
    let source = Arc::new(GatedSource::ok(12));
    let mut driver = driver(Arc::clone(&source), Role::Admin);
    driver.start();
    driver.settle().await;

    let release_x = source.gate(RecordId(3)).await;
    let release_y = source.gate(RecordId(4)).await;
    assert!(driver.select_row(RecordId(3)));
    assert!(driver.select_row(RecordId(4)));
    assert_eq!(driver.in_flight(), 2);

    release_y.send(Ok(detail(4))).expect("release y");
    assert_eq!(
        driver.next_event().await,
        Some(Outcome::Detail {
            id: RecordId(4),
            completion: Completion::Applied
        })
    );

    release_x.send(Ok(detail(3))).expect("release x");
    assert_eq!(
        driver.next_event().await,
        Some(Outcome::Detail {
            id: RecordId(3),
            completion: Completion::Stale
        })
    );

    assert_eq!(driver.view().detail, DetailView::Ready { detail: detail(4) });
    assert_eq!(driver.controller().selected(), Some(RecordId(4)));
}

#[tokio::test]
async fn detail_runs_independently_of_list() {
    let source = Arc::new(GatedSource::ok(12));
    let mut driver = driver(Arc::clone(&source), Role::Admin);
    driver.start();
    driver.settle().await;
    let list_before = driver.controller().list_state().clone();

    let release = source.gate(RecordId(7)).await;
    assert!(driver.select_row(RecordId(7)));
    assert!(!driver.select_row(RecordId(7)));
    assert_eq!(driver.view().detail, DetailView::Loading { id: RecordId(7) });

    release.send(Ok(detail(7))).expect("release");
    driver.settle().await;
    assert_eq!(driver.view().detail, DetailView::Ready { detail: detail(7) });
    assert_eq!(driver.controller().list_state(), &list_before);
}

#[tokio::test]
async fn panicking_source_still_completes_the_request() {
    let controller = TableController::new(Identity::user(None, Role::Admin), TableOptions::default())
        .expect("controller");
    let mut driver = TableDriver::new(Arc::new(PanickingSource), controller);

    driver.start();
    timeout(Duration::from_secs(2), driver.settle())
        .await
        .expect("settle should not hang");

    assert_eq!(driver.in_flight(), 0);
    let view = driver.view();
    assert_eq!(view.phase, Phase::ListFailed);
    assert_eq!(
        view.list_error.as_ref().map(|err| err.code),
        Some(ErrorCode::Generic)
    );

    assert!(driver.select_row(RecordId(1)));
    timeout(Duration::from_secs(2), driver.settle())
        .await
        .expect("settle should not hang");
    assert!(matches!(
        driver.view().detail,
        DetailView::Failed { id: RecordId(1), .. }
    ));
}

#[tokio::test]
async fn dropping_the_driver_cancels_outstanding_fetches() {
    let source = Arc::new(GatedSource::ok(3));
    let mut driver = driver(Arc::clone(&source), Role::Admin);
    driver.start();
    driver.settle().await;

    let mut release = source.gate(RecordId(2)).await;
    assert!(driver.select_row(RecordId(2)));

    // Wait until the fetch has taken its gate and is parked on it.
    while !source.detail_gates.lock().await.is_empty() {
        tokio::task::yield_now().await;
    }
    assert!(!release.is_closed());

    drop(driver);
    timeout(Duration::from_secs(2), release.closed())
        .await
        .expect("gated fetch should be cancelled");
    assert!(release.is_closed());
}

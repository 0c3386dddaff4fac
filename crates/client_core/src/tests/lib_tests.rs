use super::*;
use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

const TEST_TOKEN: &str = "test-token";

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<usize>,
    size: Option<usize>,
}

fn authorized(headers: &HeaderMap) -> Result<(), (StatusCode, String)> {
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(TEST_TOKEN) => Ok(()),
        _ => Err((StatusCode::UNAUTHORIZED, "token expired".to_string())),
    }
}

fn order(id: i64) -> Value {
    json!({
        "id": id,
        "nombre": format!("Cliente {id}"),
        "email": format!("c{id}@tienda.com"),
        "direccion": "Calle 1",
        "telefono": "5550000",
        "fechaEntrega": "2024-06-01",
        "total": 100.0 + id as f64,
    })
}

async fn handle_list_orders(
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, (StatusCode, String)> {
    authorized(&headers)?;
    let all: Vec<Value> = (1..=12).map(order).collect();
    match (params.page, params.size) {
        (Some(page), Some(size)) => {
            let items: Vec<Value> = all.iter().skip(page * size).take(size).cloned().collect();
            Ok(Json(json!({ "items": items, "total": all.len() })))
        }
        _ => Ok(Json(Value::Array(all))),
    }
}

async fn handle_order_detail(
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, String)> {
    authorized(&headers)?;
    if id == 409 {
        return Err((StatusCode::CONFLICT, "order already cancelled".to_string()));
    }
    if id == 500 {
        return Err((StatusCode::INTERNAL_SERVER_ERROR, String::new()));
    }
    Ok(Json(json!({ "id": id, "lineas": [{ "producto": "Café", "cantidad": 2 }] })))
}

async fn handle_list_products(headers: HeaderMap) -> Result<Json<Value>, (StatusCode, String)> {
    authorized(&headers)?;
    Ok(Json(json!([
        { "id": 1, "nombre": "Café", "precio": 55.5 },
        { "id": 2, "nombre": "Té", "precio": 30 }
    ])))
}

async fn handle_broken_orders() -> &'static str {
    "not json"
}

async fn spawn_store_server() -> Url {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let app = Router::new()
        .route("/api/orden", get(handle_list_orders))
        .route("/api/orden/:id", get(handle_order_detail))
        .route("/api/producto", get(handle_list_products))
        .route("/broken/orden", get(handle_broken_orders));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    Url::parse(&format!("http://{addr}/api/")).expect("url")
}

fn client(base_url: Url, token: Option<&str>) -> StorefrontClient {
    StorefrontClient::new(base_url, token.and_then(Credential::new))
}

#[tokio::test]
async fn list_orders_sends_credential_and_parses_records() {
    let base = spawn_store_server().await;
    let orders = client(base, Some(TEST_TOKEN))
        .list_orders()
        .await
        .expect("orders");

    assert_eq!(orders.len(), 12);
    assert_eq!(orders[0].id(), RecordId(1));
    assert_eq!(
        orders[0].get("total").and_then(|v| v.as_number()),
        Some(101.0)
    );
}

#[tokio::test]
async fn list_orders_without_valid_token_is_unauthorized() {
    let base = spawn_store_server().await;
    let err = client(base.clone(), Some("stale"))
        .list_orders()
        .await
        .expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Unauthorized);
    assert_eq!(err.status, Some(401));
    assert_eq!(err.message, "token expired");
    assert!(err.requires_reauth());

    let err = client(base, None).list_orders().await.expect_err("no token");
    assert_eq!(err.code, ErrorCode::Unauthorized);
}

#[tokio::test]
async fn detail_conflict_and_server_errors_are_classified() {
    let base = spawn_store_server().await;
    let client = client(base, Some(TEST_TOKEN));

    let conflict = client.order_detail(RecordId(409)).await.expect_err("409");
    assert_eq!(conflict.code, ErrorCode::Conflict);
    assert_eq!(conflict.message, "order already cancelled");

    let generic = client.order_detail(RecordId(500)).await.expect_err("500");
    assert_eq!(generic.code, ErrorCode::Generic);
    assert_eq!(generic.status, Some(500));
    assert_eq!(generic.message, "Internal Server Error");
}

#[tokio::test]
async fn detail_carries_opaque_payload() {
    let base = spawn_store_server().await;
    let detail = client(base, Some(TEST_TOKEN))
        .order_detail(RecordId(7))
        .await
        .expect("detail");
    assert_eq!(detail.id, RecordId(7));
    assert_eq!(detail.payload["lineas"][0]["cantidad"], 2);
}

#[tokio::test]
async fn record_source_page_query_returns_server_total() {
    let base = spawn_store_server().await;
    let client = client(base, Some(TEST_TOKEN));

    let page = client
        .fetch_list(ListQuery::Page(PageQuery { page: 2, size: 5 }))
        .await
        .expect("page");
    assert_eq!(page.total, 12);
    assert_eq!(
        page.records.iter().map(|r| r.id()).collect::<Vec<_>>(),
        vec![RecordId(11), RecordId(12)]
    );

    let all = client.fetch_list(ListQuery::All).await.expect("all");
    assert_eq!(all.total, 12);
    assert_eq!(all.len(), 12);
}

#[tokio::test]
async fn list_products_uses_producto_endpoint() {
    let base = spawn_store_server().await;
    let products = client(base, Some(TEST_TOKEN))
        .list_products()
        .await
        .expect("products");
    assert_eq!(products.len(), 2);
    assert_eq!(
        products[1].get("nombre").map(ToString::to_string),
        Some("Té".to_string())
    );
}

#[tokio::test]
async fn undecodable_body_is_a_generic_failure() {
    let base = spawn_store_server().await;
    let broken = base.join("/broken/").expect("url");
    let err = client(broken, Some(TEST_TOKEN))
        .list_orders()
        .await
        .expect_err("decode");
    assert_eq!(err.code, ErrorCode::Generic);
    assert_eq!(err.status, None);
}

#[tokio::test]
async fn unreachable_server_is_a_generic_failure() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let base = Url::parse(&format!("http://{addr}/")).expect("url");
    let err = client(base, Some(TEST_TOKEN))
        .list_orders()
        .await
        .expect_err("refused");
    assert_eq!(err.code, ErrorCode::Generic);
    assert_eq!(err.status, None);
    assert!(!err.requires_reauth());
}

#[tokio::test]
async fn missing_source_always_fails() {
    let err = MissingRecordSource
        .fetch_detail(RecordId(3))
        .await
        .expect_err("missing");
    assert!(err.message.contains("record 3"));
}

#[test]
fn blank_credentials_are_rejected_and_debug_is_redacted() {
    assert!(Credential::new("  ").is_none());
    let credential = Credential::new(" abc ").expect("credential");
    assert_eq!(credential.header_value(), "abc");
    assert_eq!(format!("{credential:?}"), "Credential(<redacted>)");
}

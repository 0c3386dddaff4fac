use std::fmt;

use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Identity, Record, RecordDetail, RecordId},
    error::{ApiError, ErrorCode},
    protocol::{PageQuery, RecordCollection, RecordPage},
};
use tracing::{debug, error, info};
use url::Url;

pub mod identity;
pub mod registration;

pub use identity::decode_identity;

const ORDERS_PATH: &str = "orden";
const PRODUCTS_PATH: &str = "producto";

/// Opaque session token, sent verbatim in the `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn header_value(&self) -> &str {
        &self.0
    }

    pub fn identity(&self) -> Identity {
        decode_identity(Some(&self.0))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// What a list request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListQuery {
    /// The whole collection; the caller windows it locally.
    All,
    /// One server page.
    Page(PageQuery),
}

/// Backend seam used by the table driver.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_list(&self, query: ListQuery) -> Result<RecordCollection, ApiError>;
    async fn fetch_detail(&self, id: RecordId) -> Result<RecordDetail, ApiError>;
}

pub struct MissingRecordSource;

#[async_trait]
impl RecordSource for MissingRecordSource {
    async fn fetch_list(&self, _query: ListQuery) -> Result<RecordCollection, ApiError> {
        Err(ApiError::transport("record source is unavailable"))
    }

    async fn fetch_detail(&self, id: RecordId) -> Result<RecordDetail, ApiError> {
        Err(ApiError::transport(format!(
            "record source is unavailable for record {id}"
        )))
    }
}

/// Thin HTTP wrapper around the storefront backend.
pub struct StorefrontClient {
    http: Client,
    base_url: Url,
    credential: Option<Credential>,
}

impl StorefrontClient {
    pub fn new(base_url: Url, credential: Option<Credential>) -> Self {
        Self::with_http(Client::new(), base_url, credential)
    }

    pub fn with_http(http: Client, base_url: Url, credential: Option<Credential>) -> Self {
        Self {
            http,
            base_url,
            credential,
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub async fn list_orders(&self) -> Result<Vec<Record>, ApiError> {
        let url = self.endpoint(&[ORDERS_PATH])?;
        let orders: Vec<Record> = self.get_json(url, None, "list_orders").await?;
        info!(count = orders.len(), "orders fetched");
        Ok(orders)
    }

    pub async fn list_orders_page(&self, query: PageQuery) -> Result<RecordPage, ApiError> {
        let url = self.endpoint(&[ORDERS_PATH])?;
        let page: RecordPage = self.get_json(url, Some(&query), "list_orders_page").await?;
        info!(
            page = query.page,
            size = query.size,
            count = page.items.len(),
            total = page.total,
            "order page fetched"
        );
        Ok(page)
    }

    pub async fn order_detail(&self, id: RecordId) -> Result<RecordDetail, ApiError> {
        let id_segment = id.to_string();
        let url = self.endpoint(&[ORDERS_PATH, &id_segment])?;
        let payload: serde_json::Value = self.get_json(url, None, "order_detail").await?;
        debug!(record_id = id.0, "order detail fetched");
        Ok(RecordDetail::new(id, payload))
    }

    pub async fn list_products(&self) -> Result<Vec<Record>, ApiError> {
        let url = self.endpoint(&[PRODUCTS_PATH])?;
        let products: Vec<Record> = self.get_json(url, None, "list_products").await?;
        info!(count = products.len(), "products fetched");
        Ok(products)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::transport(format!("base url {} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: Option<&PageQuery>,
        operation: &'static str,
    ) -> Result<T, ApiError> {
        let mut request = self.http.get(url);
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(credential) = &self.credential {
            request = request.header(AUTHORIZATION, credential.header_value());
        }

        let response = request.send().await.map_err(|err| {
            error!(operation, error = %err, "request failed without a response");
            ApiError::transport(err.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(log_failure(operation, status_error(status, body)));
        }

        response.json::<T>().await.map_err(|err| {
            error!(operation, error = %err, "response body could not be decoded");
            ApiError::transport(format!("invalid response body: {err}"))
        })
    }
}

#[async_trait]
impl RecordSource for StorefrontClient {
    async fn fetch_list(&self, query: ListQuery) -> Result<RecordCollection, ApiError> {
        match query {
            ListQuery::All => self.list_orders().await.map(RecordCollection::complete),
            ListQuery::Page(page) => self.list_orders_page(page).await.map(Into::into),
        }
    }

    async fn fetch_detail(&self, id: RecordId) -> Result<RecordDetail, ApiError> {
        self.order_detail(id).await
    }
}

fn status_error(status: StatusCode, body: String) -> ApiError {
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    } else {
        body
    };
    ApiError::from_status(status.as_u16(), message)
}

fn log_failure(operation: &'static str, err: ApiError) -> ApiError {
    let status = err.status.unwrap_or_default();
    match err.code {
        ErrorCode::Conflict => error!(operation, status, body = %err.message, "conflict error"),
        ErrorCode::Unauthorized => error!(
            operation,
            status,
            body = %err.message,
            "unauthorized: token is invalid or expired"
        ),
        _ => error!(operation, status, body = %err.message, "error response"),
    }
    err
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

//! HTTP implementation of the product repository.
//!
//! Endpoints, relative to the configured base URL:
//! `GET products`, `GET products/{id}`, `POST products`,
//! `PATCH products/{id}/stock`, `PUT products/{id}`, `DELETE products/{id}`.
//! Nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use stockdash_core::ProductId;
use stockdash_inventory::{ListQuery, ProductRepository, RepositoryError, StockChange};
use stockdash_products::{Product, ProductDraft};

use crate::config::DashboardConfig;

const PRODUCTS: &str = "products";

/// Statuses a create rejection is reported with when the payload itself is
/// at fault (bad fields, duplicate id).
const CREATE_REJECTIONS: [StatusCode; 3] = [
    StatusCode::BAD_REQUEST,
    StatusCode::CONFLICT,
    StatusCode::UNPROCESSABLE_ENTITY,
];

/// Client for the remote product API.
#[derive(Debug, Clone)]
pub struct HttpProductRepository {
    client: Client,
    base_url: Url,
}

fn not_a_base(url: &Url) -> RepositoryError {
    RepositoryError::Network(format!("{url} cannot be used as a base URL"))
}

impl HttpProductRepository {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, RepositoryError> {
        if base_url.cannot_be_a_base() {
            return Err(not_a_base(&base_url));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RepositoryError::Network(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, RepositoryError> {
        Self::new(config.api_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL plus `segments`, each percent-encoded as one path segment.
    fn url(&self, segments: &[&str]) -> Result<Url, RepositoryError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| not_a_base(&self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RepositoryError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RepositoryError::Network(format!("request timed out: {e}"))
            } else {
                RepositoryError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), %body, "product API returned an error");
        Err(RepositoryError::api(status.as_u16(), body))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RepositoryError> {
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RepositoryError::Network(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ProductRepository for HttpProductRepository {
    async fn list(&self, query: &ListQuery) -> Result<Vec<Product>, RepositoryError> {
        let url = self.url(&[PRODUCTS])?;
        let response = self.send(self.client.get(url).query(&query.to_params())).await?;
        Self::decode(response).await
    }

    async fn get(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        let url = self.url(&[PRODUCTS, id.as_str()])?;
        let response = self.send(self.client.get(url)).await?;
        Self::decode(response).await
    }

    async fn create(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let url = self.url(&[PRODUCTS])?;
        let response = match self.send(self.client.post(url).json(draft)).await {
            Ok(response) => response,
            Err(RepositoryError::Api { status, body })
                if CREATE_REJECTIONS.iter().any(|s| s.as_u16() == status) =>
            {
                return Err(RepositoryError::Validation(body));
            }
            Err(err) => return Err(err),
        };
        Self::decode(response).await
    }

    async fn update_stock(
        &self,
        id: &ProductId,
        change: &StockChange,
    ) -> Result<Product, RepositoryError> {
        let url = self.url(&[PRODUCTS, id.as_str(), "stock"])?;
        let response = self.send(self.client.patch(url).json(change)).await?;
        Self::decode(response).await
    }

    async fn replace(&self, id: &ProductId, product: &Product) -> Result<Product, RepositoryError> {
        let url = self.url(&[PRODUCTS, id.as_str()])?;
        let response = self.send(self.client.put(url).json(product)).await?;
        Self::decode(response).await
    }

    async fn remove(&self, id: &ProductId) -> Result<(), RepositoryError> {
        let url = self.url(&[PRODUCTS, id.as_str()])?;
        // 204 and any other success carry nothing we need
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}

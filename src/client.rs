//! HTTP client for a remote feedback portal
//!
//! [`ApiClient`] implements [`CatalogSource`] and [`FeedbackStore`] against
//! the JSON API, so a [`FeedbackWorkflow`](crate::workflow::FeedbackWorkflow)
//! can run against a deployed backend.

use crate::models::{
    ApiResponse, FeedbackRecord, Issue, Product, StoreLocation, SubmissionResult, Variant,
};
use crate::workflow::{
    CatalogSource, Collaborators, FeedbackStore, FeedbackWorkflow, FormPolicy, Navigator, Notifier,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://localhost:8080`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.http.get(self.url(path)).send().await?;
        let status = response.status();
        let body: ApiResponse<T> = response.json().await?;
        unwrap_envelope(status, body)
    }

    pub async fn form_policy(&self) -> Result<FormPolicy, ClientError> {
        self.get("form-policy").await
    }

    /// A workflow enforcing the server's form policy, backed by this client
    pub async fn workflow(
        self,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<FeedbackWorkflow, ClientError> {
        let policy = self.form_policy().await?;
        let client = Arc::new(self);
        Ok(FeedbackWorkflow::new(
            policy,
            Collaborators {
                catalog: client.clone(),
                store: client,
                navigator,
                notifier,
            },
        ))
    }

    pub async fn locations(&self) -> Result<Vec<StoreLocation>, ClientError> {
        self.get("locations").await
    }

    /// POST a record; validation, rate limit and storage rejections become
    /// `submitted == false`
    pub async fn post_feedback(
        &self,
        record: &FeedbackRecord,
    ) -> Result<SubmissionResult, ClientError> {
        let response = self
            .http
            .post(self.url("feedback"))
            .json(record)
            .send()
            .await?;
        let status = response.status();
        let body: ApiResponse<SubmissionResult> = response.json().await?;
        submission_outcome(status, body)
    }
}

fn unwrap_envelope<T>(status: StatusCode, body: ApiResponse<T>) -> Result<T, ClientError> {
    match body.data {
        Some(data) if body.success => Ok(data),
        _ => Err(ClientError::Api {
            status,
            message: body
                .error
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
        }),
    }
}

fn submission_outcome(
    status: StatusCode,
    body: ApiResponse<SubmissionResult>,
) -> Result<SubmissionResult, ClientError> {
    match (body.data, body.error) {
        (Some(result), _) => Ok(result),
        (None, Some(error)) if status.is_client_error() || status.is_server_error() => {
            Ok(SubmissionResult::rejected(error))
        }
        _ => Err(ClientError::Api {
            status,
            message: "Unexpected response from feedback API".to_string(),
        }),
    }
}

#[async_trait]
impl CatalogSource for ApiClient {
    async fn list_products(&self) -> anyhow::Result<Vec<Product>> {
        Ok(self.get("products").await?)
    }

    async fn list_variants(&self, product_id: &str) -> anyhow::Result<Vec<Variant>> {
        Ok(self.get(&format!("products/{}/variants", product_id)).await?)
    }

    async fn list_issues(&self) -> anyhow::Result<Vec<Issue>> {
        Ok(self.get("issues").await?)
    }
}

#[async_trait]
impl FeedbackStore for ApiClient {
    async fn submit(&self, record: FeedbackRecord) -> anyhow::Result<SubmissionResult> {
        Ok(self.post_feedback(&record).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = ApiClient::with_client(reqwest::Client::new(), "http://portal.test/");
        assert_eq!(client.url("products"), "http://portal.test/api/products");
        assert_eq!(
            client.url("/products/indomie/variants"),
            "http://portal.test/api/products/indomie/variants"
        );
    }

    #[test]
    fn test_envelope_error_carries_message() {
        let err = unwrap_envelope::<Vec<Variant>>(
            StatusCode::NOT_FOUND,
            ApiResponse::error("Product not found"),
        )
        .unwrap_err();
        match err {
            ClientError::Api { status, message } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(message, "Product not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejections_become_unsubmitted_results() {
        let result = submission_outcome(
            StatusCode::TOO_MANY_REQUESTS,
            ApiResponse::error("Too many submissions. Please try again later."),
        )
        .unwrap();
        assert!(!result.submitted);
        assert_eq!(result.message, "Too many submissions. Please try again later.");

        let stored = SubmissionResult::rejected("Failed to store feedback");
        let result = submission_outcome(
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiResponse {
                success: false,
                data: Some(stored.clone()),
                error: Some(stored.message.clone()),
            },
        )
        .unwrap();
        assert_eq!(result, stored);
    }

    #[test]
    fn test_empty_success_is_an_error() {
        let body = ApiResponse::<SubmissionResult> {
            success: true,
            data: None,
            error: None,
        };
        assert!(submission_outcome(StatusCode::OK, body).is_err());
    }

    #[test]
    fn test_unreachable_server_is_transport_error() {
        tokio_test::block_on(async {
            let client = ApiClient::new("http://127.0.0.1:1").unwrap();
            let err = client.list_issues().await.unwrap_err();
            assert!(err.downcast_ref::<ClientError>().is_some());
        });
    }

    #[tokio::test]
    async fn test_workflow_needs_reachable_server() {
        use crate::workflow::{LogNavigator, LogNotifier};

        let client = ApiClient::new("http://127.0.0.1:1").unwrap();
        let result = client
            .workflow(Arc::new(LogNavigator), Arc::new(LogNotifier))
            .await;
        assert!(matches!(result, Err(ClientError::Http(_))));
    }
}

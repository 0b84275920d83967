//! Services the feedback workflow calls into

use crate::models::{FeedbackRecord, Issue, Product, SubmissionResult, Variant};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Read access to the product and issue catalogs
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// All products, each with its ordered variants
    async fn list_products(&self) -> Result<Vec<Product>>;

    /// Variants of a single product
    async fn list_variants(&self, product_id: &str) -> Result<Vec<Variant>>;

    async fn list_issues(&self) -> Result<Vec<Issue>>;
}

/// Write access to the feedback table.
///
/// Failures inside the store come back as `submitted == false` with a
/// message; only transport failures are `Err`.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn submit(&self, record: FeedbackRecord) -> Result<SubmissionResult>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    ThankYou,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::ThankYou => "/thank-you",
        }
    }
}

/// State handed to the confirmation view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationState {
    pub customer_name: String,
    pub email: Option<String>,
    pub product_name: String,
}

#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    fn go_to(&self, route: Route, state: ConfirmationState);
}

/// Fire-and-forget user notifications
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    fn success(&self, text: &str);
    fn error(&self, text: &str);
}

/// Navigator for headless use: navigation is logged
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn go_to(&self, route: Route, state: ConfirmationState) {
        tracing::info!(
            "Navigating to {} for {} ({})",
            route.path(),
            state.customer_name,
            state.product_name
        );
    }
}

/// Notifier for headless use: notifications go to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, text: &str) {
        tracing::info!("{}", text);
    }

    fn error(&self, text: &str) {
        tracing::warn!("{}", text);
    }
}

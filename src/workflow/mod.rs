//! Feedback submission workflow
//!
//! Drives one shopper through product, variant and issue selection, the
//! free-form fields, validation and the submission itself:
//!
//! ```text
//! Selecting ──submit──▶ Validating ──ok──▶ Submitting ──submitted──▶ Succeeded
//!     ▲                     │                   │
//!     └──────errors─────────┘                   └──rejected──▶ Failed ──edit/submit──▶ ...
//! ```
//!
//! The workflow owns its draft and never blocks: catalog loads, variant
//! fetches and the submission are awaited through the injected
//! [`CatalogSource`] and [`FeedbackStore`]. Variant fetches are split into a
//! [`VariantRequest`] and a [`VariantResponse`] so a response can be applied
//! after newer selections were made; late responses are discarded.

mod collaborators;
mod draft;
mod policy;

pub use collaborators::{
    CatalogSource, ConfirmationState, FeedbackStore, LogNavigator, LogNotifier, Navigator,
    Notifier, Route,
};
pub use draft::{FeedbackDraft, RatingDimension, Ratings};
pub use policy::{FormPolicy, IssuePolicy, RatingScale};

#[cfg(test)]
pub use collaborators::{MockNavigator, MockNotifier};

use crate::models::{Issue, Product, SubmissionResult, Variant};
use crate::validation::{truncate_words, validate_feedback, FieldId, ValidationErrors};
use chrono::NaiveDate;
use std::sync::Arc;
use thiserror::Error;

const VALIDATION_SUMMARY: &str = "Please fix the highlighted fields before submitting";
const SUBMISSION_FALLBACK: &str = "Failed to submit feedback. Please try again.";
const CATALOG_FALLBACK: &str = "Could not load products. Please try again.";
const VARIANTS_FALLBACK: &str = "Could not load product variants";
const SUBMITTED_MESSAGE: &str = "Thank you! Your feedback has been submitted.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Selecting,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    #[error("{0}")]
    SubmissionFailed(String),

    #[error("{0}")]
    CatalogLoadFailed(String),

    #[error("The catalog has not been loaded")]
    CatalogNotLoaded,

    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    #[error("Unknown variant: {0}")]
    UnknownVariant(String),

    #[error("Unknown issue: {0}")]
    UnknownIssue(String),

    #[error("A submission is already in progress")]
    SubmissionInProgress,

    #[error("Feedback has already been submitted")]
    AlreadySubmitted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub products: Vec<Product>,
    pub issues: Vec<Issue>,
}

impl Catalog {
    pub fn product(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }

    pub fn issue(&self, issue_id: &str) -> Option<&Issue> {
        self.issues.iter().find(|i| i.id == issue_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogState {
    NotLoaded,
    Loaded(Catalog),
    /// Message shown next to the retry affordance
    Failed(String),
}

/// A single edit to one of the free-form fields
#[derive(Debug, Clone, PartialEq)]
pub enum FieldEdit {
    CustomerName(String),
    Email(String),
    Location(String),
    Anonymous(bool),
    Rating(RatingDimension, u8),
    Comments(String),
    VisitDate(NaiveDate),
}

/// Pending variant fetch for one product selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRequest {
    token: u64,
    product_id: String,
}

impl VariantRequest {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    pub async fn resolve(self, source: &dyn CatalogSource) -> VariantResponse {
        let result = source
            .list_variants(&self.product_id)
            .await
            .map_err(|e| e.to_string());
        VariantResponse {
            request: self,
            result,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariantResponse {
    request: VariantRequest,
    result: Result<Vec<Variant>, String>,
}

/// Services the workflow depends on
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn CatalogSource>,
    pub store: Arc<dyn FeedbackStore>,
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
}

pub struct FeedbackWorkflow {
    policy: FormPolicy,
    services: Collaborators,
    state: WorkflowState,
    history: Vec<WorkflowState>,
    catalog: CatalogState,
    variant_token: u64,
    variants_loading: bool,
    draft: FeedbackDraft,
    errors: ValidationErrors,
}

impl FeedbackWorkflow {
    pub fn new(policy: FormPolicy, services: Collaborators) -> Self {
        let draft = FeedbackDraft::new(policy.rating_scale);
        Self {
            policy,
            services,
            state: WorkflowState::Selecting,
            history: vec![WorkflowState::Selecting],
            catalog: CatalogState::NotLoaded,
            variant_token: 0,
            variants_loading: false,
            draft,
            errors: ValidationErrors::new(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Every state entered so far, starting with `Selecting`
    pub fn history(&self) -> &[WorkflowState] {
        &self.history
    }

    pub fn policy(&self) -> &FormPolicy {
        &self.policy
    }

    pub fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    pub fn draft(&self) -> &FeedbackDraft {
        &self.draft
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Variants offered for the selected product
    pub fn variants(&self) -> &[Variant] {
        self.draft
            .product
            .as_ref()
            .map(|p| p.variants.as_slice())
            .unwrap_or(&[])
    }

    pub fn variants_loading(&self) -> bool {
        self.variants_loading
    }

    /// Live word count of the comments field
    pub fn word_count(&self) -> usize {
        crate::validation::count_words(&self.draft.comments)
    }

    pub fn word_limit(&self) -> Option<usize> {
        self.policy.max_comment_words
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Load products and issues. Runs once; after a failure, calling it
    /// again retries.
    pub async fn load_catalog(&mut self) -> Result<(), WorkflowError> {
        if matches!(self.catalog, CatalogState::Loaded(_)) {
            return Ok(());
        }

        let source = Arc::clone(&self.services.catalog);
        let (products, issues) = tokio::join!(source.list_products(), source.list_issues());

        match (products, issues) {
            (Ok(products), Ok(issues)) => {
                tracing::debug!(
                    "Catalog loaded: {} products, {} issues",
                    products.len(),
                    issues.len()
                );
                self.catalog = CatalogState::Loaded(Catalog { products, issues });
                Ok(())
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::error!("Failed to load catalog: {:#}", e);
                self.catalog = CatalogState::Failed(CATALOG_FALLBACK.to_string());
                self.services.notifier.error(CATALOG_FALLBACK);
                Err(WorkflowError::CatalogLoadFailed(CATALOG_FALLBACK.to_string()))
            }
        }
    }

    fn loaded_catalog(&self) -> Result<&Catalog, WorkflowError> {
        match &self.catalog {
            CatalogState::Loaded(catalog) => Ok(catalog),
            _ => Err(WorkflowError::CatalogNotLoaded),
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Select a product, clearing variant and issue selections.
    ///
    /// Returns the variant fetch to run when the product has variants.
    pub fn select_product(
        &mut self,
        product_id: &str,
    ) -> Result<Option<VariantRequest>, WorkflowError> {
        self.ensure_editable()?;

        if self.draft.product.as_ref().is_some_and(|p| p.id == product_id) {
            self.resume_editing();
            return Ok(None);
        }

        let product = self
            .loaded_catalog()?
            .product(product_id)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownProduct(product_id.to_string()))?;

        let has_variants = product.has_variants();
        self.draft.product = Some(product);
        self.draft.variant_id = None;
        self.draft.issue_ids.clear();
        self.errors.clear(FieldId::Product);
        self.errors.clear(FieldId::Variant);
        self.errors.clear(FieldId::Issue);

        // Any older request becomes stale from here on
        self.variant_token += 1;
        self.variants_loading = has_variants;
        self.resume_editing();

        Ok(has_variants.then(|| VariantRequest {
            token: self.variant_token,
            product_id: product_id.to_string(),
        }))
    }

    /// Apply a variant fetch result. Returns `false` when the response was
    /// stale and has been discarded.
    pub fn apply_variants(&mut self, response: VariantResponse) -> bool {
        let VariantResponse { request, result } = response;

        let current = self.draft.product.as_ref().map(|p| p.id.as_str());
        if request.token != self.variant_token || current != Some(request.product_id.as_str()) {
            tracing::debug!(
                "Discarding stale variant response for {} (token {}, latest {})",
                request.product_id,
                request.token,
                self.variant_token
            );
            return false;
        }

        self.variants_loading = false;
        match result {
            Ok(variants) => {
                if let Some(product) = self.draft.product.as_mut() {
                    product.variants = variants;
                    let still_offered = self
                        .draft
                        .variant_id
                        .as_deref()
                        .map(|id| product.variant(id).is_some())
                        .unwrap_or(true);
                    if !still_offered {
                        self.draft.variant_id = None;
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Failed to load variants for {}: {}", request.product_id, e);
                self.services.notifier.error(VARIANTS_FALLBACK);
            }
        }
        true
    }

    /// Select a product and wait for its variants
    pub async fn choose_product(&mut self, product_id: &str) -> Result<(), WorkflowError> {
        if let Some(request) = self.select_product(product_id)? {
            let source = Arc::clone(&self.services.catalog);
            let response = request.resolve(source.as_ref()).await;
            self.apply_variants(response);
        }
        Ok(())
    }

    pub fn select_variant(&mut self, variant_id: &str) -> Result<(), WorkflowError> {
        self.ensure_editable()?;

        let offered = self
            .draft
            .product
            .as_ref()
            .is_some_and(|p| p.variant(variant_id).is_some());
        if !offered {
            return Err(WorkflowError::UnknownVariant(variant_id.to_string()));
        }

        self.draft.variant_id = Some(variant_id.to_string());
        self.errors.clear(FieldId::Variant);
        self.resume_editing();
        Ok(())
    }

    /// Toggle an issue. With a single-issue policy, selecting replaces the
    /// current selection.
    pub fn toggle_issue(&mut self, issue_id: &str) -> Result<(), WorkflowError> {
        self.ensure_editable()?;

        if self.loaded_catalog()?.issue(issue_id).is_none() {
            return Err(WorkflowError::UnknownIssue(issue_id.to_string()));
        }

        let issues = &mut self.draft.issue_ids;
        if let Some(pos) = issues.iter().position(|id| id == issue_id) {
            issues.remove(pos);
        } else {
            if !self.policy.multiple_issues {
                issues.clear();
            }
            issues.push(issue_id.to_string());
        }
        self.errors.clear(FieldId::Issue);
        self.resume_editing();
        Ok(())
    }

    // =========================================================================
    // Field edits
    // =========================================================================

    pub fn apply_edit(&mut self, edit: FieldEdit) -> Result<(), WorkflowError> {
        self.ensure_editable()?;

        match edit {
            FieldEdit::CustomerName(name) => {
                self.draft.customer_name = name;
                self.errors.clear(FieldId::CustomerName);
            }
            FieldEdit::Email(email) => {
                self.draft.email = email;
                self.errors.clear(FieldId::Email);
            }
            FieldEdit::Location(location) => {
                self.draft.location = location;
                self.errors.clear(FieldId::Location);
            }
            FieldEdit::Anonymous(is_anonymous) => {
                self.draft.is_anonymous = is_anonymous;
                if is_anonymous {
                    self.errors.clear(FieldId::CustomerName);
                    self.errors.clear(FieldId::Email);
                }
            }
            FieldEdit::Rating(dimension, value) => {
                let value = self.policy.rating_scale.clamp(value);
                self.draft.ratings.set(dimension, value);
                self.errors.clear(dimension.field());
            }
            FieldEdit::Comments(text) => {
                self.draft.comments = match self.policy.max_comment_words {
                    Some(max) => truncate_words(&text, max).to_string(),
                    None => text,
                };
                self.errors.clear(FieldId::Comments);
            }
            FieldEdit::VisitDate(date) => {
                self.draft.visit_date = date;
            }
        }
        self.resume_editing();
        Ok(())
    }

    /// Discard the draft and start over
    pub fn reset(&mut self) -> Result<(), WorkflowError> {
        self.ensure_editable()?;
        self.draft = FeedbackDraft::new(self.policy.rating_scale);
        self.errors = ValidationErrors::new();
        self.variant_token += 1;
        self.variants_loading = false;
        self.resume_editing();
        Ok(())
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Validate the draft and, when it passes, send it to the feedback store
    pub async fn submit(&mut self) -> Result<SubmissionResult, WorkflowError> {
        match self.state {
            WorkflowState::Submitting | WorkflowState::Validating => {
                return Err(WorkflowError::SubmissionInProgress)
            }
            WorkflowState::Succeeded => return Err(WorkflowError::AlreadySubmitted),
            WorkflowState::Selecting | WorkflowState::Failed => {}
        }

        self.transition(WorkflowState::Validating);
        let record = self.draft.to_record(&self.policy);
        let errors = validate_feedback(&record, self.draft.product.as_ref(), &self.policy);
        if !errors.is_empty() {
            tracing::debug!("Feedback draft failed validation: {}", errors);
            self.errors = errors.clone();
            self.transition(WorkflowState::Selecting);
            self.services.notifier.error(VALIDATION_SUMMARY);
            return Err(WorkflowError::ValidationFailed(errors));
        }
        self.errors = ValidationErrors::new();

        self.transition(WorkflowState::Submitting);
        let store = Arc::clone(&self.services.store);
        match store.submit(record).await {
            Ok(result) if result.submitted && !result.id.is_empty() => {
                self.complete(&result);
                Ok(result)
            }
            Ok(result) if result.submitted => {
                tracing::error!("Feedback store accepted the submission without an id");
                Err(self.fail(SUBMISSION_FALLBACK.to_string()))
            }
            Ok(result) => {
                let message = if result.message.trim().is_empty() {
                    SUBMISSION_FALLBACK.to_string()
                } else {
                    format!("Failed to submit feedback: {}", result.message)
                };
                Err(self.fail(message))
            }
            Err(e) => {
                tracing::error!("Feedback submission failed: {:#}", e);
                Err(self.fail(SUBMISSION_FALLBACK.to_string()))
            }
        }
    }

    fn complete(&mut self, result: &SubmissionResult) {
        let name = self.draft.customer_name.trim();
        let customer_name = if self.draft.is_anonymous || name.is_empty() {
            self.policy.anonymous_name.clone()
        } else {
            name.to_string()
        };
        let email = if self.draft.is_anonymous {
            None
        } else {
            Some(self.draft.email.trim().to_string()).filter(|e| !e.is_empty())
        };
        let confirmation = ConfirmationState {
            customer_name,
            email,
            product_name: self.draft.product_name().unwrap_or_default().to_string(),
        };

        tracing::info!("Feedback {} submitted", result.id);
        self.transition(WorkflowState::Succeeded);
        self.services.notifier.success(SUBMITTED_MESSAGE);
        self.services.navigator.go_to(Route::ThankYou, confirmation);

        self.draft = FeedbackDraft::new(self.policy.rating_scale);
        self.errors = ValidationErrors::new();
    }

    fn fail(&mut self, message: String) -> WorkflowError {
        self.transition(WorkflowState::Failed);
        self.services.notifier.error(&message);
        WorkflowError::SubmissionFailed(message)
    }

    // =========================================================================
    // State handling
    // =========================================================================

    fn ensure_editable(&self) -> Result<(), WorkflowError> {
        match self.state {
            WorkflowState::Selecting | WorkflowState::Failed => Ok(()),
            WorkflowState::Validating | WorkflowState::Submitting => {
                Err(WorkflowError::SubmissionInProgress)
            }
            WorkflowState::Succeeded => Err(WorkflowError::AlreadySubmitted),
        }
    }

    /// An accepted edit after a failed submit resumes selection
    fn resume_editing(&mut self) {
        if self.state == WorkflowState::Failed {
            self.transition(WorkflowState::Selecting);
        }
    }

    fn transition(&mut self, next: WorkflowState) {
        tracing::debug!("Feedback workflow: {:?} -> {:?}", self.state, next);
        self.state = next;
        self.history.push(next);
    }
}

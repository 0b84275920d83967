//! Input validation module
//!
//! The same rule set runs in the feedback workflow before a submission is
//! sent and in the API handler when a record arrives.

mod words;

pub use words::{count_words, truncate_words};

use crate::models::{FeedbackRecord, Product};
use crate::workflow::{FormPolicy, IssuePolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

const MAX_TEXT_LEN: usize = 255;
const MAX_COMMENT_LEN: usize = 5000;

/// Form fields that can carry a validation message.
///
/// Declaration order is the order rules are evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    Product,
    Variant,
    Issue,
    CustomerName,
    Location,
    Email,
    StaffFriendliness,
    Cleanliness,
    ProductAvailability,
    OverallExperience,
    Comments,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select a product")]
    ProductRequired,

    #[error("Unknown product")]
    UnknownProduct,

    #[error("Please select a product variant")]
    VariantRequired,

    #[error("Please select at least one issue")]
    IssueRequired,

    #[error("Unknown issue: {id}")]
    UnknownIssue { id: String },

    #[error("Name is required")]
    NameRequired,

    #[error("Please select a store location")]
    LocationRequired,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Must be at most {max} characters")]
    TooLong { max: usize },

    #[error("Rating must be between 1 and {max}")]
    RatingOutOfRange { max: u8 },

    #[error("Comments must be at most {max} words")]
    TooManyWords { max: usize },
}

/// Field-keyed validation messages, ordered by rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<FieldId, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`; the first error per field wins
    pub fn add(&mut self, field: FieldId, error: ValidationError) {
        self.0.entry(field).or_insert_with(|| error.to_string());
    }

    pub fn clear(&mut self, field: FieldId) {
        self.0.remove(&field);
    }

    pub fn get(&self, field: FieldId) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FieldId) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.iter().map(|(_, message)| message).collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Validate a feedback record.
///
/// `product` is the catalog entry `record.product_id` resolves to, or `None`
/// when the id is missing or unknown. Every rule runs; errors are collected.
pub fn validate_feedback(
    record: &FeedbackRecord,
    product: Option<&Product>,
    policy: &FormPolicy,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    // Product
    let has_product_id = record
        .product_id
        .as_deref()
        .is_some_and(|id| !id.trim().is_empty());
    match product {
        Some(_) => {}
        None if has_product_id => errors.add(FieldId::Product, ValidationError::UnknownProduct),
        None => errors.add(FieldId::Product, ValidationError::ProductRequired),
    }

    // Variant
    let mut variant_satisfied = true;
    if let Some(product) = product {
        match record.product_variant_id.as_deref().filter(|v| !v.is_empty()) {
            Some(variant_id) if product.variant(variant_id).is_none() => {
                errors.add(FieldId::Variant, ValidationError::VariantRequired);
                variant_satisfied = false;
            }
            None if policy.require_variant && product.has_variants() => {
                errors.add(FieldId::Variant, ValidationError::VariantRequired);
                variant_satisfied = false;
            }
            _ => {}
        }
    }

    // Issues, only once product and variant are settled
    if policy.issues == IssuePolicy::Required
        && product.is_some()
        && variant_satisfied
        && record.issue_ids().is_empty()
    {
        errors.add(FieldId::Issue, ValidationError::IssueRequired);
    }

    // Customer name
    if !record.is_anonymous {
        match record.customer_name.as_deref().map(str::trim) {
            None | Some("") => errors.add(FieldId::CustomerName, ValidationError::NameRequired),
            Some(name) if name.len() > MAX_TEXT_LEN => errors.add(
                FieldId::CustomerName,
                ValidationError::TooLong { max: MAX_TEXT_LEN },
            ),
            Some(_) => {}
        }
    }

    // Location
    match record.location.as_deref().map(str::trim) {
        None | Some("") if policy.location_required => {
            errors.add(FieldId::Location, ValidationError::LocationRequired)
        }
        Some(location) if location.len() > MAX_TEXT_LEN => errors.add(
            FieldId::Location,
            ValidationError::TooLong { max: MAX_TEXT_LEN },
        ),
        _ => {}
    }

    // Email (optional but must be valid if provided)
    if !record.is_anonymous {
        if let Some(email) = record.email.as_deref().map(str::trim) {
            if email.len() > MAX_TEXT_LEN {
                errors.add(FieldId::Email, ValidationError::TooLong { max: MAX_TEXT_LEN });
            } else if !email.is_empty() && !is_valid_email(email) {
                errors.add(FieldId::Email, ValidationError::InvalidEmail);
            }
        }
    }

    // Ratings
    let scale = policy.rating_scale;
    let ratings = [
        (FieldId::StaffFriendliness, record.staff_friendliness),
        (FieldId::Cleanliness, record.cleanliness),
        (FieldId::ProductAvailability, record.product_availability),
        (FieldId::OverallExperience, record.overall_experience),
    ];
    for (field, value) in ratings {
        if !scale.contains(value) {
            errors.add(field, ValidationError::RatingOutOfRange { max: scale.max() });
        }
    }

    // Comments
    if let Some(comments) = record.comments.as_deref() {
        if comments.len() > MAX_COMMENT_LEN {
            errors.add(
                FieldId::Comments,
                ValidationError::TooLong {
                    max: MAX_COMMENT_LEN,
                },
            );
        } else if let Some(max) = policy.max_comment_words {
            if count_words(comments) > max {
                errors.add(FieldId::Comments, ValidationError::TooManyWords { max });
            }
        }
    }

    errors
}

/// Simple email validation
fn is_valid_email(email: &str) -> bool {
    // Basic check: contains @ and at least one .
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);

    !local.is_empty() && !domain.is_empty() && domain.contains('.') && domain.len() > 2
}

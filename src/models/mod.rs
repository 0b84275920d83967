//! Data models for the application

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Variant {
    pub id: String,
    pub product_id: String,
    pub name: String,
}

/// A product row without its variants
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub image_url: String,
    pub description: String,
    /// Ordered as the catalog lists them
    #[serde(default)]
    pub variants: Vec<Variant>,
}

impl Product {
    pub fn from_row(row: ProductRow, variants: Vec<Variant>) -> Self {
        Self {
            id: row.id,
            name: row.name,
            image_url: row.image_url,
            description: row.description,
            variants,
        }
    }

    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    pub fn variant(&self, variant_id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id == variant_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Issue {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct StoreLocation {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Feedback
// =============================================================================

/// Wire shape of one feedback submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub product_id: Option<String>,
    pub product_variant_id: Option<String>,
    pub staff_friendliness: u8,
    pub cleanliness: u8,
    pub product_availability: u8,
    pub overall_experience: u8,
    pub selected_issue_id: Option<String>,
    #[serde(default)]
    pub issues: Vec<String>,
    pub comments: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    pub date_of_visit: NaiveDate,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl FeedbackRecord {
    /// Trim text and id fields, turning blanks into `None`
    pub fn normalized(self) -> Self {
        Self {
            customer_name: trimmed(self.customer_name),
            email: trimmed(self.email),
            location: trimmed(self.location),
            product_id: trimmed(self.product_id),
            product_variant_id: trimmed(self.product_variant_id),
            selected_issue_id: trimmed(self.selected_issue_id),
            issues: self
                .issues
                .into_iter()
                .filter_map(|id| trimmed(Some(id)))
                .collect(),
            comments: trimmed(self.comments),
            ..self
        }
    }

    /// All issue ids referenced by the record, `selected_issue_id` first
    pub fn issue_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(self.issues.len() + 1);
        for id in self.selected_issue_id.iter().chain(self.issues.iter()) {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }
}

/// Outcome of a write attempt against the feedback store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub id: String,
    pub submitted: bool,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl SubmissionResult {
    pub fn accepted(id: Uuid) -> Self {
        Self {
            id: id.to_string(),
            submitted: true,
            timestamp: Utc::now(),
            message: "Feedback submitted successfully".to_string(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            submitted: false,
            timestamp: Utc::now(),
            message: message.into(),
        }
    }
}

/// Stored feedback joined with catalog names
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackRow {
    pub id: Uuid,
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub product_id: String,
    pub product_name: String,
    pub product_variant_id: Option<String>,
    pub variant_name: Option<String>,
    pub staff_friendliness: i16,
    pub cleanliness: i16,
    pub product_availability: i16,
    pub overall_experience: i16,
    pub selected_issue_id: Option<String>,
    pub comments: Option<String>,
    pub is_anonymous: bool,
    pub date_of_visit: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackEntry {
    #[serde(flatten)]
    pub feedback: FeedbackRow,
    pub issues: Vec<String>,
}

// =============================================================================
// Dashboard
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct RatingAverages {
    pub staff_friendliness: f64,
    pub cleanliness: f64,
    pub product_availability: f64,
    pub overall_experience: f64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LocationPerformance {
    pub location: String,
    pub responses: i64,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub averages: RatingAverages,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct IssueCount {
    pub issue_id: String,
    pub name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total_feedback: i64,
    pub anonymous_feedback: i64,
    pub average_ratings: RatingAverages,
    pub location_performance: Vec<LocationPerformance>,
    pub issue_distribution: Vec<IssueCount>,
}

// =============================================================================
// API Responses
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

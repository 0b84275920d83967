//! Admin dashboard handlers

use crate::db::FeedbackFilter;
use crate::models::*;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

use super::AppState;

// =============================================================================
// Query Parameters
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListFeedbackQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub location: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl ListFeedbackQuery {
    /// Page number and page size, clamped to sane bounds
    fn paging(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        (page, per_page)
    }

    fn filter(&self) -> FeedbackFilter {
        FeedbackFilter {
            location: self.location.clone(),
            search: self.search.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

// =============================================================================
// Feedback Listing
// =============================================================================

/// List feedback, newest first
pub async fn list_feedback(
    State(state): State<AppState>,
    Query(query): Query<ListFeedbackQuery>,
) -> impl IntoResponse {
    let (page, per_page) = query.paging();
    let offset = (page - 1) * per_page;

    match state.store.list(&query.filter(), per_page, offset).await {
        Ok((items, total)) => {
            let total_pages = (total + per_page - 1) / per_page;
            (
                StatusCode::OK,
                Json(ApiResponse::success(PaginatedResponse {
                    items,
                    total,
                    page,
                    per_page,
                    total_pages,
                })),
            )
        }
        Err(e) => {
            tracing::error!("Failed to list feedback: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to load feedback")),
            )
        }
    }
}

/// Aggregate ratings, locations and issues
pub async fn get_dashboard_stats(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.dashboard().await {
        Ok(stats) => (StatusCode::OK, Json(ApiResponse::success(stats))),
        Err(e) => {
            tracing::error!("Failed to compute dashboard stats: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("Failed to load dashboard")),
            )
        }
    }
}

// =============================================================================
// Export
// =============================================================================

#[derive(Debug, Serialize)]
pub struct FeedbackExport {
    pub exported_at: DateTime<Utc>,
    pub total: usize,
    pub feedback: Vec<FeedbackEntry>,
}

const CSV_HEADER: [&str; 16] = [
    "id",
    "created_at",
    "date_of_visit",
    "customer_name",
    "email",
    "location",
    "product",
    "variant",
    "staff_friendliness",
    "cleanliness",
    "product_availability",
    "overall_experience",
    "issues",
    "is_anonymous",
    "comments",
    "selected_issue_id",
];

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render entries as CSV, one row per feedback
pub fn to_csv(entries: &[FeedbackEntry]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');

    for entry in entries {
        let f = &entry.feedback;
        let customer_name = if f.is_anonymous {
            "Anonymous"
        } else {
            f.customer_name.as_deref().unwrap_or("")
        };
        let row = [
            f.id.to_string(),
            f.created_at.to_rfc3339(),
            f.date_of_visit.to_string(),
            customer_name.to_string(),
            f.email.clone().unwrap_or_default(),
            f.location.clone().unwrap_or_default(),
            f.product_name.clone(),
            f.variant_name.clone().unwrap_or_default(),
            f.staff_friendliness.to_string(),
            f.cleanliness.to_string(),
            f.product_availability.to_string(),
            f.overall_experience.to_string(),
            entry.issues.join(";"),
            f.is_anonymous.to_string(),
            f.comments.clone().unwrap_or_default(),
            f.selected_issue_id.clone().unwrap_or_default(),
        ];
        let line: Vec<String> = row.iter().map(|v| csv_field(v)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }

    out
}

/// Bundle an export as a ZIP holding `feedback.json` and `feedback.csv`
pub fn build_export_zip(export: &FeedbackExport) -> zip::result::ZipResult<Vec<u8>> {
    let json = serde_json::to_vec_pretty(export)
        .map_err(|e| zip::result::ZipError::Io(std::io::Error::other(e)))?;
    let csv = to_csv(&export.feedback);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    zip.start_file("feedback.json", options)?;
    zip.write_all(&json)?;
    zip.start_file("feedback.csv", options)?;
    zip.write_all(csv.as_bytes())?;

    Ok(zip.finish()?.into_inner())
}

/// Export all matching feedback as a ZIP download
pub async fn export_feedback(
    State(state): State<AppState>,
    Query(filter): Query<FeedbackFilter>,
) -> Response {
    let feedback = match state.store.all(&filter).await {
        Ok(feedback) => feedback,
        Err(e) => {
            tracing::error!("Failed to load feedback for export: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error("Failed to export feedback")),
            )
                .into_response();
        }
    };

    let export = FeedbackExport {
        exported_at: Utc::now(),
        total: feedback.len(),
        feedback,
    };

    match build_export_zip(&export) {
        Ok(zip_data) => {
            tracing::info!("Exported {} feedback entries", export.total);
            let filename = format!("feedback_{}.zip", export.exported_at.format("%Y%m%d_%H%M%S"));
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/zip".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", filename),
                    ),
                ],
                zip_data,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to build export archive: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error("Failed to export feedback")),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use uuid::Uuid;

    fn entry(name: Option<&str>, anonymous: bool, comments: Option<&str>) -> FeedbackEntry {
        FeedbackEntry {
            feedback: FeedbackRow {
                id: Uuid::nil(),
                customer_name: name.map(str::to_string),
                email: None,
                location: Some("Lagos - Lekki".to_string()),
                product_id: "indomie".to_string(),
                product_name: "Indomie Noodles".to_string(),
                product_variant_id: None,
                variant_name: None,
                staff_friendliness: 4,
                cleanliness: 5,
                product_availability: 3,
                overall_experience: 4,
                selected_issue_id: Some("texture".to_string()),
                comments: comments.map(str::to_string),
                is_anonymous: anonymous,
                date_of_visit: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                created_at: DateTime::parse_from_rfc3339("2024-05-02T10:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            },
            issues: vec!["texture".to_string(), "mold-spoilage".to_string()],
        }
    }

    #[test]
    fn test_paging_defaults_and_bounds() {
        assert_eq!(ListFeedbackQuery::default().paging(), (1, 20));
        let query = ListFeedbackQuery {
            page: Some(0),
            per_page: Some(1000),
            ..Default::default()
        };
        assert_eq!(query.paging(), (1, 100));
    }

    #[test]
    fn test_csv_escapes_special_characters() {
        let csv = to_csv(&[entry(Some("Ada"), false, Some("Soggy, \"old\"\nnoodles"))]);
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("id,created_at,date_of_visit"));
        let row = csv.split_once('\n').unwrap().1;
        assert!(row.contains("\"Soggy, \"\"old\"\"\nnoodles\""));
        assert!(row.contains("texture;mold-spoilage"));
        assert!(row.contains(",Ada,"));
    }

    #[test]
    fn test_csv_masks_anonymous_names() {
        let csv = to_csv(&[entry(Some("Hidden"), true, None)]);
        assert!(csv.contains(",Anonymous,"));
        assert!(!csv.contains("Hidden"));
    }

    #[test]
    fn test_export_zip_contains_json_and_csv() {
        let export = FeedbackExport {
            exported_at: Utc::now(),
            total: 1,
            feedback: vec![entry(Some("Ada"), false, Some("Great"))],
        };
        let bytes = build_export_zip(&export).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut json = String::new();
        archive
            .by_name("feedback.json")
            .unwrap()
            .read_to_string(&mut json)
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["total"], 1);
        assert_eq!(parsed["feedback"][0]["product_name"], "Indomie Noodles");

        let mut csv = String::new();
        archive
            .by_name("feedback.csv")
            .unwrap()
            .read_to_string(&mut csv)
            .unwrap();
        assert_eq!(csv.lines().count(), 2);
    }
}

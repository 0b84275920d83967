//! Feedback persistence and the aggregate queries behind the admin dashboard

use crate::models::*;
use crate::workflow::FeedbackStore;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

const FEEDBACK_COLUMNS: &str = r#"
    f.id, f.customer_name, f.email, f.location,
    f.product_id, p.name AS product_name,
    f.product_variant_id, v.name AS variant_name,
    f.staff_friendliness, f.cleanliness, f.product_availability, f.overall_experience,
    f.selected_issue_id, f.comments, f.is_anonymous, f.date_of_visit, f.created_at
"#;

const FEEDBACK_FILTER: &str = r#"
    FROM feedback f
    JOIN products p ON p.id = f.product_id
    LEFT JOIN product_variants v ON v.id = f.product_variant_id
    WHERE ($1::text IS NULL OR f.location = $1)
      AND ($2::text IS NULL OR f.customer_name ILIKE $2 OR f.comments ILIKE $2)
      AND ($3::date IS NULL OR f.date_of_visit >= $3)
      AND ($4::date IS NULL OR f.date_of_visit <= $4)
"#;

/// Admin list filters; every filter is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackFilter {
    pub location: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FeedbackFilter {
    fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)))
    }

    fn location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .filter(|l| !l.is_empty() && *l != "all")
    }
}

/// Match `%`, `_` and `\` literally under the default `\` LIKE escape
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Clone)]
pub struct PgFeedbackStore {
    pool: PgPool,
}

impl PgFeedbackStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one feedback row and its issue links
    pub async fn insert(&self, record: &FeedbackRecord) -> Result<Uuid, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO feedback (
                customer_name, email, location, product_id, product_variant_id,
                staff_friendliness, cleanliness, product_availability, overall_experience,
                selected_issue_id, comments, is_anonymous, date_of_visit
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            "#,
        )
        .bind(&record.customer_name)
        .bind(&record.email)
        .bind(&record.location)
        .bind(&record.product_id)
        .bind(&record.product_variant_id)
        .bind(i16::from(record.staff_friendliness))
        .bind(i16::from(record.cleanliness))
        .bind(i16::from(record.product_availability))
        .bind(i16::from(record.overall_experience))
        .bind(&record.selected_issue_id)
        .bind(&record.comments)
        .bind(record.is_anonymous)
        .bind(record.date_of_visit)
        .fetch_one(&mut *tx)
        .await?;

        for issue_id in record.issue_ids() {
            sqlx::query("INSERT INTO feedback_issues (feedback_id, issue_id) VALUES ($1, $2)")
                .bind(id)
                .bind(&issue_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    /// One page of feedback, newest first, plus the total matching count
    pub async fn list(
        &self,
        filter: &FeedbackFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<FeedbackEntry>, i64), sqlx::Error> {
        let search = filter.search_pattern();

        let rows = sqlx::query_as::<_, FeedbackRow>(&format!(
            "SELECT {} {} ORDER BY f.created_at DESC LIMIT $5 OFFSET $6",
            FEEDBACK_COLUMNS, FEEDBACK_FILTER
        ))
        .bind(filter.location())
        .bind(&search)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {}", FEEDBACK_FILTER))
            .bind(filter.location())
            .bind(&search)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_one(&self.pool)
            .await?;

        Ok((self.attach_issues(rows).await?, total))
    }

    /// Every matching row, for export
    pub async fn all(&self, filter: &FeedbackFilter) -> Result<Vec<FeedbackEntry>, sqlx::Error> {
        let rows = sqlx::query_as::<_, FeedbackRow>(&format!(
            "SELECT {} {} ORDER BY f.created_at DESC",
            FEEDBACK_COLUMNS, FEEDBACK_FILTER
        ))
        .bind(filter.location())
        .bind(filter.search_pattern())
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.pool)
        .await?;

        self.attach_issues(rows).await
    }

    async fn attach_issues(
        &self,
        rows: Vec<FeedbackRow>,
    ) -> Result<Vec<FeedbackEntry>, sqlx::Error> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let links = if ids.is_empty() {
            vec![]
        } else {
            sqlx::query_as::<_, (Uuid, String)>(
                "SELECT feedback_id, issue_id FROM feedback_issues WHERE feedback_id = ANY($1)",
            )
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?
        };

        let mut issues_by_feedback: HashMap<Uuid, Vec<String>> = HashMap::new();
        for (feedback_id, issue_id) in links {
            issues_by_feedback
                .entry(feedback_id)
                .or_default()
                .push(issue_id);
        }

        Ok(rows
            .into_iter()
            .map(|feedback| {
                let issues = issues_by_feedback.remove(&feedback.id).unwrap_or_default();
                FeedbackEntry { feedback, issues }
            })
            .collect())
    }

    pub async fn dashboard(&self) -> Result<DashboardStats, sqlx::Error> {
        let (total_feedback, anonymous_feedback): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_anonymous) FROM feedback",
        )
        .fetch_one(&self.pool)
        .await?;

        let average_ratings = sqlx::query_as::<_, RatingAverages>(
            r#"
            SELECT
                COALESCE(AVG(staff_friendliness), 0)::float8 AS staff_friendliness,
                COALESCE(AVG(cleanliness), 0)::float8 AS cleanliness,
                COALESCE(AVG(product_availability), 0)::float8 AS product_availability,
                COALESCE(AVG(overall_experience), 0)::float8 AS overall_experience
            FROM feedback
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let location_performance = sqlx::query_as::<_, LocationPerformance>(
            r#"
            SELECT
                COALESCE(location, 'Unspecified') AS location,
                COUNT(*) AS responses,
                AVG(staff_friendliness)::float8 AS staff_friendliness,
                AVG(cleanliness)::float8 AS cleanliness,
                AVG(product_availability)::float8 AS product_availability,
                AVG(overall_experience)::float8 AS overall_experience
            FROM feedback
            GROUP BY COALESCE(location, 'Unspecified')
            ORDER BY responses DESC, location
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let issue_distribution = sqlx::query_as::<_, IssueCount>(
            r#"
            SELECT i.id AS issue_id, i.name, COUNT(fi.feedback_id) AS count
            FROM issues i
            LEFT JOIN feedback_issues fi ON fi.issue_id = i.id
            GROUP BY i.id, i.name, i.sort_order
            ORDER BY i.sort_order, i.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(DashboardStats {
            total_feedback,
            anonymous_feedback,
            average_ratings,
            location_performance,
            issue_distribution,
        })
    }
}

#[async_trait]
impl FeedbackStore for PgFeedbackStore {
    async fn submit(&self, record: FeedbackRecord) -> anyhow::Result<SubmissionResult> {
        match self.insert(&record).await {
            Ok(id) => {
                tracing::info!(
                    "Stored feedback {} for product {}",
                    id,
                    record.product_id.as_deref().unwrap_or("-")
                );
                Ok(SubmissionResult::accepted(id))
            }
            Err(e) => {
                tracing::error!("Failed to store feedback: {}", e);
                Ok(SubmissionResult::rejected("Failed to store feedback"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_ignores_blank_values() {
        let filter = FeedbackFilter {
            location: Some("all".to_string()),
            search: Some("   ".to_string()),
            ..FeedbackFilter::default()
        };
        assert_eq!(filter.location(), None);
        assert_eq!(filter.search_pattern(), None);
    }

    #[test]
    fn test_search_wildcards_match_literally() {
        let filter = FeedbackFilter {
            search: Some("100%_off\\".to_string()),
            ..FeedbackFilter::default()
        };
        assert_eq!(
            filter.search_pattern().as_deref(),
            Some("%100\\%\\_off\\\\%")
        );
    }

    #[test]
    fn test_filter_builds_like_pattern() {
        let filter = FeedbackFilter {
            location: Some("Abuja - Wuse II".to_string()),
            search: Some(" stock ".to_string()),
            ..FeedbackFilter::default()
        };
        assert_eq!(filter.location(), Some("Abuja - Wuse II"));
        assert_eq!(filter.search_pattern().as_deref(), Some("%stock%"));
    }
}

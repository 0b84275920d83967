//! The in-progress feedback record

use super::policy::{FormPolicy, RatingScale};
use crate::models::{FeedbackRecord, Product};
use crate::validation::FieldId;
use chrono::{NaiveDate, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RatingDimension {
    StaffFriendliness,
    Cleanliness,
    ProductAvailability,
    OverallExperience,
}

impl RatingDimension {
    pub const ALL: [RatingDimension; 4] = [
        RatingDimension::StaffFriendliness,
        RatingDimension::Cleanliness,
        RatingDimension::ProductAvailability,
        RatingDimension::OverallExperience,
    ];

    pub fn field(self) -> FieldId {
        match self {
            RatingDimension::StaffFriendliness => FieldId::StaffFriendliness,
            RatingDimension::Cleanliness => FieldId::Cleanliness,
            RatingDimension::ProductAvailability => FieldId::ProductAvailability,
            RatingDimension::OverallExperience => FieldId::OverallExperience,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratings {
    pub staff_friendliness: u8,
    pub cleanliness: u8,
    pub product_availability: u8,
    pub overall_experience: u8,
}

impl Ratings {
    pub fn defaults(scale: RatingScale) -> Self {
        let value = scale.default_value();
        Self {
            staff_friendliness: value,
            cleanliness: value,
            product_availability: value,
            overall_experience: value,
        }
    }

    pub fn get(&self, dimension: RatingDimension) -> u8 {
        match dimension {
            RatingDimension::StaffFriendliness => self.staff_friendliness,
            RatingDimension::Cleanliness => self.cleanliness,
            RatingDimension::ProductAvailability => self.product_availability,
            RatingDimension::OverallExperience => self.overall_experience,
        }
    }

    pub fn set(&mut self, dimension: RatingDimension, value: u8) {
        let slot = match dimension {
            RatingDimension::StaffFriendliness => &mut self.staff_friendliness,
            RatingDimension::Cleanliness => &mut self.cleanliness,
            RatingDimension::ProductAvailability => &mut self.product_availability,
            RatingDimension::OverallExperience => &mut self.overall_experience,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackDraft {
    pub product: Option<Product>,
    pub variant_id: Option<String>,
    /// Selection order is kept
    pub issue_ids: Vec<String>,
    pub customer_name: String,
    pub email: String,
    pub location: String,
    pub ratings: Ratings,
    pub comments: String,
    pub is_anonymous: bool,
    pub visit_date: NaiveDate,
}

impl FeedbackDraft {
    /// Empty draft dated today
    pub fn new(scale: RatingScale) -> Self {
        Self::dated(scale, Utc::now().date_naive())
    }

    pub fn dated(scale: RatingScale, visit_date: NaiveDate) -> Self {
        Self {
            product: None,
            variant_id: None,
            issue_ids: Vec::new(),
            customer_name: String::new(),
            email: String::new(),
            location: String::new(),
            ratings: Ratings::defaults(scale),
            comments: String::new(),
            is_anonymous: false,
            visit_date,
        }
    }

    pub fn product_name(&self) -> Option<&str> {
        self.product.as_ref().map(|p| p.name.as_str())
    }

    /// Project the draft onto the wire record.
    ///
    /// Anonymous drafts carry no name or email. Blank text becomes `None`.
    pub fn to_record(&self, policy: &FormPolicy) -> FeedbackRecord {
        let (customer_name, email) = if self.is_anonymous {
            (None, None)
        } else {
            (non_blank(&self.customer_name), non_blank(&self.email))
        };

        let (selected_issue_id, issues) = if policy.multiple_issues {
            (None, self.issue_ids.clone())
        } else {
            (self.issue_ids.first().cloned(), Vec::new())
        };

        FeedbackRecord {
            customer_name,
            email,
            location: non_blank(&self.location),
            product_id: self.product.as_ref().map(|p| p.id.clone()),
            product_variant_id: self.variant_id.clone(),
            staff_friendliness: self.ratings.staff_friendliness,
            cleanliness: self.ratings.cleanliness,
            product_availability: self.ratings.product_availability,
            overall_experience: self.ratings.overall_experience,
            selected_issue_id,
            issues,
            comments: non_blank(&self.comments),
            is_anonymous: self.is_anonymous,
            date_of_visit: self.visit_date,
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        Product {
            id: "dano".to_string(),
            name: "Dano Milk".to_string(),
            image_url: String::new(),
            description: String::new(),
            variants: vec![],
        }
    }

    #[test]
    fn test_new_draft_has_default_ratings() {
        let draft = FeedbackDraft::new(RatingScale::TenPoint);
        for dimension in RatingDimension::ALL {
            assert_eq!(draft.ratings.get(dimension), 5);
        }
        assert!(draft.product.is_none());
        assert!(draft.issue_ids.is_empty());
    }

    #[test]
    fn test_anonymous_record_drops_identity() {
        let mut draft = FeedbackDraft::new(RatingScale::FiveStar);
        draft.product = Some(product());
        draft.customer_name = "Ngozi".to_string();
        draft.email = "ngozi@example.com".to_string();
        draft.is_anonymous = true;

        let record = draft.to_record(&FormPolicy::default());
        assert_eq!(record.customer_name, None);
        assert_eq!(record.email, None);
        assert!(record.is_anonymous);
        assert_eq!(record.product_id.as_deref(), Some("dano"));
    }

    #[test]
    fn test_single_issue_mode_uses_selected_issue_id() {
        let mut draft = FeedbackDraft::new(RatingScale::FiveStar);
        draft.issue_ids = vec!["mold-spoilage".to_string()];
        let policy = FormPolicy {
            multiple_issues: false,
            ..FormPolicy::default()
        };

        let record = draft.to_record(&policy);
        assert_eq!(record.selected_issue_id.as_deref(), Some("mold-spoilage"));
        assert!(record.issues.is_empty());

        let record = draft.to_record(&FormPolicy::default());
        assert_eq!(record.selected_issue_id, None);
        assert_eq!(record.issues, vec!["mold-spoilage"]);
    }

    #[test]
    fn test_blank_text_becomes_none() {
        let mut draft = FeedbackDraft::new(RatingScale::FiveStar);
        draft.customer_name = "  Tunde ".to_string();
        draft.location = "   ".to_string();
        let record = draft.to_record(&FormPolicy::default());
        assert_eq!(record.customer_name.as_deref(), Some("Tunde"));
        assert_eq!(record.location, None);
        assert_eq!(record.comments, None);
    }
}

//! Form policy: which optional fields and steps a deployment enables

use serde::{Deserialize, Serialize};

pub const DEFAULT_ANONYMOUS_NAME: &str = "Valued Customer";
pub const DEFAULT_MAX_COMMENT_WORDS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssuePolicy {
    Optional,
    /// At least one issue once product (and variant, when required) are chosen
    Required,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingScale {
    FiveStar,
    TenPoint,
}

impl RatingScale {
    pub fn max(self) -> u8 {
        match self {
            RatingScale::FiveStar => 5,
            RatingScale::TenPoint => 10,
        }
    }

    /// Mid-scale value every rating starts at
    pub fn default_value(self) -> u8 {
        match self {
            RatingScale::FiveStar => 3,
            RatingScale::TenPoint => 5,
        }
    }

    pub fn clamp(self, value: u8) -> u8 {
        value.clamp(1, self.max())
    }

    pub fn contains(self, value: u8) -> bool {
        (1..=self.max()).contains(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormPolicy {
    pub require_variant: bool,
    pub issues: IssuePolicy,
    pub multiple_issues: bool,
    pub location_required: bool,
    pub rating_scale: RatingScale,
    pub max_comment_words: Option<usize>,
    pub anonymous_name: String,
}

impl Default for FormPolicy {
    fn default() -> Self {
        Self {
            require_variant: true,
            issues: IssuePolicy::Required,
            multiple_issues: true,
            location_required: false,
            rating_scale: RatingScale::FiveStar,
            max_comment_words: Some(DEFAULT_MAX_COMMENT_WORDS),
            anonymous_name: DEFAULT_ANONYMOUS_NAME.to_string(),
        }
    }
}

impl FormPolicy {
    /// Product-only flow: variant and issues are optional
    pub fn simplified() -> Self {
        Self {
            require_variant: false,
            issues: IssuePolicy::Optional,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_defaults_are_mid_scale() {
        assert_eq!(RatingScale::FiveStar.default_value(), 3);
        assert_eq!(RatingScale::TenPoint.default_value(), 5);
    }

    #[test]
    fn test_rating_clamp() {
        assert_eq!(RatingScale::FiveStar.clamp(0), 1);
        assert_eq!(RatingScale::FiveStar.clamp(9), 5);
        assert_eq!(RatingScale::TenPoint.clamp(9), 9);
        assert!(!RatingScale::FiveStar.contains(6));
        assert!(RatingScale::TenPoint.contains(10));
    }

    #[test]
    fn test_simplified_policy() {
        let policy = FormPolicy::simplified();
        assert!(!policy.require_variant);
        assert_eq!(policy.issues, IssuePolicy::Optional);
        assert!(!policy.location_required);
        assert_eq!(policy.anonymous_name, "Valued Customer");
    }
}

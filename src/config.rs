//! Application configuration
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::workflow::{FormPolicy, IssuePolicy, RatingScale};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database connection URL
    pub database_url: String,
    /// Frontend assets directory
    pub frontend_dir: String,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// CORS allowed origins
    pub cors_origins: Vec<String>,
    /// Environment (development/production)
    pub environment: Environment,
    /// Trusted proxy IP prefixes (e.g., ["10.0.0.", "172.16."])
    /// Only trust X-Forwarded-For headers from these IPs
    pub trusted_proxies: Vec<String>,
    /// Feedback submissions allowed per IP per hour
    pub rate_limit_per_hour: i64,
    /// Which fields and steps the feedback form enforces
    pub form_policy: FormPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Production,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match var("ENVIRONMENT")
            .unwrap_or_else(|| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        };

        // DATABASE_URL, or assembled from DATABASE_SERVER_* components
        let database_url = match var("DATABASE_URL").or_else(|| var("DATABASE_SERVER_FULL")) {
            Some(url) => url,
            None => {
                let host = var("DATABASE_SERVER_HOST");
                let user = var("DATABASE_SERVER_USER");
                let password = var("DATABASE_PASSWORD");
                let db = var("DATABASE_DB");
                match (host, user, password, db) {
                    (Some(host), Some(user), Some(password), Some(db)) => {
                        let port =
                            var("DATABASE_SERVER_PORT").unwrap_or_else(|| "5432".to_string());
                        format!("postgres://{}:{}@{}:{}/{}", user, password, host, port, db)
                    }
                    _ => {
                        return Err(ConfigError::Missing(
                            "DATABASE_URL, DATABASE_SERVER_FULL, or DATABASE_SERVER_HOST + DATABASE_SERVER_USER + DATABASE_PASSWORD + DATABASE_DB is required".to_string(),
                        ))
                    }
                }
            }
        };

        Ok(Config {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&var, "PORT", 8080)?,
            database_url,
            frontend_dir: var("FRONTEND_DIR").unwrap_or_else(|| "./frontend".to_string()),
            max_body_size: parse_or(&var, "MAX_BODY_SIZE", 64 * 1024)?,
            cors_origins: var("CORS_ORIGINS")
                .map(|s| split_list(&s))
                .unwrap_or_else(|| vec!["http://localhost:8080".to_string()]),
            environment,
            trusted_proxies: var("TRUSTED_PROXIES")
                .map(|s| split_list(&s))
                .unwrap_or_default(),
            rate_limit_per_hour: parse_or(&var, "RATE_LIMIT_PER_HOUR", 20)?,
            form_policy: form_policy(&var)?,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Get the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn form_policy<F>(var: &F) -> Result<FormPolicy, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = FormPolicy::default();

    let issues = match var("FEEDBACK_ISSUE_POLICY").as_deref().map(str::trim) {
        None => defaults.issues,
        Some("optional") => IssuePolicy::Optional,
        Some("required") => IssuePolicy::Required,
        Some(other) => {
            return Err(ConfigError::Invalid(format!(
                "FEEDBACK_ISSUE_POLICY must be 'optional' or 'required', got '{}'",
                other
            )))
        }
    };

    let rating_scale = match var("FEEDBACK_RATING_SCALE").as_deref().map(str::trim) {
        None => defaults.rating_scale,
        Some("5") => RatingScale::FiveStar,
        Some("10") => RatingScale::TenPoint,
        Some(other) => {
            return Err(ConfigError::Invalid(format!(
                "FEEDBACK_RATING_SCALE must be 5 or 10, got '{}'",
                other
            )))
        }
    };

    // 0 disables the cap
    let max_comment_words = match var("FEEDBACK_MAX_COMMENT_WORDS") {
        None => defaults.max_comment_words,
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(0) => None,
            Ok(max) => Some(max),
            Err(_) => {
                return Err(ConfigError::Invalid(format!(
                    "FEEDBACK_MAX_COMMENT_WORDS must be a number, got '{}'",
                    raw
                )))
            }
        },
    };

    Ok(FormPolicy {
        require_variant: parse_bool(var, "FEEDBACK_REQUIRE_VARIANT", defaults.require_variant)?,
        issues,
        multiple_issues: parse_bool(var, "FEEDBACK_MULTIPLE_ISSUES", defaults.multiple_issues)?,
        location_required: parse_bool(
            var,
            "FEEDBACK_LOCATION_REQUIRED",
            defaults.location_required,
        )?,
        rating_scale,
        max_comment_words,
        anonymous_name: var("FEEDBACK_ANONYMOUS_NAME")
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(defaults.anonymous_name),
    })
}

fn parse_or<F, T>(var: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("{} has an invalid value '{}'", key, raw))),
    }
}

fn parse_bool<F>(var: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key).map(|v| v.trim().to_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::Invalid(format!(
            "{} must be true or false, got '{}'",
            key, other
        ))),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/feedback")]).unwrap();
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.rate_limit_per_hour, 20);
        assert_eq!(config.form_policy, FormPolicy::default());
        assert!(config.trusted_proxies.is_empty());
    }

    #[test]
    fn test_database_url_from_components() {
        let config = load(&[
            ("DATABASE_SERVER_HOST", "db"),
            ("DATABASE_SERVER_USER", "feedback"),
            ("DATABASE_PASSWORD", "secret"),
            ("DATABASE_DB", "portal"),
        ])
        .unwrap();
        assert_eq!(config.database_url, "postgres://feedback:secret@db:5432/portal");
    }

    #[test]
    fn test_missing_database_url() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_form_policy_from_env() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/feedback"),
            ("FEEDBACK_ISSUE_POLICY", "optional"),
            ("FEEDBACK_RATING_SCALE", "10"),
            ("FEEDBACK_LOCATION_REQUIRED", "yes"),
            ("FEEDBACK_MAX_COMMENT_WORDS", "0"),
            ("FEEDBACK_ANONYMOUS_NAME", "Dear Shopper"),
            ("TRUSTED_PROXIES", "10.0.0., 172.16.,"),
        ])
        .unwrap();
        let policy = config.form_policy;
        assert_eq!(policy.issues, IssuePolicy::Optional);
        assert_eq!(policy.rating_scale, RatingScale::TenPoint);
        assert!(policy.location_required);
        assert_eq!(policy.max_comment_words, None);
        assert_eq!(policy.anonymous_name, "Dear Shopper");
        assert_eq!(config.trusted_proxies, vec!["10.0.0.", "172.16."]);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let base = ("DATABASE_URL", "postgres://localhost/feedback");
        assert!(matches!(
            load(&[base, ("FEEDBACK_RATING_SCALE", "7")]),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            load(&[base, ("PORT", "eighty")]),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            load(&[base, ("FEEDBACK_REQUIRE_VARIANT", "maybe")]),
            Err(ConfigError::Invalid(_))
        ));
    }
}

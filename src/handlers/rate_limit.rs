//! Per-IP rate limiting for public write endpoints

use axum::http::HeaderMap;
use sqlx::PgPool;
use std::net::SocketAddr;

/// Rate limit bucket for feedback submissions
pub const FEEDBACK_ENDPOINT: &str = "submit_feedback";

/// Resolve the client IP.
///
/// Forwarding headers are only honored when the direct peer matches one of
/// the trusted proxy prefixes.
pub fn get_client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted_proxies: &[String],
) -> String {
    let peer_ip = peer.map(|addr| addr.ip().to_string());

    let from_trusted_proxy = peer_ip
        .as_deref()
        .is_some_and(|ip| trusted_proxies.iter().any(|prefix| ip.starts_with(prefix.as_str())));

    if from_trusted_proxy {
        // Check X-Forwarded-For first (for reverse proxy setups)
        if let Some(first_ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
        {
            return first_ip.to_string();
        }

        if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
            return real_ip.trim().to_string();
        }
    }

    peer_ip.unwrap_or_else(|| "unknown".to_string())
}

/// Record an attempt by `ip` on `endpoint`, then report whether it stays
/// within `max_per_hour`.
///
/// Counting after the insert means concurrent requests see each other.
pub async fn register_attempt(
    pool: &PgPool,
    ip: &str,
    endpoint: &str,
    max_per_hour: i64,
) -> bool {
    let result = sqlx::query(
        "INSERT INTO rate_limit_attempts (ip_address, endpoint) VALUES ($1, $2)",
    )
    .bind(ip)
    .bind(endpoint)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!("Failed to record rate limit attempt: {}", e);
    }

    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM rate_limit_attempts
        WHERE ip_address = $1 AND endpoint = $2
        AND attempted_at > NOW() - INTERVAL '1 hour'
        "#,
    )
    .bind(ip)
    .bind(endpoint)
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| {
        tracing::warn!("Rate limit lookup failed: {}", e);
        0
    });

    within_limit(count, max_per_hour)
}

/// `count` includes the attempt being judged
fn within_limit(count: i64, max_per_hour: i64) -> bool {
    count <= max_per_hour
}

/// Drop attempts older than a day
///
/// Called periodically from the maintenance task in main.rs.
pub async fn prune_attempts(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "DELETE FROM rate_limit_attempts WHERE attempted_at < NOW() - INTERVAL '1 day'",
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.2"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.8"));
        headers
    }

    #[test]
    fn test_forwarded_header_ignored_from_untrusted_peer() {
        let peer: SocketAddr = "198.51.100.4:5000".parse().unwrap();
        let ip = get_client_ip(&headers(), Some(peer), &["10.0.0.".to_string()]);
        assert_eq!(ip, "198.51.100.4");
    }

    #[test]
    fn test_forwarded_header_used_from_trusted_proxy() {
        let peer: SocketAddr = "10.0.0.5:5000".parse().unwrap();
        let ip = get_client_ip(&headers(), Some(peer), &["10.0.0.".to_string()]);
        assert_eq!(ip, "203.0.113.7");
    }

    #[test]
    fn test_real_ip_fallback() {
        let peer: SocketAddr = "10.0.0.5:5000".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("203.0.113.8"));
        let ip = get_client_ip(&headers, Some(peer), &["10.0.0.".to_string()]);
        assert_eq!(ip, "203.0.113.8");
    }

    #[test]
    fn test_limit_counts_current_attempt() {
        assert!(within_limit(1, 20));
        assert!(within_limit(20, 20));
        assert!(!within_limit(21, 20));
        assert!(!within_limit(1, 0));
    }

    #[test]
    fn test_unknown_without_peer() {
        assert_eq!(get_client_ip(&headers(), None, &[]), "unknown");
    }
}

//! Database connection pool

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Create a new database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    pool_options().connect(database_url).await
}

/// Pool that connects on first use
pub fn create_lazy_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    pool_options().connect_lazy(database_url)
}

fn pool_options() -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
}

/// Split SQL into statements, keeping $$ delimited blocks, quoted strings and
/// `--` comments intact
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_dollar_block = false;
    let mut in_quote = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);

        match c {
            '\'' if !in_dollar_block => in_quote = !in_quote,
            '-' if !in_quote && !in_dollar_block && chars.peek() == Some(&'-') => {
                // Line comment: nothing up to the newline is SQL
                for next in chars.by_ref() {
                    current.push(next);
                    if next == '\n' {
                        break;
                    }
                }
            }
            '$' if !in_quote && chars.peek() == Some(&'$') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_dollar_block = !in_dollar_block;
            }
            ';' if !in_quote && !in_dollar_block => {
                if has_sql_content(current.trim_end_matches(';')) {
                    statements.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
            _ => {}
        }
    }

    if has_sql_content(current.trim()) {
        statements.push(current);
    }

    statements
}

/// Check if a string has actual SQL content (not just comments)
fn has_sql_content(s: &str) -> bool {
    s.lines()
        .any(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with("--")
        })
}

/// Create the schema and seed the catalog
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    let migration_sql = include_str!("migrations/001_initial.sql");
    let statements = split_sql_statements(migration_sql);
    tracing::debug!("Applying {} migration statements", statements.len());

    for statement in statements {
        sqlx::query(&statement)
            .execute(pool)
            .await
            .map_err(|e| {
                tracing::warn!("Migration statement failed (possibly already applied): {}", e);
                e
            })
            .ok();
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keeps_quoted_semicolons() {
        let sql = "INSERT INTO issues (id, name) VALUES ('a', 'x; y');\nSELECT 1;";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("'x; y'"));
    }

    #[test]
    fn test_split_handles_escaped_quotes() {
        let sql = "INSERT INTO products (id, name) VALUES ('k', 'Kellogg''s; Cereals');";
        assert_eq!(split_sql_statements(sql).len(), 1);
    }

    #[test]
    fn test_split_skips_comment_only_chunks() {
        let sql = "-- header\n;\nCREATE TABLE t (id INT);\n-- trailing";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 1);
        assert!(statements[0].contains("CREATE TABLE"));
    }

    #[test]
    fn test_split_ignores_quotes_in_comments() {
        let sql = "-- don't split here\nCREATE TABLE a (id INT);\nCREATE TABLE b (id INT);";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[0].contains("CREATE TABLE a"));
        assert!(statements[1].contains("CREATE TABLE b"));
    }

    #[test]
    fn test_split_ignores_semicolons_in_comments() {
        let sql = "CREATE TABLE a (id INT); -- first; then b\nCREATE TABLE b (id INT);";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[1].contains("CREATE TABLE b"));
    }

    #[test]
    fn test_split_keeps_dollar_blocks() {
        let sql = "CREATE FUNCTION f() RETURNS INT AS $$ BEGIN RETURN 1; END; $$ LANGUAGE plpgsql;";
        assert_eq!(split_sql_statements(sql).len(), 1);
    }

    #[test]
    fn test_migration_file_splits() {
        let statements = split_sql_statements(include_str!("migrations/001_initial.sql"));
        assert!(statements.iter().any(|s| s.contains("CREATE TABLE IF NOT EXISTS feedback (")));
        assert!(statements.iter().any(|s| s.contains("INSERT INTO issues")));
    }
}

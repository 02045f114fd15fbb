//! Database layer for SQLite storage.
//!
//! This module handles all database operations including:
//! - Connection pool management with WAL mode
//! - Schema migrations
//! - SQLite implementations of the storage capabilities

pub mod pool;
mod pull_requests;
mod stats;
mod teams;
mod users;

pub use pull_requests::SqlitePullRequestStore;
pub use stats::SqliteStatsStore;
pub use teams::SqliteTeamStore;
pub use users::SqliteUserStore;

use std::path::Path;
use thiserror::Error;

/// Database-related errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Embedded migrations, applied in order.
const MIGRATIONS: &[(&str, &str)] = &[(
    "0001_initial_schema",
    include_str!("migrations/0001_initial_schema.sql"),
)];

/// Initialize the database: create the file if needed and run migrations.
///
/// # Arguments
/// * `db_path` - Path to the SQLite database file
///
/// # Returns
/// A connection pool configured with WAL mode
pub async fn initialize(db_path: &Path) -> Result<pool::DbPool, DbError> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            DbError::Migration(format!("Failed to create database directory: {}", e))
        })?;
    }

    let pool = pool::create_pool(db_path).await?;
    run_migrations(&pool).await?;

    log::info!("[db] SQLite database ready at {}", db_path.display());
    Ok(pool)
}

/// Open a private in-memory database with the schema applied.
pub async fn initialize_in_memory() -> Result<pool::DbPool, DbError> {
    let pool = pool::create_memory_pool().await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// Run all pending database migrations.
async fn run_migrations(pool: &pool::DbPool) -> Result<(), DbError> {
    // One connection for the whole run; the in-memory pool has no other
    let mut conn = pool.acquire().await?;

    // Bookkeeping table, one row per applied migration
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            applied_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    for &(name, migration_sql) in MIGRATIONS {
        let applied: Option<(i64,)> = sqlx::query_as("SELECT id FROM _migrations WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

        if applied.is_some() {
            log::debug!("[db] Migration {} already applied", name);
            continue;
        }

        for statement in parse_sql_statements(migration_sql) {
            sqlx::query(&statement)
                .execute(&mut *conn)
                .await
                .map_err(|e| DbError::Migration(format!("{}: {}", name, e)))?;
        }

        // Recorded only after every statement succeeded
        sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
            .bind(name)
            .execute(&mut *conn)
            .await?;

        log::info!("[db] Applied migration {}", name);
    }

    Ok(())
}

/// Split a migration file into executable statements.
///
/// Statements end at a `;` outside parentheses and string literals.
/// `--` comments are dropped, again only outside string literals.
fn parse_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut paren_depth: usize = 0;
    let mut in_string = false;

    for line in sql.lines() {
        let mut chars = line.chars().peekable();
        while let Some(ch) = chars.next() {
            if in_string {
                current.push(ch);
                // A doubled '' closes and immediately reopens the literal
                if ch == '\'' {
                    in_string = false;
                }
                continue;
            }

            match ch {
                '\'' => {
                    in_string = true;
                    current.push(ch);
                }
                // Rest of the line is a comment
                '-' if chars.peek() == Some(&'-') => break,
                '(' => {
                    paren_depth += 1;
                    current.push(ch);
                }
                ')' => {
                    paren_depth = paren_depth.saturating_sub(1);
                    current.push(ch);
                }
                ';' if paren_depth == 0 => finish_statement(&mut statements, &mut current),
                _ => current.push(ch),
            }
        }

        // Line breaks collapse to a single space
        if !current.is_empty() {
            current.push(' ');
        }
    }

    // Last statement may omit its semicolon
    finish_statement(&mut statements, &mut current);
    statements
}

fn finish_statement(statements: &mut Vec<String>, current: &mut String) {
    let statement = current.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
    current.clear();
}

//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for users, tags, questions and comments.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            avatar_url TEXT,
            role TEXT NOT NULL DEFAULT 'user',
            authority_tags TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            group_name TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // tags holds a JSON array of tag names.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS questions (
            id TEXT PRIMARY KEY,
            type INTEGER NOT NULL,
            difficulty INTEGER NOT NULL,
            tags TEXT NOT NULL DEFAULT '[]',
            detail TEXT NOT NULL,
            params TEXT,
            reference TEXT,
            name TEXT,
            priority INTEGER,
            score INTEGER NOT NULL DEFAULT 5,
            review_status INTEGER NOT NULL DEFAULT 0,
            review_message TEXT,
            review_time TEXT,
            publish_time TEXT,
            create_time TEXT NOT NULL,
            update_time TEXT NOT NULL,
            user_id TEXT NOT NULL,
            view_num INTEGER NOT NULL DEFAULT 0,
            comment_num INTEGER NOT NULL DEFAULT 0,
            favour_num INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id TEXT PRIMARY KEY,
            question_id TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            content TEXT NOT NULL,
            create_time TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_questions_review_status ON questions(review_status);
        CREATE INDEX IF NOT EXISTS idx_questions_create_time ON questions(create_time);
        CREATE INDEX IF NOT EXISTS idx_questions_user_id ON questions(user_id);
        CREATE INDEX IF NOT EXISTS idx_tags_group_name ON tags(group_name);
        CREATE INDEX IF NOT EXISTS idx_comments_question ON comments(question_id, create_time);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

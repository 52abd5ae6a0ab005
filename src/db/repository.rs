use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::models::DueDateRecord;

/// How many records the remote returns per page; the preload reads at most
/// one page's worth from the cache.
const FIRST_PAGE_SIZE: i64 = 20;

#[derive(Debug, Clone, FromRow)]
struct CachedDueDate {
    first_block_id: String,
    course_id: String,
    due_at: String,
    title: String,
    learner_has_access: bool,
    is_relative: bool,
    course_name: String,
    is_complete: bool,
}

impl CachedDueDate {
    /// A cached row whose stored date no longer parses is skipped on read.
    fn into_domain(self) -> Option<DueDateRecord> {
        let due_at = DateTime::parse_from_rfc3339(&self.due_at)
            .ok()?
            .with_timezone(&Utc);
        Some(DueDateRecord {
            course_id: self.course_id,
            first_block_id: self.first_block_id,
            due_at,
            title: self.title,
            learner_has_access: self.learner_has_access,
            is_relative: self.is_relative,
            course_name: self.course_name,
            is_complete: self.is_complete,
        })
    }
}

pub async fn init_schema(db: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS due_dates (
            first_block_id TEXT PRIMARY KEY,
            course_id TEXT NOT NULL,
            due_at TEXT NOT NULL,
            title TEXT NOT NULL,
            learner_has_access INTEGER NOT NULL DEFAULT 0,
            is_relative INTEGER NOT NULL DEFAULT 0,
            course_name TEXT NOT NULL,
            is_complete INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(db)
    .await?;
    Ok(())
}

pub async fn insert_cached_dates(
    db: &SqlitePool,
    records: &[DueDateRecord],
) -> Result<(), sqlx::Error> {
    for record in records {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO due_dates
                (first_block_id, course_id, due_at, title,
                learner_has_access, is_relative, course_name, is_complete)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&record.first_block_id)
        .bind(&record.course_id)
        .bind(record.due_at.to_rfc3339())
        .bind(&record.title)
        .bind(record.learner_has_access)
        .bind(record.is_relative)
        .bind(&record.course_name)
        .bind(record.is_complete)
        .execute(db)
        .await?;
    }
    Ok(())
}

pub async fn clear_cached_dates(db: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM due_dates").execute(db).await?;
    Ok(())
}

/// Full cached set, for the offline/error fallback.
pub async fn fetch_cached_dates(db: &SqlitePool) -> Result<Vec<DueDateRecord>, sqlx::Error> {
    let rows: Vec<CachedDueDate> = sqlx::query_as(
        r#"
        SELECT first_block_id, course_id, due_at, title,
               learner_has_access, is_relative, course_name, is_complete
        FROM due_dates
        ORDER BY due_at ASC
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().filter_map(CachedDueDate::into_domain).collect())
}

/// First page's worth of cached records, for the startup preload.
pub async fn fetch_first_page_cached(db: &SqlitePool) -> Result<Vec<DueDateRecord>, sqlx::Error> {
    let rows: Vec<CachedDueDate> = sqlx::query_as(
        r#"
        SELECT first_block_id, course_id, due_at, title,
               learner_has_access, is_relative, course_name, is_complete
        FROM due_dates
        ORDER BY due_at ASC
        LIMIT ?1
        "#,
    )
    .bind(FIRST_PAGE_SIZE)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().filter_map(CachedDueDate::into_domain).collect())
}

//! Video repository for database operations
//!
//! Every query is scoped to the owning user; a video that exists but
//! belongs to someone else is indistinguishable from a missing one.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::models::{NewVideo, Video};

const VIDEO_COLUMNS: &str = "id, title, description, public_id, original_size, compressed_size, \
                             duration, user_id, created_at, updated_at";

/// Storage for video metadata
#[async_trait]
pub trait VideoStore: Send + Sync {
    /// Insert a new video
    async fn create(&self, video: &NewVideo) -> Result<Video>;

    /// All videos of `user_id`, newest first
    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Video>>;

    /// A video if it exists and belongs to `user_id`
    async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Video>>;

    /// Delete a video owned by `user_id`; returns whether a row was removed
    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<bool>;
}

/// PostgreSQL-backed video repository
#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    /// Create a new video repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoStore for VideoRepository {
    async fn create(&self, video: &NewVideo) -> Result<Video> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO videos (title, description, public_id, original_size, compressed_size, duration, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.public_id)
        .bind(video.original_size)
        .bind(video.compressed_size)
        .bind(video.duration)
        .bind(video.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(video_from_row(&row))
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<Video>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {VIDEO_COLUMNS}
            FROM videos
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(video_from_row).collect())
    }

    async fn find_owned(&self, id: Uuid, user_id: Uuid) -> Result<Option<Video>> {
        let row = sqlx::query(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(video_from_row))
    }

    async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn video_from_row(row: &PgRow) -> Video {
    Video {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        public_id: row.get("public_id"),
        original_size: row.get("original_size"),
        compressed_size: row.get("compressed_size"),
        duration: row.get("duration"),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

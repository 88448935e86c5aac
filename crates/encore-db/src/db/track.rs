//! Catalog repository: CRUD for the tracks table.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use encore_core::models::{AudioMetadata, NewUploadRecord, UploadRecord, UploadStats};
use encore_core::IngestResult;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Record-store collaborator for uploaded tracks.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Insert a record; the store assigns `id` and `created_at`.
    async fn insert(&self, record: NewUploadRecord) -> IngestResult<UploadRecord>;

    async fn get_by_id(&self, id: Uuid) -> IngestResult<Option<UploadRecord>>;

    /// Delete a record. Returns `false` when no row matched.
    async fn delete(&self, id: Uuid) -> IngestResult<bool>;

    /// Newest first.
    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> IngestResult<Vec<UploadRecord>>;

    async fn stats_for_owner(&self, owner_id: Uuid) -> IngestResult<UploadStats>;
}

/// Row type for tracks table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct TrackRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub storage_url: String,
    pub file_size_bytes: i64,
    pub duration_seconds: f64,
    pub version_type: String,
    pub recording_date: Option<NaiveDate>,
    pub metadata: Option<Json<AudioMetadata>>,
    pub created_at: DateTime<Utc>,
}

impl TrackRow {
    pub fn into_record(self) -> UploadRecord {
        UploadRecord {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            storage_url: self.storage_url,
            file_size_bytes: self.file_size_bytes,
            duration_seconds: self.duration_seconds,
            // The column is constrained to known names.
            version_type: self.version_type.parse().unwrap_or_default(),
            recording_date: self.recording_date,
            metadata: self.metadata.map(|m| m.0),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TrackStatsRow {
    total_files: i64,
    total_size_bytes: i64,
    total_duration_seconds: f64,
}

const TRACK_COLUMNS: &str = "id, owner_id, title, storage_url, file_size_bytes, duration_seconds, \
     version_type, recording_date, metadata, created_at";

/// Repository for tracks table.
#[derive(Clone)]
pub struct TrackRepository {
    pool: PgPool,
}

impl TrackRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for TrackRepository {
    #[tracing::instrument(skip(self, record), fields(db.table = "tracks", owner_id = %record.owner_id))]
    async fn insert(&self, record: NewUploadRecord) -> IngestResult<UploadRecord> {
        let sql = format!(
            r#"
            INSERT INTO tracks (owner_id, title, storage_url, file_size_bytes, duration_seconds,
                                version_type, recording_date, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            TRACK_COLUMNS
        );
        let row: TrackRow = sqlx::query_as::<Postgres, TrackRow>(&sql)
            .bind(record.owner_id)
            .bind(&record.title)
            .bind(&record.storage_url)
            .bind(record.file_size_bytes)
            .bind(record.duration_seconds)
            .bind(record.version_type.as_str())
            .bind(record.recording_date)
            .bind(Json(&record.metadata))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into_record())
    }

    #[tracing::instrument(skip(self), fields(db.table = "tracks", db.record_id = %id))]
    async fn get_by_id(&self, id: Uuid) -> IngestResult<Option<UploadRecord>> {
        let sql = format!("SELECT {} FROM tracks WHERE id = $1", TRACK_COLUMNS);
        let row: Option<TrackRow> = sqlx::query_as::<Postgres, TrackRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(TrackRow::into_record))
    }

    #[tracing::instrument(skip(self), fields(db.table = "tracks", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> IngestResult<bool> {
        let result = sqlx::query("DELETE FROM tracks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), fields(db.table = "tracks", owner_id = %owner_id))]
    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> IngestResult<Vec<UploadRecord>> {
        let sql = format!(
            "SELECT {} FROM tracks WHERE owner_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            TRACK_COLUMNS
        );
        let rows: Vec<TrackRow> = sqlx::query_as::<Postgres, TrackRow>(&sql)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(TrackRow::into_record).collect())
    }

    #[tracing::instrument(skip(self), fields(db.table = "tracks", owner_id = %owner_id))]
    async fn stats_for_owner(&self, owner_id: Uuid) -> IngestResult<UploadStats> {
        let row: TrackStatsRow = sqlx::query_as::<Postgres, TrackStatsRow>(
            r#"
            SELECT
                COUNT(*)::BIGINT AS total_files,
                COALESCE(SUM(file_size_bytes), 0)::BIGINT AS total_size_bytes,
                COALESCE(SUM(duration_seconds), 0)::DOUBLE PRECISION AS total_duration_seconds
            FROM tracks
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UploadStats {
            total_files: row.total_files,
            total_size_bytes: row.total_size_bytes,
            total_duration_seconds: row.total_duration_seconds,
            estimated_compression_savings_bytes: 0,
        })
    }
}

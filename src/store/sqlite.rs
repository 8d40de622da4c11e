//! libsql (SQLite-compatible) implementation of [`VideoStore`].

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Builder, Connection, Row, Value, params, params::Params};
use tracing::debug;

use super::{FindMany, StoreError, StoreResult, VideoStore};
use crate::video::{NewVideo, VideoChanges, VideoRow, format_timestamp};

/// Column list shared by every SELECT/RETURNING so `row_to_video` can read
/// columns by index.
const VIDEO_COLUMNS: &str = "id, title, duration, thumbnail_url, views, tags, created_at";

async fn configure_connection(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;
        PRAGMA foreign_keys=ON;
        "#,
    )
    .await?;
    Ok(())
}

async fn ensure_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS videos (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            duration INTEGER NOT NULL,
            thumbnail_url TEXT NOT NULL,
            views INTEGER NOT NULL DEFAULT 0,
            tags TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_videos_created_at ON videos(created_at);
        CREATE INDEX IF NOT EXISTS idx_videos_duration ON videos(duration);
        CREATE INDEX IF NOT EXISTS idx_videos_title ON videos(title);
        CREATE INDEX IF NOT EXISTS idx_videos_views ON videos(views);
        "#,
    )
    .await?;
    Ok(())
}

/// Catalog store over a single libsql connection.
#[derive(Clone)]
pub struct CatalogStore {
    conn: Connection,
}

impl CatalogStore {
    /// Opens (and if necessary creates) the database file and ensures the
    /// `videos` table exists.
    pub async fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating catalog directory {}", parent.display()))?;
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .with_context(|| format!("opening catalog DB {}", path.display()))?;
        let conn = db.connect()?;
        configure_connection(&conn).await?;
        ensure_schema(&conn).await?;
        Ok(Self { conn })
    }

    /// Replaces the whole catalog with `rows`, keeping their ids and
    /// timestamps. Runs in one transaction so readers never see a half
    /// seeded table.
    pub async fn replace_all(&self, rows: &[VideoRow]) -> StoreResult<()> {
        let tx = self.conn.transaction().await?;
        tx.execute("DELETE FROM videos", params![]).await?;

        for row in rows {
            tx.execute(
                r#"
                INSERT INTO videos (id, title, duration, thumbnail_url, views, tags, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    row.id,
                    row.title.as_str(),
                    row.duration,
                    row.thumbnail_url.as_str(),
                    row.views,
                    row.tags.as_str(),
                    format_timestamp(&row.created_at),
                ],
            )
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn fetch_one(&self, sql: &str, values: Vec<Value>) -> StoreResult<Option<VideoRow>> {
        let mut rows = self.conn.query(sql, Params::Positional(values)).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_video(&row)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl VideoStore for CatalogStore {
    async fn create(&self, video: NewVideo) -> StoreResult<VideoRow> {
        let sql = format!(
            r#"
            INSERT INTO videos (title, duration, thumbnail_url, views, tags, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING {VIDEO_COLUMNS}
            "#
        );
        let values = vec![
            Value::Text(video.title),
            Value::Integer(video.duration),
            Value::Text(video.thumbnail_url),
            Value::Integer(video.views),
            Value::Text(video.tags),
            Value::Text(format_timestamp(&Utc::now())),
        ];
        self.fetch_one(&sql, values)
            .await?
            .ok_or_else(|| StoreError::CorruptRow("insert returned no row".to_string()))
    }

    async fn get(&self, id: i64) -> StoreResult<Option<VideoRow>> {
        let sql = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = ?1");
        self.fetch_one(&sql, vec![Value::Integer(id)]).await
    }

    async fn update(&self, id: i64, changes: VideoChanges) -> StoreResult<VideoRow> {
        if changes.is_empty() {
            return self.get(id).await?.ok_or(StoreError::NotFound(id));
        }

        let mut assignments = Vec::new();
        let mut values = Vec::new();
        if let Some(title) = changes.title {
            assignments.push("title = ?");
            values.push(Value::Text(title));
        }
        if let Some(duration) = changes.duration {
            assignments.push("duration = ?");
            values.push(Value::Integer(duration));
        }
        if let Some(thumbnail_url) = changes.thumbnail_url {
            assignments.push("thumbnail_url = ?");
            values.push(Value::Text(thumbnail_url));
        }
        if let Some(views) = changes.views {
            assignments.push("views = ?");
            values.push(Value::Integer(views));
        }
        if let Some(tags) = changes.tags {
            assignments.push("tags = ?");
            values.push(Value::Text(tags));
        }
        values.push(Value::Integer(id));

        let sql = format!(
            "UPDATE videos SET {} WHERE id = ? RETURNING {VIDEO_COLUMNS}",
            assignments.join(", ")
        );
        self.fetch_one(&sql, values)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let affected = self
            .conn
            .execute("DELETE FROM videos WHERE id = ?1", params![id])
            .await?;
        if affected == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn find_many(&self, request: &FindMany) -> StoreResult<Vec<VideoRow>> {
        let predicate = request.filter.to_sql();
        let order_by = request.sort.order_by_sql();
        let mut values = Vec::with_capacity(predicate.params.len() + 2);

        // The anchor is looked up by id over the whole table, so an anchor
        // that no longer matches the filter still marks where to resume. A
        // missing anchor leaves the join empty.
        let sql = match request.cursor {
            Some(cursor) => {
                values.push(Value::Integer(cursor.id()));
                format!(
                    r#"
                    WITH anchor AS (
                        SELECT {key} AS sort_key, id AS anchor_id
                        FROM videos
                        WHERE id = ?
                    )
                    SELECT {VIDEO_COLUMNS}
                    FROM videos, anchor
                    WHERE ({predicate}) AND {after}
                    ORDER BY {order_by}
                    LIMIT ?
                    "#,
                    key = request.sort.field.column(),
                    predicate = predicate.sql,
                    after = request.sort.after_anchor_sql(),
                )
            }
            None => format!(
                r#"
                SELECT {VIDEO_COLUMNS}
                FROM videos
                WHERE {predicate}
                ORDER BY {order_by}
                LIMIT ?
                "#,
                predicate = predicate.sql,
            ),
        };
        values.extend(predicate.params);
        values.push(Value::Integer(
            i64::try_from(request.limit).unwrap_or(i64::MAX),
        ));
        debug!(
            order_by = %order_by,
            limit = request.limit,
            cursor = ?request.cursor,
            "querying videos"
        );

        let mut rows = self.conn.query(&sql, Params::Positional(values)).await?;
        let mut videos = Vec::new();
        while let Some(row) = rows.next().await? {
            videos.push(row_to_video(&row)?);
        }
        Ok(videos)
    }
}

/// Converts a SQL row into a `VideoRow`. Column order follows `VIDEO_COLUMNS`.
fn row_to_video(row: &Row) -> StoreResult<VideoRow> {
    let created_at_raw: String = row.get(6)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|err| StoreError::CorruptRow(format!("created_at {created_at_raw:?}: {err}")))?;

    Ok(VideoRow {
        id: row.get(0)?,
        title: row.get(1)?,
        duration: row.get(2)?,
        thumbnail_url: row.get(3)?,
        views: row.get(4)?,
        tags: row.get(5)?,
        created_at,
    })
}

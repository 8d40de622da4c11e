#![forbid(unsafe_code)]

//! Replaces the catalog contents with the videos listed in a JSON file.
//!
//! The file holds `{"videos": [...]}` where every entry carries a string id
//! of the form `v-<number>`; the number becomes the stored id.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use clap::Parser;
use newtube_catalog::{
    CatalogStore, CreateVideo, VideoRow,
    config::{RuntimeOverrides, resolve_runtime_settings},
};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "seed", about = "Load the video catalog from a JSON file")]
struct Cli {
    /// JSON file with a top-level `videos` array
    #[arg(long, default_value = "videos.json")]
    file: PathBuf,
    /// Database path; falls back to CATALOG_DB, then catalog.db
    #[arg(long)]
    database: Option<PathBuf>,
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    videos: Vec<SeedVideo>,
}

#[derive(Debug, Deserialize)]
struct SeedVideo {
    id: String,
    title: String,
    thumbnail_url: String,
    created_at: String,
    duration: i64,
    views: i64,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Extracts the numeric part of a `v-<number>` id.
fn parse_seed_id(raw: &str) -> Result<i64> {
    raw.strip_prefix("v-")
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|digits| digits.parse::<i64>().ok())
        .ok_or_else(|| anyhow!("Invalid id: {raw}."))
}

impl SeedVideo {
    /// Applies the same field rules as `POST /videos`.
    fn into_row(self) -> Result<VideoRow> {
        let id = parse_seed_id(&self.id)?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .with_context(|| format!("video {}: invalid created_at {}", self.id, self.created_at))?
            .with_timezone(&Utc);
        let video = CreateVideo {
            title: self.title,
            duration: self.duration,
            thumbnail_url: self.thumbnail_url,
            views: self.views,
            tags: self.tags,
        }
        .validate()
        .map_err(|issues| anyhow!("video {}: {}", self.id, issues.join("; ")))?;

        Ok(VideoRow {
            id,
            title: video.title,
            duration: video.duration,
            thumbnail_url: video.thumbnail_url,
            views: video.views,
            tags: video.tags,
            created_at,
        })
    }
}

fn parse_seed_file(contents: &str) -> Result<Vec<VideoRow>> {
    let file: SeedFile = serde_json::from_str(contents).context("parsing seed file")?;
    file.videos.into_iter().map(SeedVideo::into_row).collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings = resolve_runtime_settings(RuntimeOverrides {
        database_path: cli.database,
        env_path: Some(cli.env_file),
        ..RuntimeOverrides::default()
    })?;

    let contents = fs::read_to_string(&cli.file)
        .with_context(|| format!("reading {}", cli.file.display()))?;
    let rows = parse_seed_file(&contents)?;

    let store = CatalogStore::open(&settings.database_path)
        .await
        .context("initializing catalog store")?;
    store
        .replace_all(&rows)
        .await
        .context("replacing catalog contents")?;

    info!(
        database = %settings.database_path.display(),
        "Successfully seeded {} videos",
        rows.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use newtube_catalog::{ListingQuery, list_videos};
    use tempfile::tempdir;

    const SAMPLE: &str = r#"{
        "videos": [
            {
                "id": "v-1",
                "title": "Intro to Rust",
                "thumbnail_url": "/thumbs/1.jpg",
                "created_at": "2024-01-15T10:30:00.000Z",
                "duration": 600,
                "views": 1500,
                "tags": ["rust", "beginner"]
            },
            {
                "id": "v-42",
                "title": "No Tags",
                "thumbnail_url": "/thumbs/42.jpg",
                "created_at": "2024-02-01T08:00:00+02:00",
                "duration": 30,
                "views": 0
            }
        ]
    }"#;

    #[test]
    fn parses_ids_tags_and_timestamps() {
        let rows = parse_seed_file(SAMPLE).unwrap();
        assert_eq!(rows.len(), 2);

        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[0].tags, "rust,beginner");
        assert_eq!(
            rows[0].created_at,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
        );

        assert_eq!(rows[1].id, 42);
        assert_eq!(rows[1].tags, "");
        assert_eq!(
            rows[1].created_at,
            Utc.with_ymd_and_hms(2024, 2, 1, 6, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in ["1", "v-", "v-abc", "video-3", "v--1"] {
            let err = parse_seed_id(raw).unwrap_err();
            assert!(err.to_string().contains(raw), "{raw}: {err}");
        }
        assert_eq!(parse_seed_id("v-007").unwrap(), 7);
    }

    #[test]
    fn bad_timestamp_names_the_video() {
        let contents = r#"{"videos": [{
            "id": "v-3", "title": "t", "thumbnail_url": "/t.jpg",
            "created_at": "yesterday", "duration": 1, "views": 0
        }]}"#;
        let err = parse_seed_file(contents).unwrap_err();
        assert!(err.to_string().contains("v-3"));
    }

    #[test]
    fn invalid_fields_are_rejected_with_the_video_id() {
        let contents = r#"{"videos": [{
            "id": "v-8", "title": "Tags", "thumbnail_url": "/t.jpg",
            "created_at": "2024-01-01T00:00:00Z", "duration": 10, "views": 0,
            "tags": ["a,b", ""]
        }]}"#;
        let err = parse_seed_file(contents).unwrap_err().to_string();
        assert!(err.contains("v-8"), "{err}");
        assert!(err.contains("tags.0 must not contain \",\""), "{err}");
        assert!(err.contains("tags.1 must not be empty"), "{err}");

        let contents = r#"{"videos": [{
            "id": "v-9", "title": "", "thumbnail_url": "/t.jpg",
            "created_at": "2024-01-01T00:00:00Z", "duration": 0, "views": -1
        }]}"#;
        let err = parse_seed_file(contents).unwrap_err().to_string();
        assert!(err.contains("v-9"), "{err}");
        assert!(err.contains("title must not be empty"), "{err}");
        assert!(err.contains("duration must be at least 1"), "{err}");
        assert!(err.contains("views must not be negative"), "{err}");
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["seed"]);
        assert_eq!(cli.file, PathBuf::from("videos.json"));
        assert!(cli.database.is_none());

        let cli = Cli::parse_from(["seed", "--file", "data.json", "--database", "/tmp/c.db"]);
        assert_eq!(cli.file, PathBuf::from("data.json"));
        assert_eq!(cli.database, Some(PathBuf::from("/tmp/c.db")));
    }

    #[tokio::test]
    async fn seeding_replaces_existing_rows() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::open(&dir.path().join("catalog.db"))
            .await
            .unwrap();

        let rows = parse_seed_file(SAMPLE).unwrap();
        store.replace_all(&rows).await.unwrap();
        store.replace_all(&rows[..1]).await.unwrap();

        let page = list_videos(&store, &ListingQuery::default()).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, 1);
        assert_eq!(page.items[0].tags, vec!["rust", "beginner"]);
        assert_eq!(page.items[0].created_at, "2024-01-15T10:30:00.000Z");
    }
}

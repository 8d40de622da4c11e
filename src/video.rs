//! Video records in their stored and public shapes.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::tags::{TAG_DELIMITER, decode_tags, encode_tags};

/// Row of the `videos` table. Tags stay in their encoded column form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRow {
    pub id: i64,
    pub title: String,
    pub duration: i64,
    pub thumbnail_url: String,
    pub views: i64,
    pub tags: String,
    pub created_at: DateTime<Utc>,
}

/// Video as exposed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: i64,
    pub title: String,
    pub duration: i64,
    pub thumbnail_url: String,
    pub views: i64,
    pub tags: Vec<String>,
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub created_at: String,
}

impl From<VideoRow> for Video {
    fn from(row: VideoRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            duration: row.duration,
            thumbnail_url: row.thumbnail_url,
            views: row.views,
            tags: decode_tags(Some(&row.tags)),
            created_at: format_timestamp(&row.created_at),
        }
    }
}

/// Timestamp format shared by the stored column and the public shape.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fields the store needs to insert a video. The store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVideo {
    pub title: String,
    pub duration: i64,
    pub thumbnail_url: String,
    pub views: i64,
    pub tags: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoChanges {
    pub title: Option<String>,
    pub duration: Option<i64>,
    pub thumbnail_url: Option<String>,
    pub views: Option<i64>,
    pub tags: Option<String>,
}

impl VideoChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.duration.is_none()
            && self.thumbnail_url.is_none()
            && self.views.is_none()
            && self.tags.is_none()
    }
}

/// Request body for `POST /videos`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVideo {
    pub title: String,
    pub duration: i64,
    pub thumbnail_url: String,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Request body for `PUT /videos/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub duration: Option<i64>,
    pub thumbnail_url: Option<String>,
    pub views: Option<i64>,
    pub tags: Option<Vec<String>>,
}

impl CreateVideo {
    /// Checks every field and returns all problems found, or the insert
    /// payload with tags already encoded.
    pub fn validate(self) -> Result<NewVideo, Vec<String>> {
        let mut issues = Vec::new();
        check_title(&self.title, &mut issues);
        check_duration(self.duration, &mut issues);
        check_thumbnail_url(&self.thumbnail_url, &mut issues);
        check_views(self.views, &mut issues);
        if let Some(tags) = &self.tags {
            check_tags(tags, &mut issues);
        }
        if !issues.is_empty() {
            return Err(issues);
        }

        Ok(NewVideo {
            tags: encode_tags(self.tags.as_deref()),
            title: self.title,
            duration: self.duration,
            thumbnail_url: self.thumbnail_url,
            views: self.views,
        })
    }
}

impl UpdateVideo {
    pub fn validate(self) -> Result<VideoChanges, Vec<String>> {
        let mut issues = Vec::new();
        if let Some(title) = &self.title {
            check_title(title, &mut issues);
        }
        if let Some(duration) = self.duration {
            check_duration(duration, &mut issues);
        }
        if let Some(thumbnail_url) = &self.thumbnail_url {
            check_thumbnail_url(thumbnail_url, &mut issues);
        }
        if let Some(views) = self.views {
            check_views(views, &mut issues);
        }
        if let Some(tags) = &self.tags {
            check_tags(tags, &mut issues);
        }
        if !issues.is_empty() {
            return Err(issues);
        }

        Ok(VideoChanges {
            tags: self.tags.as_deref().map(|tags| encode_tags(Some(tags))),
            title: self.title,
            duration: self.duration,
            thumbnail_url: self.thumbnail_url,
            views: self.views,
        })
    }
}

fn check_title(title: &str, issues: &mut Vec<String>) {
    if title.is_empty() {
        issues.push("title must not be empty".to_string());
    }
}

fn check_duration(duration: i64, issues: &mut Vec<String>) {
    if duration < 1 {
        issues.push("duration must be at least 1".to_string());
    }
}

fn check_thumbnail_url(thumbnail_url: &str, issues: &mut Vec<String>) {
    if thumbnail_url.is_empty() {
        issues.push("thumbnail_url must not be empty".to_string());
    }
}

fn check_views(views: i64, issues: &mut Vec<String>) {
    if views < 0 {
        issues.push("views must not be negative".to_string());
    }
}

fn check_tags(tags: &[String], issues: &mut Vec<String>) {
    for (index, tag) in tags.iter().enumerate() {
        if tag.is_empty() {
            issues.push(format!("tags.{index} must not be empty"));
        } else if tag.contains(TAG_DELIMITER) {
            issues.push(format!("tags.{index} must not contain {TAG_DELIMITER:?}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_row() -> VideoRow {
        VideoRow {
            id: 7,
            title: "Intro to Rust".into(),
            duration: 600,
            thumbnail_url: "https://cdn.example/7.jpg".into(),
            views: 12,
            tags: "rust,beginner".into(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap(),
        }
    }

    #[test]
    fn public_shape_decodes_tags_and_formats_timestamp() {
        let video = Video::from(sample_row());
        assert_eq!(video.tags, vec!["rust", "beginner"]);
        assert_eq!(video.created_at, "2024-03-05T08:30:00.000Z");
        assert_eq!(video.id, 7);
    }

    #[test]
    fn public_shape_with_no_tags_is_empty_list() {
        let mut row = sample_row();
        row.tags = String::new();
        assert!(Video::from(row).tags.is_empty());
    }

    #[test]
    fn create_defaults_views_and_tags() {
        let payload: CreateVideo = serde_json::from_value(serde_json::json!({
            "title": "Clip",
            "duration": 30,
            "thumbnail_url": "/t.jpg"
        }))
        .unwrap();
        let new_video = payload.validate().unwrap();
        assert_eq!(new_video.views, 0);
        assert_eq!(new_video.tags, "");
    }

    #[test]
    fn create_encodes_tags() {
        let payload = CreateVideo {
            title: "Clip".into(),
            duration: 30,
            thumbnail_url: "/t.jpg".into(),
            views: 3,
            tags: Some(vec!["a".into(), "b".into()]),
        };
        assert_eq!(payload.validate().unwrap().tags, "a,b");
    }

    #[test]
    fn create_reports_every_invalid_field() {
        let payload = CreateVideo {
            title: String::new(),
            duration: 0,
            thumbnail_url: String::new(),
            views: -1,
            tags: Some(vec!["ok".into(), "".into(), "x,y".into()]),
        };
        let issues = payload.validate().unwrap_err();
        assert_eq!(
            issues,
            vec![
                "title must not be empty",
                "duration must be at least 1",
                "thumbnail_url must not be empty",
                "views must not be negative",
                "tags.1 must not be empty",
                "tags.2 must not contain \",\"",
            ]
        );
    }

    #[test]
    fn update_only_sets_supplied_fields() {
        let changes = UpdateVideo {
            title: Some("New".into()),
            tags: Some(vec!["updated".into(), "test".into()]),
            ..UpdateVideo::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.title.as_deref(), Some("New"));
        assert_eq!(changes.tags.as_deref(), Some("updated,test"));
        assert!(changes.duration.is_none());
        assert!(!changes.is_empty());
        assert!(VideoChanges::default().is_empty());
    }

    #[test]
    fn update_can_clear_tags() {
        let changes = UpdateVideo {
            tags: Some(Vec::new()),
            ..UpdateVideo::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.tags.as_deref(), Some(""));
    }

    #[test]
    fn update_rejects_invalid_values() {
        let issues = UpdateVideo {
            duration: Some(-5),
            ..UpdateVideo::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(issues, vec!["duration must be at least 1"]);
    }
}

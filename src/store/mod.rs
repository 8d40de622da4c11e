//! Persistence boundary for the catalog.

pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::filter::VideoFilter;
use crate::query::Cursor;
use crate::sort::SortSpec;
use crate::video::{NewVideo, VideoChanges, VideoRow};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("video {0} not found")]
    NotFound(i64),
    #[error("database error: {0}")]
    Database(#[from] libsql::Error),
    #[error("corrupt video row: {0}")]
    CorruptRow(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One page request against the store.
///
/// When `cursor` is set, the anchor is the video with that id, whether or not
/// it still matches `filter`, and only matching rows after it in the current
/// ordering are returned. A cursor naming a video that does not exist yields
/// an empty result.
#[derive(Debug, Clone, Default)]
pub struct FindMany {
    pub filter: VideoFilter,
    pub sort: SortSpec,
    pub limit: usize,
    pub cursor: Option<Cursor>,
}

#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn create(&self, video: NewVideo) -> StoreResult<VideoRow>;

    async fn get(&self, id: i64) -> StoreResult<Option<VideoRow>>;

    /// Fails with [`StoreError::NotFound`] when `id` does not exist.
    async fn update(&self, id: i64, changes: VideoChanges) -> StoreResult<VideoRow>;

    /// Fails with [`StoreError::NotFound`] when `id` does not exist.
    async fn delete(&self, id: i64) -> StoreResult<()>;

    async fn find_many(&self, request: &FindMany) -> StoreResult<Vec<VideoRow>>;
}

//! Entry point the HTTP layer calls to list videos.

use crate::pagination::{Page, paginate};
use crate::query::ListingQuery;
use crate::store::{StoreResult, VideoStore};
use crate::video::Video;

/// Lists one page of videos in their public shape. Read-only: the store
/// sees exactly one `find_many` call per invocation.
pub async fn list_videos<S>(store: &S, query: &ListingQuery) -> StoreResult<Page<Video>>
where
    S: VideoStore + ?Sized,
{
    let page = paginate(store, query).await?;
    Ok(page.map(Video::from))
}

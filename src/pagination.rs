//! Cursor pagination over a [`VideoStore`].

use tracing::debug;

use crate::filter::VideoFilter;
use crate::query::{Cursor, ListingQuery};
use crate::store::{FindMany, StoreResult, VideoStore};
use crate::video::VideoRow;

/// One page of results plus the token for the following page, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_page_token: self.next_page_token,
        }
    }
}

/// Runs one listing query against `store`.
///
/// Asks for one row more than `query.limit`; when that lookahead row comes
/// back, a next page exists and the token is the id of the last row that is
/// actually returned. Store errors are passed through untouched.
pub async fn paginate<S>(store: &S, query: &ListingQuery) -> StoreResult<Page<VideoRow>>
where
    S: VideoStore + ?Sized,
{
    let request = FindMany {
        filter: VideoFilter::build(query.search.as_deref(), query.tags.as_deref()),
        sort: query.sort,
        limit: query.limit + 1,
        cursor: query.next_page_token,
    };

    let mut items = store.find_many(&request).await?;
    let next_page_token = if items.len() > query.limit {
        items.truncate(query.limit);
        items.last().map(|row| Cursor(row.id))
    } else {
        None
    };

    debug!(
        returned = items.len(),
        next_page_token = ?next_page_token,
        "paginated videos"
    );
    Ok(Page {
        items,
        next_page_token,
    })
}

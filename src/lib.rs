#![forbid(unsafe_code)]

//! Video catalog for NewTube.
//!
//! The library owns the listing engine (filtering, sorting and cursor
//! pagination), the tag codec and the libsql-backed store. The binaries in
//! `src/bin` only add HTTP and seeding glue on top.

pub mod config;
pub mod filter;
pub mod listing;
pub mod pagination;
pub mod query;
pub mod sort;
pub mod store;
pub mod tags;
pub mod video;

pub use listing::list_videos;
pub use pagination::{Page, paginate};
pub use query::{Cursor, ListingParams, ListingQuery};
pub use store::{FindMany, StoreError, VideoStore, sqlite::CatalogStore};
pub use video::{CreateVideo, UpdateVideo, Video, VideoRow};

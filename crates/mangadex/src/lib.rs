//! MangaDex API client for exporting an account's library.
//!
//! This library provides session handling (login, refresh, token
//! persistence), typed access to the library endpoints and the chunking
//! helpers used to stay under the API's request size limits.

pub mod api;
pub mod chunk;
pub mod error;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use api::types::{ChapterData, ChapterNumber, MangaData, RatingEntry, Ratings};
pub use api::{
    ApiRequest, ApiSettings, Credentials, HttpTransport, MangadexClient, Method, Session,
    SessionSettings, Transport,
};
pub use chunk::id_chunks;
pub use error::ApiError;

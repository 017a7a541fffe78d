//! Rating statistics for a MangaDex library.
//!
//! Ratings are grouped by reading status and summarised per status and over
//! the whole library.

pub mod reporter;
pub mod summary;

pub use reporter::{collect_ratings, BucketRatings, StatsReport};
pub use summary::{significant, RatingSummary};

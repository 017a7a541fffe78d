//! Gathering ratings per status bucket.

use crate::summary::RatingSummary;
use anyhow::{Context, Result};
use mangadex::{MangadexClient, Transport};
use std::fmt;
use tracing::{debug, info};

/// Ratings of every rated manga in one status bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketRatings {
    pub status: String,
    pub ratings: Vec<i64>,
}

/// Ratings for the whole library, buckets in server order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsReport {
    pub buckets: Vec<BucketRatings>,
}

impl StatsReport {
    /// Every rating across all buckets
    pub fn all_ratings(&self) -> Vec<i64> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.ratings.iter().copied())
            .collect()
    }
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bucket in &self.buckets {
            writeln!(f, "{}:", bucket.status)?;
            writeln!(f, "{}", RatingSummary::render(&bucket.ratings))?;
            writeln!(f)?;
        }
        writeln!(f, "All")?;
        write!(f, "{}", RatingSummary::render(&self.all_ratings()))
    }
}

/// Fetch the account's ratings grouped by reading status
pub async fn collect_ratings<T: Transport>(client: &mut MangadexClient<T>) -> Result<StatsReport> {
    let buckets = client
        .status_buckets()
        .await
        .context("Failed to fetch library statuses")?;

    let mut report = StatsReport::default();
    for (status, manga_ids) in buckets {
        let mut ratings = Vec::new();
        for chunk in client.chunks(&manga_ids) {
            let batch = client
                .ratings(chunk)
                .await
                .with_context(|| format!("Failed to fetch ratings for \"{status}\""))?;
            if batch.is_empty() {
                debug!(status = %status, ids = chunk.len(), "No ratings in chunk");
            }
            ratings.extend(batch.values());
        }

        info!(
            status = %status,
            manga = manga_ids.len(),
            rated = ratings.len(),
            "Collected ratings"
        );
        report.buckets.push(BucketRatings { status, ratings });
    }

    Ok(report)
}

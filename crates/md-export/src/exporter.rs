//! Export orchestrator.
//!
//! Walks the library bucket by bucket and chunk by chunk, builds one record
//! per manga and hands it to the [`ExportStore`] as soon as it is complete.

use crate::chapters::{resolve_last_chapter, ChapterResolution};
use crate::store::ExportStore;
use crate::titles::select_title;
use anyhow::{Context, Result};
use mangadex::{ApiError, MangadexClient, Transport};
use shared::MangaRecord;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Something the export could not decide on its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportWarning {
    /// Several read markers, none of which maps to a numbered chapter
    AmbiguousReadMarkers { manga_id: String, read_markers: usize },
}

impl std::fmt::Display for ExportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportWarning::AmbiguousReadMarkers {
                manga_id,
                read_markers,
            } => write!(
                f,
                "{manga_id} has {read_markers} read markers without chapter numbers"
            ),
        }
    }
}

/// Outcome of one export run
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    /// Records added during this run
    pub records_written: usize,
    /// Records in the export file after the run, earlier runs included
    pub total_records: usize,
    /// Status buckets processed
    pub buckets: usize,
    pub warnings: Vec<ExportWarning>,
}

/// Library exporter
pub struct Exporter<T: Transport> {
    client: MangadexClient<T>,
    store: ExportStore,
}

impl<T: Transport> Exporter<T> {
    pub fn new(client: MangadexClient<T>, store: ExportStore) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &ExportStore {
        &self.store
    }

    /// Export every manga in the library
    ///
    /// Any API or file error aborts the run; records written before the
    /// failure stay in the export file.
    pub async fn run(&mut self) -> Result<ExportReport> {
        info!(
            path = %self.store.path().display(),
            existing = self.store.len(),
            "Starting export"
        );

        let mut report = ExportReport::default();
        let buckets = self
            .client
            .status_buckets()
            .await
            .context("Failed to fetch library statuses")?;

        for (status, manga_ids) in &buckets {
            info!(status = %status, manga = manga_ids.len(), "Exporting status bucket");
            for chunk in self.client.chunks(manga_ids) {
                self.export_chunk(status, chunk, &mut report)
                    .await
                    .with_context(|| format!("Failed to export \"{status}\" manga"))?;
            }
            report.buckets += 1;
        }

        report.total_records = self.store.len();
        info!(
            buckets = report.buckets,
            records_written = report.records_written,
            total_records = report.total_records,
            warnings = report.warnings.len(),
            "Export complete"
        );

        Ok(report)
    }

    async fn export_chunk(
        &mut self,
        status: &str,
        manga_ids: &[String],
        report: &mut ExportReport,
    ) -> Result<()> {
        let ratings = self.client.ratings(manga_ids).await?;
        let manga = self.client.manga(manga_ids).await?;
        let read_markers = self.client.read_markers(manga_ids).await?;

        for manga_id in manga_ids {
            debug!(manga_id = %manga_id, "Exporting manga");

            let data = manga.get(manga_id).ok_or_else(|| ApiError::MissingField {
                endpoint: "manga".to_string(),
                what: format!("metadata for {manga_id}"),
            })?;
            let markers = read_markers
                .get(manga_id)
                .map(Vec::as_slice)
                .unwrap_or_default();

            let resolution = if markers.is_empty() {
                ChapterResolution::Unread
            } else {
                let feed = self.client.chapter_feed(manga_id).await?;
                resolve_last_chapter(markers, &feed)
            };
            if let ChapterResolution::Ambiguous { read_markers } = resolution {
                let warning = ExportWarning::AmbiguousReadMarkers {
                    manga_id: manga_id.clone(),
                    read_markers,
                };
                warn!(manga_id = %manga_id, read_markers, "{warning}");
                report.warnings.push(warning);
            }

            let record = MangaRecord {
                id: manga_id.clone(),
                title: select_title(&data.attributes.title),
                rating: ratings.get(manga_id),
                last_chapter: resolution.last_chapter(),
                status: status.to_string(),
            };
            info!(%record, "Exported manga");

            self.store.append(record)?;
            report.records_written += 1;
        }

        Ok(())
    }
}

/// Count records per status, for the end-of-run summary
pub fn records_by_status(records: &[MangaRecord]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for record in records {
        *counts.entry(record.status.as_str()).or_insert(0) += 1;
    }
    counts
}

//! Typed access to the MangaDex library endpoints.

use super::session::{Session, SessionSettings};
use super::transport::{HttpTransport, Transport};
use super::types::*;
use crate::chunk::id_chunks;
use crate::error::ApiError;
use indexmap::IndexMap;
use shared::Config;
use std::collections::HashMap;
use tracing::{debug, info};

/// Request shaping settings
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Maximum ids per batch request
    pub chunk_size: usize,
    /// Page size for chapter feeds
    pub feed_page_size: usize,
    pub content_ratings: Vec<String>,
    pub translated_languages: Vec<String>,
}

impl ApiSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_size: config.api.chunk_size,
            feed_page_size: config.api.feed_page_size,
            content_ratings: config.api.content_ratings.clone(),
            translated_languages: config.api.translated_languages.clone(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// MangaDex client for one authenticated account
pub struct MangadexClient<T: Transport> {
    session: Session<T>,
    settings: ApiSettings,
}

impl MangadexClient<HttpTransport> {
    /// Build the HTTP transport and authenticate from configuration
    pub async fn connect(config: &Config) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(
            &config.api.base_url,
            std::time::Duration::from_secs(config.api.timeout_secs),
            &config.api.user_agent,
        )?;
        let session = Session::obtain(transport, SessionSettings::from_config(config)).await?;
        info!(base_url = %config.api.base_url, "Authenticated with MangaDex");
        Ok(Self::new(session, ApiSettings::from_config(config)))
    }
}

impl<T: Transport> MangadexClient<T> {
    pub fn new(session: Session<T>, settings: ApiSettings) -> Self {
        Self { session, settings }
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    /// Split ids into batches sized for this client's requests
    pub fn chunks<'a>(&self, ids: &'a [String]) -> std::slice::Chunks<'a, String> {
        id_chunks(ids, self.settings.chunk_size)
    }

    /// Reading status of every manga in the account's library
    pub async fn statuses(&mut self) -> Result<IndexMap<String, String>, ApiError> {
        const ENDPOINT: &str = "manga/status";
        info!("Fetching library statuses");
        let value = self.session.get(ENDPOINT, Vec::new()).await?;
        let response: StatusesResponse = ApiError::decode(ENDPOINT, value)?;
        Ok(response.statuses)
    }

    /// Library grouped by status, buckets in order of first appearance
    pub async fn status_buckets(&mut self) -> Result<IndexMap<String, Vec<String>>, ApiError> {
        let statuses = self.statuses().await?;
        let buckets = group_by_status(statuses);
        info!(
            buckets = buckets.len(),
            manga = buckets.values().map(Vec::len).sum::<usize>(),
            "Grouped library by status"
        );
        Ok(buckets)
    }

    /// Ratings for one batch of manga ids
    pub async fn ratings(&mut self, ids: &[String]) -> Result<Ratings, ApiError> {
        const ENDPOINT: &str = "rating";
        debug!(ids = ids.len(), "Fetching ratings");
        let query = repeated("manga[]", ids);
        let value = self.session.get(ENDPOINT, query).await?;
        let response: RatingsResponse = ApiError::decode(ENDPOINT, value)?;
        Ok(response.ratings)
    }

    /// Metadata for one batch of manga ids, keyed by id
    pub async fn manga(&mut self, ids: &[String]) -> Result<HashMap<String, MangaData>, ApiError> {
        const ENDPOINT: &str = "manga";
        debug!(ids = ids.len(), "Fetching manga metadata");
        let mut query = repeated("ids[]", ids);
        query.extend(repeated("contentRating[]", &self.settings.content_ratings));
        query.push(("limit".to_string(), ids.len().max(1).to_string()));

        let value = self.session.get(ENDPOINT, query).await?;
        let response: MangaListResponse = ApiError::decode(ENDPOINT, value)?;
        Ok(response
            .data
            .into_iter()
            .map(|manga| (manga.id.clone(), manga))
            .collect())
    }

    /// Read chapter ids for one batch of manga ids, keyed by manga id
    pub async fn read_markers(
        &mut self,
        ids: &[String],
    ) -> Result<IndexMap<String, Vec<String>>, ApiError> {
        const ENDPOINT: &str = "manga/read";
        debug!(ids = ids.len(), "Fetching read markers");
        let mut query = repeated("ids[]", ids);
        query.push(("grouped".to_string(), "true".to_string()));

        let value = self.session.get(ENDPOINT, query).await?;
        let response: ReadMarkersResponse = ApiError::decode(ENDPOINT, value)?;
        Ok(response.data)
    }

    /// Whole chapter feed of one manga, keyed by chapter id
    ///
    /// Pages are requested until the reported total is covered. Chapters seen
    /// on more than one page keep their last version.
    pub async fn chapter_feed(
        &mut self,
        manga_id: &str,
    ) -> Result<HashMap<String, ChapterData>, ApiError> {
        let endpoint = format!("manga/{manga_id}/feed");
        let page_size = self.settings.feed_page_size.max(1);
        let mut feed = HashMap::new();
        let mut offset = 0;

        loop {
            let mut query = repeated("contentRating[]", &self.settings.content_ratings);
            query.extend(repeated(
                "translatedLanguage[]",
                &self.settings.translated_languages,
            ));
            query.push(("limit".to_string(), page_size.to_string()));
            query.push(("offset".to_string(), offset.to_string()));

            let value = self.session.get(&endpoint, query).await?;
            let page: ChapterFeedResponse = ApiError::decode(&endpoint, value)?;
            debug!(
                manga_id = manga_id,
                offset = offset,
                chapters = page.data.len(),
                total = page.total,
                "Fetched chapter feed page"
            );

            feed.extend(page.data.into_iter().map(|chapter| (chapter.id.clone(), chapter)));

            if page.total <= offset + page_size {
                break;
            }
            offset += page_size;
        }

        Ok(feed)
    }
}

/// Invert an id → status map into status → ids, keeping first-seen order
pub fn group_by_status(statuses: IndexMap<String, String>) -> IndexMap<String, Vec<String>> {
    let mut buckets: IndexMap<String, Vec<String>> = IndexMap::new();
    for (manga_id, status) in statuses {
        buckets.entry(status).or_default().push(manga_id);
    }
    buckets
}

fn repeated(key: &str, values: &[String]) -> Vec<(String, String)> {
    values
        .iter()
        .map(|value| (key.to_string(), value.clone()))
        .collect()
}

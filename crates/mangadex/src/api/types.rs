//! MangaDex API response types.
//!
//! These types represent the JSON responses from the MangaDex API. Only the
//! fields the tools read are modelled; everything else is ignored.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;

/// Body of `/auth/login` and `/auth/refresh`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub result: String,
    #[serde(default)]
    pub token: Option<TokenPair>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub session: String,
    pub refresh: String,
}

/// Body of `/manga/status`
#[derive(Debug, Clone, Deserialize)]
pub struct StatusesResponse {
    /// Manga id to reading status, in server order
    #[serde(deserialize_with = "map_or_empty")]
    pub statuses: IndexMap<String, String>,
}

/// Body of `/rating`
#[derive(Debug, Clone, Deserialize)]
pub struct RatingsResponse {
    pub ratings: Ratings,
}

/// Ratings for one batch of manga ids
///
/// The API encodes "no ratings for any requested id" as an empty JSON array
/// instead of an empty object, so the two shapes are decoded explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawRatings")]
pub enum Ratings {
    NoRatings,
    RatingsById(HashMap<String, RatingEntry>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RatingEntry {
    pub rating: i64,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRatings {
    ById(HashMap<String, RatingEntry>),
    Sequence(Vec<serde_json::Value>),
}

impl TryFrom<RawRatings> for Ratings {
    type Error = String;

    fn try_from(raw: RawRatings) -> Result<Self, Self::Error> {
        match raw {
            RawRatings::ById(map) => Ok(Ratings::RatingsById(map)),
            RawRatings::Sequence(items) if items.is_empty() => Ok(Ratings::NoRatings),
            RawRatings::Sequence(items) => Err(format!(
                "expected a rating map or an empty array, got an array of {} items",
                items.len()
            )),
        }
    }
}

impl Ratings {
    /// Rating for a single manga, `None` when it is unrated
    pub fn get(&self, manga_id: &str) -> Option<i64> {
        match self {
            Ratings::NoRatings => None,
            Ratings::RatingsById(map) => map.get(manga_id).map(|entry| entry.rating),
        }
    }

    /// All ratings in the batch
    pub fn values(&self) -> Vec<i64> {
        match self {
            Ratings::NoRatings => Vec::new(),
            Ratings::RatingsById(map) => map.values().map(|entry| entry.rating).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Ratings::NoRatings => true,
            Ratings::RatingsById(map) => map.is_empty(),
        }
    }
}

/// Body of `/manga`
#[derive(Debug, Clone, Deserialize)]
pub struct MangaListResponse {
    pub data: Vec<MangaData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MangaData {
    pub id: String,
    pub attributes: MangaAttributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MangaAttributes {
    /// Localized titles keyed by language code, in server order
    #[serde(deserialize_with = "map_or_empty")]
    pub title: IndexMap<String, String>,
}

/// Body of `/manga/read?grouped=true`
#[derive(Debug, Clone, Deserialize)]
pub struct ReadMarkersResponse {
    /// Manga id to the ids of its read chapters
    #[serde(deserialize_with = "map_or_empty")]
    pub data: IndexMap<String, Vec<String>>,
}

/// Body of `/manga/{id}/feed`
#[derive(Debug, Clone, Deserialize)]
pub struct ChapterFeedResponse {
    pub data: Vec<ChapterData>,
    pub total: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChapterData {
    pub id: String,
    pub attributes: ChapterAttributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChapterAttributes {
    #[serde(default)]
    pub chapter: Option<ChapterNumber>,
}

/// Chapter number as sent by the API, usually a decimal string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ChapterNumber {
    Number(f64),
    Text(String),
}

impl ChapterNumber {
    /// Whole chapter number, truncating any fractional part
    ///
    /// Returns `None` for text that is not a finite number.
    pub fn truncated(&self) -> Option<i64> {
        let value = match self {
            ChapterNumber::Number(value) => *value,
            ChapterNumber::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then(|| value.trunc() as i64)
    }
}

/// Accept either a JSON object or the empty-array placeholder the API uses
/// for empty objects.
fn map_or_empty<'de, D, V>(deserializer: D) -> Result<IndexMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MapOrSeq<V> {
        Map(IndexMap<String, V>),
        Seq(Vec<serde_json::Value>),
    }

    match MapOrSeq::deserialize(deserializer)? {
        MapOrSeq::Map(map) => Ok(map),
        MapOrSeq::Seq(items) if items.is_empty() => Ok(IndexMap::new()),
        MapOrSeq::Seq(_) => Err(serde::de::Error::custom(
            "expected an object or an empty array",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_ratings_sentinel() {
        let response: RatingsResponse =
            serde_json::from_value(json!({"result": "ok", "ratings": []})).unwrap();
        assert_eq!(response.ratings, Ratings::NoRatings);
        assert!(response.ratings.values().is_empty());
        assert_eq!(response.ratings.get("m1"), None);
    }

    #[test]
    fn test_ratings_by_id() {
        let response: RatingsResponse = serde_json::from_value(json!({
            "result": "ok",
            "ratings": {"m1": {"rating": 7, "createdAt": "2023-01-01T00:00:00+00:00"}}
        }))
        .unwrap();
        assert_eq!(response.ratings.get("m1"), Some(7));
        assert_eq!(response.ratings.get("m2"), None);
        assert_eq!(response.ratings.values(), vec![7]);
    }

    #[test]
    fn test_non_empty_rating_array_is_rejected() {
        let result: Result<RatingsResponse, _> =
            serde_json::from_value(json!({"ratings": [{"rating": 3}]}));
        assert!(result.is_err());
    }

    #[test]
    fn test_read_markers_accept_empty_array() {
        let response: ReadMarkersResponse =
            serde_json::from_value(json!({"result": "ok", "data": []})).unwrap();
        assert!(response.data.is_empty());

        let response: ReadMarkersResponse =
            serde_json::from_value(json!({"data": {"m1": ["c1", "c2"]}})).unwrap();
        assert_eq!(response.data["m1"], vec!["c1", "c2"]);
    }

    #[test]
    fn test_statuses_keep_server_order() {
        let response: StatusesResponse = serde_json::from_value(json!({
            "statuses": {"z": "reading", "a": "completed", "m": "reading"}
        }))
        .unwrap();
        let keys: Vec<&str> = response.statuses.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_chapter_number_truncation() {
        assert_eq!(ChapterNumber::Text("3.0".into()).truncated(), Some(3));
        assert_eq!(ChapterNumber::Text("12.5".into()).truncated(), Some(12));
        assert_eq!(ChapterNumber::Text(" 7 ".into()).truncated(), Some(7));
        assert_eq!(ChapterNumber::Number(4.9).truncated(), Some(4));
        assert_eq!(ChapterNumber::Text("Extra".into()).truncated(), None);
        assert_eq!(ChapterNumber::Text("".into()).truncated(), None);
        assert_eq!(ChapterNumber::Text("nan".into()).truncated(), None);
    }

    #[test]
    fn test_chapter_null_number() {
        let chapter: ChapterData = serde_json::from_value(json!({
            "id": "c1",
            "type": "chapter",
            "attributes": {"chapter": null, "volume": null}
        }))
        .unwrap();
        assert_eq!(chapter.attributes.chapter, None);
    }
}

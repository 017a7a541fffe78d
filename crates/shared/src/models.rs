//! Data models shared by the export and stats tools.

use serde::{Deserialize, Serialize};

/// One exported manga from the account's library
///
/// Field names are the on-disk format of the export file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MangaRecord {
    pub id: String,
    pub title: Option<String>,
    pub rating: Option<i64>,
    pub last_chapter: Option<i64>,
    pub status: String,
}

impl std::fmt::Display for MangaRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "id={} title={:?} rating={:?} last_chapter={:?} status={}",
            self.id, self.title, self.rating, self.last_chapter, self.status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_nulls() {
        let record = MangaRecord {
            id: "m1".to_string(),
            title: None,
            rating: Some(7),
            last_chapter: None,
            status: "reading".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "m1",
                "title": null,
                "rating": 7,
                "last_chapter": null,
                "status": "reading",
            })
        );
    }

    #[test]
    fn test_record_parses_export_entry() {
        let raw = r#"{"id":"m2","title":"Blame!","rating":9,"last_chapter":65,"status":"completed"}"#;
        let record: MangaRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.title.as_deref(), Some("Blame!"));
        assert_eq!(record.last_chapter, Some(65));
    }
}

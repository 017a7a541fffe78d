//! Picking a display title from the localized title map.

use indexmap::IndexMap;

/// Languages tried in order before falling back to any title
const PREFERRED_LANGUAGES: [&str; 3] = ["en", "ja-ro", "ja"];

/// English, then romanized Japanese, then Japanese, then the first title listed
///
/// Empty strings are skipped for the preferred languages. Returns `None` only
/// when the map is empty.
pub fn select_title(titles: &IndexMap<String, String>) -> Option<String> {
    PREFERRED_LANGUAGES
        .iter()
        .filter_map(|lang| titles.get(*lang))
        .find(|title| !title.is_empty())
        .or_else(|| titles.values().next())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_prefers_english() {
        assert_eq!(
            select_title(&titles(&[("ja-ro", "B"), ("en", "A")])),
            Some("A".to_string())
        );
    }

    #[test]
    fn test_romanized_before_japanese() {
        assert_eq!(
            select_title(&titles(&[("ja", "C"), ("ja-ro", "B")])),
            Some("B".to_string())
        );
    }

    #[test]
    fn test_japanese_before_other_languages() {
        assert_eq!(
            select_title(&titles(&[("ko", "E"), ("ja", "C")])),
            Some("C".to_string())
        );
    }

    #[test]
    fn test_falls_back_to_any_title() {
        assert_eq!(select_title(&titles(&[("fr", "D")])), Some("D".to_string()));
    }

    #[test]
    fn test_empty_english_is_skipped() {
        assert_eq!(
            select_title(&titles(&[("en", ""), ("ja-ro", "B")])),
            Some("B".to_string())
        );
    }

    #[test]
    fn test_empty_map() {
        assert_eq!(select_title(&IndexMap::new()), None);
    }
}

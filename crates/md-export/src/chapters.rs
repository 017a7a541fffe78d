//! Working out the last read chapter of a manga.
//!
//! Read markers are chapter ids. They are matched against the manga's chapter
//! feed to recover chapter numbers; the highest number wins.

use mangadex::ChapterData;
use std::collections::HashMap;

/// Outcome of matching read markers against a chapter feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterResolution {
    /// Highest numbered chapter among the read ones
    Numbered(i64),
    /// One read marker without a usable chapter number, treated as a one-shot
    OneShot,
    /// Several read markers, none with a usable chapter number
    Ambiguous { read_markers: usize },
    /// No read markers at all
    Unread,
}

impl ChapterResolution {
    /// Value stored in the export record
    pub fn last_chapter(&self) -> Option<i64> {
        match self {
            ChapterResolution::Numbered(chapter) => Some(*chapter),
            ChapterResolution::OneShot => Some(1),
            ChapterResolution::Ambiguous { .. } | ChapterResolution::Unread => None,
        }
    }
}

/// Resolve the last read chapter from read markers and the chapter feed
///
/// Markers missing from the feed, and chapters with a null or non-numeric
/// number, are ignored.
pub fn resolve_last_chapter(
    read_markers: &[String],
    feed: &HashMap<String, ChapterData>,
) -> ChapterResolution {
    let highest = read_markers
        .iter()
        .filter_map(|chapter_id| feed.get(chapter_id))
        .filter_map(|chapter| chapter.attributes.chapter.as_ref()?.truncated())
        .max();

    match (highest, read_markers.len()) {
        (Some(chapter), _) => ChapterResolution::Numbered(chapter),
        (None, 0) => ChapterResolution::Unread,
        (None, 1) => ChapterResolution::OneShot,
        (None, read_markers) => ChapterResolution::Ambiguous { read_markers },
    }
}

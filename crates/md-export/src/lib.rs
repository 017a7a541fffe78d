//! Export a MangaDex library to a local JSON file.
//!
//! Every tracked manga becomes one [`shared::MangaRecord`] holding its
//! title, the account's rating, the last read chapter and its status. The
//! export file is rewritten after each record so an interrupted run keeps
//! everything exported before the failure.

pub mod chapters;
pub mod exporter;
pub mod store;
pub mod titles;

pub use chapters::{resolve_last_chapter, ChapterResolution};
pub use exporter::{ExportReport, ExportWarning, Exporter};
pub use store::ExportStore;
pub use titles::select_title;

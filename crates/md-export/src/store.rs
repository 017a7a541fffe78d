//! The export file: a JSON array of records, rewritten after every append.

use anyhow::{Context, Result};
use shared::MangaRecord;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Records loaded from and persisted to the export file
pub struct ExportStore {
    path: PathBuf,
    records: Vec<MangaRecord>,
}

impl ExportStore {
    /// Open the export file, loading any records from an earlier run
    ///
    /// Earlier records are kept as they are; new records are appended after
    /// them without checking for duplicate ids.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let records = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read export file: {}", path.display()))?;
            let records: Vec<MangaRecord> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse export file: {}", path.display()))?;
            info!(
                path = %path.display(),
                records = records.len(),
                "Resuming from existing export file"
            );
            records
        } else {
            debug!(path = %path.display(), "No existing export file");
            Vec::new()
        };

        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[MangaRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a record and rewrite the whole file
    pub fn append(&mut self, record: MangaRecord) -> Result<()> {
        self.records.push(record);
        self.save()
    }

    /// Write every record to the export file
    ///
    /// The file is replaced through a sibling temporary file, so a crash
    /// mid-write leaves the previous version intact.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create export directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(&self.records)
            .context("Failed to serialize export records")?;

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        std::fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write export file: {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace export file: {}", self.path.display()))?;

        debug!(path = %self.path.display(), records = self.records.len(), "Export file saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str) -> MangaRecord {
        MangaRecord {
            id: id.to_string(),
            title: Some(format!("Title {id}")),
            rating: None,
            last_chapter: Some(3),
            status: "reading".to_string(),
        }
    }

    #[test]
    fn test_missing_file_starts_empty() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let store = ExportStore::open(temp_dir.path().join("md_export.json"))?;
        assert!(store.is_empty());
        assert!(!store.path().exists());
        Ok(())
    }

    #[test]
    fn test_append_rewrites_file_each_time() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("md_export.json");
        let mut store = ExportStore::open(&path)?;

        store.append(record("m1"))?;
        let on_disk: Vec<MangaRecord> = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(on_disk, vec![record("m1")]);

        store.append(record("m2"))?;
        let on_disk: Vec<MangaRecord> = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(on_disk, vec![record("m1"), record("m2")]);
        assert!(!temp_dir.path().join("md_export.json.tmp").exists());
        Ok(())
    }

    #[test]
    fn test_reopen_appends_without_dedup() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("md_export.json");

        let mut store = ExportStore::open(&path)?;
        store.append(record("m1"))?;

        let mut reopened = ExportStore::open(&path)?;
        assert_eq!(reopened.records(), &[record("m1")]);
        reopened.append(record("m1"))?;
        assert_eq!(ExportStore::open(&path)?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_reads_file_written_elsewhere() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("md_export.json");
        std::fs::write(
            &path,
            r#"[{"id": "m1", "title": null, "rating": 8, "last_chapter": null, "status": "completed"}]"#,
        )?;

        let store = ExportStore::open(&path)?;
        assert_eq!(store.records()[0].rating, Some(8));
        assert_eq!(store.records()[0].title, None);
        Ok(())
    }

    #[test]
    fn test_corrupt_file_is_an_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("md_export.json");
        std::fs::write(&path, "{not json")?;

        assert!(ExportStore::open(&path).is_err());
        Ok(())
    }
}

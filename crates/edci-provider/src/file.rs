//! File-backed feed.

use std::path::{Path, PathBuf};

use edci_core::ReadingRecord;

use crate::{ProviderError, ProviderResult, ReadingProvider};

/// Serialization format of a readings file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Json,
    Yaml,
}

impl FeedFormat {
    /// # Errors
    ///
    /// Returns [`ProviderError::UnsupportedFormat`] for anything but `.json`, `.yaml` or `.yml`.
    pub fn from_path(path: &Path) -> ProviderResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(ProviderError::UnsupportedFormat {
                file: path.to_path_buf(),
            }),
        }
    }
}

/// A feed entry that could not be decoded and was left out of its cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Position of the entry in the feed's top-level list.
    pub index: usize,
    pub path: String,
    pub message: String,
}

/// Re-reads a list of [`ReadingRecord`]s from disk on every cycle.
///
/// Entries are decoded one at a time. An entry with a missing key, a wrong type or a fractional
/// count is skipped and kept in [`FileProvider::skipped`]; the rest of the file still makes up the
/// cycle. A file that is not a list at all is a [`ProviderError::Parse`].
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
    format: FeedFormat,
    skipped: Vec<SkippedRecord>,
}

impl FileProvider {
    /// # Errors
    ///
    /// Returns [`ProviderError::UnsupportedFormat`] if the extension is not recognised. The file
    /// itself is not opened until the first cycle.
    pub fn new(path: impl Into<PathBuf>) -> ProviderResult<Self> {
        let path = path.into();
        let format = FeedFormat::from_path(&path)?;
        Ok(Self {
            path,
            format,
            skipped: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FeedFormat {
        self.format
    }

    /// Entries left out of the most recent cycle.
    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    fn parse(&mut self, text: &str) -> ProviderResult<Vec<ReadingRecord>> {
        match self.format {
            FeedFormat::Json => {
                let mut de = serde_json::Deserializer::from_str(text);
                let entries: Vec<serde_json::Value> = serde_path_to_error::deserialize(&mut de)
                    .map_err(|err| self.schema_error(err.path().to_string(), err.into_inner()))?;
                de.end()
                    .map_err(|err| self.schema_error(String::new(), err))?;
                Ok(self.decode_entries(entries))
            }
            FeedFormat::Yaml => {
                let de = serde_yaml::Deserializer::from_str(text);
                let entries: Vec<serde_yaml::Value> = serde_path_to_error::deserialize(de)
                    .map_err(|err| self.schema_error(err.path().to_string(), err.into_inner()))?;
                Ok(self.decode_entries(entries))
            }
        }
    }

    fn decode_entries<'de, D>(&mut self, entries: Vec<D>) -> Vec<ReadingRecord>
    where
        D: serde::Deserializer<'de>,
    {
        self.skipped.clear();
        let mut records = Vec::with_capacity(entries.len());

        for (index, entry) in entries.into_iter().enumerate() {
            match serde_path_to_error::deserialize(entry) {
                Ok(record) => records.push(record),
                Err(err) => {
                    let path = entry_path(index, &err.path().to_string());
                    let message = err.into_inner().to_string();
                    tracing::warn!(
                        "skipping entry {} of {}: schema mismatch at {}: {}",
                        index,
                        self.path.display(),
                        path,
                        message
                    );
                    self.skipped.push(SkippedRecord {
                        index,
                        path,
                        message,
                    });
                }
            }
        }

        records
    }

    fn schema_error(&self, path: String, source: impl std::fmt::Display) -> ProviderError {
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        ProviderError::Parse {
            file: self.path.clone(),
            path,
            message: source.to_string(),
        }
    }
}

fn entry_path(index: usize, inner: &str) -> String {
    if inner.is_empty() || inner == "." {
        format!("[{index}]")
    } else {
        format!("[{index}].{inner}")
    }
}

impl ReadingProvider for FileProvider {
    fn next_cycle(&mut self) -> ProviderResult<Vec<ReadingRecord>> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| {
            tracing::warn!("failed to read readings file {}: {}", self.path.display(), source);
            ProviderError::Io {
                file: self.path.clone(),
                source,
            }
        })?;

        let records = self.parse(&text).inspect_err(|err| {
            tracing::warn!("{}", err);
        })?;
        tracing::debug!(
            "read {} readings from {} ({} skipped)",
            records.len(),
            self.path.display(),
            self.skipped.len()
        );
        Ok(records)
    }
}

//! # EDCI Provider
//!
//! Sources of raw per-facility readings for the congestion engine.
//!
//! - [`SyntheticProvider`]: seeded generator reproducing the live feed's value ranges
//! - [`FileProvider`]: JSON or YAML file re-read on every cycle
//!
//! Providers only deliver [`ReadingRecord`]s; validation and every derived value belong to
//! `edci-core`.

pub mod file;
pub mod synthetic;

use std::path::PathBuf;

use edci_core::ReadingRecord;

pub use file::{FeedFormat, FileProvider, SkippedRecord};
pub use synthetic::{RosterEntry, SyntheticProvider, DEFAULT_ROSTER};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("failed to read readings file {}: {source}", file.display())]
    Io {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("readings file {} does not match the feed schema at {path}: {message}", file.display())]
    Parse {
        file: PathBuf,
        path: String,
        message: String,
    },
    #[error("unsupported readings file format {}: expected .json, .yaml or .yml", file.display())]
    UnsupportedFormat { file: PathBuf },
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Supplies one batch of readings per evaluation cycle.
pub trait ReadingProvider {
    /// Produce the readings for the next cycle.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the source cannot be read. Individual malformed facilities
    /// are not provider errors; the engine rejects them one by one.
    fn next_cycle(&mut self) -> ProviderResult<Vec<ReadingRecord>>;
}

impl<P: ReadingProvider + ?Sized> ReadingProvider for Box<P> {
    fn next_cycle(&mut self) -> ProviderResult<Vec<ReadingRecord>> {
        (**self).next_cycle()
    }
}

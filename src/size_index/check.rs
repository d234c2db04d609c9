//! Reconciliation of a persisted size index against a fresh scan

use std::path::Path;

use serde::Serialize;

use crate::observability::{Event, Logger};

use super::errors::SizeIndexResult;
use super::generator::SizeGenerator;
use super::index::{SizeDelta, SizeIndex};
use super::store::SizeIndexStore;

/// Outcome of a size check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeCheckReport {
    /// Index computed from the bucket files
    pub generated: SizeIndex,
    /// Index read from the size index file
    pub persisted: SizeIndex,
    /// `generated - persisted`
    pub difference: SizeDelta,
    /// Whether the difference is zero
    pub matches: bool,
}

impl SizeCheckReport {
    /// Compares a generated index with a persisted one
    pub fn compare(generated: SizeIndex, persisted: SizeIndex) -> Self {
        let difference = generated - persisted;
        Self {
            generated,
            persisted,
            difference,
            matches: difference.is_zero(),
        }
    }
}

/// Regenerates a channel's size index and compares it with the stored one.
#[derive(Debug, Clone, Copy)]
pub struct SizeCheck {
    logger: Logger,
    generator: SizeGenerator,
}

impl SizeCheck {
    /// Create a size check
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            generator: SizeGenerator::new(logger),
        }
    }

    /// Runs the check. A mismatch is a report with `matches == false`, not an
    /// error.
    ///
    /// # Errors
    ///
    /// If the stored index cannot be read or the channel cannot be listed.
    pub fn run(&self, channel_dir: &Path, store: &SizeIndexStore) -> SizeIndexResult<SizeCheckReport> {
        let persisted = store.read()?;
        let generated = self.generator.generate(channel_dir)?;
        let report = SizeCheckReport::compare(generated, persisted);

        if !report.matches {
            self.logger.warn(
                Event::SizeMismatch,
                &[
                    ("path", &channel_dir.display().to_string()),
                    ("generated", &report.generated.to_string()),
                    ("persisted", &report.persisted.to_string()),
                    ("difference", &report.difference.to_string()),
                ],
            );
        }
        Ok(report)
    }
}

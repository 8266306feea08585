//! CSV output of scenario summaries.
use csv::Writer;
use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use crate::aggregate::ScenarioSummary;
use crate::error::SimError;
use crate::log::debug;

/// File name of the summary report inside the output directory.
pub const SUMMARY_FILE_NAME: &str = "scenario_summary.csv";

fn generate_validate_filepath(path: &Path) -> Result<File, SimError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            Ok(file)
        }
        _ => Err(SimError::ReportError(format!(
            "report output files must be CSVs, got {}",
            path.display()
        ))),
    }
}

/// Writes one row per scenario, with a header taken from the fields of [`ScenarioSummary`].
pub struct SummaryReport {
    path: PathBuf,
    writer: Writer<File>,
}

impl SummaryReport {
    /// Creates `scenario_summary.csv` in `output_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns a `SimError` if the directory or file can't be created.
    pub fn create(output_dir: &Path) -> Result<Self, SimError> {
        Self::create_at(&output_dir.join(SUMMARY_FILE_NAME))
    }

    /// Creates the report at `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns `SimError::ReportError` if `path` doesn't end in `.csv`, or a `SimError` if the
    /// file can't be created.
    pub fn create_at(path: &Path) -> Result<Self, SimError> {
        let file = generate_validate_filepath(path)?;
        debug!("writing scenario summaries to {}", path.display());
        Ok(SummaryReport {
            path: path.to_path_buf(),
            writer: Writer::from_writer(file),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a row and flushes it, so a partially run study still leaves its rows behind.
    ///
    /// # Errors
    ///
    /// Returns a `SimError` if the row can't be written.
    pub fn send(&mut self, summary: &ScenarioSummary) -> Result<(), SimError> {
        self.writer.serialize(summary)?;
        self.writer.flush()?;
        Ok(())
    }
}

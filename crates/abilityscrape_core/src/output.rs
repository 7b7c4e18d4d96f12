use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Result, ScrapeError};
use crate::model::FightScrapeResult;
use crate::report_url::ReportTarget;

pub fn single_output_path(output_dir: &Path, target: &ReportTarget) -> PathBuf {
    output_dir.join(format!("ability_ids_single_{}.json", target.file_stem()))
}

pub fn full_output_path(output_dir: &Path, target: &ReportTarget) -> PathBuf {
    output_dir.join(format!("ability_ids_full_{}.json", target.file_stem()))
}

/// Write `value` as two-space indented JSON, creating parent directories.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let serialization_error = |message: String| ScrapeError::Serialization {
        path: path.display().to_string(),
        message,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .map_err(|error| serialization_error(format!("failed to create directory: {error}")))?;
    }
    let mut rendered = serde_json::to_string_pretty(value)
        .map_err(|error| serialization_error(error.to_string()))?;
    rendered.push('\n');
    fs::write(path, rendered).map_err(|error| serialization_error(error.to_string()))
}

pub fn read_fight_result(path: &Path) -> Result<FightScrapeResult> {
    let content = fs::read_to_string(path).map_err(|error| ScrapeError::Config {
        path: path.display().to_string(),
        message: format!("failed to read: {error}"),
    })?;
    serde_json::from_str(&content).map_err(|error| ScrapeError::Config {
        path: path.display().to_string(),
        message: format!("not a fight scrape result: {error}"),
    })
}

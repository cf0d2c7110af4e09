// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::extractors::report::ParsedDarReport;
use crate::utils::error::StorageError;

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        // Create the base directory if it doesn't exist
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self {
            base_dir: base_path,
        })
    }

    /// Saves the extracted record as pretty-printed JSON.
    pub fn save_report(
        &self,
        source_name: &str,
        report: &ParsedDarReport,
    ) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(format!("{}_extracted.json", source_name));

        let json = serde_json::to_string_pretty(report)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, json).map_err(StorageError::IoError)?;

        tracing::info!("Saved record to {}", file_path.display());

        Ok(file_path)
    }

    /// Saves metadata about the extraction run in JSON format
    pub fn save_report_metadata(
        &self,
        source_name: &str,
        source_path: &Path,
        report: &ParsedDarReport,
    ) -> Result<PathBuf, StorageError> {
        let file_path = self.base_dir.join(format!("{}_meta.json", source_name));

        // Create metadata structure
        let metadata = serde_json::json!({
            "source_file": source_path.display().to_string(),
            "trade_name": report.header.trade_name,
            "gstin": report.header.gstin,
            "audit_para_count": report.audit_paras.len(),
            "needs_review": report.parsing_errors.is_some(),
            "parsing_errors": report.parsing_errors,
            "extraction_timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());

        Ok(file_path)
    }

    /// Saves the exact prompt sent to the model (debug mode).
    pub fn save_debug_prompt(
        &self,
        source_name: &str,
        prompt: &str,
    ) -> Result<PathBuf, StorageError> {
        let debug_dir = self.base_dir.join("debug");
        if !debug_dir.exists() {
            fs::create_dir_all(&debug_dir).map_err(StorageError::IoError)?;
        }

        let file_path = debug_dir.join(format!("{}_prompt.txt", source_name));
        fs::write(&file_path, prompt).map_err(StorageError::IoError)?;

        Ok(file_path)
    }
}

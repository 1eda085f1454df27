//! Diagnostic run over a folder of PDFs: raw text per file plus a JSON report.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::pipeline::{list_pdfs, Processor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// At least one entry has an account number.
    Success,
    /// Processed, but no account number found.
    Failed,
    /// Processing raised an error.
    Error,
}

#[derive(Debug, Serialize)]
pub struct FileReport {
    pub filename: String,
    pub status: Status,
    pub ac_numbers: Vec<String>,
    pub entries_found: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn count(&self, status: Status) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }
}

pub const REPORT_FILE: &str = "batch_report.json";

fn raw_text_path(output_dir: &Path, filename: &str) -> PathBuf {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| filename.to_string());
    output_dir.join(format!("{stem}.txt"))
}

/// Process every PDF in `source_dir`, writing `<name>.txt` and `batch_report.json`
/// into `output_dir`.
pub fn run_batch(processor: &Processor, source_dir: &Path, output_dir: &Path) -> Result<BatchReport> {
    let files = list_pdfs(source_dir)?;
    std::fs::create_dir_all(output_dir)?;

    let mut reports = Vec::with_capacity(files.len());
    for (i, filename) in files.iter().enumerate() {
        tracing::info!("batch {}/{}: {filename}", i + 1, files.len());
        let report = match processor.process_file(&source_dir.join(filename)) {
            Ok(processed) => {
                std::fs::write(raw_text_path(output_dir, filename), &processed.raw_text)?;
                let ac_numbers: Vec<String> = processed
                    .entries
                    .iter()
                    .filter_map(|e| e.ac_no.clone())
                    .collect();
                FileReport {
                    filename: filename.clone(),
                    status: if ac_numbers.is_empty() {
                        Status::Failed
                    } else {
                        Status::Success
                    },
                    ac_numbers,
                    entries_found: processed.entries.len(),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(file = %filename, error = %e, "batch item failed");
                FileReport {
                    filename: filename.clone(),
                    status: Status::Error,
                    ac_numbers: Vec::new(),
                    entries_found: 0,
                    error: Some(e.to_string()),
                }
            }
        };
        reports.push(report);
    }

    let report = BatchReport { files: reports };
    let json = serde_json::to_string_pretty(&report.files)?;
    std::fs::write(output_dir.join(REPORT_FILE), json)?;
    Ok(report)
}

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{CashflowError, Result};
use crate::extract::extract_all_entries;
use crate::master::MasterTable;
use crate::models::Entry;
use crate::ocr::{pdf_to_text, PageRecognizer};
use crate::settings::Settings;

/// Result of one source document.
#[derive(Debug)]
pub struct Processed {
    pub path: PathBuf,
    pub entries: Vec<Entry>,
    pub raw_text: String,
    pub checksum: String,
}

pub struct Processor<'a> {
    settings: &'a Settings,
    master: &'a MasterTable,
    recognizer: &'a dyn PageRecognizer,
}

/// Outcome of a run over several files: the ones that worked and the ones that did not.
#[derive(Default)]
pub struct RunOutcome {
    pub processed: Vec<Processed>,
    pub failed: Vec<(PathBuf, CashflowError)>,
}

impl RunOutcome {
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.processed.iter().flat_map(|p| p.entries.iter())
    }
}

pub fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// PDF file names in `dir`, sorted.
pub fn list_pdfs(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(CashflowError::InvalidSourceDir(dir.display().to_string()));
    }
    let mut files: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && has_extension(&e.path(), "pdf"))
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .collect();
    files.sort();
    Ok(files)
}

impl<'a> Processor<'a> {
    pub fn new(settings: &'a Settings, master: &'a MasterTable, recognizer: &'a dyn PageRecognizer) -> Self {
        Self {
            settings,
            master,
            recognizer,
        }
    }

    /// Recognised text of a document. `.txt` files are taken as already recognised.
    pub fn read_text(&self, path: &Path) -> Result<String> {
        if has_extension(path, "txt") {
            Ok(std::fs::read_to_string(path)?)
        } else if has_extension(path, "pdf") {
            pdf_to_text(path, self.recognizer, self.settings)
        } else {
            Err(CashflowError::UnsupportedInput(path.display().to_string()))
        }
    }

    pub fn process_text(&self, text: &str, source_file: Option<&str>) -> Vec<Entry> {
        let mut entries = extract_all_entries(text);
        for entry in &mut entries {
            entry.source_file = source_file.map(str::to_string);
            self.master.enrich(entry);
        }
        entries
    }

    pub fn process_file(&self, path: &Path) -> Result<Processed> {
        if !path.is_file() {
            return Err(CashflowError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            )));
        }
        let checksum = compute_checksum(path)?;
        let raw_text = self.read_text(path)?;
        let name = path.file_name().and_then(|n| n.to_str());
        let entries = self.process_text(&raw_text, name);
        tracing::info!(file = %path.display(), entries = entries.len(), "processed");
        Ok(Processed {
            path: path.to_path_buf(),
            entries,
            raw_text,
            checksum,
        })
    }

    /// Process each file in turn; a failure is logged and recorded, never fatal to the run.
    pub fn process_many(&self, paths: &[PathBuf]) -> RunOutcome {
        let mut outcome = RunOutcome::default();
        for (i, path) in paths.iter().enumerate() {
            tracing::info!("processing {}/{}: {}", i + 1, paths.len(), path.display());
            match self.process_file(path) {
                Ok(p) => outcome.processed.push(p),
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "processing failed");
                    outcome.failed.push((path.clone(), e));
                }
            }
        }
        outcome
    }
}

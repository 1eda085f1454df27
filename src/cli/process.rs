use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::cli::{open_db, print_entries, OutputFormat};
use crate::db::save_records;
use crate::error::{CashflowError, Result};
use crate::master::MasterTable;
use crate::models::Entry;
use crate::ocr::Tesseract;
use crate::pipeline::{list_pdfs, Processed, Processor};
use crate::report::append_to_excel;
use crate::settings::Settings;

pub struct ProcessOptions {
    pub files: Vec<PathBuf>,
    pub all: bool,
    pub source: Option<PathBuf>,
    pub export: bool,
    pub save: bool,
    pub raw_dir: Option<PathBuf>,
    pub format: OutputFormat,
}

fn inputs(settings: &Settings, opts: &ProcessOptions) -> Result<Vec<PathBuf>> {
    if opts.all {
        let dir = opts.source.clone().unwrap_or_else(|| settings.source_dir());
        let files = list_pdfs(&dir)?;
        return Ok(files.into_iter().map(|f| dir.join(f)).collect());
    }
    if opts.files.is_empty() {
        return Err(CashflowError::Other(
            "Nothing to process: pass PDF files or --all".to_string(),
        ));
    }
    Ok(opts.files.clone())
}

fn write_raw(dir: &Path, processed: &Processed) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let stem = processed
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    std::fs::write(dir.join(format!("{stem}.txt")), &processed.raw_text)?;
    Ok(())
}

/// Blanks left after extraction are re-looked-up, then entries are exported and/or saved.
fn persist(
    settings: &Settings,
    master: &MasterTable,
    processed: &mut [Processed],
    export: bool,
    save: bool,
) -> Result<()> {
    for entry in processed.iter_mut().flat_map(|p| p.entries.iter_mut()) {
        master.fill_missing(entry);
    }
    if export {
        let entries: Vec<Entry> = processed.iter().flat_map(|p| p.entries.clone()).collect();
        if entries.is_empty() {
            eprintln!("Nothing to export.");
        } else {
            eprintln!("{}", append_to_excel(&entries, &settings.export_path())?);
        }
    }
    if save {
        let conn = open_db(settings)?;
        for p in processed.iter() {
            let result = save_records(&conn, &p.entries, Some(p.checksum.as_str()))?;
            let name = p.path.display();
            if result.duplicate_file {
                eprintln!("{name}: already saved (duplicate checksum).");
            } else {
                eprintln!("{name}: {} saved, {} skipped (duplicates)", result.saved, result.skipped);
            }
        }
    }
    Ok(())
}

pub fn run(settings: &Settings, opts: ProcessOptions) -> Result<()> {
    let paths = inputs(settings, &opts)?;
    if paths.is_empty() {
        println!("No PDF files to process.");
        return Ok(());
    }

    let master = MasterTable::load(&settings.master_path())?;
    let recognizer = Tesseract::from_settings(settings);
    let processor = Processor::new(settings, &master, &recognizer);
    let mut outcome = processor.process_many(&paths);

    for (path, err) in &outcome.failed {
        eprintln!("{} {}: {err}", "failed".red(), path.display());
    }
    if outcome.processed.is_empty() {
        return Err(CashflowError::Other(format!(
            "All {} files failed to process",
            outcome.failed.len()
        )));
    }

    if let Some(dir) = &opts.raw_dir {
        for p in &outcome.processed {
            write_raw(dir, p)?;
        }
    }

    let entries: Vec<Entry> = outcome.entries().cloned().collect();
    print_entries(&entries, opts.format)?;
    persist(settings, &master, &mut outcome.processed, opts.export, opts.save)
}

/// Extraction only, on text that was recognised earlier.
pub fn extract(settings: &Settings, text_file: &Path, save: bool, format: OutputFormat) -> Result<()> {
    let master = MasterTable::load(&settings.master_path())?;
    let recognizer = Tesseract::from_settings(settings);
    let processor = Processor::new(settings, &master, &recognizer);
    let processed = processor.process_file(text_file)?;
    print_entries(&processed.entries, format)?;
    persist(settings, &master, &mut [processed], false, save)
}

use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::batch::{run_batch, Status, REPORT_FILE};
use crate::error::Result;
use crate::master::MasterTable;
use crate::ocr::Tesseract;
use crate::pipeline::Processor;
use crate::settings::Settings;

pub fn run(settings: &Settings, source: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let source = source.unwrap_or_else(|| settings.source_dir());
    let output = output.unwrap_or_else(|| settings.output_dir().join("debug"));

    let master = MasterTable::load(&settings.master_path())?;
    let recognizer = Tesseract::from_settings(settings);
    let processor = Processor::new(settings, &master, &recognizer);
    let report = run_batch(&processor, &source, &output)?;

    if report.files.is_empty() {
        println!("No PDF files in {}", source.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["File", "Status", "A/C Numbers", "Entries", "Error"]);
    for f in &report.files {
        let status = match f.status {
            Status::Success => "SUCCESS".green(),
            Status::Failed => "FAILED".yellow(),
            Status::Error => "ERROR".red(),
        };
        table.add_row(vec![
            Cell::new(&f.filename),
            Cell::new(status),
            Cell::new(f.ac_numbers.join(", ")),
            Cell::new(f.entries_found),
            Cell::new(f.error.as_deref().unwrap_or_default()),
        ]);
    }
    println!("{table}");
    println!(
        "{} success, {} failed, {} error",
        report.count(Status::Success),
        report.count(Status::Failed),
        report.count(Status::Error)
    );
    println!("Report: {}", output.join(REPORT_FILE).display());
    Ok(())
}

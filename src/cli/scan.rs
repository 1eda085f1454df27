use std::path::PathBuf;

use crate::error::Result;
use crate::pipeline::list_pdfs;
use crate::settings::Settings;

pub fn run(settings: &Settings, source: Option<PathBuf>) -> Result<()> {
    let dir = source.unwrap_or_else(|| settings.source_dir());
    let files = list_pdfs(&dir)?;
    if files.is_empty() {
        println!("No PDF files in {}", dir.display());
        return Ok(());
    }
    println!("{} PDF files in {}", files.len(), dir.display());
    for name in files {
        println!("  {name}");
    }
    Ok(())
}

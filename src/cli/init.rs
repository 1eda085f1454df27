use std::path::Path;

use crate::cli::open_db;
use crate::error::Result;
use crate::settings::{save_settings, Settings};

pub fn run(config_path: &Path, settings: &Settings) -> Result<()> {
    if config_path.exists() {
        println!("Config:    {} (kept)", config_path.display());
    } else {
        save_settings(config_path, settings)?;
        println!("Config:    {} (created)", config_path.display());
    }

    let output_dir = settings.output_dir();
    std::fs::create_dir_all(&output_dir)?;
    println!("Output:    {}", output_dir.display());

    let source_dir = settings.source_dir();
    std::fs::create_dir_all(&source_dir)?;
    println!("Source:    {}", source_dir.display());

    open_db(settings)?;
    println!("Database:  {}", settings.db_path().display());

    let master = settings.master_path();
    if !master.exists() {
        println!();
        println!("Account master not found at {}.", master.display());
        println!("Add it to enable bank/company lookup.");
    }
    Ok(())
}

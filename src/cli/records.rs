use std::path::PathBuf;

use crate::cli::{open_db, print_records, FilterArgs, OutputFormat};
use crate::db::{delete_records, filter_options, load_records, normalize_stored_dates, summary};
use crate::error::Result;
use crate::fmt::amount;
use crate::report::export_records;
use crate::settings::Settings;

pub fn list(settings: &Settings, filter: &FilterArgs, format: OutputFormat) -> Result<()> {
    let conn = open_db(settings)?;
    let filter = filter.to_filter();
    let records = load_records(&conn, &filter)?;
    print_records(&records, format)?;
    if format == OutputFormat::Table && !records.is_empty() {
        let s = summary(&conn, &filter)?;
        println!("{} records, total {}", s.count, amount(s.total));
    }
    Ok(())
}

pub fn delete(settings: &Settings, ids: &[i64]) -> Result<()> {
    let conn = open_db(settings)?;
    let count = delete_records(&conn, ids)?;
    println!("Deleted {count} records");
    Ok(())
}

pub fn export(settings: &Settings, filter: &FilterArgs, output_dir: Option<PathBuf>) -> Result<()> {
    let conn = open_db(settings)?;
    let records = load_records(&conn, &filter.to_filter())?;
    if records.is_empty() {
        println!("No records match; nothing exported.");
        return Ok(());
    }
    let dir = output_dir.unwrap_or_else(|| settings.output_dir());
    let path = export_records(&records, &dir)?;
    println!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

pub fn options(settings: &Settings) -> Result<()> {
    let conn = open_db(settings)?;
    let o = filter_options(&conn)?;
    for (label, values) in [
        ("Banks", &o.banks),
        ("Companies", &o.companies),
        ("Currencies", &o.currencies),
        ("Years", &o.years),
        ("Months", &o.months),
    ] {
        println!("{label:<11} {}", values.join(", "));
    }
    Ok(())
}

pub fn normalize_dates(settings: &Settings) -> Result<()> {
    let conn = open_db(settings)?;
    let count = normalize_stored_dates(&conn)?;
    println!("Normalized {count} dates");
    Ok(())
}

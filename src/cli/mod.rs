pub mod batch;
pub mod check;
pub mod init;
pub mod process;
pub mod records;
pub mod scan;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::{Cell, CellAlignment, Table};
use rusqlite::Connection;

use crate::db::{get_connection, init_db, RecordFilter};
use crate::error::Result;
use crate::fmt::{amount, or_dash};
use crate::models::{Entry, StoredRecord};
use crate::report::COLUMNS;
use crate::settings::{Settings, DEFAULT_CONFIG_FILE};

/// `YYYY-MM` -> (year, month). A bare `MM` gives only the month.
pub(crate) fn parse_month_opt(month: &Option<String>) -> (Option<i32>, Option<u32>) {
    if let Some(m) = month {
        let parts: Vec<&str> = m.split('-').collect();
        match parts.as_slice() {
            [y, m] => return (y.parse().ok(), m.parse().ok()),
            [m] => return (None, m.parse().ok()),
            _ => {}
        }
    }
    (None, None)
}

pub(crate) fn open_db(settings: &Settings) -> Result<Connection> {
    let conn = get_connection(&settings.db_path())?;
    init_db(&conn)?;
    Ok(conn)
}

#[derive(Parser)]
#[command(
    name = "cashflow",
    version,
    about = "Turn scanned bank debit/credit advices into cash-flow records."
)]
pub struct Cli {
    /// Path to the JSON config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config, create the output folder and the database.
    Init,
    /// Verify that pdftoppm, tesseract and the account master are available.
    Check,
    /// List PDFs waiting in the source folder.
    Scan {
        /// Source folder (default: from config)
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// OCR PDFs and extract advice entries.
    Process {
        /// PDF or recognised-text files to process
        #[arg(conflicts_with = "all")]
        files: Vec<PathBuf>,
        /// Process every PDF in the source folder
        #[arg(long)]
        all: bool,
        /// Source folder for --all (default: from config)
        #[arg(long)]
        source: Option<PathBuf>,
        /// Append entries to the export workbook
        #[arg(long)]
        export: bool,
        /// Save entries to the database
        #[arg(long)]
        save: bool,
        /// Write each file's recognised text into this folder
        #[arg(long = "raw-dir")]
        raw_dir: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Extract entries from already recognised text.
    Extract {
        /// Text file with `--- Page N ---` markers
        text_file: PathBuf,
        /// Save entries to the database
        #[arg(long)]
        save: bool,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Process a folder and write raw text plus batch_report.json for inspection.
    Batch {
        /// Source folder (default: from config)
        #[arg(long)]
        source: Option<PathBuf>,
        /// Output folder (default: <output_dir>/debug)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Query and maintain saved records.
    Records {
        #[command(subcommand)]
        command: RecordsCommands,
    },
    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Bank name ("All" for any)
    #[arg(long)]
    pub bank: Option<String>,
    /// Company name ("All" for any)
    #[arg(long)]
    pub company: Option<String>,
    /// Currency code ("All" for any)
    #[arg(long)]
    pub currency: Option<String>,
    /// Start date: YYYY-MM-DD
    #[arg(long = "from")]
    pub from_date: Option<String>,
    /// End date: YYYY-MM-DD
    #[arg(long = "to")]
    pub to_date: Option<String>,
    /// Year filter: YYYY
    #[arg(long)]
    pub year: Option<i32>,
    /// Month filter: YYYY-MM or MM (with --year)
    #[arg(long)]
    pub month: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> RecordFilter {
        let (my, mm) = parse_month_opt(&self.month);
        RecordFilter {
            bank: self.bank.clone(),
            company: self.company.clone(),
            currency: self.currency.clone(),
            from_date: self.from_date.clone(),
            to_date: self.to_date.clone(),
            year: self.year.or(my),
            month: mm,
        }
    }
}

#[derive(Subcommand)]
pub enum RecordsCommands {
    /// List saved records.
    List {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, value_enum, default_value_t)]
        format: OutputFormat,
    },
    /// Delete records by ID.
    Delete {
        /// Record IDs (shown in `cashflow records list`)
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Export records to DB_Report_<timestamp>.xlsx.
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output folder (default: from config)
        #[arg(long = "output-dir")]
        output_dir: Option<PathBuf>,
    },
    /// Show the values available for each filter.
    Options,
    /// Rewrite stored document dates as YYYY-MM-DD.
    NormalizeDates,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn write_csv(rows: Vec<Vec<String>>) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    wtr.write_record(COLUMNS)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

pub(crate) fn print_entries(entries: &[Entry], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
        OutputFormat::Csv => write_csv(
            entries
                .iter()
                .map(|e| {
                    vec![
                        opt(&e.ac_no),
                        opt(&e.bank_name),
                        opt(&e.company_name),
                        opt(&e.currency),
                        opt(&e.document_date),
                        opt(&e.reference_no),
                        opt(&e.total_value),
                        e.transaction.map(|t| t.to_string()).unwrap_or_default(),
                        opt(&e.source_file),
                        e.page.to_string(),
                    ]
                })
                .collect(),
        )?,
        OutputFormat::Table => {
            if entries.is_empty() {
                println!("No entries found.");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_header(vec![
                "A/C No", "Bank", "Company", "Cur", "Date", "Reference", "Total", "Txn", "Source", "Page",
            ]);
            for e in entries {
                table.add_row(vec![
                    Cell::new(or_dash(e.ac_no.as_deref())),
                    Cell::new(or_dash(e.bank_name.as_deref())),
                    Cell::new(or_dash(e.company_name.as_deref())),
                    Cell::new(or_dash(e.currency.as_deref())),
                    Cell::new(or_dash(e.document_date.as_deref())),
                    Cell::new(or_dash(e.reference_no.as_deref())),
                    Cell::new(e.total_value.as_ref().map_or("-".to_string(), |_| amount(e.total_as_f64())))
                        .set_alignment(CellAlignment::Right),
                    Cell::new(e.transaction.map_or("-", |t| t.as_str())),
                    Cell::new(or_dash(e.source_file.as_deref())),
                    Cell::new(e.page),
                ]);
            }
            println!("{table}");
            println!("{} entries", entries.len());
        }
    }
    Ok(())
}

pub(crate) fn print_records(records: &[StoredRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        OutputFormat::Csv => write_csv(
            records
                .iter()
                .map(|r| {
                    vec![
                        opt(&r.ac_no),
                        opt(&r.bank_name),
                        opt(&r.company_name),
                        opt(&r.currency),
                        opt(&r.doc_date),
                        opt(&r.ref_no),
                        format!("{:.2}", r.total_value),
                        opt(&r.transaction),
                        opt(&r.source_file),
                        r.page.map(|p| p.to_string()).unwrap_or_default(),
                    ]
                })
                .collect(),
        )?,
        OutputFormat::Table => {
            if records.is_empty() {
                println!("No records found.");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_header(vec![
                "ID", "A/C No", "Bank", "Company", "Cur", "Date", "Reference", "Total", "Txn", "Source",
            ]);
            for r in records {
                table.add_row(vec![
                    Cell::new(r.id),
                    Cell::new(or_dash(r.ac_no.as_deref())),
                    Cell::new(or_dash(r.bank_name.as_deref())),
                    Cell::new(or_dash(r.company_name.as_deref())),
                    Cell::new(or_dash(r.currency.as_deref())),
                    Cell::new(or_dash(r.doc_date.as_deref())),
                    Cell::new(or_dash(r.ref_no.as_deref())),
                    Cell::new(amount(r.total_value)).set_alignment(CellAlignment::Right),
                    Cell::new(or_dash(r.transaction.as_deref())),
                    Cell::new(or_dash(r.source_file.as_deref())),
                ]);
            }
            println!("{table}");
        }
    }
    Ok(())
}

//! Excel output: the running cash-flow workbook and ledger snapshots.

use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Workbook};

use crate::error::Result;
use crate::master::cell_text;
use crate::models::{Entry, StoredRecord};

pub const COLUMNS: [&str; 10] = [
    "A/C No",
    "Bank Name",
    "Company Name",
    "Currency",
    "Document Date",
    "Reference No",
    "Total Value",
    "Transaction",
    "Source File",
    "Page",
];

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Empty,
    Text(String),
    Number(f64),
}

impl From<&Data> for Value {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => Value::Empty,
            Data::Float(f) => Value::Number(*f),
            Data::Int(i) => Value::Number(*i as f64),
            other => Value::Text(cell_text(other)),
        }
    }
}

fn text(value: &Option<String>) -> Value {
    match value.as_deref() {
        Some(s) if !s.is_empty() => Value::Text(s.to_string()),
        _ => Value::Empty,
    }
}

struct Sheet {
    header: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Sheet {
    fn new() -> Self {
        Self {
            header: COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)?;
        let Some(range) = workbook.worksheet_range_at(0) else {
            return Ok(Self::new());
        };
        let range = range?;
        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            return Ok(Self::new());
        };
        let mut sheet = Self {
            header: header_row.iter().map(cell_text).collect(),
            rows: rows.map(|r| r.iter().map(Value::from).collect()).collect(),
        };
        for column in COLUMNS {
            sheet.column(column);
        }
        Ok(sheet)
    }

    /// Index of `name`, adding the column if the sheet does not have it yet.
    fn column(&mut self, name: &str) -> usize {
        if let Some(i) = self.header.iter().position(|h| h == name) {
            return i;
        }
        self.header.push(name.to_string());
        self.header.len() - 1
    }

    fn push(&mut self, values: [(&str, Value); 10]) {
        let mut row = vec![Value::Empty; self.header.len()];
        for (name, value) in values {
            let i = self.column(name);
            if i >= row.len() {
                row.resize(i + 1, Value::Empty);
            }
            row[i] = value;
        }
        self.rows.push(row);
    }

    fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let ws = workbook.add_worksheet();
        for (col, name) in self.header.iter().enumerate() {
            ws.write_string_with_format(0, col as u16, name, &bold)?;
            ws.set_column_width(col as u16, 18)?;
        }
        for (r, row) in self.rows.iter().enumerate() {
            let r = r as u32 + 1;
            for (col, value) in row.iter().enumerate() {
                match value {
                    Value::Empty => {}
                    Value::Text(s) => {
                        ws.write_string(r, col as u16, s)?;
                    }
                    Value::Number(n) => {
                        ws.write_number(r, col as u16, *n)?;
                    }
                }
            }
        }
        workbook.save(path)?;
        Ok(())
    }
}

fn entry_values(e: &Entry) -> [(&'static str, Value); 10] {
    [
        ("A/C No", text(&e.ac_no)),
        ("Bank Name", text(&e.bank_name)),
        ("Company Name", text(&e.company_name)),
        ("Currency", text(&e.currency)),
        ("Document Date", text(&e.document_date)),
        ("Reference No", text(&e.reference_no)),
        (
            "Total Value",
            e.total_value
                .as_ref()
                .map_or(Value::Empty, |_| Value::Number(e.total_as_f64())),
        ),
        (
            "Transaction",
            e.transaction
                .map_or(Value::Empty, |t| Value::Text(t.as_str().to_string())),
        ),
        ("Source File", text(&e.source_file)),
        ("Page", Value::Number(f64::from(e.page))),
    ]
}

fn record_values(r: &StoredRecord) -> [(&'static str, Value); 10] {
    [
        ("A/C No", text(&r.ac_no)),
        ("Bank Name", text(&r.bank_name)),
        ("Company Name", text(&r.company_name)),
        ("Currency", text(&r.currency)),
        ("Document Date", text(&r.doc_date)),
        ("Reference No", text(&r.ref_no)),
        ("Total Value", Value::Number(r.total_value)),
        ("Transaction", text(&r.transaction)),
        ("Source File", text(&r.source_file)),
        ("Page", r.page.map_or(Value::Empty, |p| Value::Number(p as f64))),
    ]
}

/// Append entries to the workbook at `path`, creating it if needed. Columns
/// the existing sheet has beyond the standard ones are kept.
pub fn append_to_excel(entries: &[Entry], path: &Path) -> Result<String> {
    let existed = path.exists();
    let mut sheet = if existed { Sheet::read(path)? } else { Sheet::new() };
    for entry in entries {
        sheet.push(entry_values(entry));
    }
    sheet.save(path)?;
    tracing::info!(path = %path.display(), rows = entries.len(), "wrote workbook");
    Ok(if existed {
        format!("Appended data to: {}", path.display())
    } else {
        format!("Created new file: {}", path.display())
    })
}

/// Snapshot of ledger rows as `DB_Report_<timestamp>.xlsx` in `dir`.
pub fn export_records(records: &[StoredRecord], dir: &Path) -> Result<PathBuf> {
    let name = format!("DB_Report_{}.xlsx", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let path = dir.join(name);
    let mut sheet = Sheet::new();
    for record in records {
        sheet.push(record_values(record));
    }
    sheet.save(&path)?;
    Ok(path)
}

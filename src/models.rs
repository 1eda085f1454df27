use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "DEBIT",
            Self::Credit => "CREDIT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One advice extracted from recognised text, before it is saved anywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub ac_no: Option<String>,
    pub document_date: Option<String>,
    pub reference_no: Option<String>,
    /// Plain decimal string, e.g. `87300.06`.
    pub total_value: Option<String>,
    pub bank_name: Option<String>,
    pub company_name: Option<String>,
    pub currency: Option<String>,
    pub transaction: Option<Direction>,
    pub page: u32,
    pub source_file: Option<String>,
}

impl Entry {
    pub fn with_bank(bank_name: Option<&str>) -> Self {
        Self {
            ac_no: None,
            document_date: None,
            reference_no: None,
            total_value: None,
            bank_name: bank_name.map(str::to_string),
            company_name: None,
            currency: None,
            transaction: None,
            page: 1,
            source_file: None,
        }
    }

    pub fn total_as_f64(&self) -> f64 {
        parse_total(self.total_value.as_deref().unwrap_or_default())
    }
}

/// Row of the account master workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterAccount {
    pub ac_no: String,
    pub bank_name: Option<String>,
    pub account_name: Option<String>,
    pub currency: Option<String>,
}

/// Row of the `transactions` table.
#[derive(Debug, Clone, Serialize)]
pub struct StoredRecord {
    pub id: i64,
    pub ac_no: Option<String>,
    pub bank_name: Option<String>,
    pub company_name: Option<String>,
    pub currency: Option<String>,
    pub doc_date: Option<String>,
    pub ref_no: Option<String>,
    pub total_value: f64,
    pub transaction: Option<String>,
    pub source_file: Option<String>,
    pub source_checksum: Option<String>,
    pub page: Option<i64>,
    pub saved_at: String,
}

/// Commas are thousands separators; anything unparsable counts as zero.
pub fn parse_total(raw: &str) -> f64 {
    let s = raw.replace(',', "");
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return 0.0;
    }
    s.parse().unwrap_or(0.0)
}

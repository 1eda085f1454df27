use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{CashflowError, Result};
use crate::models::{Entry, MasterAccount};

/// Account master (`AC_Master.xlsx`): account number to bank, company and currency.
#[derive(Debug, Clone, Default)]
pub struct MasterTable {
    accounts: Vec<MasterAccount>,
}

pub(crate) fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        // Account numbers typed into Excel without a leading quote come back as floats.
        Data::Float(f) if f.fract() == 0.0 => format!("{f:.0}"),
        other => other.to_string().trim().to_string(),
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn header_key(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

fn clean_master_ac(raw: &str) -> String {
    raw.replace('\'', "").trim().to_string()
}

impl MasterTable {
    pub fn new(accounts: Vec<MasterAccount>) -> Self {
        Self { accounts }
    }

    /// Load the first worksheet. A missing file gives an empty table so
    /// extraction still works without reconciliation.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "account master not found, lookups disabled");
            return Ok(Self::default());
        }
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| CashflowError::Other(format!("{} has no worksheets", path.display())))??;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Ok(Self::default());
        };
        let column = |name: &str| header.iter().position(|c| header_key(&cell_text(c)) == name);
        let idx_ac = column("acno").ok_or_else(|| {
            CashflowError::Other(format!("{}: missing ACNO column", path.display()))
        })?;
        let idx_bank = column("bankname");
        let idx_name = column("accountname");
        let idx_currency = column("currency");

        let get = |row: &[Data], idx: Option<usize>| {
            idx.and_then(|i| row.get(i)).map(cell_text).and_then(non_empty)
        };
        let accounts: Vec<MasterAccount> = rows
            .filter_map(|row| {
                let ac_no = clean_master_ac(&row.get(idx_ac).map(cell_text).unwrap_or_default());
                if ac_no.is_empty() {
                    return None;
                }
                Some(MasterAccount {
                    ac_no,
                    bank_name: get(row, idx_bank),
                    account_name: get(row, idx_name),
                    currency: get(row, idx_currency),
                })
            })
            .collect();
        tracing::info!(count = accounts.len(), path = %path.display(), "loaded account master");
        Ok(Self { accounts })
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// First master row whose account number contains the query or is
    /// contained by it. OCR often drops or adds a branch prefix, hence the
    /// two-way containment.
    pub fn lookup(&self, ac_no: &str) -> Option<&MasterAccount> {
        let query: String = ac_no.trim().chars().filter(|c| *c != ' ').collect();
        if query.is_empty() {
            return None;
        }
        let found = self
            .accounts
            .iter()
            .find(|a| a.ac_no.contains(&query) || query.contains(&a.ac_no));
        if found.is_none() {
            tracing::debug!(ac_no = %query, "no master match");
        }
        found
    }

    /// Overwrite bank, company and currency from the master when the account is known.
    pub fn enrich(&self, entry: &mut Entry) {
        let Some(account) = entry.ac_no.as_deref().and_then(|ac| self.lookup(ac)) else {
            return;
        };
        entry.bank_name.clone_from(&account.bank_name);
        entry.company_name.clone_from(&account.account_name);
        entry.currency.clone_from(&account.currency);
    }

    /// Fill only blank bank, company and currency, leaving values already set
    /// (e.g. typed in by hand). A master row without a bank name fills nothing.
    pub fn fill_missing(&self, entry: &mut Entry) {
        let Some(account) = entry.ac_no.as_deref().and_then(|ac| self.lookup(ac)) else {
            return;
        };
        if blank(&account.bank_name) {
            return;
        }
        for (field, value) in [
            (&mut entry.bank_name, &account.bank_name),
            (&mut entry.company_name, &account.account_name),
            (&mut entry.currency, &account.currency),
        ] {
            if blank(field) {
                field.clone_from(value);
            }
        }
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

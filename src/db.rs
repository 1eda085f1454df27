use std::path::Path;

use rusqlite::{params_from_iter, Connection};

use crate::dates::normalize_date;
use crate::error::Result;
use crate::models::{Entry, StoredRecord};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ac_no TEXT,
    bank_name TEXT,
    company_name TEXT,
    currency TEXT,
    doc_date TEXT,
    ref_no TEXT,
    total_value REAL,
    transaction_details TEXT,
    source_file TEXT,
    source_checksum TEXT,
    page INTEGER,
    timestamp TEXT
);
";

// Columns added after the first release; older databases get them on open.
const LATE_COLUMNS: &[(&str, &str)] = &[
    ("currency", "TEXT"),
    ("source_checksum", "TEXT"),
    ("page", "INTEGER"),
];

pub const ALL: &str = "All";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    if let Some(dir) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

fn has_column(conn: &Connection, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare("PRAGMA table_info(transactions)")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names.iter().any(|n| n == column))
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    for (column, sql_type) in LATE_COLUMNS {
        if !has_column(conn, column)? {
            tracing::info!(column, "adding column to transactions");
            conn.execute_batch(&format!("ALTER TABLE transactions ADD COLUMN {column} {sql_type}"))?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Save
// ---------------------------------------------------------------------------

pub struct SaveResult {
    pub saved: usize,
    pub skipped: usize,
    pub duplicate_file: bool,
}

fn is_duplicate_row(conn: &Connection, entry: &Entry, doc_date: Option<&str>, total: f64) -> Result<bool> {
    let mut stmt = conn.prepare_cached(
        "SELECT 1 FROM transactions WHERE ac_no IS ?1 AND doc_date IS ?2 AND ref_no IS ?3 \
         AND total_value = ?4 AND transaction_details IS ?5",
    )?;
    Ok(stmt.exists(rusqlite::params![
        entry.ac_no,
        doc_date,
        entry.reference_no,
        total,
        entry.transaction.map(|t| t.as_str()),
    ])?)
}

/// Insert entries. Rows already present are skipped; if `checksum` matches a
/// file saved earlier nothing is inserted.
pub fn save_records(conn: &Connection, entries: &[Entry], checksum: Option<&str>) -> Result<SaveResult> {
    if let Some(sum) = checksum {
        let mut stmt = conn.prepare("SELECT 1 FROM transactions WHERE source_checksum = ?1")?;
        if stmt.exists([sum])? {
            return Ok(SaveResult {
                saved: 0,
                skipped: entries.len(),
                duplicate_file: true,
            });
        }
    }

    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let tx = conn.unchecked_transaction()?;
    let mut saved = 0usize;
    let mut skipped = 0usize;
    for entry in entries {
        let total = entry.total_as_f64();
        let doc_date = entry.document_date.as_deref().and_then(normalize_date);
        if is_duplicate_row(&tx, entry, doc_date.as_deref(), total)? {
            skipped += 1;
            continue;
        }
        tx.execute(
            "INSERT INTO transactions (ac_no, bank_name, company_name, currency, doc_date, ref_no, \
             total_value, transaction_details, source_file, source_checksum, page, timestamp) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            rusqlite::params![
                entry.ac_no,
                entry.bank_name,
                entry.company_name,
                entry.currency,
                doc_date,
                entry.reference_no,
                total,
                entry.transaction.map(|t| t.as_str()),
                entry.source_file,
                checksum,
                entry.page,
                now,
            ],
        )?;
        saved += 1;
    }
    tx.commit()?;
    Ok(SaveResult {
        saved,
        skipped,
        duplicate_file: false,
    })
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// `None` or `"All"` on any field means no filter on it.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub bank: Option<String>,
    pub company: Option<String>,
    pub currency: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty() && *v != ALL)
}

impl RecordFilter {
    fn where_clause(&self) -> (String, Vec<String>) {
        let mut clause = String::from("WHERE 1=1");
        let mut params = Vec::new();
        let mut push = |sql: &str, value: String| {
            params.push(value);
            clause.push_str(&format!(" AND {sql} ?{}", params.len()));
        };
        if let Some(bank) = active(&self.bank) {
            push("bank_name =", bank.to_string());
        }
        if let Some(company) = active(&self.company) {
            push("company_name =", company.to_string());
        }
        if let Some(currency) = active(&self.currency) {
            push("currency =", currency.to_string());
        }
        if let Some(from) = active(&self.from_date) {
            push("doc_date >=", from.to_string());
        }
        if let Some(to) = active(&self.to_date) {
            push("doc_date <=", to.to_string());
        }
        match (self.year, self.month) {
            (Some(y), Some(m)) => push("doc_date LIKE", format!("{y:04}-{m:02}-%")),
            (Some(y), None) => push("doc_date LIKE", format!("{y:04}-%")),
            _ => {}
        }
        (clause, params)
    }
}

pub fn load_records(conn: &Connection, filter: &RecordFilter) -> Result<Vec<StoredRecord>> {
    let (clause, params) = filter.where_clause();
    let sql = format!(
        "SELECT id, ac_no, bank_name, company_name, currency, doc_date, ref_no, total_value, \
         transaction_details, source_file, source_checksum, page, timestamp FROM transactions {clause} \
         ORDER BY id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            Ok(StoredRecord {
                id: row.get(0)?,
                ac_no: row.get(1)?,
                bank_name: row.get(2)?,
                company_name: row.get(3)?,
                currency: row.get(4)?,
                doc_date: row.get(5)?,
                ref_no: row.get(6)?,
                total_value: row.get::<_, Option<f64>>(7)?.unwrap_or(0.0),
                transaction: row.get(8)?,
                source_file: row.get(9)?,
                source_checksum: row.get(10)?,
                page: row.get(11)?,
                saved_at: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct Summary {
    pub count: i64,
    pub total: f64,
}

pub fn summary(conn: &Connection, filter: &RecordFilter) -> Result<Summary> {
    let (clause, params) = filter.where_clause();
    let sql = format!("SELECT count(*), COALESCE(SUM(total_value), 0) FROM transactions {clause}");
    let (count, total) = conn.query_row(&sql, params_from_iter(params.iter()), |r| {
        Ok((r.get(0)?, r.get(1)?))
    })?;
    Ok(Summary { count, total })
}

/// Choices for each filter, every list headed by `All`.
pub struct FilterOptions {
    pub banks: Vec<String>,
    pub companies: Vec<String>,
    pub currencies: Vec<String>,
    pub years: Vec<String>,
    pub months: Vec<String>,
}

fn distinct(conn: &Connection, expr: &str, condition: &str) -> Result<Vec<String>> {
    let sql = format!(
        "SELECT DISTINCT {expr} FROM transactions WHERE {condition} AND {expr} IS NOT NULL \
         AND {expr} != '' ORDER BY 1"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut values: Vec<String> = vec![ALL.to_string()];
    values.extend(
        stmt.query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?,
    );
    Ok(values)
}

const NORMALIZED_DATE: &str = "doc_date GLOB '[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]'";

pub fn filter_options(conn: &Connection) -> Result<FilterOptions> {
    Ok(FilterOptions {
        banks: distinct(conn, "bank_name", "1=1")?,
        companies: distinct(conn, "company_name", "1=1")?,
        currencies: distinct(conn, "currency", "1=1")?,
        years: distinct(conn, "substr(doc_date, 1, 4)", NORMALIZED_DATE)?,
        months: distinct(conn, "substr(doc_date, 6, 2)", NORMALIZED_DATE)?,
    })
}

pub fn delete_records(conn: &Connection, ids: &[i64]) -> Result<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    let placeholders = vec!["?"; ids.len()].join(",");
    let count = conn.execute(
        &format!("DELETE FROM transactions WHERE id IN ({placeholders})"),
        params_from_iter(ids.iter()),
    )?;
    Ok(count)
}

/// Rewrite stored document dates into `YYYY-MM-DD`. Returns the number of rows changed.
pub fn normalize_stored_dates(conn: &Connection) -> Result<usize> {
    let rows: Vec<(i64, String)> = {
        let mut stmt = conn.prepare("SELECT id, doc_date FROM transactions WHERE doc_date IS NOT NULL")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows
    };
    let tx = conn.unchecked_transaction()?;
    let mut updated = 0usize;
    for (id, old) in rows {
        let new = normalize_date(&old);
        if new.as_deref() != Some(old.as_str()) {
            tx.execute(
                "UPDATE transactions SET doc_date = ?1 WHERE id = ?2",
                rusqlite::params![new, id],
            )?;
            updated += 1;
        }
    }
    tx.commit()?;
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn entry(ac: &str, bank: &str, currency: &str, date: &str, total: &str) -> Entry {
        let mut e = Entry::with_bank(Some(bank));
        e.ac_no = Some(ac.to_string());
        e.currency = Some(currency.to_string());
        e.company_name = Some("CP Trading".to_string());
        e.document_date = Some(date.to_string());
        e.total_value = Some(total.to_string());
        e.transaction = Some(Direction::Debit);
        e.source_file = Some("a.pdf".to_string());
        e
    }

    fn sample(conn: &Connection) {
        let entries = vec![
            entry("111", "Krungthai", "USD", "2025-01-15", "100.00"),
            entry("222", "CIMB", "USD", "2025-02-03", "1,250.50"),
            entry("333", "CIMB", "SGD", "2024-12-31", "50.00"),
        ];
        save_records(conn, &entries, None).unwrap();
    }

    #[test]
    fn test_init_db_creates_table() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert!(tables.contains(&"transactions".to_string()));
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
    }

    #[test]
    fn test_init_db_upgrades_old_table() {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("old.db")).unwrap();
        conn.execute_batch(
            "CREATE TABLE transactions (id INTEGER PRIMARY KEY AUTOINCREMENT, ac_no TEXT, bank_name TEXT, \
             company_name TEXT, doc_date TEXT, ref_no TEXT, total_value REAL, transaction_details TEXT, \
             source_file TEXT, timestamp TEXT)",
        )
        .unwrap();
        init_db(&conn).unwrap();
        for column in ["currency", "source_checksum", "page"] {
            assert!(has_column(&conn, column).unwrap(), "missing column: {column}");
        }
    }

    #[test]
    fn test_save_and_load() {
        let (_dir, conn) = test_db();
        sample(&conn);
        let records = load_records(&conn, &RecordFilter::default()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].total_value, 1250.5);
        assert_eq!(records[1].transaction.as_deref(), Some("DEBIT"));
        assert_eq!(records[0].page, Some(1));
        assert!(!records[0].saved_at.is_empty());
    }

    #[test]
    fn test_save_normalizes_dates_and_keeps_nulls() {
        let (_dir, conn) = test_db();
        let mut e = Entry::with_bank(None);
        e.document_date = Some("02-Dec-2025".to_string());
        save_records(&conn, &[e], None).unwrap();
        let r = &load_records(&conn, &RecordFilter::default()).unwrap()[0];
        assert_eq!(r.doc_date.as_deref(), Some("2025-12-02"));
        assert_eq!(r.bank_name, None);
        assert_eq!(r.total_value, 0.0);
    }

    #[test]
    fn test_save_skips_duplicate_rows() {
        let (_dir, conn) = test_db();
        sample(&conn);
        let again = vec![
            entry("111", "Krungthai", "USD", "2025-01-15", "100.00"),
            entry("444", "CIMB", "USD", "2025-03-01", "9.99"),
        ];
        let result = save_records(&conn, &again, None).unwrap();
        assert_eq!(result.saved, 1);
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_save_skips_duplicate_with_raw_date() {
        let (_dir, conn) = test_db();
        let raw = entry("111", "Krungthai", "USD", "15-Jan-2025", "100.00");
        assert_eq!(save_records(&conn, &[raw.clone()], None).unwrap().saved, 1);
        let again = save_records(&conn, &[raw], None).unwrap();
        assert_eq!(again.saved, 0);
        assert_eq!(again.skipped, 1);
        let normalized = entry("111", "Krungthai", "USD", "2025-01-15", "100.00");
        assert_eq!(save_records(&conn, &[normalized], None).unwrap().skipped, 1);
    }

    #[test]
    fn test_save_detects_duplicate_file() {
        let (_dir, conn) = test_db();
        let entries = vec![entry("111", "Krungthai", "USD", "2025-01-15", "100.00")];
        let r1 = save_records(&conn, &entries, Some("abc123")).unwrap();
        assert_eq!(r1.saved, 1);
        let r2 = save_records(&conn, &entries, Some("abc123")).unwrap();
        assert!(r2.duplicate_file);
        assert_eq!(r2.saved, 0);
        let stored = load_records(&conn, &RecordFilter::default()).unwrap();
        assert_eq!(stored[0].source_checksum.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_filters() {
        let (_dir, conn) = test_db();
        sample(&conn);
        let by_bank = RecordFilter {
            bank: Some("CIMB".to_string()),
            ..Default::default()
        };
        assert_eq!(load_records(&conn, &by_bank).unwrap().len(), 2);

        let all = RecordFilter {
            bank: Some(ALL.to_string()),
            currency: Some("USD".to_string()),
            ..Default::default()
        };
        assert_eq!(load_records(&conn, &all).unwrap().len(), 2);

        let range = RecordFilter {
            from_date: Some("2025-01-01".to_string()),
            to_date: Some("2025-01-31".to_string()),
            ..Default::default()
        };
        let records = load_records(&conn, &range).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ac_no.as_deref(), Some("111"));

        let month = RecordFilter {
            year: Some(2025),
            month: Some(2),
            ..Default::default()
        };
        assert_eq!(load_records(&conn, &month).unwrap()[0].ac_no.as_deref(), Some("222"));

        let year = RecordFilter {
            year: Some(2024),
            ..Default::default()
        };
        assert_eq!(load_records(&conn, &year).unwrap().len(), 1);
    }

    #[test]
    fn test_summary() {
        let (_dir, conn) = test_db();
        sample(&conn);
        let s = summary(&conn, &RecordFilter::default()).unwrap();
        assert_eq!(s.count, 3);
        assert!((s.total - 1400.5).abs() < 1e-9);
        let empty = summary(
            &conn,
            &RecordFilter {
                bank: Some("Nope".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(empty.count, 0);
        assert_eq!(empty.total, 0.0);
    }

    #[test]
    fn test_filter_options() {
        let (_dir, conn) = test_db();
        sample(&conn);
        let o = filter_options(&conn).unwrap();
        assert_eq!(o.banks, vec!["All", "CIMB", "Krungthai"]);
        assert_eq!(o.currencies, vec!["All", "SGD", "USD"]);
        assert_eq!(o.years, vec!["All", "2024", "2025"]);
        assert_eq!(o.months, vec!["All", "01", "02", "12"]);
    }

    #[test]
    fn test_delete_records() {
        let (_dir, conn) = test_db();
        sample(&conn);
        let ids: Vec<i64> = load_records(&conn, &RecordFilter::default())
            .unwrap()
            .iter()
            .take(2)
            .map(|r| r.id)
            .collect();
        assert_eq!(delete_records(&conn, &ids).unwrap(), 2);
        assert_eq!(delete_records(&conn, &[]).unwrap(), 0);
        assert_eq!(load_records(&conn, &RecordFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_normalize_stored_dates() {
        let (_dir, conn) = test_db();
        conn.execute_batch(
            "INSERT INTO transactions (doc_date, total_value) VALUES ('01-Jan-2024', 1.0);
             INSERT INTO transactions (doc_date, total_value) VALUES ('2024-05-20', 1.0);
             INSERT INTO transactions (doc_date, total_value) VALUES ('05/12/2025', 1.0);
             INSERT INTO transactions (doc_date, total_value) VALUES ('   ', 1.0);",
        )
        .unwrap();
        assert_eq!(normalize_stored_dates(&conn).unwrap(), 3);
        let dates: Vec<Option<String>> = load_records(&conn, &RecordFilter::default())
            .unwrap()
            .into_iter()
            .map(|r| r.doc_date)
            .collect();
        assert_eq!(
            dates,
            vec![
                Some("2024-01-01".to_string()),
                Some("2024-05-20".to_string()),
                Some("2025-12-05".to_string()),
                None,
            ]
        );
        assert_eq!(normalize_stored_dates(&conn).unwrap(), 0);
    }
}

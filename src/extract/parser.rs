use std::sync::OnceLock;

use regex::Regex;

use super::money::{currency_values, money_values};
use crate::models::{Direction, Entry};

// ---------------------------------------------------------------------------
// Bank parsers — enum dispatch instead of trait objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankParser {
    Krungthai,
    Cimb,
    Generic,
}

impl BankParser {
    /// Pick a parser from the whole document text.
    pub fn detect(text: &str) -> Self {
        let upper = text.to_uppercase();
        if upper.contains("KRUNGTHAI") {
            Self::Krungthai
        } else if upper.contains("CIMB") {
            Self::Cimb
        } else {
            Self::Generic
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Krungthai => "Krungthai",
            Self::Cimb => "CIMB",
            Self::Generic => "Generic",
        }
    }

    /// Bank name filled in before any master lookup.
    pub fn default_bank(&self) -> Option<&'static str> {
        match self {
            Self::Krungthai => Some("Krungthai"),
            Self::Cimb => Some("CIMB"),
            Self::Generic => None,
        }
    }

    pub fn extract_chunk(&self, text: &str) -> Entry {
        let mut entry = Entry::with_bank(self.default_bank());
        match self {
            Self::Krungthai | Self::Generic => extract_krungthai(text, &mut entry),
            Self::Cimb => extract_cimb(text, &mut entry),
        }
        entry
    }
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid regex")
}

fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|p| p.captures(text))
        .and_then(|c| c.get(1).map(|m| m.as_str().trim().to_string()))
}

pub(crate) fn detect_direction(text: &str) -> Option<Direction> {
    static DEBIT: OnceLock<Regex> = OnceLock::new();
    static CREDIT: OnceLock<Regex> = OnceLock::new();
    if DEBIT.get_or_init(|| re(r"(?i)DEBIT\s*ADVICE")).is_match(text) {
        Some(Direction::Debit)
    } else if CREDIT.get_or_init(|| re(r"(?i)CREDIT\s*ADVICE")).is_match(text) {
        Some(Direction::Credit)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Krungthai (also the generic fallback)
// ---------------------------------------------------------------------------

struct KrungthaiPatterns {
    account: [Regex; 3],
    dates: [Regex; 3],
    reference: Regex,
    reference_code: Regex,
    // unanchored, for codes glued to a spilled label
    reference_code_inner: Regex,
    shipment_receipt: Regex,
    advice: Regex,
    // (keyword, take the last value instead of the first)
    totals: Vec<(Regex, bool)>,
}

fn krungthai_patterns() -> &'static KrungthaiPatterns {
    static PATTERNS: OnceLock<KrungthaiPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let label = r"(?:A[/|I]?C['\s]*NO|Account\s*No|AVCNO|AIC\s?No)";
        KrungthaiPatterns {
            account: [
                re(&format!(r"(?i){label}[;:.\s=]*\s*([\d=-]{{7,}})")),
                re(r"(?i)Id>([\d-]{7,})</Id"),
                re(&format!(r"(?i){label}[;:.\s=]*\s*([\d=-]+)")),
            ],
            dates: [
                re(r"(?i)Date\s*[;:.]?\s*(\d{1,2}-\w{3}-\d{4})"),
                re(r"(?i)(\b\d{1,2}-\w{3}-\d{4}\b)"),
                re(r"(?i)([A-Z]+ \d{1,2}, \d{4})"),
            ],
            reference: re(
                r"(?i)(?:Our Ref|B/C|REFERENCE NO\.|Our Ref[:;]|c/o.*?[:;])\s*[;:.]?\s*([\w/ -]{5,})",
            ),
            reference_code: re(r"(?i)\b((?:OR|IC|EC|BC)\s?\d{2}/\d{4})\b"),
            reference_code_inner: re(r"((?:OR|IC|EC|BC)\s?\d{2}/\d{4})"),
            shipment_receipt: re(r"(?i)Shipment\s*Receipt"),
            advice: re(r"(?i)ADVICE"),
            totals: vec![
                (re(r"(?i)A[nm]ount\s*Credited"), false),
                (re(r"(?i)Total\s*Debited"), false),
                (re(r"(?i)Total\s*Credited"), false),
                (re(r"(?i)Total\s*Amount"), false),
                (re(r"(?i)Total\s*Value"), false),
                (re(r"(?i)Debit\s*Amount"), false),
                (re(r"(?i)Credit\s*Amount"), false),
                // weak keyword: the last figure after it is usually the total
                (re(r"(?i)Amount"), true),
            ],
        }
    })
}

fn krungthai_account(p: &KrungthaiPatterns, text: &str) -> Option<String> {
    for pattern in &p.account {
        if let Some(m) = pattern.captures(text).and_then(|c| c.get(1)) {
            let value = m.as_str().trim().replace('=', "-");
            if value.chars().count() >= 5 {
                return Some(value);
            }
        }
    }
    None
}

fn krungthai_reference(p: &KrungthaiPatterns, text: &str) -> Option<String> {
    let candidate = p
        .reference
        .captures(text)
        .or_else(|| p.reference_code.captures(text))
        .and_then(|c| c.get(1))?;
    let line = candidate
        .as_str()
        .trim()
        .lines()
        .next()
        .unwrap_or_default()
        .trim()
        .to_string();
    if line.is_empty() {
        return None;
    }
    let upper = line.to_uppercase();
    if ["A/C", "AMOUNT", "DATE"].iter().any(|w| upper.contains(w)) {
        // Label spilled into the next field; salvage a bare reference code if there is one.
        return p
            .reference_code_inner
            .captures(&line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string());
    }
    Some(line)
}

fn krungthai_total(p: &KrungthaiPatterns, text: &str) -> Option<String> {
    if p.shipment_receipt.is_match(text) && !p.advice.is_match(text) {
        return None;
    }
    for (keyword, pick_last) in &p.totals {
        let Some(m) = keyword.find(text) else {
            continue;
        };
        let values = money_values(&text[m.end()..]);
        let value = if *pick_last { values.last() } else { values.first() };
        if let Some(v) = value {
            return Some(v.clone());
        }
    }
    money_values(text).pop()
}

fn extract_krungthai(text: &str, entry: &mut Entry) {
    let p = krungthai_patterns();
    entry.ac_no = krungthai_account(p, text);
    entry.document_date = first_capture(&p.dates, text);
    entry.reference_no = krungthai_reference(p, text);
    entry.transaction = detect_direction(text);
    if entry.transaction.is_some() {
        entry.total_value = krungthai_total(p, text);
    }
}

// ---------------------------------------------------------------------------
// CIMB
// ---------------------------------------------------------------------------

struct CimbPatterns {
    account: [Regex; 4],
    dates: [Regex; 2],
    reference: [Regex; 3],
}

fn cimb_patterns() -> &'static CimbPatterns {
    static PATTERNS: OnceLock<CimbPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| CimbPatterns {
        account: [
            re(r"(?i)Account\s*No[.,\s]*\s*(\d+)"),
            re(r"(?i)A/C\s*No[.,\s]*\s*(\d+)"),
            re(r"(?i)Debit\s*Current\s*Account\s*[(\[]?\s*Account\s*No[.,\s]*\s*(\d+)"),
            re(r"(?i)Current\s*Account\s*[(\[]?\s*Account\s*No[.,\s]*\s*(\d+)\s*[)\]]?"),
        ],
        dates: [
            re(r"(?i)Date\s*:\s*(\d{1,2}/\d{1,2}/\d{4})"),
            re(r"(?i)Date\s*:\s*(\d{1,2}-\d{1,2}-\d{4})"),
        ],
        reference: [
            re(r"(?i)Inward\s*Bill\s*Collection\s*No\.?\s*[:;.-]?\s*([\w/-]{5,})"),
            re(r"(?i)Our\s*Ref\s*[:;.-]?\s*([\w/-]{5,})"),
            re(r"(?i)SWIFT\s*ID\s*[:;.-]?\s*(\w{5,})"),
        ],
    })
}

fn extract_cimb(text: &str, entry: &mut Entry) {
    let p = cimb_patterns();
    entry.ac_no = first_capture(&p.account, text);
    entry.document_date = first_capture(&p.dates, text);
    entry.reference_no = first_capture(&p.reference, text);
    entry.transaction = detect_direction(text);
    if entry.transaction.is_some() {
        // Figures printed after a currency code are amounts; bare ones may be rates.
        entry.total_value = currency_values(text)
            .pop()
            .or_else(|| money_values(text).pop());
    }
}

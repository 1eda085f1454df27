//! Field extraction from recognised advice text.
//!
//! A document may hold several advices (one per page, or several on a page).
//! The text is cut in front of every advice heading and page marker, each
//! chunk is run through the bank's parser, and header fields (account, date,
//! reference) printed once at the top are carried forward onto the advices
//! that follow them.

pub mod money;
pub mod parser;

use std::sync::OnceLock;

use regex::Regex;

use crate::dates::normalize_date;
use crate::models::Entry;
pub use parser::BankParser;

/// Written by the OCR step in front of every page's text.
pub fn page_marker(page: usize) -> String {
    format!("--- Page {page} ---")
}

fn page_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"--- Page (\d+) ---").expect("valid regex"))
}

fn chunk_boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)DEBIT ADVICE|CREDIT ADVICE|RECEIPT NO\.|Shipment Receipt|--- Page \d+ ---")
            .expect("valid regex")
    })
}

fn advice_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)DEBIT\s*ADVICE|CREDIT\s*ADVICE").expect("valid regex"))
}

/// (byte offset, page number) of every page marker, in order.
fn page_map(text: &str) -> Vec<(usize, u32)> {
    let mut map: Vec<(usize, u32)> = page_marker_re()
        .captures_iter(text)
        .filter_map(|c| {
            let start = c.get(0)?.start();
            let page = c.get(1)?.as_str().parse().ok()?;
            Some((start, page))
        })
        .collect();
    if map.is_empty() {
        map.push((0, 1));
    }
    map
}

fn page_at(map: &[(usize, u32)], offset: usize) -> u32 {
    map.iter()
        .take_while(|(start, _)| *start <= offset)
        .last()
        .map_or(1, |(_, page)| *page)
}

/// Split in front of every boundary, keeping the boundary text with the chunk
/// it starts. Returns (offset, chunk) pairs; empty chunks are dropped.
fn split_chunks(text: &str) -> Vec<(usize, &str)> {
    let mut cuts: Vec<usize> = chunk_boundary_re().find_iter(text).map(|m| m.start()).collect();
    cuts.insert(0, 0);
    cuts.push(text.len());
    cuts.dedup();
    cuts.windows(2)
        .map(|w| (w[0], &text[w[0]..w[1]]))
        .filter(|(_, chunk)| !chunk.is_empty())
        .collect()
}

#[derive(Default)]
struct HeaderState {
    document_date: Option<String>,
    reference_no: Option<String>,
    ac_no: Option<String>,
}

impl HeaderState {
    /// Values found in this chunk become the new header; missing ones are filled from it.
    fn merge(&mut self, entry: &mut Entry) {
        carry(&mut self.document_date, &mut entry.document_date);
        carry(&mut self.reference_no, &mut entry.reference_no);
        carry(&mut self.ac_no, &mut entry.ac_no);
    }
}

/// A blank value counts as missing.
fn carry(state: &mut Option<String>, field: &mut Option<String>) {
    if field.as_deref().is_some_and(|v| !v.trim().is_empty()) {
        state.clone_from(field);
    } else {
        field.clone_from(state);
    }
}

fn backfill(target: &mut Entry, from: &Entry) {
    if target.document_date.is_none() {
        target.document_date.clone_from(&from.document_date);
    }
    if target.reference_no.is_none() {
        target.reference_no.clone_from(&from.reference_no);
    }
    if target.ac_no.is_none() {
        target.ac_no.clone_from(&from.ac_no);
    }
}

/// Extract every advice in `text`, using the parser detected for the whole document.
pub fn extract_all_entries(text: &str) -> Vec<Entry> {
    extract_with(BankParser::detect(text), text)
}

pub fn extract_with(parser: BankParser, text: &str) -> Vec<Entry> {
    tracing::info!(parser = parser.name(), "extracting entries");
    let pages = page_map(text);
    let mut header = HeaderState::default();
    let mut results: Vec<Entry> = Vec::new();

    for (offset, chunk) in split_chunks(text) {
        let is_advice = advice_re().is_match(chunk);
        let mut entry = parser.extract_chunk(chunk);
        entry.page = page_at(&pages, offset);
        header.merge(&mut entry);

        if is_advice || entry.transaction.is_some() {
            results.push(entry);
        } else if entry.total_value.is_none()
            && entry.company_name.is_none()
            && entry.currency.is_none()
        {
            // Trailing header-only chunk: fill what the last advice is missing.
            if let Some(last) = results.last_mut() {
                backfill(last, &entry);
            }
        }
    }

    for entry in &mut results {
        entry.document_date = entry.document_date.as_deref().and_then(normalize_date);
    }
    tracing::debug!(count = results.len(), "entries extracted");
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;

    #[test]
    fn test_valid_advice() {
        let text = "
    KRUNGTHAI BANK
    DEBIT ADVICE
    A/C NO : 123-456-789
    Date : 01-Jan-2024
    Our Ref : OR12/2024
    Total Amount : 1,000.00
    ";
        let results = extract_all_entries(text);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].transaction, Some(Direction::Debit));
        assert_eq!(results[0].total_value.as_deref(), Some("1000.00"));
        assert_eq!(results[0].ac_no.as_deref(), Some("123-456-789"));
        assert_eq!(results[0].reference_no.as_deref(), Some("OR12/2024"));
        assert_eq!(results[0].document_date.as_deref(), Some("2024-01-01"));
        assert_eq!(results[0].bank_name.as_deref(), Some("Krungthai"));
    }

    #[test]
    fn test_document_without_advice_is_skipped() {
        let text = "
    KRUNGTHAI BANK
    SOME OTHER DOCUMENT
    A/C NO : 123-456-789
    Date : 01-Jan-2024
    Amount : 5,000.00
    ";
        assert!(extract_all_entries(text).is_empty());
    }

    #[test]
    fn test_header_carried_across_pages() {
        let text = "
    --- Page 1 ---
    KRUNGTHAI BANK
    A/C NO : 123-456-789

    --- Page 2 ---
    CREDIT ADVICE
    Date : 02-Jan-2024
    Total Amount : 2,500.00
    ";
        let results = extract_all_entries(text);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ac_no.as_deref(), Some("123-456-789"));
        assert_eq!(results[0].transaction, Some(Direction::Credit));
        assert_eq!(results[0].total_value.as_deref(), Some("2500.00"));
        assert_eq!(results[0].page, 2);
    }

    #[test]
    fn test_blank_reference_taken_from_header() {
        let text = "KRUNGTHAI\nOur Ref: IC 25/0001\nA/C NO: 111-222-333\n\
                    DEBIT ADVICE\nOur Ref:       :\nTotal Debited USD 10.00";
        let results = extract_all_entries(text);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].reference_no.as_deref(), Some("IC 25/0001"));
        assert_eq!(results[0].ac_no.as_deref(), Some("111-222-333"));
    }

    #[test]
    fn test_carry_treats_blank_as_missing() {
        let mut state = Some("IC 25/0001".to_string());
        let mut field = Some("  ".to_string());
        carry(&mut state, &mut field);
        assert_eq!(field.as_deref(), Some("IC 25/0001"));
        assert_eq!(state.as_deref(), Some("IC 25/0001"));

        let mut field = Some("EC 25/0002".to_string());
        carry(&mut state, &mut field);
        assert_eq!(state.as_deref(), Some("EC 25/0002"));
    }

    #[test]
    fn test_multiple_advices_on_one_page() {
        let text = "KRUNGTHAI BANK\nA/C NO: 111-222-333\nDate : 03-Mar-2025\n\
                    DEBIT ADVICE\nOur Ref: IC 25/0001\nTotal Debited : USD 100.00\n\
                    CREDIT ADVICE\nOur Ref: EC 25/0002\nAmount Credited : USD 250.50\n";
        let results = extract_all_entries(text);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].transaction, Some(Direction::Debit));
        assert_eq!(results[0].total_value.as_deref(), Some("100.00"));
        assert_eq!(results[1].transaction, Some(Direction::Credit));
        assert_eq!(results[1].reference_no.as_deref(), Some("EC 25/0002"));
        assert_eq!(results[1].total_value.as_deref(), Some("250.50"));
        for r in &results {
            assert_eq!(r.ac_no.as_deref(), Some("111-222-333"));
            assert_eq!(r.document_date.as_deref(), Some("2025-03-03"));
        }
    }

    #[test]
    fn test_trailing_header_backfills_last_advice() {
        let text = "KRUNGTHAI\nDEBIT ADVICE\nTotal Debited USD 10.00\n\
                    --- Page 2 ---\nA/C NO: 555-666-777\n";
        let results = extract_all_entries(text);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].ac_no.as_deref(), Some("555-666-777"));
        assert_eq!(results[0].page, 1);
    }

    #[test]
    fn test_cimb_document() {
        let text = "hal CIMB BANK\n\nCIMB BANK SINGAPORE\nTRADE SERVICES\n\n\
                    SWIFT 1D: CIBBSGSG\n\nDate: 23/12/2025\n\nDear Sir/Madam,\n\n\
                    DEBIT ADVICE\n\nORIGINAL COPY\n\n\
                    Inward Bill Collection No.: 025001631715\nMaturity Date                :\n\n\
                    For USD132,046.20\nRate 1.290150000\n\n\
                    Debit Current Account (Account No, 2200027067340)\n\n\
                    Courier                                                USD                32.00\n\
                    Commission in Lieu                                  USD               100.00\n\n\
                    SGD170,359.40\n\nUSD\n0.00\n\n132,046.20\nUSD132,292.73\n\nPage 1/1\n";
        assert_eq!(BankParser::detect(text), BankParser::Cimb);
        let results = extract_all_entries(text);
        assert_eq!(results.len(), 1);
        let e = &results[0];
        assert_eq!(e.bank_name.as_deref(), Some("CIMB"));
        assert_eq!(e.ac_no.as_deref(), Some("2200027067340"));
        assert_eq!(e.reference_no.as_deref(), Some("025001631715"));
        assert_eq!(e.document_date.as_deref(), Some("2025-12-23"));
        assert_eq!(e.total_value.as_deref(), Some("132292.73"));
    }

    #[test]
    fn test_shipment_receipt_chunk_is_not_an_entry() {
        let text = "KRUNGTHAI\nDEBIT ADVICE\nTotal Debited USD 10.00\n\
                    Shipment Receipt\nGross weight 1,200.00\n";
        let results = extract_all_entries(text);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].total_value.as_deref(), Some("10.00"));
    }

    #[test]
    fn test_page_at() {
        let map = vec![(0, 1), (100, 2), (250, 3)];
        assert_eq!(page_at(&map, 0), 1);
        assert_eq!(page_at(&map, 99), 1);
        assert_eq!(page_at(&map, 100), 2);
        assert_eq!(page_at(&map, 400), 3);
    }

    #[test]
    fn test_split_chunks_keeps_boundary_text() {
        let chunks = split_chunks("head DEBIT ADVICE one credit advice two");
        let texts: Vec<&str> = chunks.iter().map(|(_, c)| *c).collect();
        assert_eq!(texts, vec!["head ", "DEBIT ADVICE one ", "credit advice two"]);
        assert_eq!(chunks[1].0, 5);
    }
}

use super::FieldSet;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

/// A GSTIN is always 15 characters long.
const GSTIN_LEN: usize = 15;

lazy_static! {
    /// Labeled variants first, then a bare GSTIN-shaped token.
    static ref GSTIN_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)GSTIN\s*[:\-]?\s*([A-Z0-9]{13,16})").unwrap(),
        Regex::new(r"(?i)GST\s*Number\s*[:\-]?\s*([A-Z0-9]{13,16})").unwrap(),
        Regex::new(r"(?i)GST\s*IN\s*[:\-]?\s*([A-Z0-9]{13,16})").unwrap(),
        Regex::new(r"(?i)([0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z])").unwrap(),
    ];

    static ref INVOICE_NO_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)Invoice\s*(?:No\.?|Number)?\s*[:\-]?\s*([A-Za-z0-9\-/]+)").unwrap(),
        Regex::new(r"(?i)Chalan\s*No\s*[:\-]?\s*([A-Za-z0-9\-/]+)").unwrap(),
        Regex::new(r"(?i)PO\.?\s*No\s*[:\-]?\s*([A-Za-z0-9\-/]+)").unwrap(),
        Regex::new(r"(?i)No\s*[:\-]?\s*([A-Za-z0-9\-/]+)").unwrap(),
        // Any long alphanumeric run
        Regex::new(r"(?i)([A-Za-z0-9]{6,})").unwrap(),
    ];

    /// Amounts keep their thousands separators as written.
    static ref TOTAL_AMOUNT_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)Total\s*Amount\s*[:\-]?\s*([\d,]+\.\d{2})").unwrap(),
        Regex::new(r"(?i)Total\s*[:\-]?\s*([\d,]+\.\d{2})").unwrap(),
        Regex::new(r"(?i)[₹Rs\.]?\s*([\d,]+\.\d{2})").unwrap(),
    ];
}

/// Extract the three GST invoice fields. Each field is searched independently.
pub fn extract(text: &str) -> FieldSet {
    let mut fields = FieldSet::new();
    fields.insert("gstin", extract_gstin(text));
    fields.insert("invoice_no", extract_invoice_no(text));
    fields.insert("total_amount", extract_total_amount(text));
    fields
}

/// Only the first match of each pattern counts. A capture that is not exactly
/// 15 characters is dropped and the next pattern is tried.
fn extract_gstin(text: &str) -> Option<String> {
    for (idx, re) in GSTIN_PATTERNS.iter().enumerate() {
        let Some(cap) = re.captures(text) else {
            continue;
        };
        let candidate = &cap[1];
        if candidate.chars().count() == GSTIN_LEN {
            return Some(candidate.to_string());
        }
        debug!(pattern = idx, candidate, "GSTIN candidate has wrong length, trying next pattern");
    }
    None
}

fn extract_invoice_no(text: &str) -> Option<String> {
    first_capture(&INVOICE_NO_PATTERNS, text)
}

fn extract_total_amount(text: &str) -> Option<String> {
    first_capture(&TOTAL_AMOUNT_PATTERNS, text)
}

/// Capture group 1 of the first pattern that matches anywhere in `text`.
fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .map(|c| c[1].to_string())
}

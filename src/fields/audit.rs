use super::FieldSet;
use lazy_static::lazy_static;
use regex::Regex;

/// Longest auditor comment block we capture, in characters.
const MAX_COMMENT_CHARS: usize = 300;

lazy_static! {
    /// First line of the document, provided "AUDIT REPORT" appears somewhere after it.
    static ref ORGANIZATION_RE: Regex =
        Regex::new(r"(?is)\A\s*([A-Za-z &\(\)\.\-]+)\s*\n.*AUDIT REPORT").unwrap();

    static ref PERIOD_RE: Regex =
        Regex::new(r"(?i)For the Period\s*([A-Za-z0-9\s\-/]+)").unwrap();

    /// The signature line is optional; an anchor with nothing captured yields "".
    static ref AUDITOR_RE: Regex =
        Regex::new(r"(?i)PRINT NAME & SIGNATURE\s*\n*(.*\n)?\s*Auditor").unwrap();

    static ref OPINION_ANCHOR_RE: Regex = Regex::new(r"(?i)In my opinion").unwrap();

    /// A blank line, or an ALL-CAPS heading line.
    static ref OPINION_END_RE: Regex = Regex::new(r"\n\s*\n|\n[A-Z][A-Z ]+\n").unwrap();

    static ref DATE_RE: Regex = Regex::new(r"(\d{1,2}\s+[A-Za-z]{3,}\s+\d{4})").unwrap();

    static ref INCOME_RE: Regex = Regex::new(r"(?i)TOTAL INCOME\s*\$([\d,\.]+)").unwrap();

    static ref EXPENSES_RE: Regex = Regex::new(r"(?i)TOTAL EXPENSES?\s*\$([\d,\.]+)").unwrap();

    static ref NET_WORTH_RE: Regex = Regex::new(r"(?i)NET WORTH[^\$]*\$([\d,\.]+)").unwrap();

    static ref COMMENTS_RE: Regex = Regex::new(&format!(
        r"(?i)AUDITOR COMMENTS?[\s:]*([\s\S]{{0,{MAX_COMMENT_CHARS}}}?)\n\n"
    ))
    .unwrap();
}

/// Extract all nine audit report fields. Every field is present in the result;
/// anything not found is an empty string.
pub fn extract(text: &str) -> FieldSet {
    let mut fields = FieldSet::new();
    fields.insert("organization_name", trimmed(&ORGANIZATION_RE, text));
    fields.insert("audit_period", trimmed(&PERIOD_RE, text));
    fields.insert("auditor_name", extract_auditor_name(text));
    fields.insert("opinion", extract_opinion(text));
    fields.insert("report_date", trimmed(&DATE_RE, text));
    fields.insert("total_income", trimmed(&INCOME_RE, text));
    fields.insert("total_expenses", trimmed(&EXPENSES_RE, text));
    fields.insert("net_worth", trimmed(&NET_WORTH_RE, text));
    fields.insert("auditor_comments", trimmed(&COMMENTS_RE, text));
    fields
}

/// Trimmed capture group 1 of the first match, or "".
fn trimmed(re: &Regex, text: &str) -> Option<String> {
    let value = re
        .captures(text)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();
    Some(value)
}

fn extract_auditor_name(text: &str) -> Option<String> {
    let value = AUDITOR_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    Some(value)
}

/// The opinion starts on the line after "In my opinion" (the remainder of the
/// anchor line is skipped) and runs to the first blank line or ALL-CAPS heading.
/// Line breaks inside it become spaces.
///
/// An anchor with no terminator anywhere after it is skipped in favour of the
/// next anchor. If the only terminator lies in the whitespace right after the
/// anchor line, the opinion is empty.
fn extract_opinion(text: &str) -> Option<String> {
    for anchor in OPINION_ANCHOR_RE.find_iter(text) {
        let line_end = text[anchor.end()..]
            .find('\n')
            .map_or(text.len(), |i| anchor.end() + i);
        let body_start = text[line_end..]
            .find(|c: char| !c.is_whitespace())
            .map_or(text.len(), |i| line_end + i);

        if let Some(end) = OPINION_END_RE.find_at(text, body_start) {
            let opinion = text[body_start..end.start()].replace('\n', " ");
            return Some(opinion.trim().to_string());
        }
        if let Some(end) = OPINION_END_RE.find_at(text, line_end) {
            if end.start() < body_start {
                return Some(String::new());
            }
        }
    }
    Some(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Green Valley Trust
INDEPENDENT AUDIT REPORT
For the Period 1 April 2023 - 31 March 2024
(Amounts in USD)

In my opinion, and to the best of my information,
the accounts give a true and fair view
of the state of affairs of the trust.

FINANCIAL SUMMARY
TOTAL INCOME $125,400.50
TOTAL EXPENSES $98,200.00
NET WORTH (closing) $27,200.50

AUDITOR COMMENTS:
Cash book reconciled monthly.
No material misstatement noted.

PRINT NAME & SIGNATURE
R. K. Sharma
Auditor
Dated 15 May 2024
";

    #[test]
    fn test_full_report() {
        let fields = extract(SAMPLE);
        assert_eq!(fields.get("organization_name"), Some("Green Valley Trust"));
        assert_eq!(fields.get("audit_period"), Some("1 April 2023 - 31 March 2024"));
        assert_eq!(fields.get("auditor_name"), Some("R. K. Sharma"));
        assert_eq!(
            fields.get("opinion"),
            Some("the accounts give a true and fair view of the state of affairs of the trust.")
        );
        assert_eq!(fields.get("report_date"), Some("1 April 2023"));
        assert_eq!(fields.get("total_income"), Some("125,400.50"));
        assert_eq!(fields.get("total_expenses"), Some("98,200.00"));
        assert_eq!(fields.get("net_worth"), Some("27,200.50"));
        assert_eq!(
            fields.get("auditor_comments"),
            Some("Cash book reconciled monthly.\nNo material misstatement noted.")
        );
    }

    #[test]
    fn test_empty_text_gives_all_empty_strings() {
        let fields = extract("");
        assert_eq!(fields.len(), 9);
        for (name, value) in fields.iter() {
            assert_eq!(value, Some(""), "{name}");
        }
    }

    #[test]
    fn test_auditor_anchor_without_name_is_empty_string() {
        let text = "PRINT NAME & SIGNATURE\nAuditor\n";
        assert_eq!(extract_auditor_name(text).as_deref(), Some(""));
    }

    #[test]
    fn test_opinion_stops_at_caps_heading() {
        let text = "In my opinion:\nAll records were kept\nproperly\nBALANCE SHEET\nmore";
        assert_eq!(
            extract_opinion(text).as_deref(),
            Some("All records were kept properly")
        );
    }

    #[test]
    fn test_opinion_needs_a_terminator() {
        assert_eq!(extract_opinion("In my opinion\nunterminated text").as_deref(), Some(""));
        // Only a blank line right after the anchor: captured text is empty.
        assert_eq!(extract_opinion("In my opinion\n\nrest of it").as_deref(), Some(""));
    }

    #[test]
    fn test_organization_requires_audit_report_heading() {
        assert_eq!(trimmed(&ORGANIZATION_RE, "Acme Ltd\nBalance sheet\n").as_deref(), Some(""));
        assert_eq!(
            trimmed(&ORGANIZATION_RE, "\n  Acme (India) Pvt. Ltd \naudit report\n").as_deref(),
            Some("Acme (India) Pvt. Ltd")
        );
    }

    #[test]
    fn test_period_runs_across_lines_until_punctuation() {
        let text = "For the Period 2023-24\nNotes follow: none";
        assert_eq!(trimmed(&PERIOD_RE, text).as_deref(), Some("2023-24\nNotes follow"));
    }

    #[test]
    fn test_expense_label_singular() {
        assert_eq!(trimmed(&EXPENSES_RE, "Total Expense $4,000").as_deref(), Some("4,000"));
    }

    #[test]
    fn test_comments_capped_at_300_chars() {
        let long = "x".repeat(400);
        let text = format!("AUDITOR COMMENTS\n{long}\n\n");
        assert_eq!(trimmed(&COMMENTS_RE, &text).as_deref(), Some(""));

        let short = format!("AUDITOR COMMENT: {}\n\n", "y".repeat(300));
        assert_eq!(trimmed(&COMMENTS_RE, &short).map(|s| s.len()), Some(300));
    }
}

// src/report.rs

use crate::compliance::ComplianceResult;
use crate::document::DocumentType;
use crate::fields::FieldSet;
use crate::text_extract::Table;
use time::OffsetDateTime;
use time::macros::format_description;

/// CSV rows are CRLF-terminated.
const REPORT_EOL: &str = "\r\n";
/// Table exports are plain newline-terminated.
const TABLE_EOL: &str = "\n";

fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        let escaped = s.replace('"', "\"\"");
        format!("\"{}\"", escaped)
    } else {
        s.to_string()
    }
}

fn push_row(out: &mut String, cells: &[&str], eol: &str) {
    let row: Vec<String> = cells.iter().map(|c| csv_escape(c)).collect();
    out.push_str(&row.join(","));
    out.push_str(eol);
}

/// Local time, falling back to UTC where the offset can't be determined.
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// Render the compliance report CSV, timestamped now.
pub fn generate_report(
    filename: &str,
    doc_type: DocumentType,
    fields: &FieldSet,
    result: &ComplianceResult,
) -> String {
    generate_report_at(filename, doc_type, fields, result, now())
}

/// Render the compliance report CSV with an explicit generation time.
///
/// Row order: title, file name, document type, timestamp, blank, field header,
/// one row per field, blank, status, issues header, then one row per issue
/// (or a single "None" row).
pub fn generate_report_at(
    filename: &str,
    doc_type: DocumentType,
    fields: &FieldSet,
    result: &ComplianceResult,
    generated_at: OffsetDateTime,
) -> String {
    let timestamp = generated_at
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))
        .unwrap_or_default();

    let mut out = String::new();
    push_row(&mut out, &["Compliance Report"], REPORT_EOL);
    push_row(&mut out, &["File Name", filename], REPORT_EOL);
    push_row(&mut out, &["Document Type", doc_type.as_str()], REPORT_EOL);
    push_row(&mut out, &["Timestamp", timestamp.as_str()], REPORT_EOL);
    out.push_str(REPORT_EOL);
    push_row(&mut out, &["Field", "Value"], REPORT_EOL);
    for (name, value) in fields.iter() {
        push_row(&mut out, &[name, value.unwrap_or("")], REPORT_EOL);
    }
    out.push_str(REPORT_EOL);
    push_row(&mut out, &["Compliance Status", result.status.as_str()], REPORT_EOL);
    push_row(&mut out, &["Issues"], REPORT_EOL);
    if result.issues.is_empty() {
        push_row(&mut out, &["", "None"], REPORT_EOL);
    } else {
        for issue in &result.issues {
            push_row(&mut out, &["", issue.as_str()], REPORT_EOL);
        }
    }
    out
}

/// CSV of the first detected table (header row, then data rows), if any.
pub fn first_table_csv(tables: &[Table]) -> Option<String> {
    let table = tables.first()?;
    let mut out = String::new();
    let header: Vec<&str> = table.header.iter().map(String::as_str).collect();
    push_row(&mut out, &header, TABLE_EOL);
    for row in &table.rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        push_row(&mut out, &cells, TABLE_EOL);
    }
    Some(out)
}

// src/compliance.rs

use crate::document::DocumentType;
use crate::fields::FieldSet;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

lazy_static! {
    /// 2 digits, 5 letters, 4 digits, letter, 1-9/letter, literal Z, alphanumeric.
    static ref GSTIN_FORMAT: Regex =
        Regex::new(r"\A[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z]").unwrap();
}

pub const UNSUPPORTED_ISSUE: &str = "Compliance rules not implemented yet.";

/// Presence rules for audit reports, checked in this order.
const AUDIT_REQUIRED: &[(&str, &str)] = &[
    ("opinion", "Audit opinion not found"),
    ("auditor_name", "Auditor name missing"),
    ("total_income", "Total income missing"),
    ("total_expenses", "Total expenses missing"),
    ("net_worth", "Net worth missing"),
    ("organization_name", "Organization name missing"),
    ("audit_period", "Audit period missing"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    Unsupported,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "COMPLIANT",
            ComplianceStatus::NonCompliant => "NON_COMPLIANT",
            ComplianceStatus::Unsupported => "UNSUPPORTED",
        }
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COMPLIANT" => Ok(ComplianceStatus::Compliant),
            "NON_COMPLIANT" => Ok(ComplianceStatus::NonCompliant),
            "UNSUPPORTED" => Ok(ComplianceStatus::Unsupported),
            _ => Err(format!("unknown compliance status: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceResult {
    pub status: ComplianceStatus,
    pub issues: Vec<String>,
}

impl ComplianceResult {
    /// COMPLIANT iff there are no issues.
    fn from_issues(issues: Vec<String>) -> Self {
        let status = if issues.is_empty() {
            ComplianceStatus::Compliant
        } else {
            ComplianceStatus::NonCompliant
        };
        Self { status, issues }
    }

    fn unsupported() -> Self {
        Self {
            status: ComplianceStatus::Unsupported,
            issues: vec![UNSUPPORTED_ISSUE.to_string()],
        }
    }
}

/// Run the presence / format rules for `doc_type` over a (possibly reviewed) field set.
pub fn check_compliance(fields: &FieldSet, doc_type: DocumentType) -> ComplianceResult {
    match doc_type {
        DocumentType::GstInvoice => check_gst_invoice(fields),
        DocumentType::AuditReport => check_audit_report(fields),
        DocumentType::LegalContract | DocumentType::RegulatoryFiling => {
            ComplianceResult::unsupported()
        }
    }
}

/// Length 15 and the structural GSTIN shape. Case-sensitive.
pub fn validate_gstin(gstin: &str) -> bool {
    gstin.chars().count() == 15 && GSTIN_FORMAT.is_match(gstin)
}

fn check_gst_invoice(fields: &FieldSet) -> ComplianceResult {
    let mut issues = Vec::new();

    match fields.get("gstin") {
        None | Some("") => issues.push("GSTIN not found".to_string()),
        Some(gstin) if !validate_gstin(gstin) => issues.push("Invalid GSTIN format".to_string()),
        Some(_) => {}
    }
    if fields.is_missing("invoice_no") {
        issues.push("Invoice number missing".to_string());
    }
    if fields.is_missing("total_amount") {
        issues.push("Total amount missing".to_string());
    }

    ComplianceResult::from_issues(issues)
}

fn check_audit_report(fields: &FieldSet) -> ComplianceResult {
    let issues = AUDIT_REQUIRED
        .iter()
        .filter(|(name, _)| fields.is_missing(name))
        .map(|(_, issue)| issue.to_string())
        .collect();
    ComplianceResult::from_issues(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::parse_fields;

    fn gst(gstin: &str, invoice_no: &str, total_amount: &str) -> FieldSet {
        [
            ("gstin", Some(gstin.to_string())),
            ("invoice_no", Some(invoice_no.to_string())),
            ("total_amount", Some(total_amount.to_string())),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_parsed_invoice_is_compliant() {
        let text = "GSTIN: 27AAAAA0000A1Z5 Invoice No: INV-001 Total Amount: 1,234.56";
        let fields = parse_fields(text, DocumentType::GstInvoice);
        let result = check_compliance(&fields, DocumentType::GstInvoice);
        assert_eq!(result.status, ComplianceStatus::Compliant);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_empty_gstin_is_not_found() {
        let result = check_compliance(&gst("", "INV-1", "100.00"), DocumentType::GstInvoice);
        assert_eq!(result.status, ComplianceStatus::NonCompliant);
        assert_eq!(result.issues, vec!["GSTIN not found"]);
    }

    #[test]
    fn test_short_gstin_is_invalid() {
        let result = check_compliance(&gst("27AAAAA0000A1", "X", "1.00"), DocumentType::GstInvoice);
        assert_eq!(result.status, ComplianceStatus::NonCompliant);
        assert_eq!(result.issues, vec!["Invalid GSTIN format"]);
    }

    #[test]
    fn test_gst_issues_accumulate() {
        let result = check_compliance(&FieldSet::new(), DocumentType::GstInvoice);
        assert_eq!(
            result.issues,
            vec!["GSTIN not found", "Invoice number missing", "Total amount missing"]
        );

        let nulls: FieldSet = [("gstin", None::<String>), ("invoice_no", None), ("total_amount", None)]
            .into_iter()
            .collect();
        assert_eq!(check_compliance(&nulls, DocumentType::GstInvoice).issues.len(), 3);
    }

    #[test]
    fn test_validate_gstin_shape() {
        assert!(validate_gstin("27AAAAA0000A1Z5"));
        assert!(!validate_gstin("27AAAAA0000A0Z5"), "entity code may not be 0");
        assert!(!validate_gstin("27aaaaa0000a1z5"), "lowercase is rejected");
        assert!(!validate_gstin("27AAAAA0000A1Y5"));
        assert!(!validate_gstin("27AAAAA0000A1Z5X"));
    }

    #[test]
    fn test_audit_presence_rules_in_order() {
        let result = check_compliance(&FieldSet::new(), DocumentType::AuditReport);
        assert_eq!(result.status, ComplianceStatus::NonCompliant);
        let expected: Vec<&str> = AUDIT_REQUIRED.iter().map(|(_, issue)| *issue).collect();
        assert_eq!(result.issues, expected);
    }

    #[test]
    fn test_audit_report_complete() {
        let fields: FieldSet = AUDIT_REQUIRED
            .iter()
            .map(|(name, _)| (*name, Some("value".to_string())))
            .collect();
        let result = check_compliance(&fields, DocumentType::AuditReport);
        assert_eq!(result.status, ComplianceStatus::Compliant);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_unsupported_types() {
        for doc_type in [DocumentType::LegalContract, DocumentType::RegulatoryFiling] {
            let result = check_compliance(&gst("27AAAAA0000A1Z5", "1", "1.00"), doc_type);
            assert_eq!(result.status, ComplianceStatus::Unsupported);
            assert_eq!(result.issues, vec![UNSUPPORTED_ISSUE]);
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            ComplianceStatus::Compliant,
            ComplianceStatus::NonCompliant,
            ComplianceStatus::Unsupported,
        ] {
            assert_eq!(status.as_str().parse::<ComplianceStatus>(), Ok(status));
        }
    }
}

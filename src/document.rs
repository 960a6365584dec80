// src/document.rs

use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Which parsing / compliance rule set applies to an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum DocumentType {
    #[value(name = "gst-invoice")]
    GstInvoice,
    #[value(name = "audit-report")]
    AuditReport,
    /// Selectable, but no rule set exists yet.
    #[value(name = "legal-contract")]
    LegalContract,
    /// Selectable, but no rule set exists yet.
    #[value(name = "regulatory-filing")]
    RegulatoryFiling,
}

pub const GST_INVOICE_FIELDS: &[&str] = &["gstin", "invoice_no", "total_amount"];

pub const AUDIT_REPORT_FIELDS: &[&str] = &[
    "organization_name",
    "audit_period",
    "auditor_name",
    "opinion",
    "report_date",
    "total_income",
    "total_expenses",
    "net_worth",
    "auditor_comments",
];

impl DocumentType {
    /// Human-readable name, as written to reports and saved records.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::GstInvoice => "GST Invoice",
            DocumentType::AuditReport => "Audit Report",
            DocumentType::LegalContract => "Legal Contract",
            DocumentType::RegulatoryFiling => "Regulatory Filing",
        }
    }

    /// Whether a parsing and compliance rule set exists for this type.
    pub fn is_supported(&self) -> bool {
        matches!(self, DocumentType::GstInvoice | DocumentType::AuditReport)
    }

    /// The fixed field names for this type, in review/report order.
    /// Unsupported types have none.
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            DocumentType::GstInvoice => GST_INVOICE_FIELDS,
            DocumentType::AuditReport => AUDIT_REPORT_FIELDS,
            DocumentType::LegalContract | DocumentType::RegulatoryFiling => &[],
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    /// Accepts both the display name ("GST Invoice") and the CLI name ("gst-invoice").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        match normalized.as_str() {
            "gst-invoice" => Ok(DocumentType::GstInvoice),
            "audit-report" => Ok(DocumentType::AuditReport),
            "legal-contract" => Ok(DocumentType::LegalContract),
            "regulatory-filing" => Ok(DocumentType::RegulatoryFiling),
            _ => Err(format!("unknown document type: {s}")),
        }
    }
}

/// Reviewer-facing label for a field name.
pub fn field_label(name: &str) -> &str {
    match name {
        "gstin" => "GSTIN",
        "invoice_no" => "Invoice Number",
        "total_amount" => "Total Amount",
        "organization_name" => "Organization Name",
        "audit_period" => "Audit Period",
        "auditor_name" => "Auditor Name",
        "opinion" => "Audit Opinion",
        "report_date" => "Report Date",
        "total_income" => "Total Income",
        "total_expenses" => "Total Expenses",
        "net_worth" => "Net Worth",
        "auditor_comments" => "Auditor Comments",
        other => other,
    }
}

/// Kind of uploaded file, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Pdf,
    Image,
}

impl UploadKind {
    pub fn mime_type(&self) -> &'static str {
        match self {
            UploadKind::Pdf => "application/pdf",
            UploadKind::Image => "image/*",
        }
    }
}

/// One uploaded document, held in memory for the duration of an analysis.
#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub kind: UploadKind,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Read a PDF or image from disk. Only `pdf`, `jpg`, `jpeg` and `png` are accepted.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| format!("Not a file path: {}", path.display()))?;

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let kind = match ext.as_str() {
            "pdf" => UploadKind::Pdf,
            "jpg" | "jpeg" | "png" => UploadKind::Image,
            _ => {
                return Err(format!(
                    "Unsupported file type '{ext}' for {filename}: expected pdf, jpg, jpeg or png"
                )
                .into());
            }
        };

        let bytes = std::fs::read(path)?;
        Ok(Self {
            filename,
            kind,
            bytes,
        })
    }

    /// Hex SHA-256 of the uploaded bytes.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_doc_type_names() {
        assert_eq!("GST Invoice".parse::<DocumentType>(), Ok(DocumentType::GstInvoice));
        assert_eq!("audit-report".parse::<DocumentType>(), Ok(DocumentType::AuditReport));
        assert_eq!("Legal Contract".parse::<DocumentType>(), Ok(DocumentType::LegalContract));
        assert!("Balance Sheet".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_unsupported_types_have_no_fields() {
        assert!(!DocumentType::RegulatoryFiling.is_supported());
        assert!(DocumentType::RegulatoryFiling.field_names().is_empty());
        assert_eq!(DocumentType::AuditReport.field_names().len(), 9);
    }

    #[test]
    fn test_open_rejects_unknown_extension() {
        let mut file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        file.write_all(b"hello").unwrap();
        assert!(Upload::open(file.path()).is_err());
    }

    #[test]
    fn test_open_reads_pdf_and_digests() {
        let mut file = tempfile::Builder::new().suffix(".PDF").tempfile().unwrap();
        file.write_all(b"%PDF-1.4").unwrap();
        let upload = Upload::open(file.path()).unwrap();
        assert_eq!(upload.kind, UploadKind::Pdf);
        assert_eq!(upload.bytes, b"%PDF-1.4");

        let same = Upload {
            filename: "other.pdf".to_string(),
            kind: UploadKind::Pdf,
            bytes: b"%PDF-1.4".to_vec(),
        };
        assert_eq!(upload.digest(), same.digest());
        assert_eq!(upload.digest().len(), 64);
    }
}

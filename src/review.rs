// src/review.rs

use crate::analysis_db::{AnalysisRecord, AnalysisStore};
use crate::compliance::{ComplianceResult, ComplianceStatus, check_compliance};
use crate::document::DocumentType;
use crate::fields::{FieldSet, parse_fields};
use crate::report;
use tracing::info;

/// Fields as the reviewer left them, plus the compliance outcome for exactly those fields.
#[derive(Debug, Clone)]
pub struct CheckedReview {
    pub fields: FieldSet,
    pub result: ComplianceResult,
}

/// One document's trip from parsed fields through review, check, report and save.
///
/// The checked review is held here explicitly between the check step and the
/// save/report steps; nothing is shared between sessions.
#[derive(Debug)]
pub struct ReviewSession {
    filename: String,
    document_sha256: String,
    doc_type: DocumentType,
    parsed: FieldSet,
    checked: Option<CheckedReview>,
}

impl ReviewSession {
    /// Parse `text` once and start a session for it.
    pub fn new(
        filename: impl Into<String>,
        document_sha256: impl Into<String>,
        doc_type: DocumentType,
        text: &str,
    ) -> Self {
        let parsed = parse_fields(text, doc_type);
        let (filled, total) = parsed.coverage();
        info!(doc_type = %doc_type, filled, total, "Parsed fields");
        Self {
            filename: filename.into(),
            document_sha256: document_sha256.into(),
            doc_type,
            parsed,
            checked: None,
        }
    }

    pub fn doc_type(&self) -> DocumentType {
        self.doc_type
    }

    pub fn parsed(&self) -> &FieldSet {
        &self.parsed
    }

    #[cfg(test)]
    pub fn checked(&self) -> Option<&CheckedReview> {
        self.checked.as_ref()
    }

    /// Apply reviewer edits on top of the parsed values.
    ///
    /// Every field of the document type appears in the result, in canonical
    /// order, as a trimmed string: the edit if given, else the parsed value,
    /// else "". Edits naming a field the type doesn't have are rejected.
    pub fn review(&self, edits: &[(String, String)]) -> Result<FieldSet, Box<dyn std::error::Error>> {
        let names = self.doc_type.field_names();
        if let Some((unknown, _)) = edits.iter().find(|(name, _)| !names.contains(&name.as_str())) {
            return Err(format!("'{unknown}' is not a field of {}", self.doc_type).into());
        }

        let reviewed = names
            .iter()
            .map(|&name| {
                let edited = edits.iter().rev().find(|(n, _)| n == name).map(|(_, v)| v.as_str());
                let value = edited.or_else(|| self.parsed.get(name)).unwrap_or("");
                (name, Some(value.trim().to_string()))
            })
            .collect();
        Ok(reviewed)
    }

    /// Check the reviewed fields and keep the outcome for the report and save steps.
    pub fn run_check(&mut self, reviewed: FieldSet) -> &CheckedReview {
        let result = check_compliance(&reviewed, self.doc_type);
        info!(status = %result.status, issues = result.issues.len(), "Compliance check");
        self.checked.insert(CheckedReview {
            fields: reviewed,
            result,
        })
    }

    /// Compliance report CSV for the checked review. `None` before a check or
    /// when the document type is unsupported.
    pub fn report(&self) -> Option<String> {
        let checked = self.saveable()?;
        Some(report::generate_report(
            &self.filename,
            self.doc_type,
            &checked.fields,
            &checked.result,
        ))
    }

    /// Persist the checked review and clear it. `None` if there is nothing
    /// to save (no check yet, or an unsupported document type).
    pub fn save(&mut self, store: &AnalysisStore) -> rusqlite::Result<Option<i64>> {
        if self.saveable().is_none() {
            return Ok(None);
        }
        let Some(checked) = self.checked.take() else {
            return Ok(None);
        };
        let record = AnalysisRecord {
            id: None,
            filename: self.filename.clone(),
            doc_type: self.doc_type,
            fields: checked.fields,
            compliance: checked.result,
            document_sha256: self.document_sha256.clone(),
            created_at: None,
        };
        store.insert(&record).map(Some)
    }

    fn saveable(&self) -> Option<&CheckedReview> {
        self.checked
            .as_ref()
            .filter(|c| c.result.status != ComplianceStatus::Unsupported)
    }
}

use crate::compliance::{ComplianceResult, ComplianceStatus};
use crate::document::DocumentType;
use crate::fields::FieldSet;
use rusqlite::types::Type;
use rusqlite::{Connection, Result as SqliteResult, params};
use std::path::Path;
use tracing::info;

pub struct AnalysisStore {
    conn: Connection,
}

/// One saved analysis: the reviewed fields and the compliance outcome for a file.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    pub id: Option<i64>,
    pub filename: String,
    pub doc_type: DocumentType,
    pub fields: FieldSet,
    pub compliance: ComplianceResult,
    /// Hex SHA-256 of the uploaded file
    pub document_sha256: String,
    /// Set by the database on insert
    pub created_at: Option<String>,
}

impl AnalysisStore {
    /// Open (or create) the analysis store with SQLite backend
    pub fn new<P: AsRef<Path>>(db_path: P) -> SqliteResult<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS analyses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL,
                doc_type TEXT NOT NULL,
                fields_json TEXT NOT NULL,
                compliance_status TEXT NOT NULL,
                issues_json TEXT NOT NULL,
                document_sha256 TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_analyses_created_at ON analyses(created_at)",
            [],
        )?;

        info!("Database initialized successfully");
        Ok(Self { conn })
    }

    /// Insert an analysis record, returning its id. Records are never updated.
    pub fn insert(&self, record: &AnalysisRecord) -> SqliteResult<i64> {
        let fields_json = to_json(&record.fields)?;
        let issues_json = to_json(&record.compliance.issues)?;
        self.conn.execute(
            "INSERT INTO analyses
                (filename, doc_type, fields_json, compliance_status, issues_json, document_sha256)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.filename,
                record.doc_type.as_str(),
                fields_json,
                record.compliance.status.as_str(),
                issues_json,
                record.document_sha256,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(
            analysis_id = id,
            filename = %record.filename,
            status = %record.compliance.status,
            "Analysis stored"
        );
        Ok(id)
    }

    /// The `n` most recent records, newest first.
    pub fn find_recent(&self, n: usize) -> SqliteResult<Vec<AnalysisRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, filename, doc_type, fields_json, compliance_status, issues_json, document_sha256, created_at
             FROM analyses
             ORDER BY created_at DESC, id DESC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(n).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| Self::row_to_record(row))?;
        rows.collect()
    }

    #[cfg(test)]
    pub fn count(&self) -> SqliteResult<usize> {
        self.conn
            .query_row("SELECT COUNT(*) FROM analyses", [], |row| row.get(0))
    }

    /// Helper: map a row with the 8-column analysis projection to `AnalysisRecord`.
    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnalysisRecord> {
        let doc_type: String = row.get(2)?;
        let fields_json: String = row.get(3)?;
        let status: String = row.get(4)?;
        let issues_json: String = row.get(5)?;

        Ok(AnalysisRecord {
            id: Some(row.get(0)?),
            filename: row.get(1)?,
            doc_type: doc_type
                .parse()
                .map_err(|e: String| conversion_error(2, e.into()))?,
            fields: serde_json::from_str(&fields_json)
                .map_err(|e| conversion_error(3, Box::new(e)))?,
            compliance: ComplianceResult {
                status: status
                    .parse::<ComplianceStatus>()
                    .map_err(|e| conversion_error(4, e.into()))?,
                issues: serde_json::from_str(&issues_json)
                    .map_err(|e| conversion_error(5, Box::new(e)))?,
            },
            document_sha256: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

fn conversion_error(
    column: usize,
    err: Box<dyn std::error::Error + Send + Sync>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, err)
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> SqliteResult<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

// src/text_extract.rs

use crate::document::{Upload, UploadKind};
use crate::ocr;
use lazy_static::lazy_static;
use lopdf::Document;
use regex::Regex;
use tracing::{info, warn};

/// Outcome of reading a PDF's text layer.
#[derive(Debug)]
pub enum PdfContent {
    Text(String),
    /// No usable text layer: image-only pages, or nothing but whitespace.
    ScannedImage,
    /// The bytes don't parse as a PDF.
    Error(String),
}

/// A table found in the page text: header row plus data rows, all the same width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

lazy_static! {
    /// Column gap in laid-out text: two or more spaces, or any tab.
    static ref COLUMN_GAP: Regex = Regex::new(r" {2,}|\t+").unwrap();
}

/// Plain text of an upload. PDFs go through `pdf-extract`, images through OCR.
///
/// A scanned PDF has no text layer and yields an empty string; the missing
/// fields then show up as compliance issues rather than as a failure.
pub fn extract_text(upload: &Upload) -> Result<String, Box<dyn std::error::Error>> {
    match upload.kind {
        UploadKind::Pdf => match extract_text_from_pdf(&upload.bytes) {
            PdfContent::Text(text) => Ok(text),
            PdfContent::ScannedImage => {
                warn!(filename = %upload.filename, "PDF has no text layer, continuing with empty text");
                Ok(String::new())
            }
            PdfContent::Error(e) => Err(e.into()),
        },
        UploadKind::Image => ocr::image_to_text(&upload.bytes),
    }
}

/// Text layer of a PDF, after ruling out scanned documents by structure.
pub fn extract_text_from_pdf(pdf_bytes: &[u8]) -> PdfContent {
    let doc = match Document::load_mem(pdf_bytes) {
        Ok(d) => d,
        Err(e) => return PdfContent::Error(format!("Failed to parse PDF: {e}")),
    };

    if looks_like_scanned(&doc) {
        info!("PDF structural check: likely scanned / image-only");
        return PdfContent::ScannedImage;
    }

    match pdf_extract::extract_text_from_mem(pdf_bytes) {
        Ok(text) => {
            let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();
            if meaningful == 0 {
                info!("No text extracted, treating as scanned");
                PdfContent::ScannedImage
            } else {
                info!(chars = meaningful, "Text extracted successfully");
                PdfContent::Text(text)
            }
        }
        Err(e) => {
            warn!(error = %e, "pdf-extract failed, may be scanned or corrupted");
            PdfContent::ScannedImage
        }
    }
}

/// A page counts as image-only when its resources hold XObjects but no fonts.
/// The document is scanned when at least 80% of its pages are image-only.
fn looks_like_scanned(doc: &Document) -> bool {
    let pages = doc.get_pages();
    if pages.is_empty() {
        return false; // Can't tell, let text extraction try
    }

    let image_only_pages = pages
        .values()
        .filter(|object_id| {
            let Ok(page_dict) = doc.get_object(**object_id).and_then(|o| o.as_dict()) else {
                return false;
            };
            let resources = page_dict
                .get(b"Resources")
                .ok()
                .and_then(|r| doc.dereference(r).ok())
                .and_then(|(_, resolved)| resolved.as_dict().ok());
            let non_empty = |key: &[u8]| {
                resources
                    .and_then(|res| res.get(key).ok())
                    .and_then(|obj| doc.dereference(obj).ok())
                    .and_then(|(_, resolved)| resolved.as_dict().ok())
                    .is_some_and(|dict| !dict.is_empty())
            };
            non_empty(b"XObject") && !non_empty(b"Font")
        })
        .count();

    let total = pages.len();
    let ratio = image_only_pages as f64 / total as f64;
    info!(
        total_pages = total,
        image_only = image_only_pages,
        ratio = format!("{ratio:.2}"),
        "Scanned-page analysis"
    );

    ratio >= 0.8
}

/// Tables detected in a PDF's text. Images never yield tables.
pub fn extract_tables(upload: &Upload, text: &str) -> Vec<Table> {
    match upload.kind {
        UploadKind::Pdf => detect_tables(text),
        UploadKind::Image => Vec::new(),
    }
}

/// A table is a run of two or more consecutive lines that split on column gaps
/// into the same number (at least two) of cells. The first line is the header.
pub fn detect_tables(text: &str) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut run: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        let cells = split_columns(line);
        let continues = cells.len() >= 2 && run.first().is_none_or(|first| first.len() == cells.len());
        if continues {
            run.push(cells);
            continue;
        }
        flush_run(&mut run, &mut tables);
        if cells.len() >= 2 {
            run.push(cells);
        }
    }
    flush_run(&mut run, &mut tables);

    info!(tables = tables.len(), "Table detection complete");
    tables
}

fn split_columns(line: &str) -> Vec<String> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }
    COLUMN_GAP
        .split(line)
        .map(|cell| cell.trim().to_string())
        .collect()
}

fn flush_run(run: &mut Vec<Vec<String>>, tables: &mut Vec<Table>) {
    if run.len() >= 2 {
        let mut rows = std::mem::take(run);
        let header = rows.remove(0);
        tables.push(Table { header, rows });
    } else {
        run.clear();
    }
}

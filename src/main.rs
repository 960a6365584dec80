mod analysis_db;
mod compliance;
mod config;
mod document;
mod fields;
mod ocr;
mod qa;
mod report;
mod review;
mod text_extract;

use analysis_db::AnalysisStore;
use clap::{Parser, Subcommand};
use compliance::ComplianceStatus;
use document::{DocumentType, Upload, UploadKind, field_label};
use review::ReviewSession;
use std::path::{Path, PathBuf};
use tracing::{Instrument, error, info, warn};
use tracing_subscriber::EnvFilter;

/// How much extracted text to echo back.
const TEXT_PREVIEW_CHARS: usize = 2000;

#[derive(Parser)]
#[command(name = "compliance_suite")]
#[command(about = "Extract fields from GST invoices and audit reports and check them for compliance")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = ".config/compliance_suite.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, review and check one document
    Analyze {
        /// PDF or image (jpg, jpeg, png)
        file: PathBuf,
        /// Which rule set to apply
        #[arg(short, long, value_enum)]
        doc_type: DocumentType,
        /// Reviewer correction, e.g. --set gstin=27AAAAA0000A1Z5 (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE", value_parser = parse_edit)]
        edits: Vec<(String, String)>,
        /// Ask a question about the document text
        #[arg(long)]
        ask: Option<String>,
        /// Write the compliance report (and any line-item table) as CSV into this directory
        #[arg(long, value_name = "DIR")]
        export: Option<PathBuf>,
        /// Save the analysis to the database
        #[arg(long)]
        save: bool,
    },
    /// Show the most recent saved analyses
    Recent {
        /// How many to show (defaults to `recent_limit` from the config)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
}

fn parse_edit(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{s}'"))?;
    Ok((name.trim().to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = config::Config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Analyze {
            file,
            doc_type,
            edits,
            ask,
            export,
            save,
        } => {
            let span = tracing::info_span!("analyze", file = %file.display(), doc_type = %doc_type);
            let opts = AnalyzeOptions {
                doc_type,
                edits,
                ask,
                export,
                save,
            };
            analyze(&file, opts, &cfg).instrument(span).await?;
        }
        Commands::Recent { limit } => {
            show_recent(&cfg, limit.unwrap_or(cfg.recent_limit))?;
        }
    }

    Ok(())
}

struct AnalyzeOptions {
    doc_type: DocumentType,
    edits: Vec<(String, String)>,
    ask: Option<String>,
    export: Option<PathBuf>,
    save: bool,
}

async fn analyze(
    path: &Path,
    opts: AnalyzeOptions,
    cfg: &config::Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let upload = Upload::open(path)?;

    println!("--- File Details ---");
    println!("File Name: {}", upload.filename);
    println!("Size: {} bytes", upload.bytes.len());
    println!("Type: {}", upload.kind.mime_type());

    // Step 1: raw text
    let text = match text_extract::extract_text(&upload) {
        Ok(text) => text,
        Err(e) => {
            error!(error = %e, "Text extraction failed");
            return Err(e);
        }
    };
    info!(chars = text.len(), "Extracted text");
    let preview: String = text.chars().take(TEXT_PREVIEW_CHARS).collect();
    println!("\n--- Extracted Text (first {TEXT_PREVIEW_CHARS} chars) ---");
    println!("{preview}");
    println!("--- End ---\n");

    if let Some(question) = opts.ask.as_deref().filter(|q| !q.trim().is_empty()) {
        if text.trim().is_empty() {
            warn!("No document text to answer from");
        } else {
            match qa::answer(question, &text, &cfg.qa).await {
                Ok(answer) => println!("Answer: {answer}\n"),
                Err(e) => {
                    error!(error = %e, "Question answering failed");
                    println!("✗ Could not answer: {e}\n");
                }
            }
        }
    }

    // Step 1B: line-item tables
    let tables = if opts.doc_type == DocumentType::GstInvoice && upload.kind == UploadKind::Pdf {
        text_extract::extract_tables(&upload, &text)
    } else {
        Vec::new()
    };
    for (idx, table) in tables.iter().enumerate() {
        println!("--- Table {} ---", idx + 1);
        println!("{}", table.header.join(" | "));
        for row in &table.rows {
            println!("{}", row.join(" | "));
        }
        println!();
    }

    // Step 2: fields and review
    let mut session = ReviewSession::new(&upload.filename, upload.digest(), opts.doc_type, &text);
    if !session.doc_type().is_supported() {
        println!("Parsing for '{}' not yet implemented.", session.doc_type());
    }
    if session.parsed().is_empty() {
        println!("No editable fields available yet for this document type.\n");
    }
    println!("--- Extracted Fields ---");
    println!("{}", serde_json::to_string_pretty(session.parsed())?);
    println!("--- End ---\n");

    let reviewed = session.review(&opts.edits)?;
    if !opts.edits.is_empty() {
        println!("--- Reviewed Fields ---");
        for (name, value) in reviewed.iter() {
            println!("{}: {}", field_label(name), value.unwrap_or(""));
        }
        println!("--- End ---\n");
    }

    // Step 3: compliance
    let checked = session.run_check(reviewed);
    println!("--- Compliance Check ---");
    match checked.result.status {
        ComplianceStatus::Compliant => {
            println!("✓ Document is COMPLIANT");
            println!("All required fields are present and valid");
        }
        ComplianceStatus::NonCompliant => {
            println!("✗ Document is NON-COMPLIANT");
            println!("Issues found - please review below");
            for issue in &checked.result.issues {
                println!("- {issue}");
            }
        }
        ComplianceStatus::Unsupported => {
            for issue in &checked.result.issues {
                println!("{issue}");
            }
        }
    }
    println!();

    if let Some(dir) = &opts.export {
        match session.report() {
            Some(report_csv) => {
                std::fs::create_dir_all(dir)?;
                let report_path = dir.join(format!("{}_compliance_report.csv", upload.filename));
                std::fs::write(&report_path, report_csv)?;
                info!(path = %report_path.display(), "Compliance report written");
                println!("Report written to {}", report_path.display());

                if let Some(table_csv) = report::first_table_csv(&tables) {
                    let table_path = dir.join(format!("{}_lineitems.csv", upload.filename));
                    std::fs::write(&table_path, table_csv)?;
                    info!(path = %table_path.display(), "Line-item table written");
                    println!("First table written to {}", table_path.display());
                }
            }
            None => warn!("Nothing to export for an unsupported document type"),
        }
    }

    if opts.save {
        let store = open_store(cfg)?;
        match session.save(&store)? {
            Some(id) => println!("✓ Analysis saved! ID: {id}"),
            None => warn!("Not saved: compliance rules are not implemented for this document type"),
        }
    }

    Ok(())
}

fn open_store(cfg: &config::Config) -> Result<AnalysisStore, Box<dyn std::error::Error>> {
    if let Some(parent) = Path::new(&cfg.db_path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(AnalysisStore::new(&cfg.db_path)?)
}

fn show_recent(cfg: &config::Config, limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    info!(db_path = %cfg.db_path, limit, "Loading recent analyses");
    let store = open_store(cfg)?;
    let recent = store.find_recent(limit)?;
    if recent.is_empty() {
        println!("No saved analyses yet.");
        return Ok(());
    }

    println!("--- Recent Analyses ---");
    for record in &recent {
        println!("{}", record.filename);
        println!("  • Type: {}", record.doc_type);
        println!("  • Status: {}", record.compliance.status);
        if let Some(created_at) = &record.created_at {
            println!("  • Saved: {created_at}");
        }
        for issue in &record.compliance.issues {
            println!("    - {issue}");
        }
    }
    Ok(())
}

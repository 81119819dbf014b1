use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use pdf_ocr::{Pipeline, PipelineConfig, RunSummary};

#[derive(Debug, Parser)]
#[command(author, version, about = "OCR every PDF in a directory")]
struct Args {
    /// Input directory containing scanned PDFs
    #[arg(short, long)]
    input: PathBuf,

    /// Output directory for the generated documents
    #[arg(short, long)]
    output: PathBuf,

    /// Path to configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DocumentMetadata {
    filename: String,
    document: Option<PathBuf>,
    pages: usize,
    lines: usize,
    avg_confidence: f32,
    runtime_secs: f64,
    error: Option<String>,
}

impl DocumentMetadata {
    fn succeeded(filename: String, summary: &RunSummary) -> Self {
        Self {
            filename,
            document: summary.document.clone(),
            pages: summary.pages,
            lines: summary.lines,
            avg_confidence: summary.avg_confidence,
            runtime_secs: summary.runtime_secs,
            error: None,
        }
    }

    fn failed(filename: String, error: String) -> Self {
        Self {
            filename,
            document: None,
            pages: 0,
            lines: 0,
            avg_confidence: 0.0,
            runtime_secs: 0.0,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct BatchMetadata {
    processed_at: String,
    total_documents: usize,
    failed_documents: usize,
    total_pages: usize,
    documents: Vec<DocumentMetadata>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("Starting batch OCR");
    info!("Input directory: {:?}", args.input);
    info!("Output directory: {:?}", args.output);

    fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create output directory: {:?}", args.output))?;

    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    config.validate().context("Invalid configuration")?;

    let pdf_files = find_pdfs(&args.input);
    info!("Found {} PDF files", pdf_files.len());

    if pdf_files.is_empty() {
        anyhow::bail!("No PDF files found in {:?}", args.input);
    }

    let pipeline = Pipeline::from_config(config);
    pipeline.check_dependencies()?;

    let mut documents = Vec::with_capacity(pdf_files.len());
    let mut written = HashSet::new();

    for (idx, pdf_path) in pdf_files.iter().enumerate() {
        info!("Processing {}/{}: {:?}", idx + 1, pdf_files.len(), pdf_path);

        let filename = pdf_path
            .strip_prefix(&args.input)
            .unwrap_or(pdf_path)
            .to_string_lossy()
            .into_owned();
        let out_dir = document_out_dir(&args.input, pdf_path, &args.output);

        match pipeline.run(pdf_path, &out_dir) {
            Ok(output) => {
                if let Some(document) = &output.summary.document {
                    if !written.insert(document.clone()) {
                        warn!("{:?} overwrote an earlier result at {:?}", pdf_path, document);
                    }
                }
                documents.push(DocumentMetadata::succeeded(filename, &output.summary));
            }
            Err(e) => {
                warn!("Failed to process {:?}: {:#}", pdf_path, e);
                documents.push(DocumentMetadata::failed(filename, format!("{:#}", e)));
            }
        }
    }

    let metadata = BatchMetadata {
        processed_at: chrono::Local::now().to_rfc3339(),
        total_documents: documents.len(),
        failed_documents: documents.iter().filter(|d| d.error.is_some()).count(),
        total_pages: documents.iter().map(|d| d.pages).sum(),
        documents,
    };

    let metadata_path = args.output.join("batch.json");
    let json = serde_json::to_string_pretty(&metadata)?;
    fs::write(&metadata_path, json)
        .with_context(|| format!("Failed to write metadata: {:?}", metadata_path))?;

    info!("Metadata saved to: {:?}", metadata_path);
    info!(
        "Batch complete: {} documents, {} failed, {} pages",
        metadata.total_documents, metadata.failed_documents, metadata.total_pages
    );

    Ok(())
}

fn find_pdfs(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// Mirror the PDF's directory below `input_root` under `output_root`, so
/// `a/scan.pdf` and `b/scan.pdf` do not write the same document.
fn document_out_dir(input_root: &Path, pdf: &Path, output_root: &Path) -> PathBuf {
    match pdf.strip_prefix(input_root).ok().and_then(Path::parent) {
        Some(parent) if !parent.as_os_str().is_empty() => output_root.join(parent),
        _ => output_root.to_path_buf(),
    }
}

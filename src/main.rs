use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pdf_ocr::debug::{flag_enabled, DEBUG_ENV};
use pdf_ocr::pipeline::output_stem;
use pdf_ocr::report::write_report;
use pdf_ocr::utils::ExternalTool;
use pdf_ocr::{OutputFormat, PageMode, Pipeline, PipelineConfig};

#[derive(Debug, Parser)]
#[command(author, version, about = "Scanned PDF to text document via OCR")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// OCR a PDF and write the reassembled document
    Run(RunArgs),
    /// Print the default configuration as JSON
    Config,
    /// Check that the external OCR tools are installed
    Doctor,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Input PDF file
    input: PathBuf,

    /// Path to configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the output document
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Rasterization resolution
    #[arg(long)]
    dpi: Option<u32>,

    /// OCR languages as ISO-639-1 codes, comma separated (e.g. de,en)
    #[arg(long, value_delimiter = ',')]
    lang: Option<Vec<String>>,

    /// Page segmentation mode
    #[arg(long, value_enum)]
    page_mode: Option<PageMode>,

    /// Output document format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Write the HTML tuning report next to the document
    #[arg(long)]
    report: bool,

    /// Include per-page bounding box overlays in the report
    #[arg(long)]
    debug_overlay: bool,
}

fn main() -> ExitCode {
    let default_level = if flag_enabled(std::env::var(DEBUG_ENV).ok().as_deref()) {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run_command(args),
        Commands::Config => config_command(),
        Commands::Doctor => doctor_command(),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_command(args: RunArgs) -> Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {:?}", path);
            PipelineConfig::load(path)?
        }
        None => PipelineConfig::default(),
    };

    if let Some(dpi) = args.dpi {
        config.dpi = dpi;
    }
    if let Some(lang) = args.lang {
        config.languages = lang;
    }
    if let Some(page_mode) = args.page_mode {
        config.page_mode = page_mode;
    }
    if let Some(format) = args.format {
        config.output_format = format;
    }
    if args.debug_overlay {
        config.debug_overlay = true;
    }
    config.validate().context("Invalid configuration")?;

    info!(
        "Configuration: dpi={}, languages={}, page_mode={:?}, format={:?}",
        config.dpi,
        config.tesseract_languages(),
        config.page_mode,
        config.output_format
    );

    let pipeline = Pipeline::from_config(config);
    let output = pipeline.run(&args.input, &args.out_dir)?;
    let summary = &output.summary;

    println!(
        "Pages: {} | Lines: {} | Avg confidence: {:.2}",
        summary.pages, summary.lines, summary.avg_confidence
    );
    if let Some(document) = &summary.document {
        println!("Document: {}", document.display());
    }

    if args.report || pipeline.config().debug_overlay {
        let report_dir = args.out_dir.join(format!("{}_report", output_stem(&args.input)));
        let files = write_report(&output, pipeline.config(), &report_dir)?;
        println!("Report: {}", files.html.display());
    }

    Ok(ExitCode::SUCCESS)
}

fn config_command() -> Result<ExitCode> {
    let json = serde_json::to_string_pretty(&PipelineConfig::default())
        .context("Failed to serialize default config")?;
    println!("{}", json);
    Ok(ExitCode::SUCCESS)
}

fn doctor_command() -> Result<ExitCode> {
    let ocr_ok = report_tool(ExternalTool::Tesseract);
    let pdftoppm_ok = report_tool(ExternalTool::Pdftoppm);
    let mutool_ok = report_tool(ExternalTool::Mutool);

    if ocr_ok && (pdftoppm_ok || mutool_ok) {
        println!("All required tools are available.");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Some required tools are missing; see the instructions above.");
        Ok(ExitCode::FAILURE)
    }
}

fn report_tool(tool: ExternalTool) -> bool {
    match tool.locate() {
        Some(path) => {
            println!("[ok]      {:<10} {}", tool.binary(), path.display());
            true
        }
        None => {
            println!("[missing] {}", tool.install_hint());
            false
        }
    }
}

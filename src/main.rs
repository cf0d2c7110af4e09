// src/main.rs
mod extractors;
mod gemini;
mod storage;
mod utils;

use clap::Parser;
use std::path::PathBuf;

use extractors::dar;
use storage::StorageManager;
use utils::AppError;

/// Command Line Interface for the DAR structured extractor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the report text file produced by the upstream PDF conversion step
    #[arg(short, long)]
    input: PathBuf,

    /// Gemini API key (falls back to the GEMINI_API_KEY environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// Extra attempts after the first failed one
    #[arg(long, default_value_t = dar::DEFAULT_MAX_RETRIES)]
    max_retries: u32,

    /// Output directory for extracted records
    #[arg(short, long, default_value = "./output")]
    output_dir: String,

    /// Debug mode - save the exact prompt sent to the model
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting DAR extraction for {:?}", args.input);

    // 3. Resolve the credential
    let api_key = match args
        .api_key
        .clone()
        .or_else(|| std::env::var("GEMINI_API_KEY").ok())
    {
        Some(key) => key,
        None => {
            return Err(AppError::Config(
                "No Gemini API key given (use --api-key or set GEMINI_API_KEY)".to_string(),
            ))
        }
    };

    // 4. Read the preprocessed report text
    let source_text = std::fs::read_to_string(&args.input)?;
    tracing::info!("Read {} chars of report text", source_text.chars().count());

    // 5. Initialize storage
    let storage = StorageManager::new(&args.output_dir)?;
    let source_name = args
        .input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("report")
        .to_string();

    if args.debug {
        let prompt = gemini::prompt::build_extraction_prompt(&source_text);
        match storage.save_debug_prompt(&source_name, &prompt) {
            Ok(path) => tracing::info!("Saved debug prompt to {}", path.display()),
            Err(e) => tracing::warn!("Failed to save debug prompt: {}", e),
        }
    }

    // 6. Run the extraction. This never fails outright; anything that went
    //    wrong is recorded in the returned record's parsing_errors.
    let report = dar::extract_report(&api_key, &source_text, args.max_retries).await;

    match &report.parsing_errors {
        Some(errors) => tracing::warn!("Extraction finished with issues: {}", errors),
        None => tracing::info!(
            "Extraction succeeded: {} audit para(s) for {}",
            report.audit_paras.len(),
            report.header.trade_name.as_deref().unwrap_or("<unknown>")
        ),
    }

    // 7. Persist the record and its metadata
    let record_path = storage.save_report(&source_name, &report)?;
    tracing::info!("Saved extracted record to {}", record_path.display());
    match storage.save_report_metadata(&source_name, &args.input, &report) {
        Ok(path) => tracing::info!("Saved metadata to {}", path.display()),
        Err(e) => tracing::error!("Failed to save metadata: {}", e),
    }

    // An entirely empty record that also carries a diagnostic means nothing
    // at all was extracted; signal that through the exit status.
    if report.header.is_empty() && report.audit_paras.is_empty() && report.parsing_errors.is_some()
    {
        return Err(AppError::Processing(format!(
            "No data extracted from {}",
            args.input.display()
        )));
    }

    Ok(())
}

//! Batch command - process every contract in a directory.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use contex_core::{Pipeline, PureOcrEngine};

use super::process::{format_record, load_config, process_file, OutputFormat};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Directory containing PDF or text contracts
    #[arg(required = true)]
    input_dir: PathBuf,

    /// Directory for per-file JSON results (default: print a summary line
    /// per file)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Directory with OCR model files
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip OCR even when a model directory is configured
    #[arg(long)]
    text_only: bool,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input_dir.is_dir() {
        anyhow::bail!("Not a directory: {}", args.input_dir.display());
    }

    let mut inputs: Vec<PathBuf> = fs::read_dir(&args.input_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("pdf") | Some("txt") | Some("text")
            )
        })
        .collect();
    inputs.sort();

    if inputs.is_empty() {
        anyhow::bail!("No PDF or text files in {}", args.input_dir.display());
    }

    if let Some(output_dir) = &args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pipeline = Pipeline::with_config(config);

    let engine = match (&args.model_dir, args.text_only) {
        (Some(dir), false) => Some(PureOcrEngine::from_dir(dir)?),
        _ => None,
    };

    let mut processed = 0usize;
    let mut failed = 0usize;

    for input in &inputs {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {bar:30.cyan/blue} {msg}")
                .unwrap()
                .progress_chars("##-"),
        );

        match process_file(&pipeline, input, engine.as_ref(), &pb) {
            Ok(record) => {
                pb.finish_and_clear();
                processed += 1;

                if let Some(output_dir) = &args.output_dir {
                    let stem = input
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .unwrap_or("contract");
                    let target = output_dir.join(format!("{}.json", stem));
                    fs::write(&target, format_record(&record, OutputFormat::Json)?)?;
                }

                println!(
                    "{} {:<40} score {:>5.1}  gaps {}",
                    style("✓").green(),
                    input.file_name().and_then(|n| n.to_str()).unwrap_or("?"),
                    record.overall_score,
                    record.gaps.len()
                );
            }
            Err(e) => {
                pb.finish_and_clear();
                failed += 1;
                warn!(file = %input.display(), error = %e, "processing failed");
                println!(
                    "{} {:<40} {}",
                    style("✗").red(),
                    input.file_name().and_then(|n| n.to_str()).unwrap_or("?"),
                    e
                );
            }
        }
    }

    println!();
    println!(
        "{} {} processed, {} failed",
        style("Summary:").bold(),
        processed,
        failed
    );

    Ok(())
}

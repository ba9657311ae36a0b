//! Process command - extract data from a single contract file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use contex_core::{
    ContractRecord, GapSeverity, OcrBackend, Pipeline, PipelineConfig, ProcessOptions,
    PureOcrEngine,
};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or plain text)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Directory with OCR model files; without it scanned pages keep their
    /// embedded text
    #[arg(short, long)]
    pub model_dir: Option<PathBuf>,

    /// Skip OCR even when a model directory is configured
    #[arg(long)]
    pub text_only: bool,

    /// Print the completeness score and gap list after processing
    #[arg(long)]
    pub show_score: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pipeline = Pipeline::with_config(config);

    let engine = match (&args.model_dir, args.text_only) {
        (Some(dir), false) => Some(PureOcrEngine::from_dir(dir)?),
        _ => None,
    };

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    let record = process_file(&pipeline, &args.input, engine.as_ref(), &pb)?;
    pb.finish_with_message("Done");

    let output = format_record(&record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_score {
        print_score(&record);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Load the pipeline configuration, or defaults when none is given.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PipelineConfig> {
    match config_path {
        Some(path) => Ok(PipelineConfig::from_file(Path::new(path))?),
        None => Ok(PipelineConfig::default()),
    }
}

/// Run the pipeline over one PDF or plain-text file.
pub fn process_file(
    pipeline: &Pipeline,
    input: &Path,
    engine: Option<&PureOcrEngine>,
    pb: &ProgressBar,
) -> anyhow::Result<ContractRecord> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let progress = |percent: u8, label: &str| {
        pb.set_position(percent as u64);
        pb.set_message(label.to_string());
    };

    let opts = ProcessOptions {
        ocr: engine.map(|e| e as &dyn OcrBackend),
        cancel: None,
        progress: Some(&progress),
    };

    match extension.as_str() {
        "pdf" => {
            let data = fs::read(input)?;
            Ok(pipeline.process_document(&data, &opts)?)
        }
        "txt" | "text" => {
            let text = fs::read_to_string(input)?;
            Ok(pipeline.process_text(&text, &opts))
        }
        other => anyhow::bail!("Unsupported file format: {}", other),
    }
}

/// Serialize the record for output.
pub fn format_record(record: &ContractRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Text => {
            let mut out = String::new();
            out.push_str(&format!("Score: {:.1}/100\n", record.overall_score));
            out.push_str(&format!(
                "Fields: {} ({} high confidence)\n",
                record.confidence_summary.total_fields,
                record.confidence_summary.high_confidence_count
            ));

            if let Some(items) = record.line_items() {
                out.push_str(&format!("Line items: {}\n", items.len()));
                for item in items {
                    out.push_str(&format!(
                        "  {} x{} @ {} {} = {}\n",
                        item.description, item.quantity, item.unit_price, item.currency,
                        item.line_total
                    ));
                }
            }

            for (name, field) in &record.fields {
                if name == "line_items" {
                    continue;
                }
                out.push_str(&format!(
                    "  {:<28} {:?} ({:.2})\n",
                    name, field.value, field.confidence
                ));
            }

            Ok(out)
        }
    }
}

fn print_score(record: &ContractRecord) {
    println!();
    println!(
        "{} Completeness score: {:.1}/100",
        style("ℹ").blue(),
        record.overall_score
    );

    if record.gaps.is_empty() {
        println!("{} No gaps found", style("✓").green());
        return;
    }

    println!("{} Gaps:", style("!").yellow());
    for gap in &record.gaps {
        let severity = match gap.severity {
            GapSeverity::High => style("high").red(),
            GapSeverity::Medium => style("medium").yellow(),
            GapSeverity::Low => style("low").dim(),
        };
        println!("  - {} ({:?}, {})", gap.field, gap.reason, severity);
    }
}

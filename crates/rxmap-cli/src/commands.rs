use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, info_span, trace};

use rxmap_cli::dashboard::DashboardData;
use rxmap_cli::logging::redact_value;
use rxmap_cli::settings::{Settings, api_key};
use rxmap_core::{BatchProgress, MappingEngine, ProgressObserver};
use rxmap_ingest::{IngestOptions, read_source_table};
use rxmap_llm::{ConceptProposer, OpenAiClient};
use rxmap_model::{FinalStatus, MappingRecord, ProductContext, RunStatistics};
use rxmap_output::{export_results, read_results};
use rxmap_rxnorm::{RxNavClient, TerminologyValidator};

use crate::cli::{DashboardArgs, ProcessArgs};

/// Outcome of a `process` run.
#[derive(Debug)]
pub struct ProcessResult {
    pub total_rows: usize,
    pub statistics: RunStatistics,
    pub export_path: PathBuf,
    pub interrupted: bool,
}

pub fn run_process(args: &ProcessArgs, mut settings: Settings) -> Result<ProcessResult> {
    let api_key = api_key(|key| std::env::var(key).ok())?;
    if let Some(batch_size) = args.batch_size {
        settings.pipeline.batch_size = batch_size;
    }
    let input = args
        .input_file
        .clone()
        .unwrap_or_else(|| settings.input.file.clone());
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| settings.output.dir.clone());

    let span = info_span!("process", input = %input.display());
    let _guard = span.enter();

    println!("Loading data...");
    let options = IngestOptions {
        max_rows: args.max_products,
        ..IngestOptions::default()
    };
    let table = read_source_table(&input, &options)
        .with_context(|| format!("load products from {}", input.display()))?;
    if let Some(max) = args.max_products {
        println!("Limited to {max} products");
    }
    let rows = table.source_rows();

    println!("Initializing mapping engine...");
    let client = OpenAiClient::new(settings.openai.base_url.clone(), api_key)
        .context("create completion client")?;
    let proposer = ConceptProposer::new(Box::new(client), settings.openai.clone());
    let rxnav = RxNavClient::new(&settings.rxnorm).context("create RxNav client")?;
    let validator =
        TerminologyValidator::new(Box::new(rxnav), settings.rxnorm.max_approximate_entries);

    let cancel = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(Arc::clone(&cancel))?;
    let mut engine =
        MappingEngine::new(proposer, validator, settings.pipeline).with_cancel_flag(cancel);

    println!("Starting product mapping...");
    let remaining = rows.len().saturating_sub(args.start_index);
    let mut reporter = RunReporter::new(remaining as u64);
    engine.run(&rows, args.start_index, &mut reporter);
    reporter.finish();

    let interrupted = engine.is_cancelled();
    if interrupted {
        println!("\nProcessing interrupted by user");
    }

    println!("Exporting results...");
    let export_path = export_results(engine.results(), &output_dir, &settings.output.prefix)
        .context("export results")?;
    info!(path = %export_path.display(), "export complete");

    Ok(ProcessResult {
        total_rows: rows.len(),
        statistics: engine.statistics(),
        export_path,
        interrupted,
    })
}

pub fn run_dashboard(args: &DashboardArgs) -> Result<DashboardData> {
    let rows = read_results(&args.results)
        .with_context(|| format!("read results {}", args.results.display()))?;
    debug!(rows = rows.len(), "results loaded");
    Ok(DashboardData::from_rows(rows))
}

/// Ctrl-C stops intake after the current record.
fn install_interrupt_handler(flag: Arc<AtomicBool>) -> Result<()> {
    ctrlc::set_handler(move || {
        if !flag.swap(true, Ordering::SeqCst) {
            eprintln!("\nInterrupt received, finishing the current product...");
        }
    })
    .context("install Ctrl-C handler")
}

/// Progress bar over the whole run, with a line per finished batch.
struct RunReporter {
    bar: ProgressBar,
}

impl RunReporter {
    fn new(len: u64) -> Self {
        let bar = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        ) {
            bar.set_style(style.progress_chars("=>-"));
        }
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for RunReporter {
    fn batch_started(&mut self, start: usize, end: usize) {
        self.bar
            .println(format!("Processing batch: {start} to {end}"));
    }

    fn record_started(&mut self, index: usize, product: &ProductContext) {
        let label = product.label();
        trace!(index, product = redact_value(label), "processing product");
        self.bar.set_message(label.to_string());
    }

    fn record_finished(&mut self, record: &MappingRecord) {
        if let Some(error) = record.error_detail() {
            debug!(index = record.index, status = %record.final_status, %error, "product not mapped");
            if record.final_status == FinalStatus::Error {
                self.bar
                    .println(format!("Error processing product {}: {error}", record.index));
            }
        }
        self.bar.inc(1);
    }

    fn batch_finished(&mut self, progress: &BatchProgress) {
        let stats = &progress.statistics;
        self.bar.println(format!(
            "Progress: {}/{} ({}%) | Success Rate: {:.1}% | Review Rate: {:.1}%",
            stats.total_processed,
            progress.total_rows,
            progress.percentage(),
            stats.success_rate,
            stats.review_rate
        ));
    }
}

use certdesk::certificates::CertificateKind;
use certdesk::config::AppConfig;
use certdesk::error::AppError;
use certdesk::ingest::{load_records, write_records, DatasetNormalizer, IngestReport, Ingestor};
use certdesk::store::{open_store, DocumentStore};
use certdesk::telemetry::{self, TelemetryMode};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct NormalizeArgs {
    /// Dataset selector: training or internship
    #[arg(long)]
    pub(crate) dataset: String,
    /// CSV export to normalize
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Write the JSON array here instead of the configured destination
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct IngestArgs {
    /// Only ingest this dataset (training or internship). Defaults to both.
    #[arg(long)]
    pub(crate) dataset: Option<String>,
    /// Read records from this JSON file instead of the configured path
    #[arg(long, requires = "dataset")]
    pub(crate) input: Option<PathBuf>,
}

pub(crate) fn run_normalize(args: NormalizeArgs) -> Result<(), AppError> {
    let NormalizeArgs {
        dataset,
        csv,
        output,
    } = args;

    let kind: CertificateKind = dataset.parse()?;
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, TelemetryMode::Batch)?;

    let settings = config.datasets.for_kind(kind);
    let normalized = DatasetNormalizer::from_path(&csv, kind, settings)?;
    let destination = output.unwrap_or(normalized.destination);
    write_records(&destination, &normalized.records)?;

    println!(
        "Normalized {} {} records from {} into {}",
        normalized.records.len(),
        kind,
        csv.display(),
        destination.display()
    );
    Ok(())
}

pub(crate) fn run_ingest(args: IngestArgs) -> Result<(), AppError> {
    let IngestArgs { dataset, input } = args;

    let selected = match dataset {
        Some(raw) => vec![raw.parse::<CertificateKind>()?],
        None => CertificateKind::ALL.to_vec(),
    };
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, TelemetryMode::Batch)?;

    let store = open_store(&config.store.connection_string)?;
    let ingestor = Ingestor::new(store, config.datasets.missing_key_policy);

    for kind in selected {
        let path = input
            .clone()
            .unwrap_or_else(|| config.datasets.for_kind(kind).output_path.clone());
        let report = ingest_file(&ingestor, kind, path)?;
        render_report(kind, &report);
    }

    Ok(())
}

fn ingest_file<S>(
    ingestor: &Ingestor<S>,
    kind: CertificateKind,
    path: PathBuf,
) -> Result<IngestReport, AppError>
where
    S: DocumentStore + ?Sized,
{
    let records = load_records(&path)?;
    Ok(ingestor.ingest_dataset(kind, records)?)
}

fn render_report(kind: CertificateKind, report: &IngestReport) {
    println!("{} -> {}", kind, report.collection);
    println!("- inserted: {}", report.inserted);
    println!("- already present: {}", report.skipped);
    if report.missing_key > 0 {
        println!("- missing '{}': {}", kind.unique_key(), report.missing_key);
    }
    println!("- documents in collection: {}", report.total_after);
}

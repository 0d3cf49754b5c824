mod normalizer;
mod parser;
mod service;

use crate::certificates::CertificateKind;
use crate::config::DatasetSettings;
use crate::store::Record;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub use normalizer::{normalize_record, title_case, FieldRole, FieldRoles};
pub use service::{load_records, IngestError, IngestReport, Ingestor, MissingKeyPolicy};

#[derive(Debug)]
pub enum NormalizeError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    DuplicateColumn(String),
}

impl std::fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizeError::Io(err) => write!(f, "failed to read or write dataset: {}", err),
            NormalizeError::Csv(err) => write!(f, "invalid CSV data: {}", err),
            NormalizeError::Json(err) => write!(f, "could not encode normalized records: {}", err),
            NormalizeError::DuplicateColumn(name) => {
                write!(f, "column '{}' appears more than once in the header", name)
            }
        }
    }
}

impl std::error::Error for NormalizeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NormalizeError::Io(err) => Some(err),
            NormalizeError::Csv(err) => Some(err),
            NormalizeError::Json(err) => Some(err),
            NormalizeError::DuplicateColumn(_) => None,
        }
    }
}

impl From<std::io::Error> for NormalizeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for NormalizeError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for NormalizeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Normalized rows of one dataset together with where they should be written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedDataset {
    pub kind: CertificateKind,
    pub destination: PathBuf,
    pub records: Vec<Record>,
}

pub struct DatasetNormalizer;

impl DatasetNormalizer {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        kind: CertificateKind,
        settings: &DatasetSettings,
    ) -> Result<NormalizedDataset, NormalizeError> {
        let file = fs::File::open(path)?;
        Self::from_reader(file, kind, settings)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        kind: CertificateKind,
        settings: &DatasetSettings,
    ) -> Result<NormalizedDataset, NormalizeError> {
        let records = parser::parse_records(reader)?
            .into_iter()
            .map(|record| normalize_record(record, &settings.roles))
            .collect::<Vec<_>>();

        info!(dataset = %kind, rows = records.len(), "normalized dataset");

        Ok(NormalizedDataset {
            kind,
            destination: settings.output_path.clone(),
            records,
        })
    }
}

/// Writes records as a single JSON array with four-space indentation, creating parent
/// directories as needed.
pub fn write_records<P: AsRef<Path>>(path: P, records: &[Record]) -> Result<(), NormalizeError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(fs::File::create(path)?);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    records.serialize(&mut serializer)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    info!(path = %path.display(), records = records.len(), "wrote normalized records");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::io::Cursor;

    #[test]
    fn normalizer_resolves_destination_from_settings() {
        let settings = DatasetSettings::defaults(CertificateKind::Training);
        let csv = "Name,Email,Program,start_date,Duration\n jane doe ,A@B.com, Data Science ,2024-01-08,4\n";

        let dataset =
            DatasetNormalizer::from_reader(Cursor::new(csv), CertificateKind::Training, &settings)
                .expect("normalizes");

        assert_eq!(dataset.destination, settings.output_path);
        assert_eq!(dataset.records.len(), 1);
        assert_eq!(dataset.records[0]["Name"], json!("Jane Doe"));
        assert_eq!(dataset.records[0]["Email"], json!("A@B.com"));
        assert_eq!(dataset.records[0]["Program"], json!("Data Science"));
        assert_eq!(dataset.records[0]["Duration"], json!(4));
    }

    #[test]
    fn whitespace_only_cells_normalize_to_empty_text() {
        let settings = DatasetSettings::defaults(CertificateKind::Internship);
        let csv = "Name,Internship Id,certificate\njane,   ,   \n";

        let dataset = DatasetNormalizer::from_reader(
            Cursor::new(csv),
            CertificateKind::Internship,
            &settings,
        )
        .expect("normalizes");

        assert_eq!(
            Value::Object(dataset.records[0].clone()),
            json!({ "Name": "Jane", "Internship Id": "", "certificate": "" })
        );
    }

    #[test]
    fn from_path_propagates_io_errors() {
        let settings = DatasetSettings::defaults(CertificateKind::Internship);
        let error = DatasetNormalizer::from_path(
            "./does-not-exist.csv",
            CertificateKind::Internship,
            &settings,
        )
        .expect_err("expected io error");

        match error {
            NormalizeError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn write_records_uses_four_space_indent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("Training Program Data").join("training_info.json");
        let record = json!({ "Name": "Jane Doe", "Duration": 4 })
            .as_object()
            .cloned()
            .expect("object");

        write_records(&path, &[record]).expect("writes");

        let written = fs::read_to_string(&path).expect("read back");
        assert_eq!(
            written,
            "[\n    {\n        \"Name\": \"Jane Doe\",\n        \"Duration\": 4\n    }\n]\n"
        );
    }
}

use certdesk::certificates::CertificateKind;
use certdesk::config::DatasetSettings;
use certdesk::ingest::{
    load_records, write_records, DatasetNormalizer, IngestError, Ingestor, MissingKeyPolicy,
};
use certdesk::store::{open_store, DocumentStore, InMemoryDocumentStore, Record};
use serde_json::{json, Value};
use std::sync::Arc;

fn record(value: Value) -> Record {
    value.as_object().cloned().expect("object literal")
}

#[test]
fn repeated_ingestion_skips_existing_keys() {
    let store = Arc::new(InMemoryDocumentStore::default());
    let ingestor = Ingestor::new(store.clone(), MissingKeyPolicy::Reject);
    let records = vec![record(json!({ "Email": "A@B.com", "Name": "jane doe" }))];

    let first = ingestor
        .ingest("trainingCertificates", records.clone(), "Email")
        .expect("first run");
    assert_eq!(
        (first.inserted, first.skipped, first.total_after),
        (1, 0, 1)
    );

    let second = ingestor
        .ingest("trainingCertificates", records, "Email")
        .expect("second run");
    assert_eq!(
        (second.inserted, second.skipped, second.total_after),
        (0, 1, 1)
    );
}

#[test]
fn only_new_keys_are_added_to_a_populated_collection() {
    let store = Arc::new(InMemoryDocumentStore::default());
    let ingestor = Ingestor::new(store.clone(), MissingKeyPolicy::Reject);

    ingestor
        .ingest_dataset(
            CertificateKind::Training,
            vec![record(json!({ "Email": "a@b.com", "Name": "Jane Doe" }))],
        )
        .expect("seed");

    let report = ingestor
        .ingest_dataset(
            CertificateKind::Training,
            vec![
                record(json!({ "Email": "a@b.com", "Name": "Jane Renamed" })),
                record(json!({ "Email": "c@d.com", "Name": "Ravi Kumar" })),
            ],
        )
        .expect("second run");

    assert_eq!(report.collection, "trainingCertificates");
    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.total_after, 2);

    let existing = store
        .find_one("trainingCertificates", "Email", &json!("a@b.com"))
        .expect("query")
        .expect("still present");
    assert_eq!(existing.fields["Name"], "Jane Doe");
}

#[test]
fn normalized_internship_export_respects_missing_key_policy() {
    let settings = DatasetSettings::defaults(CertificateKind::Internship);
    let normalized = DatasetNormalizer::from_path(
        "tests/fixtures/internship_export.csv",
        CertificateKind::Internship,
        &settings,
    )
    .expect("normalize");
    assert_eq!(normalized.records.len(), 3);
    assert_eq!(normalized.records[0]["Name"], "Jane Doe");
    assert_eq!(normalized.records[0]["Internship Id"], "sp-int-07");
    assert_eq!(normalized.records[2]["Name"], "Lee O'Brien");
    assert!(normalized.records[2]["Internship Id"].is_null());

    let store = Arc::new(InMemoryDocumentStore::default());
    let strict = Ingestor::new(store.clone(), MissingKeyPolicy::Reject);
    let error = strict
        .ingest_dataset(CertificateKind::Internship, normalized.records.clone())
        .expect_err("missing key rejected");
    assert!(matches!(
        error,
        IngestError::MissingUniqueKey { index: 2, .. }
    ));
    assert_eq!(
        store.count("internshipCertificates").expect("count"),
        0,
        "rejected runs write nothing"
    );

    let lenient = Ingestor::new(store, MissingKeyPolicy::Skip);
    let report = lenient
        .ingest_dataset(CertificateKind::Internship, normalized.records)
        .expect("skip policy");
    assert_eq!(report.inserted, 2);
    assert_eq!(report.missing_key, 1);
    assert_eq!(report.total_after, 2);
}

#[test]
fn json_handoff_survives_a_sqlite_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let json_path = dir.path().join("Training Program Data").join("training_info.json");
    let db_path = dir.path().join("certdesk.sqlite");
    let connection = format!("sqlite://{}", db_path.display());

    let settings = DatasetSettings::defaults(CertificateKind::Training);
    let normalized = DatasetNormalizer::from_path(
        "tests/fixtures/training_export.csv",
        CertificateKind::Training,
        &settings,
    )
    .expect("normalize");
    write_records(&json_path, &normalized.records).expect("write json");

    let records = load_records(&json_path).expect("load json");
    assert_eq!(records, normalized.records);
    assert_eq!(records[1]["Name"], "Ravi Kumar");
    assert_eq!(records[0]["Duration"], 4);

    {
        let store = open_store(&connection).expect("open sqlite");
        let report = Ingestor::new(store, MissingKeyPolicy::Reject)
            .ingest_dataset(CertificateKind::Training, records.clone())
            .expect("first run");
        assert_eq!(report.inserted, 3);
    }

    let reopened = open_store(&connection).expect("reopen sqlite");
    let report = Ingestor::new(reopened, MissingKeyPolicy::Reject)
        .ingest_dataset(CertificateKind::Training, records)
        .expect("second run");
    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped, 3);
    assert_eq!(report.total_after, 3);
}

#[test]
fn whitespace_only_key_is_present_not_missing() {
    let settings = DatasetSettings::defaults(CertificateKind::Internship);
    let csv = "Name,Internship Id,certificate\njane,   ,   \n";
    let normalized = DatasetNormalizer::from_reader(
        csv.as_bytes(),
        CertificateKind::Internship,
        &settings,
    )
    .expect("normalize");

    let store = Arc::new(InMemoryDocumentStore::default());
    let report = Ingestor::new(store, MissingKeyPolicy::Reject)
        .ingest_dataset(CertificateKind::Internship, normalized.records)
        .expect("blank key is still a key");
    assert_eq!(report.inserted, 1);
    assert_eq!(report.missing_key, 0);
}

use crate::config::ConfigError;
use crate::store::{Document, DocumentId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The two certificate programs served by the lookup API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateKind {
    Training,
    Internship,
}

impl CertificateKind {
    pub const ALL: [CertificateKind; 2] = [CertificateKind::Training, CertificateKind::Internship];

    pub fn label(self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Internship => "internship",
        }
    }

    pub fn collection(self) -> &'static str {
        match self {
            Self::Training => "trainingCertificates",
            Self::Internship => "internshipCertificates",
        }
    }

    /// Field used by ingestion to detect duplicates.
    pub fn unique_key(self) -> &'static str {
        match self {
            Self::Training => "Email",
            Self::Internship => "Internship Id",
        }
    }

    pub fn not_found_message(self) -> &'static str {
        match self {
            Self::Training => "Training ID not found",
            Self::Internship => "Internship ID not found",
        }
    }

    /// Returned in place of `certificate_link` when no certificate has been issued.
    pub fn pending_link_message(self) -> &'static str {
        match self {
            Self::Training => "Training Completion Certificate is not issued yet.",
            Self::Internship => {
                "Unable to fetch the Certificate. Reach out to our team via team@spartificial.com"
            }
        }
    }
}

impl fmt::Display for CertificateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CertificateKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "training" => Ok(Self::Training),
            "internship" => Ok(Self::Internship),
            _ => Err(ConfigError::UnknownDataset(value.to_string())),
        }
    }
}

/// Stored shape of a training certificate document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrainingCertificate {
    #[serde(rename = "Name", deserialize_with = "scalar_text")]
    pub name: String,
    #[serde(rename = "Email", deserialize_with = "scalar_text")]
    pub email: String,
    #[serde(rename = "Program", deserialize_with = "scalar_text")]
    pub program: String,
    #[serde(rename = "start_date", deserialize_with = "scalar_text")]
    pub start_date: String,
    #[serde(rename = "Duration", deserialize_with = "scalar_text")]
    pub duration: String,
    #[serde(default, deserialize_with = "optional_scalar_text")]
    pub certificate: Option<String>,
}

/// Stored shape of an internship certificate document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InternshipCertificate {
    #[serde(rename = "Name", deserialize_with = "scalar_text")]
    pub name: String,
    #[serde(rename = "Email Id", deserialize_with = "scalar_text")]
    pub email: String,
    #[serde(rename = "Project Name", deserialize_with = "scalar_text")]
    pub project_name: String,
    #[serde(rename = "Mentor Name", deserialize_with = "scalar_text")]
    pub mentor_name: String,
    #[serde(rename = "Mentor Email", deserialize_with = "scalar_text")]
    pub mentor_email: String,
    #[serde(rename = "Start Date", deserialize_with = "scalar_text")]
    pub start_date: String,
    #[serde(rename = "Submission Date", deserialize_with = "scalar_text")]
    pub end_date: String,
    #[serde(default, deserialize_with = "optional_scalar_text")]
    pub certificate: Option<String>,
}

/// A stored document decoded against its program's schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredCertificate {
    Training(TrainingCertificate),
    Internship(InternshipCertificate),
}

impl StoredCertificate {
    pub fn decode(kind: CertificateKind, document: Document) -> Result<Self, SchemaError> {
        match kind {
            CertificateKind::Training => decode_as(kind, document).map(Self::Training),
            CertificateKind::Internship => decode_as(kind, document).map(Self::Internship),
        }
    }

    pub fn kind(&self) -> CertificateKind {
        match self {
            Self::Training(_) => CertificateKind::Training,
            Self::Internship(_) => CertificateKind::Internship,
        }
    }

    pub fn into_response(self) -> CertificateResponse {
        match self {
            Self::Training(certificate) => CertificateResponse::Training(certificate.into()),
            Self::Internship(certificate) => CertificateResponse::Internship(certificate.into()),
        }
    }
}

fn decode_as<T: DeserializeOwned>(
    kind: CertificateKind,
    document: Document,
) -> Result<T, SchemaError> {
    let Document { id, fields } = document;
    serde_json::from_value(Value::Object(fields)).map_err(|source| SchemaError { kind, id, source })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingResponse {
    pub name: String,
    pub email: String,
    pub program_name: String,
    pub start_date: String,
    pub duration: String,
    pub certificate_link: String,
}

impl From<TrainingCertificate> for TrainingResponse {
    fn from(certificate: TrainingCertificate) -> Self {
        Self {
            name: certificate.name,
            email: certificate.email,
            program_name: certificate.program,
            start_date: certificate.start_date,
            duration: certificate.duration,
            certificate_link: certificate.certificate.unwrap_or_else(|| {
                CertificateKind::Training.pending_link_message().to_string()
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternshipResponse {
    pub name: String,
    pub email: String,
    pub project_name: String,
    pub mentor_name: String,
    pub mentor_email: String,
    pub start_date: String,
    pub end_date: String,
    pub certificate_link: String,
}

impl From<InternshipCertificate> for InternshipResponse {
    fn from(certificate: InternshipCertificate) -> Self {
        Self {
            name: certificate.name,
            email: certificate.email,
            project_name: certificate.project_name,
            mentor_name: certificate.mentor_name,
            mentor_email: certificate.mentor_email,
            start_date: certificate.start_date,
            end_date: certificate.end_date,
            certificate_link: certificate.certificate.unwrap_or_else(|| {
                CertificateKind::Internship.pending_link_message().to_string()
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CertificateResponse {
    Training(TrainingResponse),
    Internship(InternshipResponse),
}

/// A stored document is missing a required field or holds a non-scalar value.
#[derive(Debug, thiserror::Error)]
#[error("{kind} certificate {id} does not match the stored schema: {source}")]
pub struct SchemaError {
    pub kind: CertificateKind,
    pub id: DocumentId,
    #[source]
    pub source: serde_json::Error,
}

fn scalar_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_to_text(value).ok_or_else(|| serde::de::Error::custom("expected a text or number value"))
}

fn optional_scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_to_text(value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("expected a text or number value")),
    }
}

fn scalar_to_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

//! Training and internship certificate schemas and the read-only lookup API.

pub mod domain;
pub mod lookup;
pub mod router;

pub use domain::{
    CertificateKind, CertificateResponse, InternshipCertificate, InternshipResponse,
    SchemaError, StoredCertificate, TrainingCertificate, TrainingResponse,
};
pub use lookup::{CertificateLookupService, LookupError};
pub use router::certificate_router;

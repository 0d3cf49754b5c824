use std::sync::Arc;

use axum::http::StatusCode;
use tracing::{debug, warn};

use super::domain::{CertificateKind, CertificateResponse, SchemaError, StoredCertificate};
use crate::store::{DocumentId, DocumentIdError, DocumentStore, StoreError};

/// Read-only certificate lookups over an injected document store.
pub struct CertificateLookupService<S: ?Sized> {
    store: Arc<S>,
}

impl<S> CertificateLookupService<S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Fetches a certificate from the kind's collection and decodes it against that
    /// kind's schema.
    pub fn lookup(
        &self,
        kind: CertificateKind,
        raw_id: &str,
    ) -> Result<StoredCertificate, LookupError> {
        let id: DocumentId = raw_id.parse()?;
        let document = self
            .store
            .find_by_id(kind.collection(), &id)?
            .ok_or(LookupError::NotFound(kind))?;

        debug!(%kind, %id, "certificate document found");
        StoredCertificate::decode(kind, document).map_err(|err| {
            warn!(%kind, %id, error = %err, "stored certificate failed schema check");
            LookupError::Schema(err)
        })
    }

    /// Looks up a certificate and shapes it for the HTTP response.
    pub fn respond(
        &self,
        kind: CertificateKind,
        raw_id: &str,
    ) -> Result<CertificateResponse, LookupError> {
        self.lookup(kind, raw_id).map(StoredCertificate::into_response)
    }
}

/// Error raised by a certificate lookup.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("malformed certificate id: {0}")]
    MalformedId(#[from] DocumentIdError),
    #[error("{}", .0.not_found_message())]
    NotFound(CertificateKind),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LookupError {
    pub fn status(&self) -> StatusCode {
        match self {
            LookupError::MalformedId(_) => StatusCode::BAD_REQUEST,
            LookupError::NotFound(_) => StatusCode::NOT_FOUND,
            LookupError::Schema(_) | LookupError::Store(StoreError::Corrupt { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            LookupError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

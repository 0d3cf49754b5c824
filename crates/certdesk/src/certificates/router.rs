use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tracing::error;

use super::domain::CertificateKind;
use super::lookup::{CertificateLookupService, LookupError};
use crate::store::DocumentStore;

/// Router builder exposing the certificate lookup endpoints.
pub fn certificate_router<S>(service: Arc<CertificateLookupService<S>>) -> Router
where
    S: DocumentStore + ?Sized + 'static,
{
    Router::new()
        .route("/", get(index_handler))
        .route("/training/:certificate_id", get(training_handler::<S>))
        .route("/internship/:certificate_id", get(internship_handler::<S>))
        .with_state(service)
}

pub(crate) async fn index_handler() -> Json<serde_json::Value> {
    Json(json!({ "App": "Running" }))
}

pub(crate) async fn training_handler<S>(
    State(service): State<Arc<CertificateLookupService<S>>>,
    Path(certificate_id): Path<String>,
) -> Response
where
    S: DocumentStore + ?Sized + 'static,
{
    match service.respond(CertificateKind::Training, &certificate_id) {
        Ok(body) => Json(body).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn internship_handler<S>(
    State(service): State<Arc<CertificateLookupService<S>>>,
    Path(certificate_id): Path<String>,
) -> Response
where
    S: DocumentStore + ?Sized + 'static,
{
    match service.respond(CertificateKind::Internship, &certificate_id) {
        Ok(body) => Json(body).into_response(),
        Err(err) => err.into_response(),
    }
}

impl IntoResponse for LookupError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "certificate lookup failed");
        }

        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryDocumentStore, Record};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        (status, serde_json::from_slice(&body).expect("json payload"))
    }

    fn internship_record() -> Record {
        json!({
            "Name": "Jane Doe",
            "Email Id": "jane@example.com",
            "Internship Id": "sp-int-07",
            "Project Name": "Satellite Imagery",
            "Mentor Name": "Ravi Kumar",
            "Mentor Email": "ravi@example.com",
            "Start Date": "2024-02-01",
            "Submission Date": "2024-04-30",
        })
        .as_object()
        .cloned()
        .expect("object literal")
    }

    #[tokio::test]
    async fn index_reports_running() {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::default());
        let router = certificate_router(Arc::new(CertificateLookupService::new(store)));

        let (status, body) = get_json(router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "App": "Running" }));
    }

    #[tokio::test]
    async fn internship_endpoint_returns_response_shape() {
        let store = Arc::new(InMemoryDocumentStore::default());
        let id = store
            .insert_one("internshipCertificates", internship_record())
            .expect("insert");
        let router = certificate_router(Arc::new(CertificateLookupService::new(store)));

        let (status, body) = get_json(router, &format!("/internship/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "name": "Jane Doe",
                "email": "jane@example.com",
                "project_name": "Satellite Imagery",
                "mentor_name": "Ravi Kumar",
                "mentor_email": "ravi@example.com",
                "start_date": "2024-02-01",
                "end_date": "2024-04-30",
                "certificate_link": "Unable to fetch the Certificate. Reach out to our team via team@spartificial.com",
            })
        );
    }

    #[tokio::test]
    async fn error_bodies_use_detail() {
        let store = Arc::new(InMemoryDocumentStore::default());
        let router = certificate_router(Arc::new(CertificateLookupService::new(store)));

        let (status, body) =
            get_json(router.clone(), "/training/661f00010000000000000007").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "detail": "Training ID not found" }));

        let (status, body) = get_json(router, "/internship/xyz").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"]
            .as_str()
            .expect("detail string")
            .starts_with("malformed certificate id"));
    }
}

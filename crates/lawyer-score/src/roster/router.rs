use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::filter::RosterFilter;
use super::repository::LawyerRepository;
use super::service::{IngestError, LawyerIngestService};

/// Body accepted by the upload and preview endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvUpload {
    pub csv: String,
}

/// CSV text from either a `text/csv` body or a JSON [`CsvUpload`]. The raw
/// form is what a peer's `HttpRemoteProcessor` sends to the preview route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvBody(pub String);

#[async_trait]
impl<S> FromRequest<S> for CsvBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_csv(req.headers()) {
            let csv = String::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            return Ok(Self(csv));
        }

        let axum::Json(upload) = axum::Json::<CsvUpload>::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(Self(upload.csv))
    }
}

fn is_csv(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|content_type| content_type.essence_str() == mime::TEXT_CSV.essence_str())
}

/// Router builder exposing the roster endpoints.
pub fn roster_router<R>(service: Arc<LawyerIngestService<R>>) -> Router
where
    R: LawyerRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/lawyers",
            get(list_handler::<R>).delete(clear_handler::<R>),
        )
        .route("/api/v1/lawyers/upload", post(upload_handler::<R>))
        .route("/api/v1/lawyers/preview", post(preview_handler::<R>))
        .route("/api/v1/lawyers/summary", get(summary_handler::<R>))
        .with_state(service)
}

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> Response {
    let payload = json!({
        "error": message.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn upload_handler<R>(
    State(service): State<Arc<LawyerIngestService<R>>>,
    CsvBody(csv): CsvBody,
) -> Response
where
    R: LawyerRepository + 'static,
{
    match service.ingest(&csv).await {
        Ok(report) => (StatusCode::CREATED, axum::Json(report)).into_response(),
        Err(IngestError::Pipeline(error)) => error_response(StatusCode::BAD_REQUEST, error),
        Err(error @ IngestError::ProcessorsExhausted { .. }) => {
            error_response(StatusCode::BAD_GATEWAY, error)
        }
        Err(error @ IngestError::Repository(_)) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, error)
        }
    }
}

pub(crate) async fn preview_handler<R>(
    State(service): State<Arc<LawyerIngestService<R>>>,
    CsvBody(csv): CsvBody,
) -> Response
where
    R: LawyerRepository + 'static,
{
    match service.preview(&csv) {
        Ok(output) => (StatusCode::OK, axum::Json(output)).into_response(),
        Err(error) => error_response(StatusCode::BAD_REQUEST, error),
    }
}

pub(crate) async fn list_handler<R>(
    State(service): State<Arc<LawyerIngestService<R>>>,
    Query(filter): Query<RosterFilter>,
) -> Response
where
    R: LawyerRepository + 'static,
{
    match service.list(&filter) {
        Ok(lawyers) => (StatusCode::OK, axum::Json(lawyers)).into_response(),
        Err(error) => error_response(StatusCode::INTERNAL_SERVER_ERROR, error),
    }
}

pub(crate) async fn summary_handler<R>(
    State(service): State<Arc<LawyerIngestService<R>>>,
    Query(filter): Query<RosterFilter>,
) -> Response
where
    R: LawyerRepository + 'static,
{
    match service.summary(&filter) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(StatusCode::INTERNAL_SERVER_ERROR, error),
    }
}

pub(crate) async fn clear_handler<R>(
    State(service): State<Arc<LawyerIngestService<R>>>,
) -> Response
where
    R: LawyerRepository + 'static,
{
    match service.clear() {
        Ok(cleared) => (StatusCode::OK, axum::Json(json!({ "cleared": cleared }))).into_response(),
        Err(error) => error_response(StatusCode::INTERNAL_SERVER_ERROR, error),
    }
}

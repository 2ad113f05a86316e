use crate::config::ConfigError;
use crate::pipeline::InputError;
use crate::roster::{IngestError, RemoteProcessorError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Input(InputError),
    Ingest(IngestError),
    Remote(RemoteProcessorError),
    Render(serde_json::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {err}"),
            AppError::Telemetry(err) => write!(f, "telemetry error: {err}"),
            AppError::Io(err) => write!(f, "io error: {err}"),
            AppError::Server(err) => write!(f, "server error: {err}"),
            AppError::Input(err) => write!(f, "invalid csv input: {err}"),
            AppError::Ingest(err) => write!(f, "ingest failed: {err}"),
            AppError::Remote(err) => write!(f, "remote processor unavailable: {err}"),
            AppError::Render(err) => write!(f, "unable to render output: {err}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Input(err) => Some(err),
            AppError::Ingest(err) => Some(err),
            AppError::Remote(err) => Some(err),
            AppError::Render(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Input(_) | AppError::Ingest(IngestError::Pipeline(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Ingest(IngestError::ProcessorsExhausted { .. }) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Ingest(IngestError::Repository(_))
            | AppError::Remote(_)
            | AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<InputError> for AppError {
    fn from(value: InputError) -> Self {
        Self::Input(value)
    }
}

impl From<IngestError> for AppError {
    fn from(value: IngestError) -> Self {
        Self::Ingest(value)
    }
}

impl From<RemoteProcessorError> for AppError {
    fn from(value: RemoteProcessorError) -> Self {
        Self::Remote(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Render(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::RepositoryError;

    #[test]
    fn maps_failures_to_status_codes() {
        let cases = [
            (AppError::Input(InputError::Empty), StatusCode::BAD_REQUEST),
            (
                AppError::Ingest(IngestError::Pipeline(InputError::NoDataRows)),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Ingest(IngestError::ProcessorsExhausted {
                    remote: RemoteProcessorError::Empty,
                    local: InputError::NoValidRows { skipped: 2 },
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::Ingest(IngestError::Repository(RepositoryError::Unavailable(
                    "offline".to_string(),
                ))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AppError::Config(ConfigError::InvalidPort), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}

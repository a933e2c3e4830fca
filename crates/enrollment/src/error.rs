use crate::config::ConfigError;
use crate::registration::{
    IntakeViolation, LedgerError, RegistrationServiceError, RepositoryError, RosterExportError,
};
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
    Registration(RegistrationServiceError),
    Roster(RosterExportError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Registration(RegistrationServiceError::Intake(_))
            | AppError::Registration(RegistrationServiceError::Ledger(
                LedgerError::MissingIdentity,
            )) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Registration(RegistrationServiceError::Ledger(
                LedgerError::DuplicateRegistrant(_),
            )) => StatusCode::CONFLICT,
            AppError::Registration(RegistrationServiceError::Ledger(LedgerError::NotFound(_))) => {
                StatusCode::NOT_FOUND
            }
            AppError::Registration(RegistrationServiceError::Ledger(LedgerError::Repository(
                RepositoryError::Unavailable(_),
            ))) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Registration(_)
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Roster(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Registration(err) => write!(f, "{}", err),
            AppError::Roster(err) => write!(f, "roster error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Registration(err) => Some(err),
            AppError::Roster(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

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

impl From<RegistrationServiceError> for AppError {
    fn from(value: RegistrationServiceError) -> Self {
        Self::Registration(value)
    }
}

impl From<LedgerError> for AppError {
    fn from(value: LedgerError) -> Self {
        Self::Registration(RegistrationServiceError::Ledger(value))
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::from(LedgerError::Repository(value))
    }
}

impl From<IntakeViolation> for AppError {
    fn from(value: IntakeViolation) -> Self {
        Self::Registration(RegistrationServiceError::Intake(value))
    }
}

impl From<RosterExportError> for AppError {
    fn from(value: RosterExportError) -> Self {
        Self::Roster(value)
    }
}

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use infra::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Domain(DomainError::Db(e))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    /// Field-id to message, present for validation failures so the client
    /// can re-render the form.
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<BTreeMap<String, String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, fields) = match &self {
            AppError::Domain(DomainError::Validation(outcome)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Some("validation_failed"),
                Some(outcome.errors.clone()),
            ),
            AppError::Domain(DomainError::InvalidTransition { .. }) => {
                (StatusCode::CONFLICT, Some("invalid_transition"), None)
            }
            // Distinct from validation so the client can offer "resume
            // existing registration" instead of "fix and retry".
            AppError::Domain(DomainError::DuplicateTeamName(_)) => {
                (StatusCode::CONFLICT, Some("team_name_taken"), None)
            }
            AppError::Domain(DomainError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, Some("not_found"), None)
            }
            AppError::Domain(DomainError::CorruptState(_) | DomainError::Db(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, None, None)
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, None, None),
        };

        let body = ErrorBody {
            error: self.to_string(),
            code,
            fields,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn maps_domain_errors_to_status_codes() {
        assert_eq!(
            status_of(AppError::Domain(DomainError::NotFound("registration"))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Domain(DomainError::InvalidTransition {
                from: "approved",
                to: "draft",
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::Domain(DomainError::DuplicateTeamName(
                "Sharks".to_string()
            ))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(AppError::BadRequest("nope".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn corrupt_stored_state_is_a_server_error_not_a_404() {
        assert_eq!(
            status_of(AppError::Domain(DomainError::CorruptState(
                "registration status"
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

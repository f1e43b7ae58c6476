use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use vows_mail::MailError;
use vows_types::api::ErrorBody;
use vows_types::validate::FieldErrors;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(FieldErrors),

    /// The body is not JSON of the expected shape.
    #[error("malformed body: {0}")]
    Body(#[from] JsonRejection),

    /// The request collides with stored state (duplicate email, declined guest...).
    #[error("{title}: {description}")]
    Conflict {
        title: &'static str,
        description: &'static str,
    },

    #[error("not found")]
    NotFound,

    #[error("unauthorized")]
    Unauthorized,

    #[error("mail failure: {0}")]
    Mail(#[from] MailError),

    #[error("store failure: {0}")]
    Store(#[from] anyhow::Error),
}

impl ApiError {
    pub fn already_registered() -> Self {
        Self::Conflict {
            title: "Already Registered",
            description: "This email address has already been used to RSVP.",
        }
    }

    pub fn guest_exists() -> Self {
        Self::Conflict {
            title: "Guest Already Exists",
            description: "An RSVP with this email already exists.",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, title, description, fields) = match self {
            ApiError::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Please check the form",
                "Some fields need your attention.".to_string(),
                Some(fields),
            ),
            ApiError::Body(rejection) => {
                (rejection.status(), "Please check the form", rejection.body_text(), None)
            }
            ApiError::Conflict { title, description } => {
                (StatusCode::CONFLICT, title, description.to_string(), None)
            }
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                "Not Found",
                "That record no longer exists.".to_string(),
                None,
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "Please sign in again.".to_string(),
                None,
            ),
            ApiError::Mail(e) => {
                warn!("Email send failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Send Failed",
                    "Could not send the email. Please try again.".to_string(),
                    None,
                )
            }
            ApiError::Store(e) => {
                error!("Store error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong",
                    "Could not save your changes. Please try again.".to_string(),
                    None,
                )
            }
        };

        let body = ErrorBody {
            title: title.to_string(),
            description,
            fields,
        };
        (status, Json(body)).into_response()
    }
}

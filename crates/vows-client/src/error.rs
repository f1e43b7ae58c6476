use thiserror::Error;
use uuid::Uuid;

use vows_types::api::ErrorBody;
use vows_types::validate::FieldErrors;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body meant for the user.
    #[error("{}: {}", .body.title, .body.description)]
    Api { status: u16, body: ErrorBody },

    #[error("Sign in to the dashboard first")]
    NotSignedIn,

    #[error("Please fix the highlighted fields")]
    Invalid(FieldErrors),

    #[error("A submission is already in progress")]
    Busy,

    #[error("No memory with id {0}")]
    UnknownMemory(Uuid),

    #[error("{0}")]
    Photo(&'static str),

    #[error("Live feed error: {0}")]
    Feed(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Local storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed data: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Headline and detail to show in a toast.
    pub fn message(&self) -> (String, String) {
        match self {
            Self::Api { body, .. } => (body.title.clone(), body.description.clone()),
            Self::Invalid(_) => ("Check the form".into(), self.to_string()),
            other => ("Something went wrong".into(), other.to_string()),
        }
    }

    /// Per-field messages, from local validation or a 422 response.
    pub fn fields(&self) -> Option<&FieldErrors> {
        match self {
            Self::Invalid(fields) => Some(fields),
            Self::Api { body, .. } => body.fields.as_ref(),
            _ => None,
        }
    }
}

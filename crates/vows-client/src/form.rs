use vows_types::api::{GuestbookRequest, MemoryCreated, RsvpRequest, SubmitRsvpResponse};
use vows_types::validate::{self, Audience, FieldErrors};

use crate::api::ApiClient;
use crate::error::ClientError;

/// Where a form is in its submit cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Editing {
        fields: FieldErrors,
        error: Option<String>,
    },
    Validating,
    Submitting,
    Confirmed {
        title: String,
        description: String,
    },
}

impl Default for FormState {
    fn default() -> Self {
        Self::Editing {
            fields: FieldErrors::new(),
            error: None,
        }
    }
}

/// Drives the RSVP and guestbook forms:
/// editing -> validating -> submitting -> confirmed, falling back to editing
/// on invalid input or a failed submit.
#[derive(Debug, Default)]
pub struct FormMachine {
    state: FormState,
}

impl FormMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, FormState::Validating | FormState::Submitting)
    }

    /// Runs local validation. On success the form is `Submitting` and the
    /// caller owns the request; on failure it is back to `Editing` with the
    /// field messages. A form already in flight refuses with `Busy`.
    pub fn begin<T>(
        &mut self,
        check: impl FnOnce() -> Result<T, FieldErrors>,
    ) -> Result<T, ClientError> {
        if self.is_busy() {
            return Err(ClientError::Busy);
        }

        self.state = FormState::Validating;
        match check() {
            Ok(value) => {
                self.state = FormState::Submitting;
                Ok(value)
            }
            Err(fields) => {
                self.state = FormState::Editing {
                    fields: fields.clone(),
                    error: None,
                };
                Err(ClientError::Invalid(fields))
            }
        }
    }

    pub fn succeed(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.state = FormState::Confirmed {
            title: title.into(),
            description: description.into(),
        };
    }

    /// Back to editing with the error shown; server field messages are kept.
    pub fn fail(&mut self, err: &ClientError) {
        let (_, description) = err.message();
        self.state = FormState::Editing {
            fields: err.fields().cloned().unwrap_or_default(),
            error: Some(description),
        };
    }

    /// Starts a fresh form, e.g. after the confirmation is dismissed.
    pub fn reset(&mut self) {
        self.state = FormState::default();
    }

    pub async fn submit_rsvp(
        &mut self,
        client: &ApiClient,
        req: &RsvpRequest,
    ) -> Result<SubmitRsvpResponse, ClientError> {
        self.begin(|| validate::rsvp(req, Audience::Guest))?;
        match client.submit_rsvp(req).await {
            Ok(resp) => {
                self.succeed(resp.title.clone(), resp.description.clone());
                Ok(resp)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    pub async fn share_memory(
        &mut self,
        client: &ApiClient,
        req: &GuestbookRequest,
    ) -> Result<MemoryCreated, ClientError> {
        self.begin(|| validate::memory(req))?;
        match client.create_memory(req).await {
            Ok(resp) => {
                self.succeed(resp.title.clone(), resp.description.clone());
                Ok(resp)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }
}

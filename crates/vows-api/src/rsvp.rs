use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{SecondsFormat, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use vows_db::InsertOutcome;
use vows_mail::templates;
use vows_types::api::{Notification, RsvpRequest, SubmitRsvpResponse};
use vows_types::events::LiveEvent;
use vows_types::models::{Attending, RsvpDraft, RsvpEntry};
use vows_types::validate::{self, Audience};

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::{AppState, with_db};

/// Stores a new entry unless its email is already registered.
/// Returns `None` for a duplicate; nothing is written in that case.
pub(crate) async fn insert_entry(
    state: &AppState,
    draft: RsvpDraft,
) -> Result<Option<RsvpEntry>, ApiError> {
    let id = Uuid::new_v4();
    let created_at = Utc::now();
    let stamp = created_at.to_rfc3339_opts(SecondsFormat::Micros, true);

    let row_draft = draft.clone();
    let outcome =
        with_db(state, move |db| db.insert_rsvp(&id.to_string(), &row_draft, &stamp)).await?;
    if outcome == InsertOutcome::Duplicate {
        return Ok(None);
    }

    let entry = RsvpEntry {
        id,
        email: draft.email,
        attending: draft.attending,
        name: draft.name,
        phone: draft.phone,
        guests: draft.guests,
        relation: draft.relation,
        directions: draft.directions,
        created_at,
    };
    state.dispatcher.broadcast(LiveEvent::RsvpCreated {
        entry: entry.clone(),
    });
    Ok(Some(entry))
}

/// Emails a freshly stored guest. A failed send leaves the entry in place:
/// the guest is recorded but unnotified, and the dashboard can resend.
async fn notify_new_guest(state: &AppState, entry: &RsvpEntry) -> Notification {
    let event = &state.settings.event;
    let email = match entry.attending {
        Attending::Yes => templates::confirmation(&entry.email, entry.display_name(), event),
        Attending::No if state.settings.acknowledge_declines => {
            templates::acknowledgement(&entry.email, entry.display_name(), event)
        }
        Attending::No => return Notification::Skipped,
    };

    match state.mailer.send(&email).await {
        Ok(()) => {
            info!("Sent RSVP email to {} via {}", entry.email, state.mailer.name());
            Notification::Sent
        }
        Err(e) => {
            warn!("RSVP {} stored but email to {} failed: {}", entry.id, entry.email, e);
            Notification::Failed
        }
    }
}

/// POST /rsvp: public RSVP form.
pub async fn submit_rsvp(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RsvpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = validate::rsvp(&req, Audience::Guest).map_err(ApiError::Validation)?;

    let Some(entry) = insert_entry(&state, draft).await? else {
        info!("Duplicate RSVP refused for {}", req.email.trim());
        return Err(ApiError::already_registered());
    };
    info!("RSVP {} recorded ({})", entry.id, entry.attending);

    let notification = notify_new_guest(&state, &entry).await;
    let description = match (entry.attending, notification) {
        (_, Notification::Failed) => {
            "Your RSVP has been received, but we could not send your confirmation email."
        }
        (Attending::Yes, _) => "Your RSVP has been received. We can't wait to celebrate with you!",
        (Attending::No, _) => "Thank you for letting us know. We will miss you!",
    };

    Ok((
        StatusCode::CREATED,
        Json(SubmitRsvpResponse {
            entry,
            title: "Thank You!".into(),
            description: description.into(),
            notification,
        }),
    ))
}

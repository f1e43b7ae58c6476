use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};
use uuid::Uuid;

use vows_db::UpdateOutcome;
use vows_mail::templates;
use vows_types::api::{Ack, GuestStats, ReminderReport, RsvpRequest};
use vows_types::events::LiveEvent;
use vows_types::filter::GuestFilter;
use vows_types::models::{Attending, RsvpEntry};
use vows_types::validate::{self, Audience};

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::rsvp::insert_entry;
use crate::state::{AppState, with_db};

/// Every entry, newest first.
pub(crate) async fn load_entries(state: &AppState) -> Result<Vec<RsvpEntry>, ApiError> {
    with_db(state, |db| {
        db.list_rsvps()?
            .into_iter()
            .map(RsvpEntry::try_from)
            .collect::<anyhow::Result<Vec<_>>>()
    })
    .await
}

async fn load_entry(state: &AppState, id: Uuid) -> Result<RsvpEntry, ApiError> {
    with_db(state, move |db| {
        db.get_rsvp(&id.to_string())?
            .map(RsvpEntry::try_from)
            .transpose()
    })
    .await?
    .ok_or(ApiError::NotFound)
}

/// GET /admin/rsvps?attending=all|yes|no&search=...
pub async fn list_rsvps(
    State(state): State<AppState>,
    Query(filter): Query<GuestFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = load_entries(&state).await?;
    let shown: Vec<RsvpEntry> = entries.into_iter().filter(|e| filter.matches(e)).collect();
    Ok(Json(shown))
}

/// GET /admin/stats
pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let entries = load_entries(&state).await?;
    Ok(Json(GuestStats::tally(&entries)))
}

/// POST /admin/rsvps: operator adds a guest. No email is sent.
pub async fn add_rsvp(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RsvpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = validate::rsvp(&req, Audience::Admin).map_err(ApiError::Validation)?;
    let entry = insert_entry(&state, draft)
        .await?
        .ok_or_else(ApiError::guest_exists)?;

    info!("Dashboard added guest {}", entry.id);
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PUT /admin/rsvps/{id}: overwrite in place. Last writer wins.
pub async fn update_rsvp(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    JsonBody(req): JsonBody<RsvpRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = validate::rsvp(&req, Audience::Admin).map_err(ApiError::Validation)?;

    let outcome = with_db(&state, move |db| db.update_rsvp(&id.to_string(), &draft)).await?;
    match outcome {
        UpdateOutcome::Updated => {}
        UpdateOutcome::NotFound => return Err(ApiError::NotFound),
        UpdateOutcome::EmailTaken => {
            return Err(ApiError::Conflict {
                title: "Email In Use",
                description: "Another guest already uses this email address.",
            });
        }
    }

    let entry = load_entry(&state, id).await?;
    state.dispatcher.broadcast(LiveEvent::RsvpUpdated {
        entry: entry.clone(),
    });
    info!("Dashboard updated guest {}", id);
    Ok(Json(entry))
}

/// DELETE /admin/rsvps/{id}
pub async fn delete_rsvp(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let removed = with_db(&state, move |db| db.delete_rsvp(&id.to_string())).await?;
    if !removed {
        return Err(ApiError::NotFound);
    }

    state.dispatcher.broadcast(LiveEvent::RsvpDeleted { id });
    info!("Dashboard removed guest {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/rsvps/{id}/resend: only for attending guests.
pub async fn resend_invitation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = load_entry(&state, id).await?;
    if entry.attending == Attending::No {
        return Err(ApiError::Conflict {
            title: "Cannot Resend",
            description: "You cannot resend an invitation to a guest who is not attending.",
        });
    }

    let email = templates::confirmation(&entry.email, entry.display_name(), &state.settings.event);
    state.mailer.send(&email).await?;

    info!("Resent invitation to {}", entry.email);
    Ok(Json(Ack {
        title: "Invitation Sent!".into(),
        description: format!("Successfully resent invitation to {}.", entry.display_name()),
    }))
}

/// POST /admin/reminders: one reminder per attending guest, sent in order.
pub async fn send_reminders(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let entries = load_entries(&state).await?;

    let mut report = ReminderReport::default();
    for entry in entries.iter().filter(|e| e.attending == Attending::Yes) {
        let email = templates::reminder(&entry.email, entry.display_name(), &state.settings.event);
        match state.mailer.send(&email).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                warn!("Reminder to {} failed: {}", entry.email, e);
                report.failed += 1;
            }
        }
    }

    info!("Reminders: {} sent, {} failed", report.sent, report.failed);
    Ok(Json(report))
}

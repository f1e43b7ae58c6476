use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Attending, Memory, RsvpEntry};
use crate::validate::FieldErrors;

// -- JWT Claims --

/// Admin session claims, issued by `/auth/login` and checked on every
/// dashboard route and the live feed upgrade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// -- Errors --

/// Body of every non-2xx response. `title`/`description` are meant to be
/// shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

// -- RSVPs --

/// Raw RSVP form input. Any field may be missing on the wire;
/// `validate::rsvp` decides what is actually required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RsvpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub attending: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub guests: Option<String>,
    #[serde(default)]
    pub relation: Option<String>,
    #[serde(default)]
    pub directions: Option<String>,
}

impl From<&RsvpEntry> for RsvpRequest {
    fn from(entry: &RsvpEntry) -> Self {
        Self {
            email: entry.email.clone(),
            attending: Some(entry.attending.as_str().to_string()),
            name: entry.name.clone(),
            phone: entry.phone.clone(),
            guests: entry.guests.map(|g| g.as_str().to_string()),
            relation: entry.relation.map(|r| r.as_str().to_string()),
            directions: entry.directions.map(|d| d.as_str().to_string()),
        }
    }
}

/// Outcome of the email that follows a stored RSVP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notification {
    Sent,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRsvpResponse {
    pub entry: RsvpEntry,
    pub title: String,
    pub description: String,
    pub notification: Notification,
}

/// Short confirmation for dashboard mutations and email actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderReport {
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestStats {
    pub total: usize,
    pub attending: usize,
    pub declined: usize,
    /// Expected heads at the reception, plus-ones included.
    pub headcount: u32,
}

impl GuestStats {
    pub fn tally<'a>(entries: impl IntoIterator<Item = &'a RsvpEntry>) -> Self {
        entries.into_iter().fold(Self::default(), |mut stats, entry| {
            stats.total += 1;
            match entry.attending {
                Attending::Yes => stats.attending += 1,
                Attending::No => stats.declined += 1,
            }
            stats.headcount += entry.headcount();
            stats
        })
    }
}

// -- Guestbook --

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuestbookRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryCreated {
    pub memory: Memory,
    pub title: String,
    pub description: String,
}

/// `liked = true` adds one like, `false` takes one away.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToggleLikeRequest {
    pub liked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleLikeResponse {
    pub id: Uuid,
    pub likes: u32,
}

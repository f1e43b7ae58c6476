//! Field validation shared by the server handlers and the client forms.
//!
//! Validators take the raw wire request and either produce a typed draft or
//! a map of field name to user-facing message. Empty strings count as absent,
//! since the forms submit `""` for untouched inputs.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::api::{GuestbookRequest, RsvpRequest};
use crate::models::{Attending, Directions, Guests, MemoryDraft, Relation, RsvpDraft};

/// Upper bound for an inlined guestbook photo, measured on the decoded bytes.
pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_MESSAGE_LEN: usize = 10;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+'-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

static DATA_URI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^data:image/[A-Za-z0-9.+-]+;base64,").expect("data uri pattern is valid")
});

/// Per-field validation messages, keyed by wire field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the first message for a field; later ones are ignored.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Which form the RSVP came through. The public form asks for more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Guest,
    Admin,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_optional<T: FromStr>(
    errors: &mut FieldErrors,
    field: &str,
    value: &Option<String>,
    message: &str,
) -> Option<T> {
    let raw = present(value)?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            errors.add(field, message);
            None
        }
    }
}

/// Validates an RSVP. When attending, the name and party size are required;
/// the public form also requires relation and directions.
pub fn rsvp(req: &RsvpRequest, audience: Audience) -> Result<RsvpDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let email = req.email.trim().to_string();
    if !is_valid_email(&email) {
        errors.add("email", "Please enter a valid email address.");
    }

    let attending = match present(&req.attending).map(Attending::from_str) {
        Some(Ok(a)) => Some(a),
        _ => {
            errors.add("attending", "Please select an option.");
            None
        }
    };

    let name = present(&req.name).map(str::to_string);
    let phone = present(&req.phone).map(str::to_string);
    let guests: Option<Guests> =
        parse_optional(&mut errors, "guests", &req.guests, "Please select the number of guests.");
    let relation: Option<Relation> =
        parse_optional(&mut errors, "relation", &req.relation, "Please select your connection.");
    let directions: Option<Directions> = parse_optional(
        &mut errors,
        "directions",
        &req.directions,
        "Please let us know if you need directions.",
    );

    if attending == Some(Attending::Yes) {
        if name.as_ref().map_or(true, |n| n.chars().count() < MIN_NAME_LEN) {
            let message = match audience {
                Audience::Guest => "Your name must be at least 2 characters.",
                Audience::Admin => "Name must be at least 2 characters.",
            };
            errors.add("name", message);
        }
        if guests.is_none() {
            errors.add("guests", "Please select the number of guests.");
        }
        if audience == Audience::Guest {
            if relation.is_none() {
                errors.add("relation", "Please select your connection.");
            }
            if directions.is_none() {
                errors.add("directions", "Please let us know if you need directions.");
            }
        }
    }

    match attending {
        Some(attending) if errors.is_empty() => Ok(RsvpDraft {
            email,
            attending,
            name,
            phone,
            guests,
            relation,
            directions,
        }),
        _ => Err(errors),
    }
}

/// Validates a guestbook memory and its optional inlined photo.
pub fn memory(req: &GuestbookRequest) -> Result<MemoryDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = req.name.trim().to_string();
    if name.chars().count() < MIN_NAME_LEN {
        errors.add("name", "Name must be at least 2 characters.");
    }

    let message = req.message.trim().to_string();
    if message.chars().count() < MIN_MESSAGE_LEN {
        errors.add("message", "Message must be at least 10 characters.");
    }

    let photo = present(&req.photo).map(str::to_string);
    if let Some(uri) = &photo {
        if let Err(message) = check_photo(uri) {
            errors.add("photo", message);
        }
    }

    if errors.is_empty() {
        Ok(MemoryDraft {
            name,
            message,
            photo,
        })
    } else {
        Err(errors)
    }
}

/// Checks that a photo is a base64 image data URI within the size cap.
pub fn check_photo(uri: &str) -> Result<usize, &'static str> {
    let Some(m) = DATA_URI_RE.find(uri) else {
        return Err("Photo must be an image.");
    };
    let payload = &uri[m.end()..];

    // Reject on the encoded length first so an oversized payload is never decoded.
    if payload.len() / 4 * 3 > MAX_PHOTO_BYTES + 2 {
        return Err("Please upload an image smaller than 2MB.");
    }

    let bytes = B64.decode(payload).map_err(|_| "Photo could not be read.")?;
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err("Please upload an image smaller than 2MB.");
    }
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str, attending: &str) -> RsvpRequest {
        RsvpRequest {
            email: email.into(),
            attending: Some(attending.into()),
            ..Default::default()
        }
    }

    #[test]
    fn declining_needs_only_email() {
        let draft = rsvp(&request("a@b.com", "no"), Audience::Guest).unwrap();
        assert_eq!(draft.attending, Attending::No);
        assert_eq!(draft.name, None);
    }

    #[test]
    fn attending_requires_name_and_guests() {
        let errors = rsvp(&request("a@b.com", "yes"), Audience::Admin).unwrap_err();
        assert_eq!(errors.get("name"), Some("Name must be at least 2 characters."));
        assert_eq!(errors.get("guests"), Some("Please select the number of guests."));
        assert_eq!(errors.get("relation"), None);
    }

    #[test]
    fn public_form_also_requires_relation_and_directions() {
        let mut req = request("a@b.com", "yes");
        req.name = Some("Jo".into());
        req.guests = Some("1".into());
        let errors = rsvp(&req, Audience::Guest).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.get("relation").is_some());
        assert!(errors.get("directions").is_some());

        req.relation = Some("friend".into());
        req.directions = Some("no".into());
        let draft = rsvp(&req, Audience::Guest).unwrap();
        assert_eq!(draft.guests, Some(Guests::One));
        assert_eq!(draft.relation, Some(Relation::Friend));
    }

    #[test]
    fn rejects_bad_email_and_missing_attendance() {
        let req = RsvpRequest {
            email: "not-an-email".into(),
            ..Default::default()
        };
        let errors = rsvp(&req, Audience::Guest).unwrap_err();
        assert!(errors.get("email").is_some());
        assert_eq!(errors.get("attending"), Some("Please select an option."));
    }

    #[test]
    fn guests_outside_one_or_two_is_rejected() {
        let mut req = request("a@b.com", "yes");
        req.name = Some("Jo".into());
        req.guests = Some("3".into());
        let errors = rsvp(&req, Audience::Admin).unwrap_err();
        assert_eq!(errors.get("guests"), Some("Please select the number of guests."));
    }

    #[test]
    fn blank_strings_count_as_absent() {
        let mut req = request(" a@b.com ", "no");
        req.name = Some("   ".into());
        req.guests = Some(String::new());
        let draft = rsvp(&req, Audience::Guest).unwrap();
        assert_eq!(draft.email, "a@b.com");
        assert_eq!(draft.name, None);
        assert_eq!(draft.guests, None);
    }

    #[test]
    fn memory_checks_lengths() {
        let errors = memory(&GuestbookRequest {
            name: "J".into(),
            message: "too short".into(),
            photo: None,
        })
        .unwrap_err();
        assert!(errors.get("name").is_some());
        assert!(errors.get("message").is_some());

        let draft = memory(&GuestbookRequest {
            name: "Jo".into(),
            message: "Congratulations you two!".into(),
            photo: Some(String::new()),
        })
        .unwrap();
        assert_eq!(draft.photo, None);
    }

    #[test]
    fn photo_must_be_small_image_data_uri() {
        let small = format!("data:image/png;base64,{}", B64.encode([1u8; 64]));
        assert_eq!(check_photo(&small), Ok(64));

        assert!(check_photo("https://example.com/cat.png").is_err());
        assert!(check_photo("data:text/plain;base64,aGVsbG8=").is_err());

        let large = format!(
            "data:image/jpeg;base64,{}",
            B64.encode(vec![0u8; MAX_PHOTO_BYTES + 1])
        );
        assert_eq!(check_photo(&large), Err("Please upload an image smaller than 2MB."));
    }
}

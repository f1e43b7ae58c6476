use crate::{Email, TemplateParams};

/// Reception details rendered into every email.
#[derive(Debug, Clone)]
pub struct EventDetails {
    pub couple: String,
    pub venue: String,
    pub date: String,
    pub time: String,
    pub colors: String,
    pub contact_phone: String,
    /// Downloadable invitation, linked from the confirmation.
    pub invitation_url: Option<String>,
    /// Invitation image, passed to the provider template.
    pub image_url: Option<String>,
}

impl Default for EventDetails {
    fn default() -> Self {
        Self {
            couple: "Deborah & Benjamin".into(),
            venue: "Agaya Hotel, Kwandere Road. Lafia".into(),
            date: "1st Nov, 2025".into(),
            time: "4pm".into(),
            colors: "Metallic Brown, Burgundy and Tan".into(),
            contact_phone: "08169536118".into(),
            invitation_url: None,
            image_url: None,
        }
    }
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn details_block(details: &EventDetails) -> String {
    format!(
        r#"<p><strong>Reception Details:</strong></p>
<p style="margin: 5px 0;"><strong>Venue:</strong> {venue}</p>
<p style="margin: 5px 0;"><strong>Date:</strong> {date}</p>
<p style="margin: 5px 0;"><strong>Time:</strong> {time}</p>"#,
        venue = escape_html(&details.venue),
        date = escape_html(&details.date),
        time = escape_html(&details.time),
    )
}

fn wrap(inner: &str, details: &EventDetails) -> String {
    format!(
        r#"<div style="font-family: Arial, sans-serif; font-size: 16px; color: #333; line-height: 1.6;">
{inner}
<br>
<p>With love,</p>
<p><strong>{couple}</strong></p>
</div>"#,
        couple = escape_html(&details.couple),
    )
}

fn email(to: &str, name: &str, subject: String, body: String, details: &EventDetails) -> Email {
    Email {
        to: to.to_string(),
        subject,
        params: TemplateParams {
            name: name.to_string(),
            to_email: to.to_string(),
            email_body: body,
            image_url: details.image_url.clone(),
        },
    }
}

/// Sent when a guest confirms attendance, and again on dashboard resend.
pub fn confirmation(to: &str, name: &str, details: &EventDetails) -> Email {
    let download = details
        .invitation_url
        .as_deref()
        .map(|url| {
            format!(
                r#"<hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;">
<a href="{}" style="display: inline-block; padding: 10px 20px; color: #fff; background-color: #007bff; text-decoration: none; border-radius: 5px;">Download Your Invitation</a>"#,
                escape_html(url)
            )
        })
        .unwrap_or_default();

    let inner = format!(
        r#"<p>Dear {name},</p>
<p>Thank you for confirming your attendance!</p>
<p>We're so excited to celebrate this special day with you.</p>
<hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;">
{details}
<hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;">
<p><strong>Important Info:</strong></p>
<ul style="list-style-type: none; padding-left: 0;">
<li>- Please arrive 15-20 minutes early so you don't miss the grand entrance.</li>
<li>- Colors of the Day: {colors}</li>
<li>- For questions, kindly reach us at: {phone}</li>
</ul>
{download}
<p>We can't wait to share the joy, laughter, food, music, and dance with you!</p>"#,
        name = escape_html(name),
        details = details_block(details),
        colors = escape_html(&details.colors),
        phone = escape_html(&details.contact_phone),
    );

    email(
        to,
        name,
        format!("You're Invited! Confirmation for {}'s Wedding", details.couple),
        wrap(&inner, details),
        details,
    )
}

/// Plain acknowledgement for a guest who declined.
pub fn acknowledgement(to: &str, name: &str, details: &EventDetails) -> Email {
    let inner = format!(
        r#"<p>Dear {name},</p>
<p>Thank you for letting us know. We will miss you, and we are grateful for your love and wishes.</p>"#,
        name = escape_html(name),
    );
    email(
        to,
        name,
        format!("Thank you for your RSVP to {}'s Wedding", details.couple),
        wrap(&inner, details),
        details,
    )
}

/// Reminder for attending guests ahead of the day.
pub fn reminder(to: &str, name: &str, details: &EventDetails) -> Email {
    let inner = format!(
        r#"<p>Dear {name},</p>
<p>This is a friendly reminder that our celebration is coming up soon. We look forward to seeing you!</p>
<hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;">
{details}"#,
        name = escape_html(name),
        details = details_block(details),
    );
    email(
        to,
        name,
        format!("Reminder: {}'s Wedding", details.couple),
        wrap(&inner, details),
        details,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_covers_markup_and_quotes() {
        assert_eq!(
            escape_html(r#"Tom & "Jerry" <3 O'Neil"#),
            "Tom &amp; &quot;Jerry&quot; &lt;3 O&#39;Neil"
        );
        assert_eq!(escape_html("Ada"), "Ada");
    }

    #[test]
    fn confirmation_escapes_guest_name() {
        let details = EventDetails {
            invitation_url: Some("https://example.com/RSVP.pdf".into()),
            ..Default::default()
        };
        let email = confirmation("jo@example.com", "<Jo>", &details);

        assert_eq!(email.to, "jo@example.com");
        assert_eq!(email.params.to_email, "jo@example.com");
        assert_eq!(email.params.name, "<Jo>");
        assert!(email.params.email_body.contains("Dear &lt;Jo&gt;"));
        assert!(email.params.email_body.contains("Download Your Invitation"));
        assert!(email.subject.contains("Deborah & Benjamin"));
    }

    #[test]
    fn confirmation_omits_download_without_url() {
        let email = confirmation("jo@example.com", "Jo", &EventDetails::default());
        assert!(!email.params.email_body.contains("Download Your Invitation"));
        assert!(email.params.email_body.contains("Agaya Hotel"));
    }

    #[test]
    fn reminder_and_acknowledgement_have_distinct_subjects() {
        let details = EventDetails::default();
        let a = acknowledgement("x@example.com", "X", &details);
        let r = reminder("x@example.com", "X", &details);
        assert_ne!(a.subject, r.subject);
        assert!(r.params.email_body.contains("Reception Details"));
    }
}

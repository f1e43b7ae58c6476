//! Database row types. These map directly to SQLite rows and are distinct
//! from the vows-types models so the storage layout can change on its own.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use vows_types::models::{Directions, Guests, Memory, Relation, RsvpEntry};

pub struct RsvpRow {
    pub id: String,
    pub email: String,
    pub attending: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub guests: Option<String>,
    pub relation: Option<String>,
    pub directions: Option<String>,
    pub created_at: String,
}

pub struct MemoryRow {
    pub id: String,
    pub name: String,
    pub message: String,
    pub photo: Option<String>,
    pub likes: i64,
    pub created_at: String,
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("corrupt created_at '{}'", raw))?
        .with_timezone(&Utc))
}

impl TryFrom<RsvpRow> for RsvpEntry {
    type Error = anyhow::Error;

    fn try_from(row: RsvpRow) -> Result<Self> {
        let context = || format!("rsvp row '{}'", row.id);
        Ok(RsvpEntry {
            id: row.id.parse().with_context(context)?,
            email: row.email.clone(),
            attending: row.attending.parse().with_context(context)?,
            name: row.name.clone(),
            phone: row.phone.clone(),
            guests: row.guests.as_deref().map(str::parse::<Guests>).transpose().with_context(context)?,
            relation: row.relation.as_deref().map(str::parse::<Relation>).transpose().with_context(context)?,
            directions: row
                .directions
                .as_deref()
                .map(str::parse::<Directions>)
                .transpose()
                .with_context(context)?,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl TryFrom<MemoryRow> for Memory {
    type Error = anyhow::Error;

    fn try_from(row: MemoryRow) -> Result<Self> {
        Ok(Memory {
            id: row
                .id
                .parse()
                .with_context(|| format!("guestbook row '{}'", row.id))?,
            name: row.name,
            message: row.message,
            photo: row.photo,
            likes: u32::try_from(row.likes).unwrap_or(0),
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

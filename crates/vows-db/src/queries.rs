use crate::Database;
use crate::models::{MemoryRow, RsvpRow};
use anyhow::Result;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row};
use vows_types::models::{MemoryDraft, RsvpDraft};

const RSVP_COLUMNS: &str =
    "id, email, attending, name, phone, guests, relation, directions, created_at";
const MEMORY_COLUMNS: &str = "id, name, message, photo, likes, created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Another entry already holds this email (case-insensitive).
    Duplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
    /// The new email belongs to a different entry.
    EmailTaken,
}

impl Database {
    // -- RSVPs --

    /// Insert-if-absent keyed on email. A single statement against the
    /// UNIQUE index, so concurrent submissions cannot both land.
    pub fn insert_rsvp(&self, id: &str, draft: &RsvpDraft, created_at: &str) -> Result<InsertOutcome> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "INSERT INTO rsvps (id, email, attending, name, phone, guests, relation, directions, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(email) DO NOTHING",
                rusqlite::params![
                    id,
                    draft.email,
                    draft.attending.as_str(),
                    draft.name,
                    draft.phone,
                    draft.guests.map(|g| g.as_str()),
                    draft.relation.map(|r| r.as_str()),
                    draft.directions.map(|d| d.as_str()),
                    created_at,
                ],
            )?;
            Ok(if changed == 0 {
                InsertOutcome::Duplicate
            } else {
                InsertOutcome::Inserted
            })
        })
    }

    pub fn get_rsvp(&self, id: &str) -> Result<Option<RsvpRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM rsvps WHERE id = ?1", RSVP_COLUMNS);
            Ok(conn.query_row(&sql, [id], rsvp_from_row).optional()?)
        })
    }

    #[cfg(test)]
    pub fn find_rsvp_by_email(&self, email: &str) -> Result<Option<RsvpRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM rsvps WHERE email = ?1", RSVP_COLUMNS);
            Ok(conn.query_row(&sql, [email.trim()], rsvp_from_row).optional()?)
        })
    }

    /// All entries, newest first.
    pub fn list_rsvps(&self) -> Result<Vec<RsvpRow>> {
        self.with_conn(query_rsvps)
    }

    /// Overwrites every field of an entry. Last writer wins.
    pub fn update_rsvp(&self, id: &str, draft: &RsvpDraft) -> Result<UpdateOutcome> {
        self.with_conn(|conn| {
            let result = conn.execute(
                "UPDATE rsvps
                 SET email = ?2, attending = ?3, name = ?4, phone = ?5,
                     guests = ?6, relation = ?7, directions = ?8
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    draft.email,
                    draft.attending.as_str(),
                    draft.name,
                    draft.phone,
                    draft.guests.map(|g| g.as_str()),
                    draft.relation.map(|r| r.as_str()),
                    draft.directions.map(|d| d.as_str()),
                ],
            );
            match result {
                Ok(0) => Ok(UpdateOutcome::NotFound),
                Ok(_) => Ok(UpdateOutcome::Updated),
                Err(e) if is_unique_violation(&e) => Ok(UpdateOutcome::EmailTaken),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Returns false when no entry had this id.
    pub fn delete_rsvp(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM rsvps WHERE id = ?1", [id])? > 0))
    }

    // -- Guestbook --

    pub fn insert_memory(&self, id: &str, draft: &MemoryDraft, created_at: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO guestbook (id, name, message, photo, likes, created_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                rusqlite::params![id, draft.name, draft.message, draft.photo, created_at],
            )?;
            Ok(())
        })
    }

    #[cfg(test)]
    pub fn get_memory(&self, id: &str) -> Result<Option<MemoryRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM guestbook WHERE id = ?1", MEMORY_COLUMNS);
            Ok(conn.query_row(&sql, [id], memory_from_row).optional()?)
        })
    }

    /// All memories, newest first.
    pub fn list_memories(&self) -> Result<Vec<MemoryRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM guestbook ORDER BY created_at DESC, rowid DESC",
                MEMORY_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], memory_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Adds or removes one like, never going below zero.
    /// Returns the new count, or None for an unknown memory.
    pub fn adjust_likes(&self, id: &str, liked: bool) -> Result<Option<u32>> {
        let delta: i64 = if liked { 1 } else { -1 };
        self.with_conn(|conn| {
            let likes: Option<i64> = conn
                .query_row(
                    "UPDATE guestbook SET likes = MAX(0, likes + ?2) WHERE id = ?1 RETURNING likes",
                    rusqlite::params![id, delta],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(likes.map(|l| u32::try_from(l).unwrap_or(0)))
        })
    }
}

fn query_rsvps(conn: &Connection) -> Result<Vec<RsvpRow>> {
    let sql = format!(
        "SELECT {} FROM rsvps ORDER BY created_at DESC, rowid DESC",
        RSVP_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], rsvp_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn rsvp_from_row(row: &Row<'_>) -> rusqlite::Result<RsvpRow> {
    Ok(RsvpRow {
        id: row.get(0)?,
        email: row.get(1)?,
        attending: row.get(2)?,
        name: row.get(3)?,
        phone: row.get(4)?,
        guests: row.get(5)?,
        relation: row.get(6)?,
        directions: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn memory_from_row(row: &Row<'_>) -> rusqlite::Result<MemoryRow> {
    Ok(MemoryRow {
        id: row.get(0)?,
        name: row.get(1)?,
        message: row.get(2)?,
        photo: row.get(3)?,
        likes: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::ConstraintViolation
                && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

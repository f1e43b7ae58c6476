use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (rsvps, guestbook)");
        conn.execute_batch(
            "
            CREATE TABLE rsvps (
                id          TEXT PRIMARY KEY,
                email       TEXT NOT NULL COLLATE NOCASE UNIQUE,
                attending   TEXT NOT NULL CHECK (attending IN ('yes', 'no')),
                name        TEXT,
                phone       TEXT,
                guests      TEXT CHECK (guests IN ('1', '2')),
                relation    TEXT,
                directions  TEXT CHECK (directions IN ('yes', 'no')),
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_rsvps_created ON rsvps(created_at);

            CREATE TABLE guestbook (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                message     TEXT NOT NULL,
                photo       TEXT,
                likes       INTEGER NOT NULL DEFAULT 0 CHECK (likes >= 0),
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_guestbook_created ON guestbook(created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

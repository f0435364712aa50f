//! SQLite-backed [`WatermarkStore`].
//!
//! Schema migrations are applied on open and tracked with
//! `PRAGMA user_version`.  Timestamps are stored as RFC 3339 text with
//! nanosecond precision so a stored watermark compares exactly equal to the
//! value that was written.  An unversioned database with the older
//! `history(last_pubdate, feed_id)` layout is upgraded in place.

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction};
use tracing::{debug, error, info, warn};

use super::{FeedId, FeedRegistration, StoreError, WatermarkStore};

struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("migrations/0001_init.sql"),
}];

/// Latest schema version this binary knows how to produce.
pub fn latest_schema_version() -> u32 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

/// A [`WatermarkStore`] over a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let started_at = Instant::now();

        let result = Connection::open(path)
            .map_err(StoreError::from)
            .and_then(Self::bootstrap);

        match &result {
            Ok(_) => info!(
                path = %path.display(),
                duration_ms = started_at.elapsed().as_millis() as u64,
                "opened feed database"
            ),
            Err(err) => error!(path = %path.display(), error = %err, "failed to open feed database"),
        }
        result
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(mut conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        apply_migrations(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn apply_migrations(conn: &mut Connection) -> Result<(), StoreError> {
    let current: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_schema_version();

    if current > latest {
        return Err(StoreError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }
    if current == latest {
        return Ok(());
    }

    let legacy = current == 0 && has_legacy_history(conn)?;

    let tx = conn.transaction()?;
    if legacy {
        tx.execute_batch("ALTER TABLE history RENAME TO legacy_history;")?;
    }
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        debug!(version = migration.version, "applied schema migration");
    }
    if legacy {
        import_legacy_history(&tx)?;
    }
    tx.commit()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Unversioned databases
// ---------------------------------------------------------------------------
//
// Databases created before schema versioning share the `feeds` table with
// version 1 but keep `history(last_pubdate TEXT, feed_id TEXT UNIQUE)`, with
// timestamps like `2024-06-01 10:00:00.5 +0000 UTC`.

fn has_legacy_history(conn: &Connection) -> Result<bool, StoreError> {
    let columns: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info('history') WHERE name = 'last_pubdate';",
        [],
        |row| row.get(0),
    )?;
    Ok(columns > 0)
}

/// Copy `legacy_history` into `history` and drop it.  Rows with an unreadable
/// timestamp or an unknown feed are dropped; those feeds start from the seed.
fn import_legacy_history(tx: &Transaction<'_>) -> Result<(), StoreError> {
    let rows = {
        let mut stmt = tx.prepare(
            "SELECT CAST(feed_id AS TEXT), CAST(last_pubdate AS TEXT) FROM legacy_history;",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, Option<String>>(0)?, row.get::<_, Option<String>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    let mut imported = 0usize;
    for (feed_id, last_pubdate) in &rows {
        let parsed = feed_id
            .as_deref()
            .and_then(|id| id.trim().parse::<i64>().ok())
            .zip(last_pubdate.as_deref().and_then(parse_legacy_timestamp));
        let Some((feed_id, ts)) = parsed else {
            warn!(?feed_id, ?last_pubdate, "dropping unreadable legacy history row");
            continue;
        };
        imported += tx.execute(
            "INSERT INTO history (feed_id, last_seen) \
             SELECT ?1, ?2 WHERE EXISTS (SELECT 1 FROM feeds WHERE id = ?1);",
            params![feed_id, ts.to_rfc3339_opts(SecondsFormat::Nanos, true)],
        )?;
    }
    tx.execute_batch("DROP TABLE legacy_history;")?;

    info!(
        imported,
        dropped = rows.len() - imported,
        "imported watermarks from unversioned database"
    );
    Ok(())
}

/// Parse `date time offset [zone] [m=...]` text, e.g.
/// `2024-06-01 12:00:00.5 +0200 CEST m=+0.001`.  Anything after the offset
/// is ignored.
fn parse_legacy_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let go_layout = raw.split_whitespace().take(3).collect::<Vec<_>>().join(" ");
    DateTime::parse_from_str(&go_layout, "%Y-%m-%d %H:%M:%S%.f %z")
        .or_else(|_| DateTime::parse_from_rfc3339(raw.trim()))
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Only http(s) URLs with a host are accepted as feeds.
fn validate_url(url: &str) -> Result<&str, StoreError> {
    let trimmed = url.trim();
    match reqwest::Url::parse(trimmed) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => {
            Ok(trimmed)
        }
        _ => Err(StoreError::InvalidUrl(url.to_string())),
    }
}

impl WatermarkStore for SqliteStore {
    fn get_watermark(&self, id: FeedId) -> Result<Option<DateTime<Utc>>, StoreError> {
        let raw: Option<String> = self
            .conn
            .lock()
            .query_row(
                "SELECT last_seen FROM history WHERE feed_id = ?1",
                params![id.0],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| StoreError::CorruptWatermark { feed_id: id, raw })
        })
        .transpose()
    }

    fn set_watermark(&self, id: FeedId, ts: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn.lock().execute(
            "INSERT INTO history (feed_id, last_seen) VALUES (?1, ?2)
             ON CONFLICT(feed_id) DO UPDATE SET last_seen = excluded.last_seen",
            params![id.0, ts.to_rfc3339_opts(SecondsFormat::Nanos, true)],
        )?;
        Ok(())
    }

    fn list_feeds(&self) -> Result<Vec<FeedRegistration>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id, feed_url FROM feeds ORDER BY id")?;
        let feeds = stmt
            .query_map([], |row| {
                Ok(FeedRegistration {
                    id: FeedId(row.get(0)?),
                    url: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(feeds)
    }

    fn register_feed(&self, url: &str) -> Result<FeedId, StoreError> {
        let url = validate_url(url)?;
        let conn = self.conn.lock();

        match conn.execute("INSERT INTO feeds (feed_url) VALUES (?1)", params![url]) {
            Ok(_) => Ok(FeedId(conn.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateFeed(url.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn find_feed(&self, url: &str) -> Result<Option<FeedId>, StoreError> {
        let id = self
            .conn
            .lock()
            .query_row(
                "SELECT id FROM feeds WHERE feed_url = ?1",
                params![url.trim()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id.map(FeedId))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, TrawlerError};
use crate::domain::{CaptureMode, Engagement, PostRecord, RunRecord, ScreenshotArtifact};
use crate::store::Store;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| TrawlerError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            TrawlerError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        Ok(RunRecord {
            id: row.get(0)?,
            label: row.get(1)?,
            kind: row.get(2)?,
            capture_mode: row
                .get::<_, String>(3)?
                .parse()
                .unwrap_or(CaptureMode::None),
            requested: row.get::<_, i64>(4)? as usize,
            accepted: row.get::<_, i64>(5)? as usize,
            status: row.get(6)?,
            stop_reason: row.get(7)?,
            started_at: Self::parse_datetime(&row.get::<_, String>(8)?).unwrap_or_else(Utc::now),
            finished_at: Self::parse_datetime(&row.get::<_, String>(9)?).unwrap_or_else(Utc::now),
        })
    }

    fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
        Ok(PostRecord {
            identity_key: row.get(0)?,
            author: row.get(1)?,
            body_text: row.get(2)?,
            posted_at: row.get(3)?,
            engagement: Engagement {
                reply_count: row.get::<_, i64>(4)? as u64,
                share_count: row.get::<_, i64>(5)? as u64,
                like_count: row.get::<_, i64>(6)? as u64,
                view_count: row.get::<_, i64>(7)? as u64,
            },
            is_promoted: row.get(8)?,
            capture_index: row.get::<_, i64>(9)? as usize,
        })
    }
}

const RUN_COLUMNS: &str = "id, label, kind, capture_mode, requested, accepted, status, \
                           stop_reason, started_at, finished_at";

impl Store for SqliteStore {
    fn add_run(&self, run: &RunRecord) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO runs (label, kind, capture_mode, requested, accepted, status, stop_reason, started_at, finished_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run.label,
                run.kind,
                run.capture_mode.as_str(),
                run.requested as i64,
                run.accepted as i64,
                run.status,
                run.stop_reason,
                run.started_at.to_rfc3339(),
                run.finished_at.to_rfc3339()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_run(&self, id: i64) -> Result<Option<RunRecord>> {
        let conn = self.lock()?;
        let run = conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![id],
                Self::run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn get_all_runs(&self) -> Result<Vec<RunRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM runs ORDER BY started_at DESC, id DESC",
            RUN_COLUMNS
        ))?;
        let runs = stmt
            .query_map([], Self::run_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    fn delete_run(&self, id: i64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM runs WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn add_posts(
        &self,
        run_id: i64,
        posts: &[PostRecord],
        artifacts: &[ScreenshotArtifact],
    ) -> Result<usize> {
        let shots: HashMap<usize, String> = artifacts
            .iter()
            .filter_map(|a| {
                a.source_capture_index
                    .map(|idx| (idx, a.file_path.to_string_lossy().into_owned()))
            })
            .collect();

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut count = 0;

        for post in posts {
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO posts (id, run_id, identity_key, author, body_text, posted_at,
                     reply_count, share_count, like_count, view_count, is_promoted, capture_index, screenshot_path)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    post.archive_id(),
                    run_id,
                    post.identity_key,
                    post.author,
                    post.body_text,
                    post.posted_at,
                    post.engagement.reply_count as i64,
                    post.engagement.share_count as i64,
                    post.engagement.like_count as i64,
                    post.engagement.view_count as i64,
                    post.is_promoted,
                    post.capture_index as i64,
                    shots.get(&post.capture_index)
                ],
            )?;
            count += inserted;
        }

        tx.commit()?;
        Ok(count)
    }

    fn get_posts_by_run(&self, run_id: i64) -> Result<Vec<PostRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT identity_key, author, body_text, posted_at, reply_count, share_count,
                    like_count, view_count, is_promoted, capture_index
             FROM posts WHERE run_id = ?1 ORDER BY capture_index",
        )?;
        let posts = stmt
            .query_map(params![run_id], Self::post_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    fn screenshot_for(&self, run_id: i64, capture_index: usize) -> Result<Option<PathBuf>> {
        let conn = self.lock()?;
        let path: Option<Option<String>> = conn
            .query_row(
                "SELECT screenshot_path FROM posts WHERE run_id = ?1 AND capture_index = ?2",
                params![run_id, capture_index as i64],
                |row| row.get(0),
            )
            .optional()?;
        Ok(path.flatten().map(PathBuf::from))
    }

    fn post_seen(&self, identity_key: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE identity_key = ?1",
            params![identity_key],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

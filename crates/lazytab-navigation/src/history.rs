//! Page history backed metadata lookup

use chrono::Utc;
use rusqlite::OptionalExtension;

use lazytab_storage::Database;

use crate::metadata::{MetadataLookup, PageMetadata};
use crate::Result;

pub struct HistoryMetadata {
    db: Database,
}

impl HistoryMetadata {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Record a visit to a URL
    pub fn record_visit(&self, url: &str, title: &str) -> Result<()> {
        Ok(self.db.with_connection(|conn| {
            let existing: Option<i64> = conn
                .query_row("SELECT id FROM history WHERE url = ?1", [url], |row| {
                    row.get(0)
                })
                .optional()?;

            if let Some(id) = existing {
                conn.execute(
                    "UPDATE history
                     SET title = CASE WHEN ?1 != '' THEN ?1 ELSE title END,
                         visited_at = ?2,
                         visit_count = visit_count + 1
                     WHERE id = ?3",
                    rusqlite::params![title, Utc::now().to_rfc3339(), id],
                )?;
            } else {
                conn.execute(
                    "INSERT INTO history (url, title, visited_at, visit_count) VALUES (?1, ?2, ?3, 1)",
                    rusqlite::params![url, title, Utc::now().to_rfc3339()],
                )?;
            }

            Ok(())
        })?)
    }

    /// Store the favicon of an already visited URL.
    pub fn set_favicon(&self, url: &str, favicon_url: Option<&str>) -> Result<()> {
        Ok(self.db.with_connection(|conn| {
            conn.execute(
                "UPDATE history SET favicon_url = ?1 WHERE url = ?2",
                rusqlite::params![favicon_url, url],
            )?;
            Ok(())
        })?)
    }

    /// Title and favicon recorded for exactly this URL.
    pub fn page(&self, url: &str) -> Result<Option<PageMetadata>> {
        Ok(self.db.with_connection(|conn| {
            let page = conn
                .query_row(
                    "SELECT title, favicon_url FROM history WHERE url = ?1",
                    [url],
                    |row| {
                        let title: String = row.get(0)?;
                        Ok(PageMetadata {
                            title: Some(title).filter(|t| !t.is_empty()),
                            icon: row.get(1)?,
                        })
                    },
                )
                .optional()?;
            Ok(page)
        })?)
    }
}

impl MetadataLookup for HistoryMetadata {
    fn lookup(&self, uri: &str) -> Option<PageMetadata> {
        match self.page(uri) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!(uri = %uri, error = %e, "History lookup failed");
                None
            }
        }
    }
}

impl Clone for HistoryMetadata {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

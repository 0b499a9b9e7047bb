//! SQLite repository implementation.
//!
//! Implements the repository traits from `leaguesync_core::storage` using
//! SQLite. One repository serves every entity kind: rows carry their kind
//! as part of the composite primary key, and the write policy of the kind
//! decides which `ON CONFLICT` clause a batch upsert uses.

use async_trait::async_trait;
use chrono::Utc;
use tokio_rusqlite::Connection;

use leaguesync_core::record::{NaturalKey, Season, SubjectId, SyncRecord, WritePolicy};
use leaguesync_core::storage::{Repository, RepositoryError, Result, SubjectDirectory};

use super::error::map_tokio_rusqlite_error;
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

fn deserialize_row<T: SyncRecord>(payload: &str) -> Result<T> {
    serde_json::from_str(payload).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

/// Kinds without a secondary dimension store '' in the key column.
fn secondary_column(key: &NaturalKey) -> String {
    key.secondary
        .as_ref()
        .map(|s| s.to_string())
        .unwrap_or_default()
}

/// SQLite-based repository, scoped to a single season.
///
/// Provides async access to SQLite storage for all record kinds.
pub struct SqliteRepository {
    conn: Connection,
    season: Season,
}

impl SqliteRepository {
    /// Creates a new repository with a file-based database.
    ///
    /// The database file will be created if it doesn't exist.
    /// Schema tables are created automatically.
    pub async fn new(path: &str, season: Season) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn, season })
    }

    /// Creates a new repository with an in-memory database.
    ///
    /// Useful for testing - data is lost when the connection is dropped.
    pub async fn new_in_memory(season: Season) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn, season })
    }

    /// Initialize the database schema.
    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES).map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(map_tokio_rusqlite_error)
    }
}

#[async_trait]
impl<T: SyncRecord> Repository<T> for SqliteRepository {
    async fn find_existing(&self, key: &NaturalKey) -> Result<Option<T>> {
        let season = self.season.to_string();
        let subject = key.subject.0;
        let secondary = secondary_column(key);

        let payload: Option<String> = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_RECORD_BY_KEY).map_err(wrap_err)?;
                match stmt.query_row(
                    rusqlite::params![T::KIND, season, subject, secondary],
                    |row| row.get(0),
                ) {
                    Ok(payload) => Ok(Some(payload)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(wrap_err(e)),
                }
            })
            .await
            .map_err(map_tokio_rusqlite_error)?;

        payload.as_deref().map(deserialize_row).transpose()
    }

    async fn find_all(&self) -> Result<Vec<T>> {
        let season = self.season.to_string();

        let payloads: Vec<String> = self
            .conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_RECORDS_BY_KIND)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map(rusqlite::params![T::KIND, season], |row| row.get(0))
                    .map_err(wrap_err)?;

                let mut payloads = Vec::new();
                for row_result in rows {
                    payloads.push(row_result.map_err(wrap_err)?);
                }
                Ok(payloads)
            })
            .await
            .map_err(map_tokio_rusqlite_error)?;

        payloads.iter().map(|p| deserialize_row(p)).collect()
    }

    async fn find_by_subject(&self, subject: SubjectId) -> Result<Vec<T>> {
        let season = self.season.to_string();
        let subject = subject.0;

        let payloads: Vec<String> = self
            .conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_RECORDS_BY_SUBJECT)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map(rusqlite::params![T::KIND, season, subject], |row| row.get(0))
                    .map_err(wrap_err)?;

                let mut payloads = Vec::new();
                for row_result in rows {
                    payloads.push(row_result.map_err(wrap_err)?);
                }
                Ok(payloads)
            })
            .await
            .map_err(map_tokio_rusqlite_error)?;

        payloads.iter().map(|p| deserialize_row(p)).collect()
    }

    async fn batch_upsert(&self, records: &[T]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let sql = match T::WRITE_POLICY {
            WritePolicy::SkipIfExists => schema::INSERT_RECORD_SKIP_IF_EXISTS,
            WritePolicy::Overwrite => schema::INSERT_RECORD_OVERWRITE,
        };

        // Serialize outside the connection closure so serialization failures
        // surface before any row is written.
        let season = self.season.to_string();
        let now = Utc::now().to_rfc3339();
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let payload = serde_json::to_string(record)
                .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
            let key = record.natural_key();
            rows.push((key.subject.0, secondary_column(&key), payload));
        }

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                let mut written = 0;
                {
                    let mut stmt = tx.prepare(sql).map_err(wrap_err)?;
                    for (subject, secondary, payload) in &rows {
                        written += stmt
                            .execute(rusqlite::params![
                                T::KIND, season, subject, secondary, payload, now
                            ])
                            .map_err(wrap_err)?;
                    }
                }
                tx.commit().map_err(wrap_err)?;
                Ok(written)
            })
            .await
            .map_err(map_tokio_rusqlite_error)
    }

    async fn delete_all(&self) -> Result<usize> {
        let season = self.season.to_string();

        self.conn
            .call(move |conn| {
                conn.execute(schema::DELETE_RECORDS_BY_KIND, rusqlite::params![T::KIND, season])
                    .map_err(wrap_err)
            })
            .await
            .map_err(map_tokio_rusqlite_error)
    }

    async fn delete_by_subject(&self, subject: SubjectId) -> Result<usize> {
        let season = self.season.to_string();
        let subject = subject.0;

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::DELETE_RECORDS_BY_SUBJECT,
                    rusqlite::params![T::KIND, season, subject],
                )
                .map_err(wrap_err)
            })
            .await
            .map_err(map_tokio_rusqlite_error)
    }
}

#[async_trait]
impl SubjectDirectory for SqliteRepository {
    async fn list_subjects(&self) -> Result<Vec<SubjectId>> {
        let season = self.season.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_SUBJECTS).map_err(wrap_err)?;
                let rows = stmt
                    .query_map(rusqlite::params![season], |row| {
                        row.get::<_, i64>(0).map(SubjectId)
                    })
                    .map_err(wrap_err)?;

                let mut subjects = Vec::new();
                for row_result in rows {
                    subjects.push(row_result.map_err(wrap_err)?);
                }
                Ok(subjects)
            })
            .await
            .map_err(map_tokio_rusqlite_error)
    }

    async fn register_subject(&self, subject: SubjectId, label: Option<&str>) -> Result<()> {
        let season = self.season.to_string();
        let subject = subject.0;
        let label = label.map(str::to_string);
        let now = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| {
                conn.execute(
                    schema::INSERT_SUBJECT,
                    rusqlite::params![season, subject, label, now],
                )
                .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(map_tokio_rusqlite_error)
    }

    async fn deregister_subject(&self, subject: SubjectId) -> Result<()> {
        let season = self.season.to_string();
        let subject = subject.0;

        self.conn
            .call(move |conn| {
                conn.execute(schema::DELETE_SUBJECT, rusqlite::params![season, subject])
                    .map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(map_tokio_rusqlite_error)
    }
}

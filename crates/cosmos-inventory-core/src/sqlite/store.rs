use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};
use serde_json::Value;
use time::OffsetDateTime;

use crate::config::StreamTarget;
use crate::models::{CoreError, CoreErrorKind, TaskKind};
use crate::persistence::{
    DeadLetter, DeadLetterStore, MigrationStore, PersistenceResult, StoredTelemetryRow,
};
use crate::providers::{ProviderError, ProviderResult, TelemetrySink};
use crate::sqlite::migrations::{SqliteMigration, current_schema_version, migration, migrations};

const MIGRATIONS_TABLE: &str = "cosmos_inventory_schema_migrations";

/// Local stand-in for the ingestion endpoint and the queue's poison store.
/// Every operation opens its own connection, so the store is `Send + Sync`
/// without interior locking.
pub struct SqliteStore {
    database_path: PathBuf,
}

impl SqliteStore {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn planned_migrations(&self, from_version: i64) -> Vec<&'static SqliteMigration> {
        migrations()
            .iter()
            .filter(|entry| entry.version > from_version)
            .collect()
    }

    pub fn migrate_to_latest(&self) -> PersistenceResult<()> {
        self.apply_migration(current_schema_version())
    }

    /// Rows in upload order, optionally restricted to one stream name.
    pub fn list_telemetry_rows(
        &self,
        stream_name: Option<&str>,
    ) -> PersistenceResult<Vec<StoredTelemetryRow>> {
        self.with_connection("list_telemetry_rows", |connection| {
            ensure_schema_ready(connection)?;
            let mut statement = connection.prepare(
                "SELECT rule_id, stream_name, payload
                 FROM telemetry_rows
                 WHERE ?1 IS NULL OR stream_name = ?1
                 ORDER BY row_id ASC",
            )?;
            let rows = statement.query_map([stream_name], |row| {
                let payload: String = row.get(2)?;
                Ok(StoredTelemetryRow {
                    rule_id: row.get(0)?,
                    stream_name: row.get(1)?,
                    payload: parse_payload(&payload)?,
                })
            })?;
            rows.collect()
        })
    }

    fn with_connection<T>(
        &self,
        operation_name: &str,
        operation: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> PersistenceResult<T> {
        let mut connection = open_connection(&self.database_path)
            .map_err(|error| storage_error(operation_name, error))?;
        operation(&mut connection).map_err(|error| storage_error(operation_name, error))
    }
}

impl MigrationStore for SqliteStore {
    fn current_version(&self) -> PersistenceResult<i64> {
        self.with_connection("current_version", |connection| {
            ensure_migrations_table(connection)?;
            read_current_version(connection)
        })
    }

    fn apply_migration(&self, target_version: i64) -> PersistenceResult<()> {
        if target_version < 0 || target_version > current_schema_version() {
            return Err(storage_error_text(
                "apply_migration",
                format!("invalid migration target version '{target_version}'"),
            ));
        }

        if target_version > 0 && migration(target_version).is_none() {
            return Err(storage_error_text(
                "apply_migration",
                format!("migration version '{target_version}' is not defined"),
            ));
        }

        self.with_connection("apply_migration", |connection| {
            ensure_migrations_table(connection)?;
            let current_version = read_current_version(connection)?;

            if target_version == current_version {
                // Recorded versions can outlive dropped tables; the DDL is
                // idempotent, so replay it.
                for version in 1..=target_version {
                    connection.execute_batch(defined_migration(version)?.up_sql)?;
                }
                return Ok(());
            }

            if target_version > current_version {
                for version in (current_version + 1)..=target_version {
                    apply_up_migration(connection, defined_migration(version)?)?;
                }
            } else {
                for version in ((target_version + 1)..=current_version).rev() {
                    apply_down_migration(connection, defined_migration(version)?)?;
                }
            }

            Ok(())
        })
    }
}

impl TelemetrySink for SqliteStore {
    fn upload(&self, target: &StreamTarget, rows: &[Value]) -> ProviderResult<()> {
        self.with_connection("upload_telemetry", |connection| {
            ensure_schema_ready(connection)?;
            let transaction = connection.transaction()?;
            {
                let mut statement = transaction.prepare(
                    "INSERT INTO telemetry_rows (rule_id, stream_name, payload, uploaded_at_unix)
                     VALUES (?1, ?2, ?3, strftime('%s', 'now'))",
                )?;
                for row in rows {
                    let payload = serde_json::to_string(row)
                        .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))?;
                    statement.execute(params![target.rule_id, target.stream_name, payload])?;
                }
            }
            transaction.commit()
        })
        .map_err(|error| ProviderError::Transport {
            message: error.message,
        })?;

        tracing::debug!(
            stream = target.stream_name.as_str(),
            rows = rows.len(),
            "stored telemetry rows"
        );
        Ok(())
    }
}

impl DeadLetterStore for SqliteStore {
    fn record_dead_letter(&self, dead_letter: &DeadLetter) -> PersistenceResult<()> {
        self.with_connection("record_dead_letter", |connection| {
            ensure_schema_ready(connection)?;
            connection.execute(
                "INSERT INTO dead_letters
                    (message, task, error_kind, error_message, attempts, recorded_at_unix)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    dead_letter.message,
                    dead_letter.task.map(TaskKind::as_str),
                    error_kind_to_str(dead_letter.error_kind),
                    dead_letter.error_message,
                    dead_letter.attempts,
                    dead_letter.recorded_at.unix_timestamp(),
                ],
            )?;
            Ok(())
        })
    }

    fn list_dead_letters(&self, limit: usize) -> PersistenceResult<Vec<DeadLetter>> {
        self.with_connection("list_dead_letters", |connection| {
            ensure_schema_ready(connection)?;
            let mut statement = connection.prepare(
                "SELECT message, task, error_kind, error_message, attempts, recorded_at_unix
                 FROM dead_letters
                 ORDER BY dead_letter_id ASC
                 LIMIT ?1",
            )?;
            let rows = statement.query_map([to_i64(limit)?], |row| {
                let task: Option<String> = row.get(1)?;
                let error_kind: String = row.get(2)?;
                let recorded_at: i64 = row.get(5)?;
                Ok(DeadLetter {
                    message: row.get(0)?,
                    task: task.as_deref().map(parse_task_kind).transpose()?,
                    error_kind: parse_error_kind(&error_kind)?,
                    error_message: row.get(3)?,
                    attempts: row.get(4)?,
                    recorded_at: from_unix_seconds(recorded_at)?,
                })
            })?;
            rows.collect()
        })
    }
}

fn open_connection(database_path: &Path) -> rusqlite::Result<Connection> {
    if let Some(parent) = database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|error| rusqlite::Error::ToSqlConversionFailure(Box::new(error)))?;
    }
    Connection::open(database_path)
}

fn ensure_migrations_table(connection: &Connection) -> rusqlite::Result<()> {
    connection.execute_batch(&format!(
        "
CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at_unix INTEGER NOT NULL
);
"
    ))
}

fn ensure_schema_ready(connection: &Connection) -> rusqlite::Result<()> {
    ensure_migrations_table(connection)?;
    if read_current_version(connection)? < current_schema_version() {
        return Err(storage_error_sqlite(
            "database schema is behind; apply migrations before storing telemetry",
        ));
    }
    Ok(())
}

fn read_current_version(connection: &Connection) -> rusqlite::Result<i64> {
    connection.query_row(
        &format!("SELECT COALESCE(MAX(version), 0) FROM {MIGRATIONS_TABLE}"),
        [],
        |row| row.get(0),
    )
}

fn defined_migration(version: i64) -> rusqlite::Result<&'static SqliteMigration> {
    migration(version).ok_or_else(|| {
        storage_error_sqlite(&format!("migration version '{version}' is not defined"))
    })
}

fn apply_up_migration(
    connection: &mut Connection,
    migration: &SqliteMigration,
) -> rusqlite::Result<()> {
    let transaction = connection.transaction()?;
    transaction.execute_batch(migration.up_sql)?;
    transaction.execute(
        &format!(
            "INSERT INTO {MIGRATIONS_TABLE} (version, name, applied_at_unix)
             VALUES (?1, ?2, strftime('%s', 'now'))"
        ),
        (migration.version, migration.name),
    )?;
    transaction.commit()
}

fn apply_down_migration(
    connection: &mut Connection,
    migration: &SqliteMigration,
) -> rusqlite::Result<()> {
    let transaction = connection.transaction()?;
    transaction.execute_batch(migration.down_sql)?;
    transaction.execute(
        &format!("DELETE FROM {MIGRATIONS_TABLE} WHERE version = ?1"),
        [migration.version],
    )?;
    transaction.commit()
}

fn error_kind_to_str(kind: CoreErrorKind) -> &'static str {
    match kind {
        CoreErrorKind::MalformedAddress => "malformed_address",
        CoreErrorKind::InvalidInput => "invalid_input",
        CoreErrorKind::UnrecognizedTask => "unrecognized_task",
        CoreErrorKind::ParseFailure => "parse_failure",
        CoreErrorKind::ProviderFailure => "provider_failure",
        CoreErrorKind::Transient => "transient",
        CoreErrorKind::TelemetryUpload => "telemetry_upload",
        CoreErrorKind::StorageFailure => "storage_failure",
        CoreErrorKind::Internal => "internal",
    }
}

fn parse_error_kind(raw: &str) -> rusqlite::Result<CoreErrorKind> {
    match raw {
        "malformed_address" => Ok(CoreErrorKind::MalformedAddress),
        "invalid_input" => Ok(CoreErrorKind::InvalidInput),
        "unrecognized_task" => Ok(CoreErrorKind::UnrecognizedTask),
        "parse_failure" => Ok(CoreErrorKind::ParseFailure),
        "provider_failure" => Ok(CoreErrorKind::ProviderFailure),
        "transient" => Ok(CoreErrorKind::Transient),
        "telemetry_upload" => Ok(CoreErrorKind::TelemetryUpload),
        "storage_failure" => Ok(CoreErrorKind::StorageFailure),
        "internal" => Ok(CoreErrorKind::Internal),
        _ => Err(storage_error_sqlite(&format!(
            "unknown error kind '{raw}' in sqlite record"
        ))),
    }
}

fn parse_task_kind(raw: &str) -> rusqlite::Result<TaskKind> {
    raw.parse::<TaskKind>().map_err(|_| {
        storage_error_sqlite(&format!("unknown task '{raw}' in sqlite record"))
    })
}

fn parse_payload(raw: &str) -> rusqlite::Result<Value> {
    serde_json::from_str(raw).map_err(|error| {
        storage_error_sqlite(&format!("stored telemetry payload is not JSON: {error}"))
    })
}

fn from_unix_seconds(value: i64) -> rusqlite::Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(value).map_err(|error| {
        storage_error_sqlite(&format!("stored timestamp '{value}' is out of range: {error}"))
    })
}

fn to_i64(value: usize) -> rusqlite::Result<i64> {
    i64::try_from(value).map_err(|_| storage_error_sqlite("value exceeds i64 range"))
}

fn storage_error(operation: &str, error: rusqlite::Error) -> CoreError {
    storage_error_text(operation, error.to_string())
}

fn storage_error_sqlite(message: &str) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(std::io::Error::other(message.to_string())))
}

fn storage_error_text(operation: &str, message: impl AsRef<str>) -> CoreError {
    CoreError::new(
        CoreErrorKind::StorageFailure,
        format!("sqlite {operation} failed: {}", message.as_ref()),
    )
}

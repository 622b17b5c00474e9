#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SqliteMigration {
    pub version: i64,
    pub name: &'static str,
    pub up_sql: &'static str,
    pub down_sql: &'static str,
}

const MIGRATION_0001: SqliteMigration = SqliteMigration {
    version: 1,
    name: "telemetry_rows",
    up_sql: r#"
CREATE TABLE IF NOT EXISTS telemetry_rows (
    row_id INTEGER PRIMARY KEY AUTOINCREMENT,
    rule_id TEXT NOT NULL,
    stream_name TEXT NOT NULL,
    payload TEXT NOT NULL,
    uploaded_at_unix INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_telemetry_rows_stream
    ON telemetry_rows (stream_name, row_id);
"#,
    down_sql: r#"
DROP INDEX IF EXISTS idx_telemetry_rows_stream;
DROP TABLE IF EXISTS telemetry_rows;
"#,
};

const MIGRATION_0002: SqliteMigration = SqliteMigration {
    version: 2,
    name: "dead_letters",
    up_sql: r#"
CREATE TABLE IF NOT EXISTS dead_letters (
    dead_letter_id INTEGER PRIMARY KEY AUTOINCREMENT,
    message TEXT NOT NULL,
    task TEXT,
    error_kind TEXT NOT NULL,
    error_message TEXT NOT NULL,
    attempts INTEGER NOT NULL,
    recorded_at_unix INTEGER NOT NULL
);
"#,
    down_sql: r#"
DROP TABLE IF EXISTS dead_letters;
"#,
};

const MIGRATIONS: [SqliteMigration; 2] = [MIGRATION_0001, MIGRATION_0002];

pub fn migrations() -> &'static [SqliteMigration] {
    &MIGRATIONS
}

pub fn migration(version: i64) -> Option<&'static SqliteMigration> {
    MIGRATIONS.iter().find(|entry| entry.version == version)
}

pub fn current_schema_version() -> i64 {
    MIGRATIONS.last().map(|entry| entry.version).unwrap_or(0)
}

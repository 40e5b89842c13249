//! Table Schema Definitions
//!
//! Single source of truth for the seven warehouse tables. Each struct defines
//! the expected schema for one table; DDL is rendered from these definitions
//! and the verifier compares them against the live catalog.
//!
//! # Usage
//!
//! ```rust,ignore
//! let def = TableDef::of::<SongsTable>();
//! warehouse.run_statement(&def.create_sql(Dialect::Redshift)).await?;
//! ```

use super::Dialect;

/// Column definition with SQL constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    /// SQL type (e.g., "VARCHAR(25)", "SMALLINT", "TIMESTAMP")
    pub sql_type: String,
    /// NOT NULL constraint
    pub not_null: bool,
    /// Auto-numbered surrogate key starting at 0
    pub identity: bool,
}

impl ColumnDefinition {
    /// Create new column definition
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            identity: false,
        }
    }

    /// Mark column as NOT NULL
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Mark column as an identity column
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    /// Column clause for CREATE TABLE
    pub fn render(&self, dialect: Dialect) -> String {
        let sql_type = if self.identity {
            match dialect {
                Dialect::Redshift => "INT IDENTITY(0,1)".to_string(),
                Dialect::Postgres => format!(
                    "{} GENERATED BY DEFAULT AS IDENTITY (START WITH 0 MINVALUE 0)",
                    self.sql_type
                ),
            }
        } else {
            self.sql_type.clone()
        };

        if self.not_null {
            format!("{} {} NOT NULL", self.name, sql_type)
        } else {
            format!("{} {}", self.name, sql_type)
        }
    }
}

/// Whether a table is a raw landing zone or a derived table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Staging,
    Fact,
    Dimension,
}

/// Defines expected schema for a warehouse table
pub trait TableSchema {
    /// Table name in database
    fn table_name() -> &'static str;

    fn kind() -> TableKind;

    /// Expected column definitions (order matters for table creation)
    fn expected_columns() -> Vec<ColumnDefinition>;

    /// Key columns declared for the query planner only
    ///
    /// Emitted as a PRIMARY KEY constraint on Redshift, which does not
    /// enforce it. Never emitted on PostgreSQL.
    fn informational_key() -> Option<Vec<&'static str>> {
        None
    }
}

/// Materialized table definition
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: &'static str,
    pub kind: TableKind,
    pub columns: Vec<ColumnDefinition>,
    pub informational_key: Option<Vec<&'static str>>,
}

impl TableDef {
    pub fn of<T: TableSchema>() -> Self {
        Self {
            name: T::table_name(),
            kind: T::kind(),
            columns: T::expected_columns(),
            informational_key: T::informational_key(),
        }
    }

    /// Idempotent drop statement
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }

    /// CREATE TABLE statement for the dialect
    pub fn create_sql(&self, dialect: Dialect) -> String {
        let mut clauses: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("  {}", c.render(dialect)))
            .collect();

        if let (Dialect::Redshift, Some(key)) = (dialect, &self.informational_key) {
            clauses.push(format!("  PRIMARY KEY ({})", key.join(", ")));
        }

        format!("CREATE TABLE {}\n(\n{}\n)", self.name, clauses.join(",\n"))
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Raw event log records
pub struct StagingEventsTable;

impl TableSchema for StagingEventsTable {
    fn table_name() -> &'static str {
        "staging_events"
    }

    fn kind() -> TableKind {
        TableKind::Staging
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("artist", "VARCHAR"),
            ColumnDefinition::new("auth", "VARCHAR(10)"),
            ColumnDefinition::new("first_name", "VARCHAR"),
            ColumnDefinition::new("gender", "VARCHAR(10)"),
            ColumnDefinition::new("itemInSession", "SMALLINT"),
            ColumnDefinition::new("last_name", "VARCHAR"),
            ColumnDefinition::new("length", "DECIMAL"),
            ColumnDefinition::new("level", "VARCHAR(6)"),
            ColumnDefinition::new("location", "VARCHAR"),
            ColumnDefinition::new("method", "VARCHAR(6)"),
            ColumnDefinition::new("page", "VARCHAR(20)"),
            ColumnDefinition::new("registration", "BIGINT"),
            ColumnDefinition::new("session_id", "SMALLINT"),
            ColumnDefinition::new("song", "VARCHAR"),
            ColumnDefinition::new("status", "SMALLINT"),
            // Epoch milliseconds
            ColumnDefinition::new("ts", "BIGINT"),
            ColumnDefinition::new("user_agent", "VARCHAR"),
            ColumnDefinition::new("user_id", "SMALLINT"),
        ]
    }
}

/// Raw song catalog records
pub struct StagingSongsTable;

impl TableSchema for StagingSongsTable {
    fn table_name() -> &'static str {
        "staging_songs"
    }

    fn kind() -> TableKind {
        TableKind::Staging
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("num_songs", "SMALLINT"),
            ColumnDefinition::new("artist_id", "VARCHAR(20)"),
            ColumnDefinition::new("artist_latitude", "DOUBLE PRECISION"),
            ColumnDefinition::new("artist_longitude", "DOUBLE PRECISION"),
            ColumnDefinition::new("artist_location", "VARCHAR"),
            ColumnDefinition::new("artist_name", "VARCHAR"),
            ColumnDefinition::new("song_id", "VARCHAR(25)"),
            ColumnDefinition::new("title", "VARCHAR"),
            ColumnDefinition::new("duration", "DECIMAL"),
            ColumnDefinition::new("year", "SMALLINT"),
        ]
    }
}

/// Fact table: one row per matched play event
pub struct SongplaysTable;

impl TableSchema for SongplaysTable {
    fn table_name() -> &'static str {
        "songplays"
    }

    fn kind() -> TableKind {
        TableKind::Fact
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("sp_id", "INTEGER").identity().not_null(),
            ColumnDefinition::new("sp_start_time", "TIMESTAMP").not_null(),
            ColumnDefinition::new("sp_user_id", "INTEGER").not_null(),
            ColumnDefinition::new("sp_level", "VARCHAR(6)").not_null(),
            ColumnDefinition::new("sp_song_id", "VARCHAR(25)").not_null(),
            ColumnDefinition::new("sp_artist_id", "VARCHAR(25)").not_null(),
            ColumnDefinition::new("sp_session_id", "INTEGER").not_null(),
            ColumnDefinition::new("sp_location", "VARCHAR"),
            ColumnDefinition::new("sp_user_agent", "VARCHAR"),
        ]
    }
}

/// Dimension: one row per user
pub struct UsersTable;

impl TableSchema for UsersTable {
    fn table_name() -> &'static str {
        "users"
    }

    fn kind() -> TableKind {
        TableKind::Dimension
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("u_id", "INTEGER").not_null(),
            ColumnDefinition::new("u_first_name", "VARCHAR").not_null(),
            ColumnDefinition::new("u_last_name", "VARCHAR").not_null(),
            ColumnDefinition::new("u_gender", "VARCHAR(6)").not_null(),
            ColumnDefinition::new("u_level", "VARCHAR(6)").not_null(),
        ]
    }
}

/// Dimension: catalog songs (duplicates allowed)
pub struct SongsTable;

impl TableSchema for SongsTable {
    fn table_name() -> &'static str {
        "songs"
    }

    fn kind() -> TableKind {
        TableKind::Dimension
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("s_id", "VARCHAR(25)").not_null(),
            ColumnDefinition::new("s_title", "VARCHAR").not_null(),
            ColumnDefinition::new("s_artist_id", "VARCHAR(25)").not_null(),
            ColumnDefinition::new("s_year", "INTEGER").not_null(),
            ColumnDefinition::new("s_duration", "DECIMAL").not_null(),
        ]
    }

    fn informational_key() -> Option<Vec<&'static str>> {
        Some(vec!["s_id", "s_title", "s_duration"])
    }
}

/// Dimension: distinct artist tuples
pub struct ArtistsTable;

impl TableSchema for ArtistsTable {
    fn table_name() -> &'static str {
        "artists"
    }

    fn kind() -> TableKind {
        TableKind::Dimension
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("a_id", "VARCHAR(25)").not_null(),
            ColumnDefinition::new("a_name", "VARCHAR").not_null(),
            ColumnDefinition::new("a_location", "VARCHAR"),
            ColumnDefinition::new("a_latitude", "NUMERIC(10)"),
            ColumnDefinition::new("a_longitude", "NUMERIC(10)"),
        ]
    }
}

/// Dimension: decomposed event timestamps
pub struct TimeTable;

impl TableSchema for TimeTable {
    fn table_name() -> &'static str {
        "time"
    }

    fn kind() -> TableKind {
        TableKind::Dimension
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("t_start_time", "TIMESTAMP").not_null(),
            ColumnDefinition::new("t_hour", "SMALLINT").not_null(),
            ColumnDefinition::new("t_day", "SMALLINT").not_null(),
            ColumnDefinition::new("t_week", "SMALLINT").not_null(),
            ColumnDefinition::new("t_month", "SMALLINT").not_null(),
            ColumnDefinition::new("t_year", "SMALLINT").not_null(),
            ColumnDefinition::new("t_weekday", "SMALLINT").not_null(),
        ]
    }
}

/// Staging tables in drop/create order
pub fn staging_tables() -> Vec<TableDef> {
    vec![
        TableDef::of::<StagingEventsTable>(),
        TableDef::of::<StagingSongsTable>(),
    ]
}

/// Analytical tables in drop/create order
pub fn analytical_tables() -> Vec<TableDef> {
    vec![
        TableDef::of::<SongplaysTable>(),
        TableDef::of::<UsersTable>(),
        TableDef::of::<SongsTable>(),
        TableDef::of::<ArtistsTable>(),
        TableDef::of::<TimeTable>(),
    ]
}

/// All seven tables, staging first
pub fn all_tables() -> Vec<TableDef> {
    let mut tables = staging_tables();
    tables.extend(analytical_tables());
    tables
}

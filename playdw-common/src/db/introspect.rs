//! Schema introspection and drift detection
//!
//! Reads the live column layout of a table from `information_schema` and
//! compares it with the declared [`TableDef`]. Nothing is altered here: the
//! warehouse is rebuilt from scratch by `create-tables`, so drift is only
//! reported.

use super::TableDef;
use crate::Result;
use sqlx::PgConnection;

/// Actual column from `information_schema.columns`
#[derive(Debug, Clone, PartialEq)]
pub struct ActualColumn {
    /// Position in table (1-based)
    pub position: i32,
    /// Column name as stored by the catalog (folded to lower case)
    pub name: String,
    /// Catalog type name (e.g. "character varying", "smallint")
    pub type_name: String,
    pub not_null: bool,
}

/// Schema drift detected between expected and actual schema
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaDrift {
    /// Table is not present at all
    MissingTable { table: String },
    /// Column missing from database
    MissingColumn { table: String, column: String },
    /// Column present in database but not declared
    UnexpectedColumn { table: String, column: String },
    /// Column type family differs
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },
    /// NOT NULL constraint differs
    NullabilityMismatch {
        table: String,
        column: String,
        expected_not_null: bool,
    },
}

impl std::fmt::Display for SchemaDrift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaDrift::MissingTable { table } => write!(f, "table '{}' is missing", table),
            SchemaDrift::MissingColumn { table, column } => {
                write!(f, "{}.{} is missing", table, column)
            }
            SchemaDrift::UnexpectedColumn { table, column } => {
                write!(f, "{}.{} is not declared", table, column)
            }
            SchemaDrift::TypeMismatch {
                table,
                column,
                expected,
                actual,
            } => write!(
                f,
                "{}.{} has type '{}', expected '{}'",
                table, column, actual, expected
            ),
            SchemaDrift::NullabilityMismatch {
                table,
                column,
                expected_not_null,
            } => write!(
                f,
                "{}.{} should be {}",
                table,
                column,
                if *expected_not_null { "NOT NULL" } else { "nullable" }
            ),
        }
    }
}

/// Schema introspection - read actual database schema
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Read actual columns of a table in the current schema, by position
    pub async fn introspect_table(
        conn: &mut PgConnection,
        table_name: &str,
    ) -> Result<Vec<ActualColumn>> {
        // Catalog columns are domain types; cast so they decode as text
        let rows: Vec<(i32, String, String, String)> = sqlx::query_as(
            r#"
            SELECT CAST(ordinal_position AS INTEGER),
                   CAST(column_name AS VARCHAR),
                   CAST(data_type AS VARCHAR),
                   CAST(is_nullable AS VARCHAR)
            FROM information_schema.columns
            WHERE table_schema = current_schema()
              AND table_name = $1
            ORDER BY ordinal_position
            "#,
        )
        .bind(table_name)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(position, name, type_name, is_nullable)| ActualColumn {
                position,
                name,
                type_name,
                not_null: is_nullable == "NO",
            })
            .collect())
    }

    /// Check if table exists in the current schema
    pub async fn table_exists(conn: &mut PgConnection, table_name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM information_schema.tables
            WHERE table_schema = current_schema()
              AND table_name = $1
            "#,
        )
        .bind(table_name)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count > 0)
    }

    /// Introspect and compare one table
    pub async fn check_table(conn: &mut PgConnection, table: &TableDef) -> Result<Vec<SchemaDrift>> {
        if !Self::table_exists(conn, table.name).await? {
            return Ok(vec![SchemaDrift::MissingTable {
                table: table.name.to_string(),
            }]);
        }

        let actual = Self::introspect_table(conn, table.name).await?;
        Ok(SchemaDiff::compare(table, &actual))
    }
}

/// Schema comparison - detect drift between expected and actual
pub struct SchemaDiff;

impl SchemaDiff {
    /// Compare expected schema to actual database schema
    ///
    /// Unquoted identifiers are folded to lower case by the server, so names
    /// compare case-insensitively.
    pub fn compare(expected: &TableDef, actual: &[ActualColumn]) -> Vec<SchemaDrift> {
        let mut drift = Vec::new();
        let table = expected.name.to_string();

        for expected_col in &expected.columns {
            let found = actual
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(&expected_col.name));

            let Some(actual_col) = found else {
                drift.push(SchemaDrift::MissingColumn {
                    table: table.clone(),
                    column: expected_col.name.clone(),
                });
                continue;
            };

            if !Self::types_compatible(&expected_col.sql_type, &actual_col.type_name) {
                drift.push(SchemaDrift::TypeMismatch {
                    table: table.clone(),
                    column: expected_col.name.clone(),
                    expected: expected_col.sql_type.clone(),
                    actual: actual_col.type_name.clone(),
                });
            }

            if expected_col.not_null != actual_col.not_null {
                drift.push(SchemaDrift::NullabilityMismatch {
                    table: table.clone(),
                    column: expected_col.name.clone(),
                    expected_not_null: expected_col.not_null,
                });
            }
        }

        for actual_col in actual {
            let declared = expected
                .columns
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&actual_col.name));
            if !declared {
                drift.push(SchemaDrift::UnexpectedColumn {
                    table: table.clone(),
                    column: actual_col.name.clone(),
                });
            }
        }

        drift
    }

    /// Check if a declared type and a catalog type name belong to the same family
    pub fn types_compatible(declared: &str, catalog: &str) -> bool {
        Self::catalog_family(declared) == Self::catalog_family(catalog)
    }

    /// Map a declared or catalog type name to its `information_schema` family
    fn catalog_family(type_name: &str) -> String {
        let upper = type_name.to_uppercase();
        // Drop length/precision: VARCHAR(25) -> VARCHAR
        let base = upper.split('(').next().unwrap_or("").trim();

        let family = match base {
            "VARCHAR" | "CHARACTER VARYING" | "TEXT" => "character varying",
            "SMALLINT" | "INT2" => "smallint",
            "INT" | "INTEGER" | "INT4" => "integer",
            "BIGINT" | "INT8" => "bigint",
            "DECIMAL" | "NUMERIC" => "numeric",
            "DOUBLE PRECISION" | "FLOAT8" | "FLOAT" => "double precision",
            "TIMESTAMP" | "TIMESTAMP WITHOUT TIME ZONE" => "timestamp without time zone",
            other => return other.to_lowercase(),
        };
        family.to_string()
    }
}

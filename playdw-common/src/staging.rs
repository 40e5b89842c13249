//! Staging Loader
//!
//! Bulk-copies the event log and song catalog datasets from object storage
//! into the two staging tables with one `COPY` per table. The event log is
//! mapped through a JSONPaths manifest; song records use automatic field
//! matching. A malformed source record fails the whole `COPY`.

use crate::db::{Dialect, StagingEventsTable, StagingSongsTable, TableSchema, Warehouse};
use crate::pipeline::{run_steps, Stage, StageSummary, Step};
use crate::{Error, Result};

/// External dataset locations and the credential used to read them
#[derive(Debug, Clone, PartialEq)]
pub struct StagingSources {
    /// IAM role the cluster assumes for the copy
    pub role_arn: String,
    /// Event log prefix (JSON lines)
    pub log_data: String,
    /// JSONPaths manifest for the event log
    pub log_jsonpath: String,
    /// Song metadata prefix (JSON)
    pub song_data: String,
    pub region: String,
}

/// How JSON fields map onto table columns
#[derive(Debug, Clone, PartialEq)]
pub enum JsonLayout {
    /// Explicit JSONPaths manifest at the given URI
    Paths(String),
    /// Match keys to column names
    Auto,
}

impl JsonLayout {
    fn clause(&self) -> String {
        match self {
            JsonLayout::Paths(uri) => format!("JSON {}", quote_literal(uri)),
            JsonLayout::Auto => "JSON 'auto'".to_string(),
        }
    }
}

/// Quote a string as an SQL literal
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn copy_sql(table: &str, source: &str, layout: &JsonLayout, sources: &StagingSources) -> String {
    format!(
        "COPY {} FROM {}\nCREDENTIALS {}\n{} REGION {}",
        table,
        quote_literal(source),
        quote_literal(&format!("aws_iam_role={}", sources.role_arn)),
        layout.clause(),
        quote_literal(&sources.region)
    )
}

/// Bulk-load statements, events first
pub fn copy_steps(sources: &StagingSources) -> Vec<Step> {
    let events = StagingEventsTable::table_name();
    let songs = StagingSongsTable::table_name();

    vec![
        Step::new(
            events,
            copy_sql(
                events,
                &sources.log_data,
                &JsonLayout::Paths(sources.log_jsonpath.clone()),
                sources,
            ),
        ),
        Step::new(
            songs,
            copy_sql(songs, &sources.song_data, &JsonLayout::Auto, sources),
        ),
    ]
}

/// Load both staging tables
pub async fn load_staging<W>(
    warehouse: &mut W,
    sources: &StagingSources,
    dialect: Dialect,
) -> Result<StageSummary>
where
    W: Warehouse + ?Sized,
{
    if dialect != Dialect::Redshift {
        return Err(Error::Config(format!(
            "bulk load from object storage requires the redshift dialect (configured: {}); \
             seed the staging tables and use --skip-staging",
            dialect
        )));
    }

    run_steps(warehouse, Stage::LoadStaging, &copy_steps(sources)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DryRunWarehouse;

    fn sources() -> StagingSources {
        StagingSources {
            role_arn: "arn:aws:iam::123456789012:role/dwhRole".to_string(),
            log_data: "s3://udacity-dend/log_data/".to_string(),
            log_jsonpath: "s3://udacity-dend/log_json_path.json".to_string(),
            song_data: "s3://udacity-dend/song_data/".to_string(),
            region: "us-west-2".to_string(),
        }
    }

    #[test]
    fn test_events_copy_uses_jsonpaths_manifest() {
        let steps = copy_steps(&sources());

        assert_eq!(steps[0].name, "staging_events");
        assert_eq!(
            steps[0].sql,
            "COPY staging_events FROM 's3://udacity-dend/log_data/'\n\
             CREDENTIALS 'aws_iam_role=arn:aws:iam::123456789012:role/dwhRole'\n\
             JSON 's3://udacity-dend/log_json_path.json' REGION 'us-west-2'"
        );
    }

    #[test]
    fn test_songs_copy_uses_auto_layout() {
        let steps = copy_steps(&sources());

        assert_eq!(steps[1].name, "staging_songs");
        assert!(steps[1].sql.starts_with("COPY staging_songs FROM 's3://udacity-dend/song_data/'"));
        assert!(steps[1].sql.contains("JSON 'auto' REGION 'us-west-2'"));
    }

    #[test]
    fn test_literals_are_escaped() {
        assert_eq!(quote_literal("it's"), "'it''s'");

        let mut sources = sources();
        sources.role_arn = "arn:x' OR '1".to_string();
        let steps = copy_steps(&sources);
        assert!(steps[0].sql.contains("'aws_iam_role=arn:x'' OR ''1'"));
    }

    #[tokio::test]
    async fn test_load_staging_runs_two_copies() {
        let mut warehouse = DryRunWarehouse::new();
        let summary = load_staging(&mut warehouse, &sources(), Dialect::Redshift)
            .await
            .unwrap();

        assert_eq!(summary.steps.len(), 2);
        assert!(warehouse.statements()[0].starts_with("COPY staging_events"));
        assert!(warehouse.statements()[1].starts_with("COPY staging_songs"));
    }

    #[tokio::test]
    async fn test_load_staging_refuses_postgres() {
        let mut warehouse = DryRunWarehouse::new();
        let err = load_staging(&mut warehouse, &sources(), Dialect::Postgres)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(warehouse.statements().is_empty());
    }
}

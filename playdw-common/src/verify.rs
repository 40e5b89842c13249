//! Post-load verification
//!
//! Read-only checks run against a loaded warehouse:
//! - row-count and uniqueness properties of the dimension tables
//! - fact rows resolve to existing song and artist rows
//! - sampled `time` rows agree with [`TimeParts`]
//! - live table layouts agree with the declared schema

use crate::db::{all_tables, SchemaIntrospector};
use crate::{Result, TimeParts};
use sqlx::PgConnection;
use tracing::{info, warn};

/// Verification settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Maximum `time` rows compared against the Rust decomposition
    pub time_sample_size: u32,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            time_sample_size: 100,
        }
    }
}

/// Result of one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckOutcome {
    fn new(name: impl Into<String>, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }

    /// Pass when both counts are equal
    fn equal_counts(name: &str, what: &str, actual: i64, expected: i64) -> Self {
        Self::new(
            name,
            actual == expected,
            format!("{} = {}, expected {}", what, actual, expected),
        )
    }

    /// Pass when no offending rows were found
    fn none_found(name: &str, what: &str, offending: i64) -> Self {
        Self::new(name, offending == 0, format!("{} {}", offending, what))
    }
}

/// All check outcomes, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationReport {
    pub checks: Vec<CheckOutcome>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckOutcome> {
        self.checks.iter().filter(|c| !c.passed)
    }

    fn push(&mut self, outcome: CheckOutcome) {
        if outcome.passed {
            info!("  ✓ {}: {}", outcome.name, outcome.detail);
        } else {
            warn!("  ✗ {}: {}", outcome.name, outcome.detail);
        }
        self.checks.push(outcome);
    }
}

async fn scalar(conn: &mut PgConnection, sql: &str) -> Result<i64> {
    Ok(sqlx::query_scalar::<_, i64>(sql).fetch_one(&mut *conn).await?)
}

/// Compare one `time` row against the Rust decomposition of its start time
pub fn check_time_row(epoch_seconds: i64, stored: [i16; 6]) -> std::result::Result<(), String> {
    let expected = TimeParts::from_epoch_seconds(epoch_seconds)
        .ok_or_else(|| format!("timestamp {} out of range", epoch_seconds))?;

    if expected.components() == stored {
        Ok(())
    } else {
        Err(format!(
            "{}: stored {:?}, expected {:?}",
            expected.start_time,
            stored,
            expected.components()
        ))
    }
}

async fn check_time_sample(conn: &mut PgConnection, sample_size: u32) -> Result<CheckOutcome> {
    let rows: Vec<(i64, i16, i16, i16, i16, i16, i16)> = sqlx::query_as(
        r#"
        SELECT CAST(EXTRACT(epoch FROM t_start_time) AS BIGINT),
               t_hour, t_day, t_week, t_month, t_year, t_weekday
        FROM time
        ORDER BY t_start_time
        LIMIT $1
        "#,
    )
    .bind(i64::from(sample_size))
    .fetch_all(&mut *conn)
    .await?;

    let mismatches: Vec<String> = rows
        .iter()
        .filter_map(|&(epoch, hour, day, week, month, year, weekday)| {
            check_time_row(epoch, [hour, day, week, month, year, weekday]).err()
        })
        .collect();

    Ok(match mismatches.first() {
        None => CheckOutcome::new(
            "time_decomposition",
            true,
            format!("{} sampled rows consistent", rows.len()),
        ),
        Some(first) => CheckOutcome::new(
            "time_decomposition",
            false,
            format!("{} of {} sampled rows differ, e.g. {}", mismatches.len(), rows.len(), first),
        ),
    })
}

/// Run every check; only database errors abort
pub async fn verify(conn: &mut PgConnection, options: &VerifyOptions) -> Result<VerificationReport> {
    info!("=== Verifying warehouse ===");
    let mut report = VerificationReport::default();

    let users = scalar(conn, "SELECT COUNT(*) FROM users").await?;
    let distinct_users = scalar(
        conn,
        "SELECT COUNT(DISTINCT user_id) FROM staging_events WHERE user_id IS NOT NULL",
    )
    .await?;
    report.push(CheckOutcome::equal_counts(
        "users_distinct",
        "users",
        users,
        distinct_users,
    ));

    let songs = scalar(conn, "SELECT COUNT(*) FROM songs").await?;
    let staged_songs = scalar(conn, "SELECT COUNT(*) FROM staging_songs").await?;
    report.push(CheckOutcome::equal_counts(
        "songs_one_to_one",
        "songs",
        songs,
        staged_songs,
    ));

    let duplicate_artists = scalar(
        conn,
        r#"
        SELECT COUNT(*) FROM (
            SELECT a_id, a_name, a_location, a_latitude, a_longitude
            FROM artists
            GROUP BY a_id, a_name, a_location, a_latitude, a_longitude
            HAVING COUNT(*) > 1
        ) AS dup
        "#,
    )
    .await?;
    report.push(CheckOutcome::none_found(
        "artists_unique",
        "duplicated artist tuples",
        duplicate_artists,
    ));

    let duplicate_times = scalar(
        conn,
        "SELECT COUNT(*) - COUNT(DISTINCT t_start_time) FROM time",
    )
    .await?;
    report.push(CheckOutcome::none_found(
        "time_unique",
        "duplicated start times",
        duplicate_times,
    ));

    let unresolved = scalar(
        conn,
        r#"
        SELECT COUNT(*)
        FROM songplays sp
        WHERE NOT EXISTS (SELECT 1 FROM songs s WHERE s.s_id = sp.sp_song_id)
           OR NOT EXISTS (SELECT 1 FROM artists a WHERE a.a_id = sp.sp_artist_id)
        "#,
    )
    .await?;
    report.push(CheckOutcome::none_found(
        "songplays_resolve",
        "songplays without a song or artist row",
        unresolved,
    ));

    report.push(check_time_sample(conn, options.time_sample_size).await?);

    for table in all_tables() {
        let drift = SchemaIntrospector::check_table(conn, &table).await?;
        let detail = if drift.is_empty() {
            "matches declared columns".to_string()
        } else {
            drift
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        };
        report.push(CheckOutcome::new(
            format!("schema_{}", table.name),
            drift.is_empty(),
            detail,
        ));
    }

    let failed = report.failures().count();
    if failed == 0 {
        info!("✓ All {} checks passed", report.checks.len());
    } else {
        warn!("{} of {} checks failed", failed, report.checks.len());
    }

    Ok(report)
}

//! Reporting queries
//!
//! Four read-only aggregates over the fact table. Each report yields rows of
//! `(key, plays)` as a stream so callers can print as rows arrive.

use crate::Result;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use sqlx::PgConnection;

/// One report row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    /// Group key (level, user name, day); `None` for ungrouped totals
    pub key: Option<String>,
    pub plays: i64,
}

impl From<(Option<String>, i64)> for ReportRow {
    fn from((key, plays): (Option<String>, i64)) -> Self {
        Self { key, plays }
    }
}

/// Diagnostic report over the loaded warehouse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    TotalStreams,
    StreamsByLevel,
    TopUsers,
    TopDaysOfMonth,
}

impl Report {
    /// All reports in display order
    pub const ALL: [Report; 4] = [
        Report::TotalStreams,
        Report::StreamsByLevel,
        Report::TopUsers,
        Report::TopDaysOfMonth,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Report::TotalStreams => "Total number of streams",
            Report::StreamsByLevel => "Streams by membership level",
            Report::TopUsers => "Top 5 users with most listens",
            Report::TopDaysOfMonth => "Top 5 streaming days of the month",
        }
    }

    /// Query text; every query selects `(group_key VARCHAR, plays BIGINT)`
    pub fn sql(&self) -> &'static str {
        match self {
            Report::TotalStreams => {
                r#"
                SELECT CAST(NULL AS VARCHAR) AS group_key, COUNT(*) AS plays
                FROM songplays
                "#
            }
            Report::StreamsByLevel => {
                r#"
                SELECT sp.sp_level AS group_key, COUNT(*) AS plays
                FROM songplays sp
                GROUP BY sp.sp_level
                ORDER BY plays DESC
                "#
            }
            Report::TopUsers => {
                r#"
                SELECT u.u_first_name || ' ' || u.u_last_name AS group_key, COUNT(*) AS plays
                FROM songplays sp
                JOIN users u ON sp.sp_user_id = u.u_id
                GROUP BY u.u_id, u.u_first_name, u.u_last_name
                ORDER BY plays DESC
                LIMIT 5
                "#
            }
            Report::TopDaysOfMonth => {
                r#"
                SELECT CAST(t.t_day AS VARCHAR) AS group_key, COUNT(*) AS plays
                FROM songplays sp
                JOIN time t ON sp.sp_start_time = t.t_start_time
                GROUP BY t.t_day
                ORDER BY plays DESC
                LIMIT 5
                "#
            }
        }
    }

    /// Lazily fetch the report rows
    pub fn rows<'c>(&self, conn: &'c mut PgConnection) -> BoxStream<'c, Result<ReportRow>> {
        sqlx::query_as::<_, (Option<String>, i64)>(self.sql())
            .fetch(conn)
            .map_ok(ReportRow::from)
            .map_err(crate::Error::from)
            .boxed()
    }

    /// Fetch all rows at once
    pub async fn collect(&self, conn: &mut PgConnection) -> Result<Vec<ReportRow>> {
        self.rows(conn).try_collect().await
    }
}

impl std::fmt::Display for ReportRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{}: {}", key, self.plays),
            None => write!(f, "{}", self.plays),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_in_order() {
        let labels: Vec<&str> = Report::ALL.iter().map(|r| r.label()).collect();
        assert_eq!(
            labels,
            [
                "Total number of streams",
                "Streams by membership level",
                "Top 5 users with most listens",
                "Top 5 streaming days of the month",
            ]
        );
    }

    #[test]
    fn test_queries_count_plays() {
        for report in Report::ALL {
            let sql = report.sql();
            assert!(sql.contains("COUNT(*) AS plays"), "{:?}", report);
            assert!(sql.trim_start().starts_with("SELECT"), "{:?}", report);
        }
    }

    #[test]
    fn test_top_reports_limited_to_five() {
        assert!(Report::TopUsers.sql().contains("LIMIT 5"));
        assert!(Report::TopDaysOfMonth.sql().contains("LIMIT 5"));
        assert!(!Report::StreamsByLevel.sql().contains("LIMIT"));
    }

    #[test]
    fn test_row_display() {
        let total = ReportRow::from((None, 6820));
        let level = ReportRow::from((Some("paid".to_string()), 5591));
        assert_eq!(total.to_string(), "6820");
        assert_eq!(level.to_string(), "paid: 5591");
    }
}

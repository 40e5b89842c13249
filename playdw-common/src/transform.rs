//! Transform/Insert Engine
//!
//! Populates the fact and dimension tables from staging with five
//! INSERT-SELECT statements. All join, dedup and date decomposition work
//! happens in the warehouse. Every step reads staging tables only, so the
//! steps do not depend on each other; they still run in a fixed order and
//! commit one at a time.

use crate::db::Warehouse;
use crate::pipeline::{run_steps, Stage, StageSummary, Step};
use crate::{Error, Result};
use serde::Deserialize;

/// Names of the insert steps in execution order
pub const INSERT_STEP_NAMES: [&str; 5] = ["songplays", "users", "songs", "artists", "time"];

/// Epoch milliseconds (`staging_events.ts`) to a TIMESTAMP, truncated to seconds
fn epoch_ms_to_timestamp(column: &str) -> String {
    format!("TIMESTAMP 'epoch' + {}/1000 * INTERVAL '1 second'", column)
}

/// How events are matched to catalog songs for the fact table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinRule {
    /// Artist name, song title and duration must all match
    #[default]
    ArtistTitleDuration,
    /// Artist name and song title only
    ArtistTitle,
}

/// Which event row supplies a user's profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserDedup {
    /// First row per user in the engine's row order (not necessarily the latest)
    #[default]
    SourceOrder,
    /// Row with the greatest timestamp per user
    LatestEvent,
}

/// Transform configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransformOptions {
    pub join_rule: JoinRule,
    pub user_dedup: UserDedup,
}

fn songplays_sql(join_rule: JoinRule) -> String {
    let duration_match = match join_rule {
        JoinRule::ArtistTitleDuration => "\n   AND se.length = ss.duration",
        JoinRule::ArtistTitle => "",
    };

    format!(
        r#"
INSERT INTO songplays (sp_start_time, sp_user_id, sp_level, sp_song_id,
                       sp_artist_id, sp_session_id, sp_location, sp_user_agent)
SELECT {start_time} AS sp_start_time,
       se.user_id        AS sp_user_id,
       se.level          AS sp_level,
       ss.song_id        AS sp_song_id,
       ss.artist_id      AS sp_artist_id,
       se.session_id     AS sp_session_id,
       se.location       AS sp_location,
       se.user_agent     AS sp_user_agent
FROM staging_events se
JOIN staging_songs ss
    ON se.artist = ss.artist_name
   AND se.song = ss.title{duration_match}
WHERE se.artist IS NOT NULL
  AND se.song IS NOT NULL
  AND se.length IS NOT NULL
"#,
        start_time = epoch_ms_to_timestamp("se.ts"),
        duration_match = duration_match,
    )
}

fn users_sql(user_dedup: UserDedup) -> String {
    let ordering = match user_dedup {
        UserDedup::SourceOrder => "",
        UserDedup::LatestEvent => " ORDER BY se.ts DESC",
    };

    format!(
        r#"
INSERT INTO users (u_id, u_first_name, u_last_name, u_gender, u_level)
SELECT u_id, u_first_name, u_last_name, u_gender, u_level
FROM (
    SELECT se.user_id    AS u_id,
           se.first_name AS u_first_name,
           se.last_name  AS u_last_name,
           se.gender     AS u_gender,
           se.level      AS u_level,
           ROW_NUMBER() OVER (PARTITION BY se.user_id{ordering}) AS user_rank
    FROM staging_events se
) AS ranked
WHERE ranked.user_rank = 1
  AND ranked.u_id IS NOT NULL
"#,
        ordering = ordering,
    )
}

const SONGS_SQL: &str = r#"
INSERT INTO songs (s_id, s_title, s_artist_id, s_year, s_duration)
SELECT ss.song_id   AS s_id,
       ss.title     AS s_title,
       ss.artist_id AS s_artist_id,
       ss.year      AS s_year,
       ss.duration  AS s_duration
FROM staging_songs ss
"#;

const ARTISTS_SQL: &str = r#"
INSERT INTO artists (a_id, a_name, a_location, a_latitude, a_longitude)
SELECT DISTINCT ss.artist_id        AS a_id,
                ss.artist_name      AS a_name,
                ss.artist_location  AS a_location,
                ss.artist_latitude  AS a_latitude,
                ss.artist_longitude AS a_longitude
FROM staging_songs ss
"#;

fn time_sql() -> String {
    // Decode in a subquery: PostgreSQL has no lateral column aliases
    format!(
        r#"
INSERT INTO time (t_start_time, t_hour, t_day, t_week, t_month, t_year, t_weekday)
SELECT event_times.start_time,
       EXTRACT(hour FROM event_times.start_time),
       EXTRACT(day FROM event_times.start_time),
       EXTRACT(week FROM event_times.start_time),
       EXTRACT(month FROM event_times.start_time),
       EXTRACT(year FROM event_times.start_time),
       EXTRACT(dow FROM event_times.start_time)
FROM (
    SELECT DISTINCT {start_time} AS start_time
    FROM staging_events se
    WHERE se.ts IS NOT NULL
) AS event_times
"#,
        start_time = epoch_ms_to_timestamp("se.ts"),
    )
}

/// All five insert steps in execution order
pub fn insert_steps(options: &TransformOptions) -> Vec<Step> {
    vec![
        Step::new(INSERT_STEP_NAMES[0], songplays_sql(options.join_rule)),
        Step::new(INSERT_STEP_NAMES[1], users_sql(options.user_dedup)),
        Step::new(INSERT_STEP_NAMES[2], SONGS_SQL),
        Step::new(INSERT_STEP_NAMES[3], ARTISTS_SQL),
        Step::new(INSERT_STEP_NAMES[4], time_sql()),
    ]
}

/// Insert steps starting at `start_at` (all steps when `None`)
pub fn insert_steps_from(options: &TransformOptions, start_at: Option<&str>) -> Result<Vec<Step>> {
    let steps = insert_steps(options);
    let Some(name) = start_at else {
        return Ok(steps);
    };

    let position = steps.iter().position(|s| s.name == name).ok_or_else(|| {
        Error::Config(format!(
            "unknown insert step '{}' (expected one of: {})",
            name,
            INSERT_STEP_NAMES.join(", ")
        ))
    })?;

    Ok(steps.into_iter().skip(position).collect())
}

/// Populate the analytical tables
pub async fn run_inserts<W>(
    warehouse: &mut W,
    options: &TransformOptions,
    start_at: Option<&str>,
) -> Result<StageSummary>
where
    W: Warehouse + ?Sized,
{
    let steps = insert_steps_from(options, start_at)?;
    run_steps(warehouse, Stage::InsertAnalytical, &steps).await
}

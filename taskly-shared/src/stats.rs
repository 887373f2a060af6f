//! Aggregate dashboard statistics
//!
//! All six counts come from a single SQL statement, so they describe one
//! snapshot of the database. "Today" is the calendar day of the given
//! instant in the server's local time zone, as the half-open window
//! `[start of today, start of tomorrow)`.

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

/// Counts shown on the admin dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub pending_tasks: i64,
    pub new_users_today: i64,
    pub new_tasks_today: i64,
}

impl DashboardStats {
    /// Computes the statistics for the local calendar day containing `now`
    pub async fn compute(pool: &SqlitePool, now: DateTime<Utc>) -> Result<Self, sqlx::Error> {
        Self::compute_in(pool, now, &Local).await
    }

    /// Computes the statistics for the calendar day containing `now` in `tz`
    pub async fn compute_in<Tz: TimeZone>(
        pool: &SqlitePool,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<Self, sqlx::Error> {
        let (start, end) = day_window(now, tz);

        tracing::debug!(%start, %end, "Computing dashboard statistics");

        let stats = sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM tasks) AS total_tasks,
                (SELECT COUNT(*) FROM tasks WHERE status = 'completed') AS completed_tasks,
                (SELECT COUNT(*) FROM tasks WHERE status = 'pending') AS pending_tasks,
                (SELECT COUNT(*) FROM users WHERE created_at >= ? AND created_at < ?) AS new_users_today,
                (SELECT COUNT(*) FROM tasks WHERE created_at >= ? AND created_at < ?) AS new_tasks_today
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await?;

        Ok(stats)
    }
}

/// The `[start, end)` window of the calendar day containing `now` in `tz`
pub fn day_window<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.with_timezone(tz).date_naive();
    let tomorrow = today.succ_opt().unwrap_or(NaiveDate::MAX);

    (start_of_day(today, tz), start_of_day(tomorrow, tz))
}

/// First instant of `date` in `tz`
///
/// When midnight falls in a DST gap, the wall clock is read as if it were in
/// the zone's offset at that UTC instant.
fn start_of_day<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);

    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(start) => start.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => {
            let offset = tz.offset_from_utc_datetime(&midnight).fix();
            Utc.from_utc_datetime(&(midnight - offset))
        }
    }
}

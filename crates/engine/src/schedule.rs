use crate::updater::DailyUpdater;
use chrono::{DateTime, Days, NaiveTime, Utc};

/// The first instant strictly after `now` whose UTC time of day is `at`.
pub fn next_run_after(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today
            .checked_add_days(Days::new(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Runs the daily update at `at` (UTC) every day. Never returns.
///
/// A failed run is logged and retried at the next scheduled time; re-running
/// the same date later is safe.
pub async fn run_daily(updater: &DailyUpdater, at: NaiveTime) {
    loop {
        let now = Utc::now();
        let next = next_run_after(now, at);
        let wait = (next - now).to_std().unwrap_or_default();
        tracing::info!(next_run = %next, "Waiting for next daily update");

        tokio::time::sleep(wait).await;

        match updater.run(next.date_naive()).await {
            Ok(summary) => tracing::info!(
                run_id = %summary.run_id,
                counted = summary.counted.len(),
                skipped = summary.skipped.len(),
                "Scheduled run complete"
            ),
            Err(e) => tracing::error!(error = %e, "Scheduled run failed"),
        }
    }
}

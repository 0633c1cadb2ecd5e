use chrono::{DateTime, Days, NaiveTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use janitor_types::models::CommunityId;

use crate::error::PurgeError;
use crate::executor::{PurgeExecutor, PurgeReport};
use crate::notify;

/// Fires a purge of every enabled community at fixed UTC times of day.
pub struct RetentionScheduler {
    executor: PurgeExecutor,
    times: Vec<NaiveTime>,
}

impl RetentionScheduler {
    pub fn new(executor: PurgeExecutor, mut times: Vec<NaiveTime>) -> Self {
        times.sort();
        times.dedup();
        Self { executor, times }
    }

    pub fn times(&self) -> &[NaiveTime] {
        &self.times
    }

    /// Wait for each configured time and run. Returns when `shutdown` fires;
    /// a run already in progress is finished first.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut last_fired: Option<DateTime<Utc>> = None;

        loop {
            let now = Utc::now();
            let Some(at) = next_slot(last_fired, now, &self.times) else {
                warn!("No clean-up times configured, retention scheduler idle");
                return;
            };
            info!(next_run = %at, "Retention run scheduled");

            let wait = (at - now).to_std().unwrap_or_default();
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Retention scheduler stopping");
                    return;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            last_fired = Some(at);
            self.run_once().await;
        }
    }

    /// One firing: purge every enabled community, isolating failures.
    pub async fn run_once(&self) -> Vec<(CommunityId, Result<PurgeReport, PurgeError>)> {
        info!("Daily clean-up job");
        let communities = match self.executor.store().communities() {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to read policies for scheduled run: {}", e);
                return Vec::new();
            }
        };

        let platform = self.executor.platform().clone();
        let mut outcomes = Vec::new();
        for (community, record) in communities {
            if !record.is_enabled() {
                continue;
            }

            if let Some(hours) = record.age_limit_hours {
                notify::post_log(
                    platform.as_ref(),
                    community,
                    &record,
                    &format!("Cleaning up messages that aren't saved and are over {} hours old.", hours),
                )
                .await;
            }

            let outcome = self.executor.purge(community).await;
            match &outcome {
                Ok(report) => {
                    notify::post_log(
                        platform.as_ref(),
                        community,
                        &record,
                        &format!("Deleted {} messages", report.deleted),
                    )
                    .await;
                }
                Err(e) => {
                    error!(%community, "Scheduled clean-up failed: {}", e);
                    notify::post_log(
                        platform.as_ref(),
                        community,
                        &record,
                        &format!("Scheduled clean-up failed: {}", e),
                    )
                    .await;
                }
            }
            outcomes.push((community, outcome));
        }
        outcomes
    }
}

/// Earliest configured time strictly after `after`, today or tomorrow (UTC).
pub fn next_firing(after: DateTime<Utc>, times: &[NaiveTime]) -> Option<DateTime<Utc>> {
    let today = after.date_naive();
    let tomorrow = today.checked_add_days(Days::new(1))?;

    [today, tomorrow]
        .into_iter()
        .flat_map(|day| times.iter().map(move |t| day.and_time(*t).and_utc()))
        .filter(|at| *at > after)
        .min()
}

/// Slot to fire next given the last one fired. A slot that passed while
/// the previous run was still going is due immediately; if several passed,
/// only the most recent fires.
pub fn next_slot(
    last_fired: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    times: &[NaiveTime],
) -> Option<DateTime<Utc>> {
    let Some(last) = last_fired else {
        return next_firing(now, times);
    };
    let due = next_firing(last, times)?;
    if due > now {
        return Some(due);
    }
    Some(latest_passed(now, times).map_or(due, |latest| latest.max(due)))
}

/// Latest configured time at or before `now`, today or yesterday (UTC).
fn latest_passed(now: DateTime<Utc>, times: &[NaiveTime]) -> Option<DateTime<Utc>> {
    let today = now.date_naive();
    let yesterday = today.checked_sub_days(Days::new(1))?;

    [yesterday, today]
        .into_iter()
        .flat_map(|day| times.iter().map(move |t| day.and_time(*t).and_utc()))
        .filter(|at| *at <= now)
        .max()
}

/// Parse `"09:00,21:30"` style lists.
pub fn parse_times(raw: &str) -> Result<Vec<NaiveTime>, chrono::ParseError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| NaiveTime::parse_from_str(s, "%H:%M"))
        .collect()
}

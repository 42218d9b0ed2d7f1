use anyhow::anyhow;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::{str::FromStr, sync::Arc, time::Duration};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::reminder::ReminderJob;
use crate::utils::get_epoch_ts;

/// Cron expression evaluated in a fixed timezone
#[derive(Debug, Clone)]
pub struct CronSchedule {
    schedule: Schedule,
    timezone: Tz,
}

impl CronSchedule {
    /// `expr` uses the `cron` crate syntax: sec min hour day month weekday [year]
    pub fn parse(expr: &str, timezone: &str) -> anyhow::Result<Self> {
        let schedule = Schedule::from_str(expr)
            .map_err(|err| anyhow!("invalid cron expression `{expr}`: {err}"))?;
        let timezone = timezone
            .parse::<Tz>()
            .map_err(|err| anyhow!("invalid timezone `{timezone}`: {err}"))?;
        Ok(Self { schedule, timezone })
    }

    /// First fire time strictly after `now`
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let local = now.with_timezone(&self.timezone);
        self.schedule
            .after(&local)
            .next()
            .map(|next| next.with_timezone(&Utc))
    }
}

/// Run a reminder job once, logging the outcome.
/// Returns false when the run failed.
pub async fn run_job(job: &dyn ReminderJob) -> bool {
    match job.run(get_epoch_ts()).await {
        Ok(report) => {
            tracing::info!("{} finished: {}", job.name(), report);
            true
        }
        Err(err) => {
            tracing::error!("{} failed: {:?}", job.name(), err);
            false
        }
    }
}

/// Fire `job` on `schedule` until shutdown.
///
/// The run is awaited inline and the next fire time is computed only after it
/// returns, so two runs of the same job never overlap. Fire times that pass
/// while a run is in progress are skipped.
pub async fn cron_job(
    job: Arc<dyn ReminderJob>,
    schedule: CronSchedule,
    shutdown: CancellationToken,
) {
    tracing::debug!("initializing {} scheduler job", job.name());
    loop {
        let now = Utc::now();
        let Some(next) = schedule.next_after(now) else {
            tracing::warn!("{} has no upcoming fire time, stopping", job.name());
            return;
        };
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        tracing::debug!("{} scheduled at {}", job.name(), next);
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = sleep(wait) => {}
        }
        let started = Utc::now();
        run_job(job.as_ref()).await;
        if let Some(missed) = schedule.next_after(next).filter(|missed| *missed < Utc::now()) {
            tracing::warn!(
                "{} ran from {} past its next fire time {}, skipping missed runs",
                job.name(),
                started,
                missed
            );
        }
    }
    tracing::debug!("{} scheduler job stopped", job.name());
}

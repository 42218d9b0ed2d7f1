use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use self::{
    notification::{DispatchWatcher, PushGateway},
    reminder::{HydrationReminder, InactiveReminder},
    scheduler::cron_job,
};
use crate::{
    config::AppConfig,
    store::{NotificationStore, UserStore},
};

pub mod notification;
pub mod reminder;
pub mod scheduler;

/// Spawn the dispatch watcher and both reminder schedules.
/// All of them stop once `shutdown` is cancelled.
pub fn spawn_all_jobs<S>(
    config: &AppConfig,
    store: Arc<S>,
    gateway: Arc<dyn PushGateway>,
    shutdown: CancellationToken,
) -> Vec<JoinHandle<()>>
where
    S: NotificationStore + UserStore + 'static,
{
    let mut handles = Vec::with_capacity(3);

    {
        // spawn watcher forwarding pending notifications to the push gateway
        let watcher = DispatchWatcher::new(store.clone(), gateway, config.dispatch.clone());
        handles.push(tokio::spawn(watcher.run(shutdown.clone())));
    }

    {
        // spawn daily reminder for users inactive for a few days
        let job = Arc::new(InactiveReminder::new(store.clone(), store.clone()));
        let schedule = config.inactive_reminder_schedule.clone();
        handles.push(tokio::spawn(cron_job(job, schedule, shutdown.clone())));
    }

    {
        // spawn hydration reminder fired a few times per day
        let job = Arc::new(HydrationReminder::new(store.clone(), store));
        let schedule = config.hydration_reminder_schedule.clone();
        handles.push(tokio::spawn(cron_job(job, schedule, shutdown)));
    }

    handles
}

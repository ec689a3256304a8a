//! Clock-driven task queue for the continuous mode.
//!
//! A [`Schedule`] is a list of `(time of day, task)` entries. A single driver polls the
//! clock and dispatches, in fire-time order, every task whose next occurrence falls in
//! `(last_tick, now]`. Tasks run one after another on the driver; a long task delays the
//! next poll but never overlaps another task.

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDateTime, NaiveTime};
use harvest_core::ScheduleConfig;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduledTask {
    /// One ingestion cycle on the source channel.
    Scrape,
    /// Send today's records one by one.
    SendIndividual,
    /// Send today's digest.
    Digest,
}

impl std::fmt::Display for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ScheduledTask::Scrape => "scrape",
            ScheduledTask::SendIndividual => "send",
            ScheduledTask::Digest => "digest",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schedule {
    entries: Vec<(NaiveTime, ScheduledTask)>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, at: NaiveTime, task: ScheduledTask) -> &mut Self {
        self.entries.push((at, task));
        self
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        let mut schedule = Self::new();
        for at in &config.scrape_times {
            schedule.register(*at, ScheduledTask::Scrape);
        }
        for at in &config.send_times {
            schedule.register(*at, ScheduledTask::SendIndividual);
        }
        schedule.register(config.digest_time, ScheduledTask::Digest);
        schedule
    }

    pub fn entries(&self) -> &[(NaiveTime, ScheduledTask)] {
        &self.entries
    }

    /// Tasks whose fire time falls in `(last, now]`, each entry at most once, ordered by
    /// fire time (registration order breaks ties).
    pub fn due_between(&self, last: NaiveDateTime, now: NaiveDateTime) -> Vec<ScheduledTask> {
        if now <= last {
            return Vec::new();
        }

        let mut due: Vec<(NaiveDateTime, usize, ScheduledTask)> = Vec::new();
        for (index, (at, task)) in self.entries.iter().enumerate() {
            if let Some(fire) = latest_occurrence(*at, last, now) {
                due.push((fire, index, *task));
            }
        }
        due.sort_by_key(|(fire, index, _)| (*fire, *index));
        due.into_iter().map(|(_, _, task)| task).collect()
    }
}

/// Latest `date + at` inside `(last, now]`, if any.
fn latest_occurrence(at: NaiveTime, last: NaiveDateTime, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let today = now.date().and_time(at);
    if today <= now {
        return (today > last).then_some(today);
    }
    let yesterday = now.date().checked_sub_days(Days::new(1))?.and_time(at);
    (yesterday > last).then_some(yesterday)
}

/// Source of local wall-clock time for the driver.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Executes a scheduled task. Failures are the runner's to log; the driver keeps going.
#[async_trait]
pub trait TaskRunner: Send + Sync {
    async fn run_task(&self, task: ScheduledTask);
}

/// Runs the schedule against the system clock until `shutdown` resolves.
pub async fn run_schedule<S>(schedule: &Schedule, runner: &dyn TaskRunner, poll: Duration, shutdown: S)
where
    S: Future<Output = ()>,
{
    run_schedule_with_clock(schedule, runner, poll, &SystemClock, shutdown).await
}

pub async fn run_schedule_with_clock<S>(
    schedule: &Schedule,
    runner: &dyn TaskRunner,
    poll: Duration,
    clock: &dyn Clock,
    shutdown: S,
) where
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut last = clock.now();
    info!(entries = schedule.entries().len(), poll_secs = poll.as_secs_f64(), "Scheduler started");

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Scheduler stopping");
                break;
            }
            _ = tokio::time::sleep(poll) => {}
        }

        let now = clock.now();
        let due = schedule.due_between(last, now);
        if !due.is_empty() {
            debug!(count = due.len(), "Tasks due");
        }
        for task in due {
            info!(task = %task, "step: running scheduled task");
            runner.run_task(task).await;
        }
        last = now;
    }
}

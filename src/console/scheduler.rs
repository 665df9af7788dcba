//! Periodic jobs
//!
//! Each [`ScheduledJob`] runs on its own tokio interval and sends its
//! message into the console's channel. The first tick of every interval is
//! skipped, so a job first fires one full interval after start.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::message::Msg;

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// A message sent on a fixed interval
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    pub name: &'static str,
    pub interval: Duration,
    pub message: fn() -> Msg,
}

/// Incident polling plus the heartbeat that keeps ages current
pub fn default_jobs(poll_interval: Duration) -> Vec<ScheduledJob> {
    vec![
        ScheduledJob {
            name: "poll-incidents",
            interval: poll_interval,
            message: || Msg::PollIncidents,
        },
        ScheduledJob {
            name: "heartbeat",
            interval: HEARTBEAT_INTERVAL,
            message: || Msg::Tick(Utc::now()),
        },
    ]
}

/// Handles of running jobs; dropping the scheduler stops them
pub struct Scheduler {
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn start(jobs: Vec<ScheduledJob>, tx: mpsc::UnboundedSender<Msg>) -> Self {
        let handles = jobs
            .into_iter()
            .map(|job| {
                let tx = tx.clone();
                tracing::debug!("Scheduling {} every {:?}", job.name, job.interval);
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(job.interval);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    ticker.tick().await;
                    loop {
                        ticker.tick().await;
                        if tx.send((job.message)()).is_err() {
                            tracing::debug!("Stopping {}, console closed", job.name);
                            break;
                        }
                    }
                })
            })
            .collect();
        Self { handles }
    }

    pub fn stop(&mut self) {
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

//! Job status and the bounded polling schedule that observes it.

use std::time::Duration;

use bevy::log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::collaborators::JobHandle;
use super::error::RemoteError;
use crate::constants::{DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL_SECS};

/// Status of a generation job as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed { result_url: String },
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed { .. } | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs_f32(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
        }
    }
}

/// What happened after a status query finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Not terminal yet; query again after the interval
    Continue,
    Completed(String),
    Failed,
    /// Attempts ran out before the job reached a terminal status
    Exhausted,
}

/// Schedule of status queries for one job.
///
/// The poller never performs I/O itself. The host asks [`JobPoller::is_due`]
/// each frame, runs the query when it is, and reports back through
/// [`JobPoller::finish_query`]. Only one query is ever in flight.
#[derive(Debug, Clone)]
pub struct JobPoller {
    job: JobHandle,
    policy: PollPolicy,
    attempts: u32,
    next_due: f64,
    in_flight: bool,
    finished: bool,
}

impl JobPoller {
    /// The first query is due immediately.
    pub fn new(job: JobHandle, policy: PollPolicy, now: f64) -> Self {
        Self {
            job,
            policy,
            attempts: 0,
            next_due: now,
            in_flight: false,
            finished: false,
        }
    }

    pub fn job(&self) -> &JobHandle {
        &self.job
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_due(&self, now: f64) -> bool {
        !self.finished
            && !self.in_flight
            && self.attempts < self.policy.max_attempts
            && now >= self.next_due
    }

    /// Record that a query was started.
    pub fn begin_query(&mut self) {
        self.attempts += 1;
        self.in_flight = true;
    }

    /// Record the result of the query started by [`JobPoller::begin_query`].
    ///
    /// Transport errors count as an attempt and polling carries on.
    pub fn finish_query(&mut self, now: f64, result: Result<JobStatus, RemoteError>) -> PollOutcome {
        self.in_flight = false;
        self.next_due = now + self.policy.interval.as_secs_f64();

        let outcome = match result {
            Ok(JobStatus::Completed { result_url }) => PollOutcome::Completed(result_url),
            Ok(JobStatus::Failed) => PollOutcome::Failed,
            Ok(status) => {
                debug!("Job {} is {:?} (attempt {})", self.job, status, self.attempts);
                PollOutcome::Continue
            }
            Err(e) => {
                warn!("Status query for job {} failed: {}", self.job, e);
                PollOutcome::Continue
            }
        };

        let outcome = if outcome == PollOutcome::Continue && self.attempts >= self.policy.max_attempts {
            PollOutcome::Exhausted
        } else {
            outcome
        };
        if outcome != PollOutcome::Continue {
            self.finished = true;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(3),
            max_attempts,
        }
    }

    fn poller(max_attempts: u32) -> JobPoller {
        JobPoller::new(JobHandle("img-1".into()), policy(max_attempts), 10.0)
    }

    #[test]
    fn test_first_query_is_immediate() {
        let poller = poller(5);
        assert!(poller.is_due(10.0));
        assert!(!poller.is_due(9.0));
    }

    #[test]
    fn test_waits_interval_between_queries() {
        let mut poller = poller(5);
        poller.begin_query();
        assert!(!poller.is_due(11.0), "no second query while one is in flight");
        assert_eq!(poller.finish_query(11.0, Ok(JobStatus::Pending)), PollOutcome::Continue);
        assert!(!poller.is_due(13.9));
        assert!(poller.is_due(14.0));
    }

    #[test]
    fn test_completed_stops_polling() {
        let mut poller = poller(5);
        poller.begin_query();
        let outcome = poller.finish_query(
            10.0,
            Ok(JobStatus::Completed {
                result_url: "https://cdn/result.png".into(),
            }),
        );
        assert_eq!(outcome, PollOutcome::Completed("https://cdn/result.png".into()));
        assert!(poller.is_finished());
        assert!(!poller.is_due(1000.0));
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut poller = poller(5);
        poller.begin_query();
        assert_eq!(poller.finish_query(10.0, Ok(JobStatus::Failed)), PollOutcome::Failed);
        assert!(poller.is_finished());
    }

    #[test]
    fn test_transport_errors_count_as_attempts() {
        let mut poller = poller(2);
        poller.begin_query();
        let err = RemoteError::Transport("connection reset".into());
        assert_eq!(poller.finish_query(10.0, Err(err.clone())), PollOutcome::Continue);
        poller.begin_query();
        assert_eq!(poller.finish_query(13.0, Err(err)), PollOutcome::Exhausted);
        assert_eq!(poller.attempts(), 2);
        assert!(!poller.is_due(100.0));
    }

    #[test]
    fn test_terminal_status_wins_on_last_attempt() {
        let mut poller = poller(1);
        poller.begin_query();
        assert_eq!(poller.finish_query(10.0, Ok(JobStatus::Failed)), PollOutcome::Failed);
    }

    #[test]
    fn test_default_policy_is_three_seconds_two_hundred_attempts() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(3));
        assert_eq!(policy.max_attempts, 200);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Completed { result_url: String::new() }.is_terminal());
    }
}

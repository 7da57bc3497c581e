//! Retry policy for classified outcomes
//!
//! Two sub-policies are applied in order to every attempt:
//! - throttle: `RateLimited{PerSecond}` waits through a fixed schedule
//! - transient: `RequestError` outside [400, 500) retries a bounded number of
//!   times, optionally also covering transport failures
//!
//! Anything neither sub-policy claims is terminal. [`decide`] is a pure
//! function of the policy, the outcome and the attempts made so far.

use crate::http::error::{ClassifiedOutcome, RateLimitScope};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Waits between successive per-second throttle retries
pub const THROTTLE_SCHEDULE: [Duration; 4] = [
    Duration::from_millis(500),
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Wait before each throttle retry; its length caps throttle retries
    pub throttle_schedule: Vec<Duration>,
    /// Maximum retries for non-client request errors
    pub max_transient_retries: u32,
    /// Wait before each transient retry
    pub transient_delay: Duration,
    /// Whether transport failures count as transient
    pub retry_transport_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            throttle_schedule: THROTTLE_SCHEDULE.to_vec(),
            max_transient_retries: 3,
            transient_delay: Duration::ZERO,
            retry_transport_errors: false,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            throttle_schedule: Vec::new(),
            max_transient_retries: 0,
            transient_delay: Duration::ZERO,
            retry_transport_errors: false,
        }
    }

    /// Set the throttle backoff schedule
    pub fn with_throttle_schedule(mut self, schedule: Vec<Duration>) -> Self {
        self.throttle_schedule = schedule;
        self
    }

    /// Set the transient retry bound
    pub fn with_max_transient_retries(mut self, retries: u32) -> Self {
        self.max_transient_retries = retries;
        self
    }

    /// Set the wait before transient retries
    pub fn with_transient_delay(mut self, delay: Duration) -> Self {
        self.transient_delay = delay;
        self
    }

    /// Treat transport failures as transient
    pub fn with_retry_transport_errors(mut self, enabled: bool) -> Self {
        self.retry_transport_errors = enabled;
        self
    }

    /// Upper bound on the number of sends for one call
    pub fn max_attempts(&self) -> u32 {
        1 + self.throttle_schedule.len() as u32 + self.max_transient_retries
    }
}

/// Which sub-policy scheduled a retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    Throttled,
    Transient,
}

/// Decision on whether to retry a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the request after the specified delay
    Retry { delay: Duration, reason: RetryReason },
    /// Do not retry the request
    NoRetry,
}

impl RetryDecision {
    pub fn should_retry(&self) -> bool {
        matches!(self, RetryDecision::Retry { .. })
    }

    /// Wait before the next attempt, if one is scheduled
    pub fn wait(&self) -> Option<Duration> {
        match self {
            RetryDecision::Retry { delay, .. } => Some(*delay),
            RetryDecision::NoRetry => None,
        }
    }
}

/// Retries already spent per sub-policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attempts {
    pub throttled: u32,
    pub transient: u32,
}

impl Attempts {
    /// Total sends so far, counting the first
    pub fn total(&self) -> u32 {
        1 + self.throttled + self.transient
    }
}

/// Statuses never retried
pub fn is_client_error(status: u16) -> bool {
    (400..500).contains(&status)
}

/// Decide what to do after `outcome`, given the retries already spent
pub fn decide(policy: &RetryPolicy, outcome: &ClassifiedOutcome, attempts: Attempts) -> RetryDecision {
    match outcome {
        ClassifiedOutcome::RateLimited {
            scope: RateLimitScope::PerSecond,
            ..
        } => match policy.throttle_schedule.get(attempts.throttled as usize) {
            Some(delay) => RetryDecision::Retry {
                delay: *delay,
                reason: RetryReason::Throttled,
            },
            None => RetryDecision::NoRetry,
        },
        ClassifiedOutcome::RequestError { status, .. } if !is_client_error(*status) => {
            transient(policy, attempts)
        }
        ClassifiedOutcome::TransportError { .. } if policy.retry_transport_errors => {
            transient(policy, attempts)
        }
        _ => RetryDecision::NoRetry,
    }
}

fn transient(policy: &RetryPolicy, attempts: Attempts) -> RetryDecision {
    if attempts.transient < policy.max_transient_retries {
        RetryDecision::Retry {
            delay: policy.transient_delay,
            reason: RetryReason::Transient,
        }
    } else {
        RetryDecision::NoRetry
    }
}

/// Tracks retries for a single call
#[derive(Debug)]
pub struct RetryHandler {
    policy: RetryPolicy,
    attempts: Attempts,
}

impl RetryHandler {
    /// Create a new retry handler with the given policy
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempts: Attempts::default(),
        }
    }

    /// Decide on `outcome` and record the retry if one is scheduled
    pub fn next(&mut self, outcome: &ClassifiedOutcome) -> RetryDecision {
        let decision = decide(&self.policy, outcome, self.attempts);
        if let RetryDecision::Retry { reason, .. } = decision {
            match reason {
                RetryReason::Throttled => self.attempts.throttled += 1,
                RetryReason::Transient => self.attempts.transient += 1,
            }
        }
        decision
    }

    /// Retries recorded so far
    pub fn attempts(&self) -> Attempts {
        self.attempts
    }

    /// Reset the handler for a new call
    pub fn reset(&mut self) {
        self.attempts = Attempts::default();
    }
}

//! Coordinator registration with retry
//!
//! At startup the actuator announces its name to the coordinator. Each
//! attempt is one request; a timeout burns one attempt and is followed by a
//! fixed backoff, any successful response registers immediately and cancels
//! the remaining attempts.
//!
//! Registration failure is non-fatal by design: the controller proceeds into
//! its main loop either way and the outcome is surfaced as a warning. The
//! retry budget is an explicit `RetryPolicy` value handed in by the caller,
//! not a process-wide counter.

use std::sync::Arc;
use std::time::Duration;

use sdk::transport::{Transport, TransportRequest};

use crate::config::CoordinatorConfig;

/// Retry budget for the registration phase.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts before giving up
    pub max_attempts: u32,

    /// Wait between failed attempts
    pub backoff: Duration,
}

/// Terminal registration outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    Registered,
    Failed,
}

/// Announces this actuator to the coordinator.
pub struct RegistrationManager {
    transport: Arc<dyn Transport>,
    coordinator: CoordinatorConfig,
}

impl RegistrationManager {
    pub fn new(transport: Arc<dyn Transport>, coordinator: CoordinatorConfig) -> Self {
        Self {
            transport,
            coordinator,
        }
    }

    /// Register `name` with the coordinator, retrying per `policy`.
    ///
    /// Runs to a terminal state: either some attempt got a response
    /// (`Registered`) or the attempt budget ran out (`Failed`).
    pub async fn register(&self, name: &str, policy: RetryPolicy) -> RegistrationStatus {
        let mut attempts_remaining = policy.max_attempts;

        while attempts_remaining > 0 {
            let req = TransportRequest::post(
                self.coordinator.base_url.clone(),
                self.coordinator.register_path.clone(),
                name.as_bytes().to_vec(),
                self.coordinator.request_timeout(),
            );

            match self.transport.request(req).await {
                Ok(_) => {
                    tracing::info!(name, "Registration successful");
                    return RegistrationStatus::Registered;
                }
                Err(err) => {
                    attempts_remaining -= 1;
                    tracing::warn!(
                        name,
                        %err,
                        attempts_remaining,
                        "Registration attempt failed"
                    );
                    if attempts_remaining > 0 {
                        tokio::time::sleep(policy.backoff).await;
                    }
                }
            }
        }

        tracing::warn!(name, "Registration failed after maximum attempts");
        RegistrationStatus::Failed
    }
}

//! Sensor endpoint discovery
//!
//! After registration settles, the actuator asks the coordinator for the
//! network address of each of the four sensor roles. One query per role, no
//! retry: a role whose query times out or whose reply does not parse simply
//! stays unresolved, and the poller works around the gap with stale data.
//!
//! The resulting `EndpointTable` is write-once-per-role and read-only to
//! everything downstream of discovery.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use sdk::errors::ActuatorError;
use sdk::transport::{Transport, TransportRequest};
use sdk::types::SensorRole;

use crate::config::CoordinatorConfig;

/// Role -> resolved endpoint address mapping.
///
/// Entries are written at most once; a role that discovery never resolved
/// stays `None` for the life of the table.
#[derive(Debug, Clone, Default)]
pub struct EndpointTable {
    entries: [Option<String>; 4],
}

impl EndpointTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolved address for a role, if discovery found one.
    pub fn get(&self, role: SensorRole) -> Option<&str> {
        self.entries[role.index()].as_deref()
    }

    /// Record a resolved address. First write wins.
    pub fn set_once(&mut self, role: SensorRole, address: String) {
        let slot = &mut self.entries[role.index()];
        if slot.is_none() {
            *slot = Some(address);
        }
    }

    /// Resolved address for a role, as a typed error for callers that
    /// cannot work degraded.
    pub fn require(&self, role: SensorRole) -> Result<&str, ActuatorError> {
        self.get(role)
            .ok_or(ActuatorError::UnresolvedEndpoint(role))
    }

    pub fn is_resolved(&self, role: SensorRole) -> bool {
        self.entries[role.index()].is_some()
    }

    pub fn resolved_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Roles with no resolved endpoint.
    pub fn unresolved_roles(&self) -> Vec<SensorRole> {
        SensorRole::ALL
            .into_iter()
            .filter(|role| !self.is_resolved(*role))
            .collect()
    }
}

#[derive(Serialize)]
struct DiscoveryQuery<'a> {
    name: &'a str,
}

/// Resolves sensor endpoints by role name through the coordinator.
pub struct DiscoveryManager {
    transport: Arc<dyn Transport>,
    coordinator: CoordinatorConfig,
}

impl DiscoveryManager {
    pub fn new(transport: Arc<dyn Transport>, coordinator: CoordinatorConfig) -> Self {
        Self {
            transport,
            coordinator,
        }
    }

    /// Run one discovery pass over all four roles.
    ///
    /// Unresolved roles are logged and left unset; the caller decides what
    /// degraded polling looks like.
    pub async fn discover_all(&self) -> EndpointTable {
        let mut table = EndpointTable::new();

        for role in SensorRole::ALL {
            match self.discover(role).await {
                Some(address) => {
                    tracing::info!(%role, %address, "Sensor endpoint resolved");
                    table.set_once(role, address);
                }
                None => {
                    tracing::warn!(%role, "Sensor endpoint unresolved");
                }
            }
        }

        if table.resolved_count() < SensorRole::ALL.len() {
            tracing::warn!(
                resolved = table.resolved_count(),
                "Discovery finished with unresolved roles; polling will carry stale data"
            );
        }

        table
    }

    /// Single discovery query for one role. Reply shape:
    /// `{"<role>": "<address>"}`.
    async fn discover(&self, role: SensorRole) -> Option<String> {
        let query = DiscoveryQuery { name: role.name() };
        let payload = match serde_json::to_vec(&query) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(%role, "Failed to encode discovery query: {}", e);
                return None;
            }
        };

        let req = TransportRequest::post(
            self.coordinator.base_url.clone(),
            self.coordinator.discover_path.clone(),
            payload,
            self.coordinator.request_timeout(),
        );

        let body = match self.transport.request(req).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(%role, %err, "Discovery query failed");
                return None;
            }
        };

        match serde_json::from_slice::<Value>(&body) {
            Ok(value) => value
                .get(role.name())
                .and_then(Value::as_str)
                .map(str::to_string),
            Err(e) => {
                tracing::warn!(%role, "Discovery reply did not parse: {}", e);
                None
            }
        }
    }
}

//! Per-cycle sensor polling
//!
//! Each cycle the poller issues one read per resolved sensor role and folds
//! the replies into a `ReadingSnapshot`. The poller carries the previous
//! snapshot across cycles: a role that is unresolved or does not answer
//! keeps its last-known value rather than blocking or failing the cycle.
//! Partial snapshots are flagged through tracing, never rejected.
//!
//! Reply shapes are the sensor wire contract: the NPK sensor answers
//! `{"n":..,"p":..,"k":..}`, every other role answers a single scalar named
//! after the role.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use sdk::transport::{Transport, TransportRequest};
use sdk::types::{ReadingSnapshot, SensorRole};

use crate::discovery::EndpointTable;

#[derive(Deserialize)]
struct NpkReading {
    n: i16,
    p: i16,
    k: i16,
}

#[derive(Deserialize)]
struct PhReading {
    ph: i16,
}

#[derive(Deserialize)]
struct MoistureReading {
    moisture: i16,
}

#[derive(Deserialize)]
struct TemperatureReading {
    temperature: i16,
}

/// Polls the discovered sensors and aggregates one snapshot per cycle.
pub struct SensorPoller {
    transport: Arc<dyn Transport>,
    request_timeout: Duration,
    last: ReadingSnapshot,
}

impl SensorPoller {
    pub fn new(transport: Arc<dyn Transport>, request_timeout: Duration) -> Self {
        Self {
            transport,
            request_timeout,
            last: ReadingSnapshot::default(),
        }
    }

    /// Read every resolved role once and return the aggregated snapshot.
    ///
    /// Fields for roles that are unresolved or failed to answer keep their
    /// last-known value; the count of stale roles is reported via tracing.
    pub async fn poll(&mut self, endpoints: &EndpointTable) -> ReadingSnapshot {
        let mut stale = 0usize;

        for role in SensorRole::ALL {
            let Some(address) = endpoints.get(role) else {
                tracing::debug!(%role, "Skipping unresolved sensor");
                stale += 1;
                continue;
            };

            let req = TransportRequest::get(
                address.to_string(),
                role.resource_path().to_string(),
                self.request_timeout,
            );

            match self.transport.request(req).await {
                Ok(body) => {
                    if self.apply_reading(role, &body) {
                        tracing::debug!(%role, "Sensor read ok");
                    } else {
                        tracing::warn!(%role, "Sensor reply did not parse; keeping stale value");
                        stale += 1;
                    }
                }
                Err(err) => {
                    tracing::warn!(%role, %err, "Sensor read failed; keeping stale value");
                    stale += 1;
                }
            }
        }

        if stale > 0 {
            tracing::warn!(stale, "Snapshot is partial; some readings are stale");
        }

        self.last
    }

    /// Parse one reply payload into the snapshot. Returns false when the
    /// payload does not match the role's wire shape.
    fn apply_reading(&mut self, role: SensorRole, body: &[u8]) -> bool {
        match role {
            SensorRole::Npk => match serde_json::from_slice::<NpkReading>(body) {
                Ok(r) => {
                    self.last.nitrogen = r.n;
                    self.last.phosphorus = r.p;
                    self.last.potassium = r.k;
                    true
                }
                Err(_) => false,
            },
            SensorRole::Ph => match serde_json::from_slice::<PhReading>(body) {
                Ok(r) => {
                    self.last.ph = r.ph;
                    true
                }
                Err(_) => false,
            },
            SensorRole::Moisture => match serde_json::from_slice::<MoistureReading>(body) {
                Ok(r) => {
                    self.last.moisture = r.moisture;
                    true
                }
                Err(_) => false,
            },
            SensorRole::Temperature => match serde_json::from_slice::<TemperatureReading>(body) {
                Ok(r) => {
                    self.last.temperature = r.temperature;
                    true
                }
                Err(_) => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::ScriptedTransport;
    use sdk::transport::TransportError;

    fn full_table() -> EndpointTable {
        let mut table = EndpointTable::new();
        for role in SensorRole::ALL {
            table.set_once(role, format!("http://{}", role));
        }
        table
    }

    #[tokio::test]
    async fn test_poll_aggregates_all_roles() {
        // Poll order is the fixed role order: npk, temperature, ph, moisture.
        let transport = Arc::new(ScriptedTransport::new(vec![
            Ok(br#"{"n":40,"p":50,"k":60}"#.to_vec()),
            Ok(br#"{"temperature":25}"#.to_vec()),
            Ok(br#"{"ph":6}"#.to_vec()),
            Ok(br#"{"moisture":70}"#.to_vec()),
        ]));
        let mut poller = SensorPoller::new(transport.clone(), Duration::from_secs(1));

        let snapshot = poller.poll(&full_table()).await;

        assert_eq!(
            snapshot,
            ReadingSnapshot {
                nitrogen: 40,
                phosphorus: 50,
                potassium: 60,
                ph: 6,
                moisture: 70,
                temperature: 25,
            }
        );

        // Reads hit the role resource on the resolved endpoint
        let requests = transport.requests();
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0].endpoint, "http://npk");
        assert_eq!(requests[0].path, "/npk");
    }

    #[tokio::test]
    async fn test_unresponsive_role_keeps_last_known_value() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            // First cycle: everything answers
            Ok(br#"{"n":40,"p":50,"k":60}"#.to_vec()),
            Ok(br#"{"temperature":25}"#.to_vec()),
            Ok(br#"{"ph":6}"#.to_vec()),
            Ok(br#"{"moisture":70}"#.to_vec()),
            // Second cycle: temperature times out, moisture sends garbage
            Ok(br#"{"n":41,"p":51,"k":61}"#.to_vec()),
            Err(TransportError::Timeout),
            Ok(br#"{"ph":7}"#.to_vec()),
            Ok(b"garbage".to_vec()),
        ]));
        let mut poller = SensorPoller::new(transport, Duration::from_secs(1));
        let table = full_table();

        poller.poll(&table).await;
        let second = poller.poll(&table).await;

        assert_eq!(second.nitrogen, 41);
        assert_eq!(second.ph, 7);
        // Stale fields carry the previous cycle's values
        assert_eq!(second.temperature, 25);
        assert_eq!(second.moisture, 70);
    }

    #[tokio::test]
    async fn test_unresolved_roles_are_skipped_not_requested() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(
            br#"{"ph":5}"#.to_vec(),
        )]));
        let mut table = EndpointTable::new();
        table.set_once(SensorRole::Ph, "http://ph".to_string());

        let mut poller = SensorPoller::new(transport.clone(), Duration::from_secs(1));
        let snapshot = poller.poll(&table).await;

        assert_eq!(snapshot.ph, 5);
        // Defaults for roles that were never read
        assert_eq!(snapshot.nitrogen, 0);
        assert_eq!(transport.request_count(), 1);
    }
}

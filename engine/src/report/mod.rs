//! Sowing report pipeline
//!
//! After each cell is sown the actuator streams six records to the
//! coordinator's save endpoint, one request per record, paced by a fixed
//! spacing delay. Record order is a wire contract the coordinator indexes
//! on: position, npk, moisture, temperature, ph, seed type.
//!
//! Delivery is fire-and-forget. A record that fails to send is logged and
//! skipped; the cycle never blocks on the report pipeline.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use sdk::transport::{Transport, TransportRequest};
use sdk::types::{ReadingSnapshot, SeedCategory};

use crate::config::CoordinatorConfig;

/// Everything one report covers: where the cell is, what the soil looked
/// like, and what got sown there.
#[derive(Debug, Clone, Copy)]
pub struct CellReport {
    pub row: usize,
    pub col: usize,
    pub field_id: u32,
    pub snapshot: ReadingSnapshot,
    pub seed: SeedCategory,
}

/// Build the six report records in their fixed wire order.
pub fn build_records(report: &CellReport) -> [Value; 6] {
    let s = &report.snapshot;
    [
        json!({
            "row": report.row,
            "col": report.col,
            "field_id": report.field_id,
        }),
        json!({
            "npk": { "n": s.nitrogen, "p": s.phosphorus, "k": s.potassium },
        }),
        json!({ "moisture": s.moisture }),
        json!({ "temp": s.temperature }),
        json!({ "ph": s.ph }),
        json!({ "seed_type": report.seed }),
    ]
}

/// Delivers cell reports to the coordinator.
pub struct Reporter {
    transport: Arc<dyn Transport>,
    coordinator: CoordinatorConfig,
    spacing: Duration,
}

impl Reporter {
    pub fn new(
        transport: Arc<dyn Transport>,
        coordinator: CoordinatorConfig,
        spacing: Duration,
    ) -> Self {
        Self {
            transport,
            coordinator,
            spacing,
        }
    }

    /// Send the six records for one sown cell, in order, with the spacing
    /// delay between consecutive sends.
    pub async fn report(&self, report: &CellReport) {
        let records = build_records(report);
        let last = records.len() - 1;

        for (i, record) in records.iter().enumerate() {
            let payload = match serde_json::to_vec(record) {
                Ok(p) => p,
                Err(e) => {
                    tracing::error!(index = i, "Failed to encode report record: {}", e);
                    continue;
                }
            };

            let req = TransportRequest::post(
                self.coordinator.base_url.clone(),
                self.coordinator.save_path.clone(),
                payload,
                self.coordinator.request_timeout(),
            );

            match self.transport.request(req).await {
                Ok(_) => tracing::debug!(index = i, "Report record delivered"),
                Err(err) => {
                    tracing::warn!(index = i, %err, "Report record failed; continuing");
                }
            }

            if i < last {
                tokio::time::sleep(self.spacing).await;
            }
        }

        tracing::info!(
            row = report.row,
            col = report.col,
            field_id = report.field_id,
            seed = %report.seed,
            "Cell report complete"
        );
    }
}

//! Cycle controller
//!
//! The controller owns every piece of mutable actuator state and runs the
//! whole lifecycle on one task: register, settle, discover, then the tick
//! loop. Each tick it drains pending control commands and, when the grid is
//! active, runs one sowing cycle: poll, classify, hold for the simulated
//! sowing time, report, advance.
//!
//! Control arrives over an mpsc channel and is applied only between cycles,
//! never mid-cycle. Status flows out over a watch channel; the control
//! surface reads and streams it without touching the grid.

use std::time::Duration;

use tokio::sync::{mpsc, watch};

use sdk::errors::ActuatorError;
use sdk::types::{GridConfigRequest, StatusEvent};

use crate::classifier::ClassifierAdapter;
use crate::config::{RegistrationConfig, TimingConfig};
use crate::discovery::DiscoveryManager;
use crate::grid::Grid;
use crate::registration::{RegistrationManager, RetryPolicy};
use crate::report::{CellReport, Reporter};
use crate::sensors::SensorPoller;

/// Commands the control surface can issue. Applied at the top of a tick.
#[derive(Debug, Clone)]
pub enum ControlCommand {
    /// Configure the grid for a new field
    Configure(GridConfigRequest),
    /// Begin (or resume) traversal
    Start,
    /// Pause traversal, preserving progress
    Stop,
    /// Drop all field state and stop the controller loop
    Teardown,
}

/// Point-in-time view of the controller, published on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    pub configured: bool,
    pub active: bool,
    pub complete: bool,
    pub row: usize,
    pub col: usize,
    pub field_id: u32,
}

impl StatusSnapshot {
    fn of(grid: &Grid) -> Self {
        let (row, col) = grid.position();
        Self {
            configured: grid.is_configured(),
            active: grid.is_active(),
            complete: grid.is_complete(),
            row,
            col,
            field_id: grid.field_id(),
        }
    }

    /// The two-flag status event the wire protocol exposes.
    pub fn event(&self) -> StatusEvent {
        StatusEvent::new(self.active, self.complete)
    }
}

/// Intervals driving the cycle loop.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub tick: Duration,
    pub settle: Duration,
    pub sowing: Duration,
}

impl From<&TimingConfig> for Timing {
    fn from(cfg: &TimingConfig) -> Self {
        Self {
            tick: Duration::from_secs(cfg.tick_secs),
            settle: Duration::from_secs(cfg.settle_secs),
            sowing: Duration::from_secs(cfg.sowing_secs),
        }
    }
}

/// Owns the grid and drives the sow-report lifecycle.
pub struct CycleController {
    grid: Grid,
    registration: RegistrationManager,
    discovery: DiscoveryManager,
    poller: SensorPoller,
    classifier: ClassifierAdapter,
    reporter: Reporter,
    registration_cfg: RegistrationConfig,
    timing: Timing,
    commands: mpsc::Receiver<ControlCommand>,
    status: watch::Sender<StatusSnapshot>,
}

impl CycleController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registration: RegistrationManager,
        discovery: DiscoveryManager,
        poller: SensorPoller,
        classifier: ClassifierAdapter,
        reporter: Reporter,
        registration_cfg: RegistrationConfig,
        timing: Timing,
        commands: mpsc::Receiver<ControlCommand>,
        status: watch::Sender<StatusSnapshot>,
    ) -> Self {
        Self {
            grid: Grid::new(),
            registration,
            discovery,
            poller,
            classifier,
            reporter,
            registration_cfg,
            timing,
            commands,
            status,
        }
    }

    /// Run the controller to completion.
    ///
    /// Returns on a `Teardown` command or when every command sender has
    /// been dropped. Registration failure is logged and does not stop the
    /// loop; the actuator still serves its control surface and polls
    /// whatever discovery resolved.
    pub async fn run(mut self) {
        let policy = RetryPolicy {
            max_attempts: self.registration_cfg.max_attempts,
            backoff: Duration::from_secs(self.registration_cfg.backoff_secs),
        };
        let outcome = self
            .registration
            .register(&self.registration_cfg.device_name, policy)
            .await;
        tracing::info!(?outcome, "Registration phase finished");

        tokio::time::sleep(self.timing.settle).await;

        let endpoints = self.discovery.discover_all().await;

        loop {
            tokio::time::sleep(self.timing.tick).await;

            if self.drain_commands() {
                tracing::info!("Controller stopping");
                return;
            }

            if self.grid.is_active() && !self.grid.is_complete() {
                self.run_cycle(&endpoints).await;
            }

            self.publish_status();
        }
    }

    /// Apply every queued command. Returns true when the loop must exit:
    /// a teardown was requested or the channel is closed.
    fn drain_commands(&mut self) -> bool {
        loop {
            match self.commands.try_recv() {
                Ok(cmd) => {
                    if self.apply_command(cmd) {
                        return true;
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => return false,
                Err(mpsc::error::TryRecvError::Disconnected) => return true,
            }
        }
    }

    /// Apply one command. Returns true when the command ends the loop.
    fn apply_command(&mut self, cmd: ControlCommand) -> bool {
        match cmd {
            ControlCommand::Configure(req) => {
                if !req.is_valid() {
                    tracing::warn!(?req, "Rejected grid configuration: dimension out of range");
                    return false;
                }
                let result = self.grid.configure(
                    req.length as u32,
                    req.width as u32,
                    req.square_size as u32,
                    req.field_id as u32,
                );
                match result {
                    Ok(()) => tracing::info!(
                        rows = self.grid.rows(),
                        cols = self.grid.cols(),
                        field_id = self.grid.field_id(),
                        "Grid configured"
                    ),
                    Err(e) => tracing::warn!("Rejected grid configuration: {}", e),
                }
            }
            ControlCommand::Start => {
                if self.grid.is_complete() {
                    tracing::warn!("Ignoring start: traversal already completed");
                } else if !self.grid.is_configured() {
                    tracing::warn!("Ignoring start: grid not configured");
                } else {
                    self.grid.start();
                    tracing::info!("Traversal started");
                }
            }
            ControlCommand::Stop => {
                self.grid.stop();
                tracing::info!("Traversal stopped");
            }
            ControlCommand::Teardown => {
                self.grid.reset();
                tracing::info!("Field state torn down; stopping controller");
                self.publish_status();
                return true;
            }
        }
        self.publish_status();
        false
    }

    /// One sowing cycle for the current cell.
    async fn run_cycle(&mut self, endpoints: &crate::discovery::EndpointTable) {
        let (row, col) = self.grid.position();
        tracing::info!(row, col, "Sowing cycle starting");

        let snapshot = self.poller.poll(endpoints).await;
        let seed = self.classifier.classify(&snapshot);

        // Hold in place while the seed drill works the cell
        tokio::time::sleep(self.timing.sowing).await;

        self.reporter
            .report(&CellReport {
                row,
                col,
                field_id: self.grid.field_id(),
                snapshot,
                seed,
            })
            .await;

        match self.grid.advance() {
            Ok(()) => {
                if self.grid.is_complete() {
                    tracing::info!(
                        cells = self.grid.visited_count(),
                        "Field traversal complete"
                    );
                }
            }
            // Unreachable while the cycle only runs on an active grid
            Err(ActuatorError::NotActive) | Err(ActuatorError::AlreadyComplete) => {
                tracing::warn!("Advance refused after sowing cycle");
            }
            Err(e) => tracing::error!("Advance failed: {}", e),
        }
    }

    fn publish_status(&self) {
        let snap = StatusSnapshot::of(&self.grid);
        self.status.send_if_modified(|current| {
            if *current != snap {
                *current = snap;
                true
            } else {
                false
            }
        });
    }
}

//! Sower Engine Library
//!
//! This library provides the core functionality of the Sower actuator engine.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Grid model and serpentine traversal
pub mod grid;

/// HTTP binding of the transport seam
pub mod transport;

/// Coordinator registration with retry
pub mod registration;

/// Sensor endpoint discovery
pub mod discovery;

/// Per-cycle sensor polling
pub mod sensors;

/// Classifier adapter and bundled default model
pub mod classifier;

/// Reporting pipeline toward the coordinator
pub mod report;

/// Cycle controller state machine
pub mod controller;

/// Control surface (configure, start/stop, teardown, status observation)
pub mod server;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

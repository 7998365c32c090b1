//! Sower SDK
//!
//! Shared library providing the contracts between the sowing-actuator engine
//! and its external collaborators: the request/response transport, the seed
//! classifier, and the wire payload types spoken to the coordinator.

/// Error types and handling
pub mod errors;

/// Request/response transport trait and types
pub mod transport;

/// Sensor roles, reading snapshots, and wire payload types
pub mod types;

/// Opaque seed classifier trait and feature-vector contract
pub mod classifier;

// Re-export commonly used types
pub use classifier::{FeatureVector, SeedClassifier, FEATURE_COUNT};
pub use errors::{ActuatorError, SowerErrorExt};
pub use transport::{Method, Transport, TransportError, TransportRequest};
pub use types::{GridConfigRequest, ReadingSnapshot, SeedCategory, SensorRole, StatusEvent};

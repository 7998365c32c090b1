//! Error types and handling
//!
//! This module provides the error types used throughout the Sower engine.
//! All errors implement the `SowerErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! Registration failure and unresolved sensor endpoints are deliberately NOT
//! errors: the controller proceeds in degraded mode and surfaces them through
//! the tracing channel instead. That policy is inherited from the field
//! deployment this engine replaces.

use thiserror::Error;

use crate::transport::TransportError;
use crate::types::SensorRole;

/// Trait for Sower error extensions
///
/// Provides additional context for errors: a hint safe to display to
/// operators, and whether the error can be retried or worked around.
pub trait SowerErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: invalid config file or grid dimensions
/// - **Grid**: illegal traversal operations
/// - **Transport**: request timeouts and network failures
/// - **Discovery**: sensor roles with no resolved endpoint
#[derive(Debug, Error)]
pub enum ActuatorError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid grid dimensions: length={length}, width={width}, cell_size={cell_size}")]
    InvalidDimensions {
        length: i64,
        width: i64,
        cell_size: i64,
    },

    // Grid lifecycle errors
    #[error("Grid is not active")]
    NotActive,

    #[error("Grid traversal already complete")]
    AlreadyComplete,

    // Transport errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    // Discovery errors
    #[error("No endpoint resolved for sensor role: {0}")]
    UnresolvedEndpoint(SensorRole),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SowerErrorExt for ActuatorError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::InvalidDimensions { .. } => {
                "Grid length, width and cell size must all be positive"
            }
            Self::NotActive => "Start the sowing process before advancing the grid",
            Self::AlreadyComplete => "The field is fully sowed. Reset the grid to start over",
            Self::Transport(_) => "Coordinator or sensor unreachable. Check your network",
            Self::UnresolvedEndpoint(_) => {
                "Sensor was never discovered. Restart once the sensor is registered"
            }
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // A completed traversal needs an explicit reset
            Self::AlreadyComplete => false,

            // All other errors are potentially recoverable
            _ => true,
        }
    }
}

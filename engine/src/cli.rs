//! CLI interface for Sower
//!
//! This module provides the command-line interface using clap's derive API.
//! It defines all commands and global flags for controlling the actuator
//! engine.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sower Actuator Engine
///
/// An autonomous field-sowing actuator: registers with the coordinator,
/// discovers the soil sensors, and sweeps the field cell by cell, sampling,
/// classifying and reporting as it goes.
#[derive(Parser, Debug)]
#[command(name = "sower")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the actuator: register, discover sensors, start the cycle loop
    Run,

    /// Validate the configuration and probe coordinator reachability
    Check,
}

//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the video decode core:
//! - Logging and tracing infrastructure
//! - Configuration management and host bridge injection
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions and the fail-fast configuration
//! used throughout the system.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};

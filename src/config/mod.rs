//! Configuration module for colflow
//!
//! This module handles the live preview preferences, including
//! serialization/deserialization to/from JSON and persistent storage
//! to platform-specific directories.

mod persistence;
mod settings;

pub use persistence::*;
pub use settings::*;

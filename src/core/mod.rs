//! Core module - Shared types, platform detection and path helpers
//!
//! This module provides:
//! - The hook error type and release payload model
//! - Host platform detection and asset naming
//! - Cache and config path helpers
//! - Hashing and PATH utilities

pub mod model;
pub mod paths;
pub mod platform;
pub mod util;

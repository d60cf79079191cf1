//! Cache module - Manages the per-release binary cache
//!
//! Provides:
//! - Cache entry layout (`<root>/<tag>/dfixxer`, `meta.json`)
//! - Atomic installation of downloaded binaries
//! - Cleaning of one entry or the whole cache root

pub mod meta;
pub mod store;

//! Backends module - Locating, fetching and running dfixxer
//!
//! Provides:
//! - release: GitHub releases client and asset selection
//! - archive: zip extraction
//! - fetch: download into the cache
//! - locate: PATH/cache lookup and resolution order
//! - invoke: the `dfixxer update` run
//! - doctor: environment report

pub mod archive;
pub mod doctor;
pub mod fetch;
pub mod invoke;
pub mod locate;
pub mod release;

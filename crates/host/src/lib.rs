//! `scriptinvoker-host` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod discovery;
pub mod exit_codes;

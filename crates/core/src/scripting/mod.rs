//! Script dispatch: interpreter resolution, command composition and the
//! process invocation engine.
//!
//! All subprocess management is async (tokio) and holds no state between
//! invocations.

pub mod command;
pub mod executor;
pub mod invoker;
pub mod kind;
pub mod status;
pub mod subprocess;

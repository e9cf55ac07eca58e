//! # System Interaction Layer
//!
//! The boundary between the orchestration engine and process management.
//!
//! - **`executor`**: a thin, synchronous wrapper for spawning external
//!   commands with injectable output sinks, an optional working-directory
//!   override and extra environment variables. Blocking by design: a hung
//!   external command hangs the run.

pub mod executor;

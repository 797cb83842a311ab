//! Command implementations for the sema CLI
//!
//! Each command module provides a `run` function that executes the command logic.

pub mod analyze;

//! Integration tests for launch-planner
//!
//! These tests drive the planner and executor through the public API with
//! stub workers, run the real workers against mock HTTP servers, and check
//! the CLI binary.


mod executor_tests;

// Re-export common utilities for use by test modules
pub use common::*;

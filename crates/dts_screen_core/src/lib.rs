//! Parameter screens for the DTS membrane simulation engine
//!
//! This crate turns a templated engine input file into a full parameter sweep:
//! - Parse inline parameter definitions (`<<name:start:end:step>>`, `<<name:a,b,c>>`)
//! - Enumerate the Cartesian product of all parameter values
//! - Materialize one run directory per combination with `input.dts` and `params.json`
//! - Write a `screen_summary.json` manifest of the sweep
//! - Generate a workflow for an execution backend and drive it to completion
//!
//! # Example
//!
//! ```ignore
//! use dts_screen_core::screen::{ScreenRequest, run_screen};
//!
//! let mut request = ScreenRequest::new("input.dts", "screen_out");
//! request.backend_args = "-j 8".to_string();
//! let outcome = run_screen(&request, &mut |line| println!("{}", line.text()))?;
//! std::process::exit(outcome.exit_code());
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod backend;
pub mod combinations;
pub mod error;
pub mod materialize;
pub mod screen;
pub mod summary;
pub mod template;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use backend::{Backend, BackendKind, BackendOptions, OutputLine, Resources};
pub use error::{Result, ScreenError};
pub use screen::{RunTracker, ScreenOutcome, ScreenRequest, SweepProgress, run_screen, setup_screen};
pub use summary::ScreenSummary;
pub use template::Template;

//! Command-line front end for DTS parameter screens

pub mod cli;
pub mod config;
pub mod logging;

pub use cli::{Args, normalize_args, run};
pub use config::ScreenConfig;
pub use logging::init_logging;

//! Integration tests for the screen pipeline
//!
//! Tests are organized by topic:
//! - `sweep_properties` - Run counts, identifiers and ordering across templates
//! - `idempotence` - Re-materializing into an existing output directory
//! - `end_to_end` - Full screens with dry runs and stand-in drivers

mod sweep_properties;

use std::fs;
use std::path::{Path, PathBuf};

/// Write a template file into `dir` and return its path
pub(crate) fn write_template(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("template.dts");
    fs::write(&path, content).unwrap();
    path
}

pub(crate) const KAPPA_TEMP: &str =
    "Kappa = <<kappa:25.0:35.0:5.0>> 0 0\nTemperature = <<temp:1.0,1.5>> 0\n";

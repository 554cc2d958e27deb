//! Workflow tests for the pipeline module
//!
//! Each test writes small fixture files into a temporary directory and runs
//! a processor end to end.

pub mod histogram_workflows;
pub mod resample_workflow;

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Write `contents` to `name` inside the temp dir and return its path
pub fn write_fixture(temp_dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = temp_dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

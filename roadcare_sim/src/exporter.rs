//! JSON exporter for scenario runs.
//!
//! Writes every scenario result of a run, with the thresholds it ran under,
//! so CI can archive it and diff runs across seeds.

use crate::error::SimError;
use crate::runner::ScenarioResult;
use roadcare_core::DetectionConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Complete run export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioExport {
    /// Base seed of the run
    pub base_seed: u64,

    /// Thresholds every scenario ran under
    pub config: DetectionConfig,

    /// All results, in run order
    pub results: Vec<ScenarioResult>,

    /// Number of passing results
    pub passed: usize,

    /// Number of failing results
    pub failed: usize,
}

impl ScenarioExport {
    /// Creates a new export container.
    pub fn new(base_seed: u64, config: DetectionConfig) -> Self {
        Self {
            base_seed,
            config,
            results: Vec::new(),
            passed: 0,
            failed: 0,
        }
    }

    /// Adds a result.
    pub fn add_result(&mut self, result: ScenarioResult) {
        if result.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    /// True when every recorded result passed.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Reads an export back.
    pub fn read_from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

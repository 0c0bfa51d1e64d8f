//! Batch outcome report

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::errors::{Disposition, GeoLabelError, Result};

/// Final state of one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Succeeded,
    Skipped,
    Failed,
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitStatus::Succeeded => "succeeded",
            UnitStatus::Skipped => "skipped",
            UnitStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitOutcome {
    pub unit: String,
    pub status: UnitStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UnitOutcome {
    pub fn succeeded(unit: impl Into<String>) -> Self {
        UnitOutcome {
            unit: unit.into(),
            status: UnitStatus::Succeeded,
            reason: None,
        }
    }

    pub fn skipped(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        UnitOutcome {
            unit: unit.into(),
            status: UnitStatus::Skipped,
            reason: Some(reason.into()),
        }
    }

    /// Outcome of a unit that ended in `error`
    pub fn from_error(unit: impl Into<String>, error: &GeoLabelError) -> Self {
        let status = match error.disposition() {
            Disposition::Skipped => UnitStatus::Skipped,
            Disposition::Failed => UnitStatus::Failed,
        };
        UnitOutcome {
            unit: unit.into(),
            status,
            reason: Some(error.to_string()),
        }
    }
}

impl fmt::Display for UnitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{} {}: {}", self.status, self.unit, reason),
            None => write!(f, "{} {}", self.status, self.unit),
        }
    }
}

/// Succeeded, skipped and failed units of one run, in processing order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub command: String,
    pub units: Vec<UnitOutcome>,
}

impl BatchReport {
    pub fn new(command: impl Into<String>) -> Self {
        BatchReport {
            command: command.into(),
            units: Vec::new(),
        }
    }

    pub fn push(&mut self, outcome: UnitOutcome) {
        self.units.push(outcome);
    }

    /// Record the result of one unit
    pub fn record<T>(&mut self, unit: impl Into<String>, result: &Result<T>) {
        let outcome = match result {
            Ok(_) => UnitOutcome::succeeded(unit),
            Err(e) => UnitOutcome::from_error(unit, e),
        };
        self.push(outcome);
    }

    pub fn extend(&mut self, other: BatchReport) {
        self.units.extend(other.units);
    }

    pub fn count(&self, status: UnitStatus) -> usize {
        self.units.iter().filter(|u| u.status == status).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(UnitStatus::Succeeded)
    }

    pub fn skipped(&self) -> usize {
        self.count(UnitStatus::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(UnitStatus::Failed)
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Write the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| GeoLabelError::io_at(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|source| GeoLabelError::VectorWrite {
            path: path.to_path_buf(),
            source,
        })?;
        writer.flush().map_err(|e| GeoLabelError::io_at(path, e))?;
        Ok(())
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} succeeded, {} skipped, {} failed",
            self.command,
            self.succeeded(),
            self.skipped(),
            self.failed()
        )
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary())?;
        for unit in self.units.iter().filter(|u| u.status != UnitStatus::Succeeded) {
            writeln!(f, "  {}", unit)?;
        }
        Ok(())
    }
}

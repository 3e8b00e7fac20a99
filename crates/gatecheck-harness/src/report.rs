//! Outcome collection and the run report
//!
//! Outcomes accumulate in execution order and are immutable once recorded.
//! Artifact references on failed outcomes stay resolvable for the lifetime
//! of the run; the sink never prunes failure evidence.

use chrono::{DateTime, Utc};
use gatecheck_core::Result;
use gatecheck_driver::ArtifactRef;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Where and why a scenario failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureDetail {
    /// Zero-based phase index within the scenario
    pub phase: usize,
    /// Zero-based step index within the phase
    pub step: usize,
    /// Error kind tag (`assertion_failed`, `step_timeout`, ...)
    pub kind: String,
    /// Human-readable failing step description and error
    pub detail: String,
}

/// The recorded result of running one scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub scenario: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureDetail>,
    /// Diagnostic captures taken during the run
    #[serde(default)]
    pub artifacts: Vec<ArtifactRef>,
    /// Non-fatal observations (degraded sessions, fallback logouts)
    #[serde(default)]
    pub notes: Vec<String>,
    pub finished_at: DateTime<Utc>,
}

impl Outcome {
    pub fn passed(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            passed: true,
            failure: None,
            artifacts: Vec::new(),
            notes: Vec::new(),
            finished_at: Utc::now(),
        }
    }

    pub fn failed(scenario: impl Into<String>, failure: FailureDetail) -> Self {
        Self {
            scenario: scenario.into(),
            passed: false,
            failure: Some(failure),
            artifacts: Vec::new(),
            notes: Vec::new(),
            finished_at: Utc::now(),
        }
    }

    pub fn with_artifacts(mut self, artifacts: Vec<ArtifactRef>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes = notes;
        self
    }
}

/// Append-only collection of outcomes for one run
#[derive(Debug, Serialize)]
pub struct ReportSink {
    run_id: String,
    started_at: DateTime<Utc>,
    outcomes: Vec<Outcome>,
}

impl ReportSink {
    pub fn new() -> Self {
        Self {
            run_id: format!("run-{}", &uuid::Uuid::new_v4().to_string()[..8]),
            started_at: Utc::now(),
            outcomes: Vec::new(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Record one outcome; outcomes keep execution order
    pub fn record(&mut self, outcome: Outcome) {
        info!(
            "Recorded outcome for '{}': {}",
            outcome.scenario,
            if outcome.passed { "pass" } else { "fail" }
        );
        self.outcomes.push(outcome);
    }

    /// Outcomes in execution order
    pub fn summary(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn all_passed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.passed)
    }

    /// Serialize the whole run to a JSON report file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!("Run report written to {}", path.display());
        Ok(())
    }

    /// Render one line per outcome to stdout
    pub fn print_summary(&self) {
        for outcome in &self.outcomes {
            if outcome.passed {
                println!("PASS  {}", outcome.scenario);
            } else if let Some(failure) = &outcome.failure {
                println!(
                    "FAIL  {} (phase {}, step {}): [{}] {}",
                    outcome.scenario, failure.phase, failure.step, failure.kind, failure.detail
                );
                for artifact in &outcome.artifacts {
                    println!("      artifact: {}", artifact.path.display());
                }
            }
            for note in &outcome.notes {
                println!("      note: {}", note);
            }
        }
    }
}

impl Default for ReportSink {
    fn default() -> Self {
        Self::new()
    }
}

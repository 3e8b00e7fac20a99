//! Ordered verification steps and the engine that runs them
//!
//! A scenario is a sequence of phases, one authenticated identity each;
//! a phase is a strictly ordered list of steps. The engine owns the only
//! control flow in a run: steps execute in declared order, the first
//! failure halts the scenario, and every failure is returned as a completed
//! [`Outcome`] with diagnostics attached; errors never escape `run`.

use crate::predicate::{Assertions, Predicate};
use crate::report::{FailureDetail, Outcome};
use crate::session::SessionController;
use crate::waits;
use gatecheck_core::{
    GatecheckConfig, GatecheckError, Identity, Locator, Result, Visibility,
};
use gatecheck_driver::{ArtifactKind, ArtifactRef, ArtifactStore, PageDriver};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One interaction against a located element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Click,
    Fill(String),
    Hover,
}

/// One atomic action or check within a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Go to a path under the configured base URL, or an absolute URL
    Navigate(String),
    /// Interact with the first element matching the locator
    Act { locator: Locator, action: Action },
    /// Block until the predicate reaches the expected visibility
    WaitFor {
        predicate: Predicate,
        expect: Visibility,
        /// Step-local bound; the configured default applies when absent
        timeout_secs: Option<u64>,
    },
    /// Check the predicate against expected visibility
    Assert {
        predicate: Predicate,
        expected: Visibility,
    },
    /// Click the element if it shows up within the window, else move on
    AckIfPresent { locator: Locator, within_secs: u64 },
    /// Skip the rest of the phase if the predicate becomes visible
    SkipRemainingIf {
        predicate: Predicate,
        within_secs: u64,
    },
}

impl Step {
    /// One-line description for logs and failure details
    pub fn describe(&self) -> String {
        match self {
            Step::Navigate(path) => format!("navigate to {}", path),
            Step::Act { locator, action } => match action {
                Action::Click => format!("click {}", locator),
                Action::Fill(text) => format!("fill {} with '{}'", locator, text),
                Action::Hover => format!("hover {}", locator),
            },
            Step::WaitFor {
                predicate, expect, ..
            } => format!("wait for {} to become {}", predicate, expect),
            Step::Assert {
                predicate,
                expected,
            } => format!("assert {} is {}", predicate, expected),
            Step::AckIfPresent { locator, .. } => {
                format!("dismiss {} if shown", locator)
            }
            Step::SkipRemainingIf { predicate, .. } => {
                format!("skip remaining steps if {} is present", predicate)
            }
        }
    }
}

/// Steps executed under one authenticated identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub identity: Identity,
    pub steps: Vec<Step>,
}

impl Phase {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn navigate(self, path: impl Into<String>) -> Self {
        self.step(Step::Navigate(path.into()))
    }

    pub fn click(self, locator: Locator) -> Self {
        self.step(Step::Act {
            locator,
            action: Action::Click,
        })
    }

    pub fn fill(self, locator: Locator, text: impl Into<String>) -> Self {
        self.step(Step::Act {
            locator,
            action: Action::Fill(text.into()),
        })
    }

    pub fn hover(self, locator: Locator) -> Self {
        self.step(Step::Act {
            locator,
            action: Action::Hover,
        })
    }

    /// Wait for the predicate to become visible (default step timeout)
    pub fn wait_for(self, predicate: Predicate) -> Self {
        self.step(Step::WaitFor {
            predicate,
            expect: Visibility::Present,
            timeout_secs: None,
        })
    }

    /// Wait for the predicate to disappear (default step timeout)
    pub fn wait_for_gone(self, predicate: Predicate) -> Self {
        self.step(Step::WaitFor {
            predicate,
            expect: Visibility::Absent,
            timeout_secs: None,
        })
    }

    pub fn assert_visible(self, predicate: Predicate) -> Self {
        self.step(Step::Assert {
            predicate,
            expected: Visibility::Present,
        })
    }

    pub fn assert_absent(self, predicate: Predicate) -> Self {
        self.step(Step::Assert {
            predicate,
            expected: Visibility::Absent,
        })
    }

    pub fn ack_if_present(self, locator: Locator, within_secs: u64) -> Self {
        self.step(Step::AckIfPresent {
            locator,
            within_secs,
        })
    }

    pub fn skip_remaining_if(self, predicate: Predicate, within_secs: u64) -> Self {
        self.step(Step::SkipRemainingIf {
            predicate,
            within_secs,
        })
    }
}

/// An ordered verification flow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub phases: Vec<Phase>,
}

impl Scenario {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phases: Vec::new(),
        }
    }

    pub fn phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }
}

enum StepFlow {
    Continue,
    SkipRest,
}

/// Runs scenarios against one browser context
///
/// The engine is the only component that drives interactions during a run;
/// authentication transitions go through its session controller.
pub struct ScenarioEngine {
    driver: Arc<dyn PageDriver>,
    sessions: SessionController,
    assertions: Assertions,
    store: ArtifactStore,
    config: GatecheckConfig,
}

impl ScenarioEngine {
    pub fn new(
        driver: Arc<dyn PageDriver>,
        store: ArtifactStore,
        config: GatecheckConfig,
    ) -> Self {
        Self {
            sessions: SessionController::new(driver.clone(), config.clone()),
            assertions: Assertions::new(driver.clone()),
            driver,
            store,
            config,
        }
    }

    fn interval(&self) -> Duration {
        Duration::from_millis(self.config.timeouts.poll_interval_millis)
    }

    /// Execute every phase in order and return a completed outcome
    ///
    /// Callers always receive an [`Outcome`]; step failures are captured,
    /// diagnosed, and folded into it rather than raised.
    pub async fn run(&self, scenario: &Scenario) -> Outcome {
        info!("Running scenario '{}'", scenario.name);
        let mut notes = Vec::new();

        for (phase_idx, phase) in scenario.phases.iter().enumerate() {
            let session = match self.sessions.login(&phase.identity).await {
                Ok(session) => session,
                Err(e) => {
                    return self
                        .fail(scenario, phase_idx, 0, "establish session", e, notes)
                        .await;
                }
            };
            if session.degraded {
                notes.push(format!(
                    "phase {}: boot marker never appeared; assertions may be unreliable",
                    phase_idx
                ));
            }

            for (step_idx, step) in phase.steps.iter().enumerate() {
                match self.execute(step).await {
                    Ok(StepFlow::Continue) => {}
                    Ok(StepFlow::SkipRest) => {
                        info!(
                            "Phase {} short-circuited at step {} ({})",
                            phase_idx,
                            step_idx,
                            step.describe()
                        );
                        break;
                    }
                    Err(e) => {
                        // Capture evidence before tearing the session down.
                        let outcome = self
                            .fail(scenario, phase_idx, step_idx, &step.describe(), e, notes)
                            .await;
                        if let Err(e) = self.sessions.logout(session).await {
                            warn!("Teardown logout failed: {}", e);
                        }
                        return outcome;
                    }
                }
            }

            if let Err(e) = self.sessions.logout(session).await {
                return self
                    .fail(
                        scenario,
                        phase_idx,
                        phase.steps.len(),
                        "terminate session",
                        e,
                        notes,
                    )
                    .await;
            }
        }

        let mut outcome = Outcome::passed(&scenario.name).with_notes(notes);
        if self.config.success_snapshots {
            if let Some(artifact) = self.capture(scenario, ArtifactKind::Screenshot, "success").await
            {
                outcome.artifacts.push(artifact);
            }
        }
        info!("Scenario '{}' passed", scenario.name);
        outcome
    }

    async fn execute(&self, step: &Step) -> Result<StepFlow> {
        debug!("Step: {}", step.describe());
        match step {
            Step::Navigate(path) => {
                self.driver.navigate(&self.config.url_for(path)).await?;
                Ok(StepFlow::Continue)
            }
            Step::Act { locator, action } => {
                self.act(locator, action).await?;
                Ok(StepFlow::Continue)
            }
            Step::WaitFor {
                predicate,
                expect,
                timeout_secs,
            } => {
                let timeout = Duration::from_secs(
                    timeout_secs.unwrap_or(self.config.timeouts.step_secs),
                );
                waits::await_visibility(
                    self.driver.as_ref(),
                    predicate.locator(),
                    *expect,
                    timeout,
                    self.interval(),
                )
                .await?;
                Ok(StepFlow::Continue)
            }
            Step::Assert {
                predicate,
                expected,
            } => {
                self.assertions.assert_visibility(predicate, *expected).await?;
                Ok(StepFlow::Continue)
            }
            Step::AckIfPresent {
                locator,
                within_secs,
            } => {
                let shown = waits::settled(
                    self.driver.as_ref(),
                    locator,
                    Visibility::Present,
                    Duration::from_secs(*within_secs),
                    self.interval(),
                )
                .await?;
                if shown {
                    match self.driver.click(locator).await {
                        Ok(()) => {}
                        // Vanished between the poll and the click; that is
                        // the dismissal we wanted.
                        Err(GatecheckError::ElementNotFound { .. }) => {}
                        Err(e) => return Err(e),
                    }
                }
                Ok(StepFlow::Continue)
            }
            Step::SkipRemainingIf {
                predicate,
                within_secs,
            } => {
                let satisfied = waits::settled(
                    self.driver.as_ref(),
                    predicate.locator(),
                    Visibility::Present,
                    Duration::from_secs(*within_secs),
                    self.interval(),
                )
                .await?;
                if satisfied {
                    Ok(StepFlow::SkipRest)
                } else {
                    Ok(StepFlow::Continue)
                }
            }
        }
    }

    /// Perform one interaction, retrying while the target is still rendering
    async fn act(&self, locator: &Locator, action: &Action) -> Result<()> {
        let retry_window = Duration::from_millis(self.config.timeouts.act_retry_millis);
        let start = Instant::now();
        loop {
            let attempt = match action {
                Action::Click => self.driver.click(locator).await,
                Action::Fill(text) => self.driver.fill(locator, text).await,
                Action::Hover => self.driver.hover(locator).await,
            };
            match attempt {
                Ok(()) => return Ok(()),
                Err(GatecheckError::ElementNotFound { .. })
                    if start.elapsed() < retry_window =>
                {
                    tokio::time::sleep(self.interval()).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fail(
        &self,
        scenario: &Scenario,
        phase: usize,
        step: usize,
        description: &str,
        error: GatecheckError,
        notes: Vec<String>,
    ) -> Outcome {
        warn!(
            "Scenario '{}' failed at phase {}, step {} ({}): {}",
            scenario.name, phase, step, description, error
        );

        let mut artifacts = Vec::new();
        if let Some(artifact) = self.capture(scenario, ArtifactKind::Screenshot, "failure").await
        {
            artifacts.push(artifact);
        }
        if let Some(artifact) = self
            .capture(scenario, ArtifactKind::PageContent, "failure")
            .await
        {
            artifacts.push(artifact);
        }

        let failure = FailureDetail {
            phase,
            step,
            kind: error.kind().to_string(),
            detail: format!("{}: {}", description, error),
        };
        Outcome::failed(&scenario.name, failure)
            .with_artifacts(artifacts)
            .with_notes(notes)
    }

    /// Best-effort diagnostic capture; a capture error must not mask the
    /// step failure being reported
    async fn capture(
        &self,
        scenario: &Scenario,
        kind: ArtifactKind,
        label: &str,
    ) -> Option<ArtifactRef> {
        let data = match kind {
            ArtifactKind::Screenshot => self.driver.screenshot().await,
            ArtifactKind::PageContent => self.driver.content().await.map(String::into_bytes),
        };
        let data = match data {
            Ok(data) => data,
            Err(e) => {
                warn!("Diagnostic {} capture failed: {}", kind, e);
                return None;
            }
        };

        let description = format!("{} capture for scenario '{}'", label, scenario.name);
        match self
            .store
            .store(&scenario.name, kind.clone(), label, &data, &description)
            .await
        {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!("Storing diagnostic {} failed: {}", kind, e);
                None
            }
        }
    }
}

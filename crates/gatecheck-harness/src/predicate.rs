//! Visibility predicates and the assertion set
//!
//! Predicates are pure queries against current rendered state; nothing here
//! mutates the page. The role-gating rule the harness exists to check is a
//! composition of these: a privileged affordance must observe `Absent` under
//! any session whose identity lacks the corresponding role or ownership.

use gatecheck_core::{GatecheckError, Locator, Result, Visibility};
use gatecheck_driver::PageDriver;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A visibility query over rendered state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    locator: Locator,
    /// Human label used in report lines instead of the raw locator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl Predicate {
    pub fn new(locator: Locator) -> Self {
        Self {
            locator,
            label: None,
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(Locator::css(selector))
    }

    pub fn text(needle: impl Into<String>) -> Self {
        Self::new(Locator::text(needle))
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::new(Locator::xpath(expr))
    }

    /// Attach a report-friendly label
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{}", label),
            None => write!(f, "{}", self.locator),
        }
    }
}

/// Evaluates predicates and enforces expectations against the live page
pub struct Assertions {
    driver: Arc<dyn PageDriver>,
}

impl Assertions {
    pub fn new(driver: Arc<dyn PageDriver>) -> Self {
        Self { driver }
    }

    /// Whether the predicate currently holds (element exists and is rendered)
    pub async fn visible(&self, predicate: &Predicate) -> Result<bool> {
        let visible = self.driver.is_visible(predicate.locator()).await?;
        debug!("visible({}) = {}", predicate, visible);
        Ok(visible)
    }

    /// Compare observed visibility against `expected`
    ///
    /// The failure carries the predicate, expected, and observed values so a
    /// report line can say exactly which affordance leaked or went missing.
    pub async fn assert_visibility(
        &self,
        predicate: &Predicate,
        expected: Visibility,
    ) -> Result<()> {
        let observed = Visibility::observed(self.visible(predicate).await?);
        if observed == expected {
            Ok(())
        } else {
            Err(GatecheckError::AssertionFailed {
                predicate: predicate.to_string(),
                expected,
                observed,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::StubDriver;

    #[test]
    fn test_predicate_display_prefers_label() {
        let raw = Predicate::text("Admin Center");
        assert_eq!(raw.to_string(), "text 'Admin Center'");

        let labeled = Predicate::text("Admin Center").labeled("admin center entry");
        assert_eq!(labeled.to_string(), "admin center entry");
    }

    #[tokio::test]
    async fn test_visible_reflects_rendered_state() {
        let stub = StubDriver::new();
        stub.show(Locator::text("Workflow"));
        let assertions = Assertions::new(Arc::new(stub));

        assert!(assertions
            .visible(&Predicate::text("Workflow"))
            .await
            .unwrap());
        assert!(!assertions
            .visible(&Predicate::text("Admin Center"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_assert_visibility_mismatch_detail() {
        let stub = StubDriver::new();
        stub.show(Locator::text("Admin Center"));
        let assertions = Assertions::new(Arc::new(stub));

        let err = assertions
            .assert_visibility(
                &Predicate::text("Admin Center").labeled("admin center entry"),
                Visibility::Absent,
            )
            .await
            .unwrap_err();

        match err {
            GatecheckError::AssertionFailed {
                predicate,
                expected,
                observed,
            } => {
                assert_eq!(predicate, "admin center entry");
                assert_eq!(expected, Visibility::Absent);
                assert_eq!(observed, Visibility::Present);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_assert_visibility_match_is_ok() {
        let stub = StubDriver::new();
        let assertions = Assertions::new(Arc::new(stub));

        assertions
            .assert_visibility(&Predicate::text("Admin Center"), Visibility::Absent)
            .await
            .unwrap();
    }
}

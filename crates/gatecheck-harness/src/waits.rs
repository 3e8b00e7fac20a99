//! Bounded visibility polling
//!
//! The only suspension points in the harness: cooperative sleeps between
//! visibility probes, always under a deadline.

use gatecheck_core::{GatecheckError, Locator, Result, Visibility};
use gatecheck_driver::PageDriver;
use std::time::{Duration, Instant};

/// Poll until the locator's visibility matches `expect`
///
/// Fails with `StepTimeout` once the deadline passes. The probe runs at
/// least once, so a zero timeout still observes current state.
pub(crate) async fn await_visibility(
    driver: &dyn PageDriver,
    locator: &Locator,
    expect: Visibility,
    timeout: Duration,
    interval: Duration,
) -> Result<()> {
    let start = Instant::now();
    loop {
        let observed = Visibility::observed(driver.is_visible(locator).await?);
        if observed == expect {
            return Ok(());
        }
        if start.elapsed() >= timeout {
            return Err(GatecheckError::StepTimeout {
                description: format!("{} to become {}", locator, expect),
                waited_ms: timeout.as_millis() as u64,
            });
        }
        tokio::time::sleep(interval).await;
    }
}

/// Poll like [`await_visibility`], but report the miss instead of failing
///
/// Used where absence is an allowed answer: tour dismissal, provisioning
/// guards, optional confirmation dialogs.
pub(crate) async fn settled(
    driver: &dyn PageDriver,
    locator: &Locator,
    expect: Visibility,
    timeout: Duration,
    interval: Duration,
) -> Result<bool> {
    match await_visibility(driver, locator, expect, timeout, interval).await {
        Ok(()) => Ok(true),
        Err(GatecheckError::StepTimeout { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::StubDriver;

    const TICK: Duration = Duration::from_millis(1);

    #[tokio::test]
    async fn test_await_visibility_present() {
        let stub = StubDriver::new();
        stub.show(Locator::css("nav"));

        await_visibility(
            &stub,
            &Locator::css("nav"),
            Visibility::Present,
            Duration::ZERO,
            TICK,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_await_visibility_absent_of_missing_element() {
        let stub = StubDriver::new();

        await_visibility(
            &stub,
            &Locator::text("Planix Import"),
            Visibility::Absent,
            Duration::ZERO,
            TICK,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_await_visibility_times_out() {
        let stub = StubDriver::new();

        let err = await_visibility(
            &stub,
            &Locator::css("nav"),
            Visibility::Present,
            Duration::ZERO,
            TICK,
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), "step_timeout");
        assert!(err.to_string().contains("css 'nav'"));
    }

    #[tokio::test]
    async fn test_settled_reports_miss() {
        let stub = StubDriver::new();

        let hit = settled(
            &stub,
            &Locator::text("Got it"),
            Visibility::Present,
            Duration::ZERO,
            TICK,
        )
        .await
        .unwrap();
        assert!(!hit);
    }
}

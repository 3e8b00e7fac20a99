//! The page-driving capability the harness depends on
//!
//! Everything the Session Controller and Scenario Engine do against the
//! target application goes through this trait. Operations are addressed by
//! [`Locator`] rather than element handles: CDP element handles borrow their
//! tab and cannot cross an object-safe async boundary, and the verification
//! flows only ever locate-then-act in one motion anyway.

use async_trait::async_trait;
use gatecheck_core::{Locator, Result};
use std::time::Duration;

/// Black-box surface for driving one browser context
///
/// Implementations must treat each call as one synchronous interaction with
/// the rendered page; the harness provides all retry and timeout policy on
/// top. Errors map to the workspace taxonomy: a missing action target is
/// `ElementNotFound`, an expired wait is `StepTimeout`, anything the
/// underlying protocol reports is `Driver`.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to an absolute URL and wait for the load to settle
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Reload the current page
    async fn reload(&self) -> Result<()>;

    /// Block until the locator matches, or fail with `StepTimeout`
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()>;

    /// Whether at least one element matches the locator right now
    async fn exists(&self, locator: &Locator) -> Result<bool>;

    /// Whether a matching element exists and is rendered
    ///
    /// Rendered means a non-zero box and neither `display: none` nor
    /// `visibility: hidden`.
    async fn is_visible(&self, locator: &Locator) -> Result<bool>;

    /// Click the first matching element
    async fn click(&self, locator: &Locator) -> Result<()>;

    /// Focus the first matching element and type `text` into it
    async fn fill(&self, locator: &Locator, text: &str) -> Result<()>;

    /// Move the pointer over the first matching element
    async fn hover(&self, locator: &Locator) -> Result<()>;

    /// Execute JavaScript in the page context and return its JSON result
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Full-page PNG of the current viewport state
    async fn screenshot(&self) -> Result<Vec<u8>>;

    /// Serialized DOM of the current page
    async fn content(&self) -> Result<String>;

    /// Wipe client-side session state
    ///
    /// Postcondition: no credential survives a subsequent reload.
    async fn clear_storage(&self) -> Result<()>;
}

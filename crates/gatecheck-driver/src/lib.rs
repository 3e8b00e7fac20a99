//! Browser driving capability for Gatecheck verification runs
//!
//! The harness never talks to an automation library directly. It depends on
//! the [`PageDriver`] capability surface defined here; [`ChromeDriver`]
//! implements that surface over the Chrome DevTools Protocol.
//!
//! # Architecture
//!
//! - [`driver`]: the `PageDriver` trait covering navigation,
//!   locator-addressed interaction, visibility probes, storage clearing,
//!   and diagnostics capture
//! - [`chrome`]: CDP implementation on `headless_chrome`
//! - [`artifacts`]: timestamped storage for failure evidence (screenshots,
//!   serialized page content)
//!
//! # Requirements
//!
//! - Chrome or Chromium installed for headless operation
//! - For connecting to an existing browser: `chrome --remote-debugging-port=9222`

pub mod artifacts;
pub mod chrome;
pub mod driver;

pub use artifacts::{ArtifactKind, ArtifactRef, ArtifactStore};
pub use chrome::ChromeDriver;
pub use driver::PageDriver;

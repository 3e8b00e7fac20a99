//! # gatecheck-core
//!
//! Core types for the Gatecheck RBAC verification harness.
//!
//! Gatecheck drives a running web application through a real browser,
//! performs state-changing actions under one identity, and asserts
//! visibility/permission invariants under another. This crate holds the
//! vocabulary shared by every other crate in the workspace:
//!
//! - The unified [`GatecheckError`] taxonomy and [`Result`] alias
//! - Domain types: [`Identity`], [`Role`], [`Task`], [`Locator`],
//!   [`Visibility`]
//! - Repository configuration loaded from `gatecheck.toml`

mod config;
mod error;
mod types;

pub use config::{
    BrowserSettings, GatecheckConfig, SurfaceSelectors, TimeoutSettings,
};
pub use error::{GatecheckError, Result};
pub use types::{Identity, Locator, Role, Task, Visibility};

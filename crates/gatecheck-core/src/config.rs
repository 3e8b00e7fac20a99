//! Configuration management for Gatecheck
//!
//! This module provides configuration structures for a verification run,
//! including the target application's base URL, browser launch settings,
//! wait bounds, and the selectors of the target app's fixed chrome.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::Locator;
use crate::{GatecheckError, Result};

/// Run-level Gatecheck configuration
///
/// Loaded from `gatecheck.toml` in the working directory. Every field has a
/// default matching the reference deployment, so a missing file is not an
/// error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatecheckConfig {
    /// Entry point of the application under test
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Where diagnostic artifacts and the run report are written
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Capture a full-page snapshot on scenario success too
    #[serde(default)]
    pub success_snapshots: bool,

    /// Browser launch settings
    #[serde(default)]
    pub browser: BrowserSettings,

    /// Wait bounds for login and step execution
    #[serde(default)]
    pub timeouts: TimeoutSettings,

    /// Selectors for the target app's fixed chrome
    #[serde(default)]
    pub surface: SurfaceSelectors,
}

/// Browser launch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Run in headless mode
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Browser window width
    #[serde(default = "default_window_width")]
    pub window_width: u32,

    /// Browser window height
    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Navigation timeout in seconds
    #[serde(default = "default_nav_timeout")]
    pub nav_timeout_secs: u64,
}

/// Bounded wait configuration
///
/// Every wait in the harness is a bounded predicate poll; these are the
/// bounds. There are no unconditional sleeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutSettings {
    /// Wait for the login surface after navigating to the entry point
    #[serde(default = "default_login_surface")]
    pub login_surface_secs: u64,

    /// Wait for the boot marker after submitting credentials (tolerated)
    #[serde(default = "default_boot_marker")]
    pub boot_marker_secs: u64,

    /// Wait for the post-login surface (required)
    #[serde(default = "default_post_login")]
    pub post_login_secs: u64,

    /// Default bound for WaitFor steps without an explicit timeout
    #[serde(default = "default_step")]
    pub step_secs: u64,

    /// Retry window for Act steps whose target has not rendered yet
    #[serde(default = "default_act_retry")]
    pub act_retry_millis: u64,

    /// Interval between polls inside any bounded wait
    #[serde(default = "default_poll_interval")]
    pub poll_interval_millis: u64,
}

/// Selectors of the target app's fixed chrome
///
/// Defaults match the reference deployment's login modal, boot screen, and
/// top navigation. Override per deployment in `gatecheck.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceSelectors {
    /// Login identifier input
    #[serde(default = "default_login_user")]
    pub login_user: Locator,

    /// Login secret input
    #[serde(default = "default_login_secret")]
    pub login_secret: Locator,

    /// Login submit control
    #[serde(default = "default_login_submit")]
    pub login_submit: Locator,

    /// Marker rendered when the boot sequence completes
    #[serde(default = "default_boot_marker_locator")]
    pub boot_marker: Locator,

    /// Surface that proves authentication succeeded
    #[serde(default = "default_post_login_surface")]
    pub post_login_surface: Locator,

    /// Sign-out control
    #[serde(default = "default_logout_button")]
    pub logout_button: Locator,

    /// Sign-out confirmation control
    #[serde(default = "default_logout_confirm")]
    pub logout_confirm: Locator,

    /// Product tour dismissal control, shown on first login
    #[serde(default = "default_tour_dismiss")]
    pub tour_dismiss: Locator,
}

// Default value providers

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from(".gatecheck/artifacts")
}

fn default_headless() -> bool {
    true
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    800
}

fn default_nav_timeout() -> u64 {
    30
}

fn default_login_surface() -> u64 {
    15
}

fn default_boot_marker() -> u64 {
    10
}

fn default_post_login() -> u64 {
    15
}

fn default_step() -> u64 {
    10
}

fn default_act_retry() -> u64 {
    2000
}

fn default_poll_interval() -> u64 {
    250
}

fn default_login_user() -> Locator {
    Locator::css("input[placeholder='ACCESS_ID']")
}

fn default_login_secret() -> Locator {
    Locator::css("input[placeholder='\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}']")
}

fn default_login_submit() -> Locator {
    Locator::text("Authorize")
}

fn default_boot_marker_locator() -> Locator {
    Locator::text("SYSTEM_READY")
}

fn default_post_login_surface() -> Locator {
    Locator::css("nav")
}

fn default_logout_button() -> Locator {
    Locator::css("button[title='Logout']")
}

fn default_logout_confirm() -> Locator {
    Locator::text("Yes, Terminate Session")
}

fn default_tour_dismiss() -> Locator {
    Locator::text("Got it")
}

impl GatecheckConfig {
    /// Load configuration from `gatecheck.toml` or use defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| {
                GatecheckError::Config(format!("Failed to parse {}: {}", path.display(), e))
            })
        } else {
            Ok(Self::default())
        }
    }

    /// Write default configuration to the given path
    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let config = Self::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| GatecheckError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve a step path against the configured base URL
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        }
    }
}

impl Default for GatecheckConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            artifacts_dir: default_artifacts_dir(),
            success_snapshots: false,
            browser: BrowserSettings::default(),
            timeouts: TimeoutSettings::default(),
            surface: SurfaceSelectors::default(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            nav_timeout_secs: default_nav_timeout(),
        }
    }
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            login_surface_secs: default_login_surface(),
            boot_marker_secs: default_boot_marker(),
            post_login_secs: default_post_login(),
            step_secs: default_step(),
            act_retry_millis: default_act_retry(),
            poll_interval_millis: default_poll_interval(),
        }
    }
}

impl Default for SurfaceSelectors {
    fn default() -> Self {
        Self {
            login_user: default_login_user(),
            login_secret: default_login_secret(),
            login_submit: default_login_submit(),
            boot_marker: default_boot_marker_locator(),
            post_login_surface: default_post_login_surface(),
            logout_button: default_logout_button(),
            logout_confirm: default_logout_confirm(),
            tour_dismiss: default_tour_dismiss(),
        }
    }
}

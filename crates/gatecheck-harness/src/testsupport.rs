//! Scripted in-memory driver for harness tests
//!
//! Models the target application as a set of currently-visible locators plus
//! scripted visibility transitions that fire when specific elements are
//! clicked. Every interaction is logged so tests can assert strict ordering.

use async_trait::async_trait;
use gatecheck_core::{
    GatecheckConfig, GatecheckError, Locator, Result, TimeoutSettings,
};
use gatecheck_driver::PageDriver;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// One scripted visibility transition
#[derive(Debug, Clone)]
pub(crate) enum Change {
    Show(Locator),
    Hide(Locator),
}

#[derive(Default)]
struct State {
    visible: HashSet<Locator>,
    log: Vec<String>,
    /// Per-locator queues of transitions; one entry consumed per click
    click_scripts: HashMap<Locator, VecDeque<Vec<Change>>>,
    clear_changes: Vec<Change>,
}

impl State {
    fn apply(&mut self, changes: &[Change]) {
        for change in changes {
            match change {
                Change::Show(locator) => {
                    self.visible.insert(locator.clone());
                }
                Change::Hide(locator) => {
                    self.visible.remove(locator);
                }
            }
        }
    }
}

pub(crate) struct StubDriver {
    state: Mutex<State>,
}

impl StubDriver {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    pub fn show(&self, locator: Locator) {
        self.state.lock().unwrap().visible.insert(locator);
    }

    /// Queue a visibility transition for the next click on `locator`
    pub fn on_click(&self, locator: Locator, changes: Vec<Change>) {
        self.state
            .lock()
            .unwrap()
            .click_scripts
            .entry(locator)
            .or_default()
            .push_back(changes);
    }

    /// Transitions applied on every `clear_storage` call
    pub fn on_clear_storage(&self, changes: Vec<Change>) {
        self.state.lock().unwrap().clear_changes = changes;
    }

    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn saw(&self, entry: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .log
            .iter()
            .any(|line| line == entry)
    }
}

#[async_trait]
impl PageDriver for StubDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.state.lock().unwrap().log.push(format!("navigate {}", url));
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        self.state.lock().unwrap().log.push("reload".to_string());
        Ok(())
    }

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        loop {
            if self.state.lock().unwrap().visible.contains(locator) {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(GatecheckError::StepTimeout {
                    description: locator.to_string(),
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    async fn exists(&self, locator: &Locator) -> Result<bool> {
        Ok(self.state.lock().unwrap().visible.contains(locator))
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool> {
        Ok(self.state.lock().unwrap().visible.contains(locator))
    }

    async fn click(&self, locator: &Locator) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.visible.contains(locator) {
            return Err(GatecheckError::ElementNotFound {
                locator: locator.to_string(),
            });
        }
        state.log.push(format!("click {}", locator));
        let changes = state
            .click_scripts
            .get_mut(locator)
            .and_then(|queue| queue.pop_front());
        if let Some(changes) = changes {
            state.apply(&changes);
        }
        Ok(())
    }

    async fn fill(&self, locator: &Locator, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.visible.contains(locator) {
            return Err(GatecheckError::ElementNotFound {
                locator: locator.to_string(),
            });
        }
        state.log.push(format!("fill {} = {}", locator, text));
        Ok(())
    }

    async fn hover(&self, locator: &Locator) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.visible.contains(locator) {
            return Err(GatecheckError::ElementNotFound {
                locator: locator.to_string(),
            });
        }
        state.log.push(format!("hover {}", locator));
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        self.state
            .lock()
            .unwrap()
            .log
            .push(format!("evaluate {}", script));
        Ok(serde_json::Value::Null)
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn content(&self) -> Result<String> {
        Ok("<html>stub</html>".to_string())
    }

    async fn clear_storage(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.log.push("clear_storage".to_string());
        let changes = state.clear_changes.clone();
        state.apply(&changes);
        Ok(())
    }
}

/// Config with zeroed wait bounds so stubbed polls resolve on the first probe
pub(crate) fn test_config() -> GatecheckConfig {
    let mut config = GatecheckConfig::default();
    config.timeouts = TimeoutSettings {
        login_surface_secs: 0,
        boot_marker_secs: 0,
        post_login_secs: 0,
        step_secs: 0,
        act_retry_millis: 0,
        poll_interval_millis: 1,
    };
    config
}

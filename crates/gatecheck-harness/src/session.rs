//! Authenticated session lifecycle against the target application
//!
//! The browser context is the one shared mutable resource in a run; only
//! this controller transitions its authentication state. A session belongs
//! to exactly one identity, and switching identities always goes through an
//! explicit logout so no client-side state bleeds into the next identity's
//! assertions.

use crate::waits;
use chrono::{DateTime, Utc};
use gatecheck_core::{GatecheckConfig, GatecheckError, Identity, Result, Visibility};
use gatecheck_driver::PageDriver;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The authenticated state of one browser context under one identity
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    /// The boot marker never appeared; assertions may observe a half-ready app
    pub degraded: bool,
    pub established_at: DateTime<Utc>,
}

/// Drives login and logout against the target application
pub struct SessionController {
    driver: Arc<dyn PageDriver>,
    config: GatecheckConfig,
}

impl SessionController {
    pub fn new(driver: Arc<dyn PageDriver>, config: GatecheckConfig) -> Self {
        Self { driver, config }
    }

    fn interval(&self) -> Duration {
        Duration::from_millis(self.config.timeouts.poll_interval_millis)
    }

    /// Authenticate one identity from a clean slate
    ///
    /// Clears residual client-side state, waits for the login surface,
    /// submits credentials, and waits for the post-authentication surface.
    /// A missing boot marker degrades the session but does not fail it; a
    /// missing post-login surface does, as `AuthRejected` when the login
    /// form is demonstrably still on screen and `AuthTimeout` otherwise.
    pub async fn login(&self, identity: &Identity) -> Result<Session> {
        info!("Logging in as '{}' ({})", identity.name, identity.role);

        self.driver.navigate(&self.config.base_url).await?;
        self.driver.clear_storage().await?;
        self.driver.reload().await?;

        let surface = &self.config.surface;
        let timeouts = &self.config.timeouts;

        self.driver
            .wait_for(
                &surface.login_user,
                Duration::from_secs(timeouts.login_surface_secs),
            )
            .await
            .map_err(|_| GatecheckError::AuthTimeout {
                identity: identity.name.clone(),
                waited_ms: timeouts.login_surface_secs * 1000,
            })?;

        self.driver.fill(&surface.login_user, &identity.name).await?;
        self.driver
            .fill(&surface.login_secret, &identity.credential)
            .await?;
        self.driver.click(&surface.login_submit).await?;

        // Boot screens are allowed to be slow or absent; real auth failure
        // is not. The marker miss is surfaced, never swallowed.
        let booted = waits::settled(
            self.driver.as_ref(),
            &surface.boot_marker,
            Visibility::Present,
            Duration::from_secs(timeouts.boot_marker_secs),
            self.interval(),
        )
        .await?;
        if !booted {
            warn!(
                "Boot marker {} not observed for '{}'; session is degraded",
                surface.boot_marker, identity.name
            );
        }

        let authenticated = waits::settled(
            self.driver.as_ref(),
            &surface.post_login_surface,
            Visibility::Present,
            Duration::from_secs(timeouts.post_login_secs),
            self.interval(),
        )
        .await?;
        if !authenticated {
            if self.driver.is_visible(&surface.login_user).await? {
                return Err(GatecheckError::AuthRejected {
                    identity: identity.name.clone(),
                });
            }
            return Err(GatecheckError::AuthTimeout {
                identity: identity.name.clone(),
                waited_ms: timeouts.post_login_secs * 1000,
            });
        }

        info!("Logged in as '{}'", identity.name);
        Ok(Session {
            identity: identity.clone(),
            degraded: !booted,
            established_at: Utc::now(),
        })
    }

    /// Terminate the session and verify nobody remains authenticated
    ///
    /// Prefers the application's own sign-out control; falls back to wiping
    /// client-side storage and reloading the entry point. Either way the
    /// postcondition is checked: the login surface must be reachable again.
    pub async fn logout(&self, session: Session) -> Result<()> {
        info!("Logging out '{}'", session.identity.name);

        if let Err(e) = self.explicit_signout().await {
            debug!(
                "Explicit sign-out unavailable ({}); clearing storage instead",
                e
            );
            self.reset_to_entry().await?;
        }

        let surface = &self.config.surface;
        let wait = Duration::from_secs(self.config.timeouts.login_surface_secs);
        if self.driver.wait_for(&surface.login_user, wait).await.is_err() {
            // One storage-clearing attempt before declaring the logout stuck.
            self.reset_to_entry().await?;
            self.driver
                .wait_for(&surface.login_user, wait)
                .await
                .map_err(|_| GatecheckError::LogoutIncomplete)?;
        }

        info!("Logged out '{}'", session.identity.name);
        Ok(())
    }

    async fn explicit_signout(&self) -> Result<()> {
        let surface = &self.config.surface;
        self.driver.click(&surface.logout_button).await?;

        let confirm_window = Duration::from_millis(self.config.timeouts.act_retry_millis);
        if waits::settled(
            self.driver.as_ref(),
            &surface.logout_confirm,
            Visibility::Present,
            confirm_window,
            self.interval(),
        )
        .await?
        {
            self.driver.click(&surface.logout_confirm).await?;
        }
        Ok(())
    }

    async fn reset_to_entry(&self) -> Result<()> {
        self.driver.clear_storage().await?;
        self.driver.navigate(&self.config.base_url).await?;
        self.driver.reload().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::{test_config, Change, StubDriver};
    use gatecheck_core::Locator;

    fn surface() -> gatecheck_core::SurfaceSelectors {
        test_config().surface
    }

    fn controller(stub: &Arc<StubDriver>) -> SessionController {
        SessionController::new(stub.clone(), test_config())
    }

    fn admin() -> Identity {
        Identity::administrator("admin", "admin")
    }

    /// Stub with the login surface showing, submit scripted to `changes`
    fn stub_with_login(changes: Vec<Change>) -> Arc<StubDriver> {
        let stub = Arc::new(StubDriver::new());
        let s = surface();
        stub.show(s.login_user.clone());
        stub.show(s.login_secret.clone());
        stub.show(s.login_submit.clone());
        stub.on_click(s.login_submit.clone(), changes);
        stub
    }

    #[tokio::test]
    async fn test_login_success() {
        let s = surface();
        let stub = stub_with_login(vec![
            Change::Hide(s.login_user.clone()),
            Change::Show(s.boot_marker.clone()),
            Change::Show(s.post_login_surface.clone()),
        ]);

        let session = controller(&stub).login(&admin()).await.unwrap();
        assert!(!session.degraded);
        assert_eq!(session.identity.name, "admin");
        assert!(stub.saw("clear_storage"));
        assert!(stub.saw("fill css 'input[placeholder='ACCESS_ID']' = admin"));
    }

    #[tokio::test]
    async fn test_login_without_boot_marker_is_degraded() {
        let s = surface();
        let stub = stub_with_login(vec![
            Change::Hide(s.login_user.clone()),
            Change::Show(s.post_login_surface.clone()),
        ]);

        let session = controller(&stub).login(&admin()).await.unwrap();
        assert!(session.degraded, "missing boot marker must be surfaced");
    }

    #[tokio::test]
    async fn test_login_rejected_when_form_remains() {
        // Submit changes nothing: the login form stays on screen.
        let stub = stub_with_login(vec![]);

        let err = controller(&stub).login(&admin()).await.unwrap_err();
        assert_eq!(err.kind(), "auth_rejected");
    }

    #[tokio::test]
    async fn test_login_timeout_when_nothing_renders() {
        let s = surface();
        let stub = stub_with_login(vec![Change::Hide(s.login_user.clone())]);

        let err = controller(&stub).login(&admin()).await.unwrap_err();
        assert_eq!(err.kind(), "auth_timeout");
    }

    #[tokio::test]
    async fn test_login_timeout_when_surface_never_appears() {
        let stub = Arc::new(StubDriver::new());

        let err = controller(&stub).login(&admin()).await.unwrap_err();
        assert_eq!(err.kind(), "auth_timeout");
    }

    fn established(identity: Identity) -> Session {
        Session {
            identity,
            degraded: false,
            established_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_logout_via_signout_control() {
        let s = surface();
        let stub = Arc::new(StubDriver::new());
        stub.show(s.post_login_surface.clone());
        stub.show(s.logout_button.clone());
        stub.on_click(
            s.logout_button.clone(),
            vec![Change::Show(s.logout_confirm.clone())],
        );
        stub.on_click(
            s.logout_confirm.clone(),
            vec![
                Change::Hide(s.post_login_surface.clone()),
                Change::Hide(s.logout_button.clone()),
                Change::Hide(s.logout_confirm.clone()),
                Change::Show(s.login_user.clone()),
            ],
        );

        controller(&stub).logout(established(admin())).await.unwrap();
        assert!(stub.saw("click css 'button[title='Logout']'"));
        assert!(stub.saw("click text 'Yes, Terminate Session'"));
    }

    #[tokio::test]
    async fn test_logout_falls_back_to_storage_clearing() {
        let s = surface();
        let stub = Arc::new(StubDriver::new());
        stub.show(s.post_login_surface.clone());
        // No sign-out control rendered; clearing storage restores the entry
        // point.
        stub.on_clear_storage(vec![
            Change::Hide(s.post_login_surface.clone()),
            Change::Show(s.login_user.clone()),
        ]);

        controller(&stub).logout(established(admin())).await.unwrap();
        assert!(stub.saw("clear_storage"));
    }

    #[tokio::test]
    async fn test_logout_incomplete_when_login_surface_never_returns() {
        let s = surface();
        let stub = Arc::new(StubDriver::new());
        stub.show(s.post_login_surface.clone());

        let err = controller(&stub)
            .logout(established(admin()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "logout_incomplete");
    }
}

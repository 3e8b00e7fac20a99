//! Canned verification scenarios
//!
//! The flows the harness ships with: admin dashboard reachability, the
//! role-gating invariant, idempotent identity provisioning, and the
//! ownership-gating invariant on imported tasks. Each builder returns a
//! plain [`Scenario`] so callers can run, extend, or serialize it.

use crate::predicate::Predicate;
use crate::scenario::{Phase, Scenario};
use gatecheck_core::{GatecheckConfig, Identity, Locator, Task};

/// Administrator identity of the reference deployment
pub fn default_admin() -> Identity {
    Identity::administrator("admin", "admin")
}

/// Member identity of the reference deployment
pub fn default_member() -> Identity {
    Identity::member("chintan", "password").with_alias("Chintan")
}

/// XPath for an owner-only button scoped to one task card
///
/// The card is addressed by its caption; the affordance by its `title`
/// attribute. Scoping matters: the same button may legitimately exist on a
/// card the session's identity owns.
pub fn owner_button_xpath(card_text: &str, button_title: &str) -> String {
    format!(
        "//div[contains(@class,'group')][contains(normalize-space(.), '{}')]//button[@title='{}']",
        card_text, button_title
    )
}

/// Login as an administrator and verify the admin dashboard renders
pub fn admin_center(config: &GatecheckConfig, admin: &Identity) -> Scenario {
    let tour_window = config.timeouts.step_secs;
    Scenario::named("admin-center").phase(
        Phase::new(admin.clone())
            .ack_if_present(config.surface.tour_dismiss.clone(), tour_window)
            .click(Locator::text("Admin Center"))
            .wait_for(Predicate::text("ADMIN CENTER").labeled("admin dashboard header"))
            .assert_visible(Predicate::text("Identity Registry").labeled("identity registry panel")),
    )
}

/// The central role-gating check
///
/// An administrator sees the "Admin Center" navigation entry; a member must
/// not, while still seeing the unprivileged "Workflow" entry.
pub fn role_gating(
    config: &GatecheckConfig,
    admin: &Identity,
    member: &Identity,
) -> Scenario {
    let tour_window = config.timeouts.step_secs;
    Scenario::named("role-gating")
        .phase(
            Phase::new(admin.clone())
                .ack_if_present(config.surface.tour_dismiss.clone(), tour_window)
                .assert_visible(
                    Predicate::text("Admin Center").labeled("admin center navigation entry"),
                ),
        )
        .phase(
            Phase::new(member.clone())
                .ack_if_present(config.surface.tour_dismiss.clone(), tour_window)
                .assert_absent(
                    Predicate::text("Admin Center").labeled("admin center navigation entry"),
                )
                .assert_visible(Predicate::text("Workflow").labeled("workflow navigation entry")),
        )
}

/// Ensure the member identity exists, provisioning it only when missing
pub fn provision_member(
    config: &GatecheckConfig,
    admin: &Identity,
    member: &Identity,
) -> Scenario {
    Scenario::named("provision-member").phase(provision_phase(config, admin, member))
}

/// Full ownership-gating flow
///
/// As administrator: ensure the member exists, import a task, assign it to
/// the member. As the member: the card must be readable, while the
/// owner-only timer and delete controls scoped to that card stay hidden.
/// General read access does not confer ownership affordances.
pub fn task_ownership(
    config: &GatecheckConfig,
    admin: &Identity,
    member: &Identity,
    task: &Task,
) -> Scenario {
    let tour_window = config.timeouts.step_secs;
    let card = Predicate::text(task.title.as_str()).labeled(format!("task card '{}'", task.title));

    Scenario::named("task-ownership")
        .phase(provision_phase(config, admin, member))
        .phase(
            Phase::new(admin.clone())
                .click(Locator::text("Workflow"))
                .wait_for(Predicate::css("button[data-tour='import']").labeled("import control"))
                .click(Locator::css("button[data-tour='import']"))
                .fill(Locator::css("textarea"), task.id.as_str())
                .click(Locator::text("Execute Sync Protocol"))
                .wait_for_gone(Predicate::text("Planix Import").labeled("import modal"))
                .wait_for(card.clone())
                .hover(Locator::text(task.title.as_str()))
                .click(Locator::css("button[title='Edit Task']"))
                .click(Locator::text("Assignee"))
                .click(Locator::text(member.display_name()))
                .click(Locator::text("Save Changes"))
                .wait_for_gone(Predicate::text("Save Changes").labeled("task edit dialog")),
        )
        .phase(
            Phase::new(member.clone())
                .ack_if_present(config.surface.tour_dismiss.clone(), tour_window)
                .wait_for(card.clone())
                .assert_visible(card)
                .assert_absent(
                    Predicate::xpath(owner_button_xpath(&task.title, "Start Timer"))
                        .labeled("start timer button on another owner's task"),
                )
                .assert_absent(
                    Predicate::xpath(owner_button_xpath(&task.title, "Delete Task"))
                        .labeled("delete button on another owner's task"),
                ),
        )
}

/// Administrator phase that provisions the member only when the registry
/// has no matching row
fn provision_phase(config: &GatecheckConfig, admin: &Identity, member: &Identity) -> Phase {
    let guard_window = config.timeouts.step_secs;
    Phase::new(admin.clone())
        .click(Locator::text("Admin Center"))
        .wait_for(Predicate::text("ADMIN CENTER").labeled("admin dashboard header"))
        .fill(
            Locator::css("input[placeholder='PROBE REGISTRY...']"),
            member.name.as_str(),
        )
        .skip_remaining_if(
            Predicate::text(member.name.as_str()).labeled("existing registry row"),
            guard_window,
        )
        .click(Locator::text("Provision Node"))
        .fill(
            Locator::css("input[placeholder='IDENTITY_ALIAS']"),
            member.display_name(),
        )
        .fill(
            Locator::css("input[placeholder='ACCESS_NODE_ID']"),
            member.name.as_str(),
        )
        .fill(
            Locator::css(
                "input[placeholder='\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}']",
            ),
            member.credential.as_str(),
        )
        .click(Locator::text("Authorize Node"))
        .wait_for(Predicate::text("Identity Provisioned Successfully").labeled("provisioning toast"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{Action, ScenarioEngine, Step};
    use crate::testsupport::{test_config, Change, StubDriver};
    use gatecheck_core::Role;
    use gatecheck_driver::ArtifactStore;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_default_identities() {
        let admin = default_admin();
        assert_eq!(admin.role, Role::Administrator);

        let member = default_member();
        assert_eq!(member.role, Role::Member);
        assert_eq!(member.display_name(), "Chintan");
    }

    #[test]
    fn test_owner_button_xpath_scopes_to_card() {
        let xpath = owner_button_xpath("Redmine Task #77777", "Start Timer");
        assert!(xpath.contains("Redmine Task #77777"));
        assert!(xpath.contains("button[@title='Start Timer']"));
        assert!(xpath.starts_with("//div[contains(@class,'group')]"));
    }

    #[test]
    fn test_role_gating_shape() {
        let config = test_config();
        let scenario = role_gating(&config, &default_admin(), &default_member());

        assert_eq!(scenario.name, "role-gating");
        assert_eq!(scenario.phases.len(), 2);
        assert_eq!(scenario.phases[0].identity.role, Role::Administrator);
        assert_eq!(scenario.phases[1].identity.role, Role::Member);

        // The member phase must check both the gated and the open entry.
        let asserts = scenario.phases[1]
            .steps
            .iter()
            .filter(|s| matches!(s, Step::Assert { .. }))
            .count();
        assert_eq!(asserts, 2);
    }

    #[test]
    fn test_provision_guard_precedes_form_steps() {
        let config = test_config();
        let scenario = provision_member(&config, &default_admin(), &default_member());
        let steps = &scenario.phases[0].steps;

        let guard_idx = steps
            .iter()
            .position(|s| matches!(s, Step::SkipRemainingIf { .. }))
            .expect("provisioning must be guarded");
        let form_idx = steps
            .iter()
            .position(|s| {
                matches!(
                    s,
                    Step::Act {
                        action: Action::Click,
                        locator
                    } if *locator == Locator::text("Provision Node")
                )
            })
            .expect("provision form entry");
        assert!(guard_idx < form_idx);
    }

    #[test]
    fn test_task_ownership_asserts_owner_buttons_absent() {
        let config = test_config();
        let task = Task::imported("77777");
        let scenario = task_ownership(&config, &default_admin(), &default_member(), &task);

        assert_eq!(scenario.phases.len(), 3);
        let member_phase = &scenario.phases[2];
        assert_eq!(member_phase.identity.role, Role::Member);

        let absent_asserts: Vec<String> = member_phase
            .steps
            .iter()
            .filter_map(|s| match s {
                Step::Assert {
                    predicate,
                    expected,
                } if !expected.is_present() => Some(predicate.to_string()),
                _ => None,
            })
            .collect();
        assert_eq!(absent_asserts.len(), 2);
        assert!(absent_asserts.iter().any(|p| p.contains("start timer")));
        assert!(absent_asserts.iter().any(|p| p.contains("delete")));
    }

    /// Surface chrome shared by every stubbed login
    fn base_view(extra: Vec<Change>) -> Vec<Change> {
        let s = test_config().surface;
        let mut changes = vec![
            Change::Hide(s.login_user.clone()),
            Change::Show(s.boot_marker.clone()),
            Change::Show(s.post_login_surface.clone()),
            Change::Show(s.logout_button.clone()),
        ];
        changes.extend(extra);
        changes
    }

    fn stub_with_logins(views: Vec<Vec<Change>>) -> Arc<StubDriver> {
        let stub = Arc::new(StubDriver::new());
        let s = test_config().surface;
        stub.show(s.login_user.clone());
        stub.show(s.login_secret.clone());
        stub.show(s.login_submit.clone());
        for view in views {
            stub.on_click(s.login_submit.clone(), base_view(view));
        }
        stub
    }

    /// Logout script that retracts everything a view may have shown
    fn wire_teardown(stub: &StubDriver, shown: Vec<Locator>) {
        let s = test_config().surface;
        let mut changes = vec![
            Change::Hide(s.post_login_surface.clone()),
            Change::Hide(s.boot_marker.clone()),
            Change::Hide(s.logout_button.clone()),
            Change::Show(s.login_user.clone()),
        ];
        changes.extend(shown.into_iter().map(Change::Hide));
        stub.on_clear_storage(changes);
    }

    #[tokio::test]
    async fn test_role_gating_passes_when_gate_holds() {
        let dir = TempDir::new().unwrap();
        let stub = stub_with_logins(vec![
            vec![
                Change::Show(Locator::text("Admin Center")),
                Change::Show(Locator::text("Workflow")),
            ],
            vec![Change::Show(Locator::text("Workflow"))],
        ]);
        wire_teardown(
            &stub,
            vec![Locator::text("Admin Center"), Locator::text("Workflow")],
        );

        let config = test_config();
        let engine = ScenarioEngine::new(
            stub.clone(),
            ArtifactStore::new(dir.path().to_path_buf()),
            config.clone(),
        );

        let scenario = role_gating(&config, &default_admin(), &default_member());
        let outcome = engine.run(&scenario).await;
        assert!(outcome.passed, "failure: {:?}", outcome.failure);
    }

    #[tokio::test]
    async fn test_role_gating_fails_when_member_sees_admin_center() {
        let dir = TempDir::new().unwrap();
        let leaked = vec![
            Change::Show(Locator::text("Admin Center")),
            Change::Show(Locator::text("Workflow")),
        ];
        let stub = stub_with_logins(vec![leaked.clone(), leaked]);
        wire_teardown(
            &stub,
            vec![Locator::text("Admin Center"), Locator::text("Workflow")],
        );

        let config = test_config();
        let engine = ScenarioEngine::new(
            stub.clone(),
            ArtifactStore::new(dir.path().to_path_buf()),
            config.clone(),
        );

        let scenario = role_gating(&config, &default_admin(), &default_member());
        let outcome = engine.run(&scenario).await;

        assert!(!outcome.passed, "a leaked affordance must fail the run");
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.phase, 1);
        assert_eq!(failure.kind, "assertion_failed");
        assert!(failure.detail.contains("admin center navigation entry"));
        assert!(!outcome.artifacts.is_empty(), "failure evidence captured");
    }

    #[tokio::test]
    async fn test_task_ownership_end_to_end() {
        let dir = TempDir::new().unwrap();
        let config = test_config();
        let task = Task::imported("77777");
        let member = default_member();
        let title = Locator::text(task.title.clone());

        // Phase 1: registry already has the member; the guard short-circuits.
        let registry_view = vec![
            Change::Show(Locator::text("Admin Center")),
            Change::Show(Locator::text("Workflow")),
        ];
        // Phase 2: admin board with import flow wired through clicks.
        let board_view = registry_view.clone();
        // Phase 3: member sees the card but no owner-only buttons.
        let member_view = vec![
            Change::Show(Locator::text("Workflow")),
            Change::Show(title.clone()),
        ];

        let stub = stub_with_logins(vec![registry_view, board_view, member_view]);

        // Admin center opens the registry with the member row present.
        let admin_center_changes = vec![
            Change::Show(Locator::text("ADMIN CENTER")),
            Change::Show(Locator::css("input[placeholder='PROBE REGISTRY...']")),
            Change::Show(Locator::text(member.name.clone())),
        ];
        stub.on_click(Locator::text("Admin Center"), admin_center_changes);

        // Workflow tab reveals the import control.
        stub.on_click(
            Locator::text("Workflow"),
            vec![Change::Show(Locator::css("button[data-tour='import']"))],
        );
        stub.on_click(
            Locator::css("button[data-tour='import']"),
            vec![Change::Show(Locator::css("textarea")), Change::Show(Locator::text("Execute Sync Protocol"))],
        );
        stub.on_click(
            Locator::text("Execute Sync Protocol"),
            vec![
                Change::Show(title.clone()),
                Change::Show(Locator::css("button[title='Edit Task']")),
            ],
        );
        stub.on_click(
            Locator::css("button[title='Edit Task']"),
            vec![
                Change::Show(Locator::text("Assignee")),
                Change::Show(Locator::text(member.display_name().to_string())),
                Change::Show(Locator::text("Save Changes")),
            ],
        );
        stub.on_click(
            Locator::text("Save Changes"),
            vec![Change::Hide(Locator::text("Save Changes"))],
        );

        wire_teardown(
            &stub,
            vec![
                Locator::text("Admin Center"),
                Locator::text("Workflow"),
                Locator::text("ADMIN CENTER"),
                Locator::css("input[placeholder='PROBE REGISTRY...']"),
                Locator::text(member.name.clone()),
                Locator::css("button[data-tour='import']"),
                Locator::css("textarea"),
                Locator::text("Execute Sync Protocol"),
                Locator::css("button[title='Edit Task']"),
                Locator::text("Assignee"),
                Locator::text(member.display_name().to_string()),
                title.clone(),
            ],
        );

        let engine = ScenarioEngine::new(
            stub.clone(),
            ArtifactStore::new(dir.path().to_path_buf()),
            config.clone(),
        );

        let scenario = task_ownership(&config, &default_admin(), &member, &task);
        let outcome = engine.run(&scenario).await;
        assert!(outcome.passed, "failure: {:?}", outcome.failure);

        // The guard skipped the provisioning form entirely.
        assert!(!stub.saw("click text 'Provision Node'"));
        // The import and assignment actually ran.
        assert!(stub.saw("fill css 'textarea' = 77777"));
        assert!(stub.saw("click text 'Chintan'"));
    }

    #[tokio::test]
    async fn test_task_ownership_fails_when_owner_button_leaks() {
        let dir = TempDir::new().unwrap();
        let config = test_config();
        let task = Task::imported("77777");
        let member = default_member();
        let title = Locator::text(task.title.clone());
        let leaked_button =
            Locator::xpath(owner_button_xpath(&task.title, "Start Timer"));

        let registry_view = vec![Change::Show(Locator::text("Admin Center"))];
        let board_view = vec![
            Change::Show(Locator::text("Admin Center")),
            Change::Show(Locator::text("Workflow")),
        ];
        let member_view = vec![
            Change::Show(Locator::text("Workflow")),
            Change::Show(title.clone()),
            Change::Show(leaked_button.clone()),
        ];

        let stub = stub_with_logins(vec![registry_view, board_view, member_view]);
        stub.on_click(
            Locator::text("Admin Center"),
            vec![
                Change::Show(Locator::text("ADMIN CENTER")),
                Change::Show(Locator::css("input[placeholder='PROBE REGISTRY...']")),
                Change::Show(Locator::text(member.name.clone())),
            ],
        );
        stub.on_click(
            Locator::text("Workflow"),
            vec![Change::Show(Locator::css("button[data-tour='import']"))],
        );
        stub.on_click(
            Locator::css("button[data-tour='import']"),
            vec![
                Change::Show(Locator::css("textarea")),
                Change::Show(Locator::text("Execute Sync Protocol")),
            ],
        );
        stub.on_click(
            Locator::text("Execute Sync Protocol"),
            vec![
                Change::Show(title.clone()),
                Change::Show(Locator::css("button[title='Edit Task']")),
            ],
        );
        stub.on_click(
            Locator::css("button[title='Edit Task']"),
            vec![
                Change::Show(Locator::text("Assignee")),
                Change::Show(Locator::text(member.display_name().to_string())),
                Change::Show(Locator::text("Save Changes")),
            ],
        );
        stub.on_click(
            Locator::text("Save Changes"),
            vec![Change::Hide(Locator::text("Save Changes"))],
        );
        wire_teardown(
            &stub,
            vec![
                Locator::text("Admin Center"),
                Locator::text("Workflow"),
                Locator::text("ADMIN CENTER"),
                Locator::css("input[placeholder='PROBE REGISTRY...']"),
                Locator::text(member.name.clone()),
                Locator::css("button[data-tour='import']"),
                Locator::css("textarea"),
                Locator::text("Execute Sync Protocol"),
                Locator::css("button[title='Edit Task']"),
                Locator::text("Assignee"),
                Locator::text(member.display_name().to_string()),
                title.clone(),
                leaked_button,
            ],
        );

        let engine = ScenarioEngine::new(
            stub.clone(),
            ArtifactStore::new(dir.path().to_path_buf()),
            config.clone(),
        );

        let scenario = task_ownership(&config, &default_admin(), &member, &task);
        let outcome = engine.run(&scenario).await;

        assert!(!outcome.passed);
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.phase, 2);
        assert_eq!(failure.kind, "assertion_failed");
        assert!(failure.detail.contains("start timer"));
    }
}

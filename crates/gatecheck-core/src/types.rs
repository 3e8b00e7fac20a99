//! Domain type definitions for RBAC verification

use serde::{Deserialize, Serialize};

/// Role attached to an identity under test
///
/// The target application has exactly two roles. Administrators see the
/// admin center and the identity registry; members see only the workflow
/// surfaces and the tasks assigned to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    Member,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Administrator => write!(f, "administrator"),
            Self::Member => write!(f, "member"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "administrator" | "admin" => Ok(Self::Administrator),
            "member" => Ok(Self::Member),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// A named credential pair with a role, fixed for the whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Access identifier typed into the login form
    pub name: String,
    /// Secret typed into the login form
    pub credential: String,
    /// Role the target application is expected to enforce
    pub role: Role,
    /// Display alias used by the provisioning form, when it differs from `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Identity {
    pub fn administrator(name: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            credential: credential.into(),
            role: Role::Administrator,
            alias: None,
        }
    }

    pub fn member(name: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            credential: credential.into(),
            role: Role::Member,
            alias: None,
        }
    }

    /// Set the display alias the registry shows for this identity
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Name the registry and task assignee dropdowns display
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Domain entity manipulated during verification
///
/// Created by an administrator import action, mutated by assignment, read
/// by visibility assertions under a member identity. Persistence is the
/// target application's responsibility; the harness only remembers enough
/// to address the rendered card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// External tracker id fed to the import modal
    pub id: String,
    /// Caption the card renders after import
    pub title: String,
    /// Display name of the current assignee, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

impl Task {
    /// Task as it appears after importing `id` from the external tracker
    pub fn imported(id: impl Into<String>) -> Self {
        let id = id.into();
        let title = format!("Redmine Task #{}", id);
        Self {
            id,
            title,
            assignee: None,
        }
    }

    pub fn assigned_to(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }
}

/// How a predicate or action addresses rendered UI
///
/// CDP selectors are CSS-only, so text matching compiles to an XPath
/// `contains()` query at the driver. `Text` is what the verification flows
/// use for buttons and markers the target app labels by caption.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locator {
    /// CSS selector
    Css(String),
    /// Visible-text match, case-sensitive substring
    Text(String),
    /// Raw XPath expression
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn text(needle: impl Into<String>) -> Self {
        Self::Text(needle.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css '{}'", s),
            Self::Text(s) => write!(f, "text '{}'", s),
            Self::XPath(s) => write!(f, "xpath '{}'", s),
        }
    }
}

/// Expected or observed visibility of an affordance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Present,
    Absent,
}

impl Visibility {
    /// Observation from a boolean visibility probe
    pub fn observed(visible: bool) -> Self {
        if visible {
            Self::Present
        } else {
            Self::Absent
        }
    }

    pub fn is_present(self) -> bool {
        matches!(self, Self::Present)
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Present => write!(f, "present"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

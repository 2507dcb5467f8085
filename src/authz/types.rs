use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

/// Authorization label assigned to a principal, e.g. "developer".
///
/// Roles form an open set; the well-known ones are exposed as constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const INFRASTRUCTURE_TEAM: Role = Role(Cow::Borrowed("infrastructure-team"));
    pub const DEVELOPER: Role = Role(Cow::Borrowed("developer"));
    pub const GUEST: Role = Role(Cow::Borrowed("guest"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Binary verdict returned by the decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Allow => f.write_str("ALLOW"),
            Decision::Deny => f.write_str("DENY"),
        }
    }
}

/// The rule that produced a decision. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionRule {
    AdminOverride,
    GuestScaffolderDenied,
    GuestDefaultAllow,
    NonScaffolderDefault,
    TemplateParameterRead,
    TemplateStepRead,
    TaskOperation,
    ActionExecute,
    ScaffolderFallthrough,
}

impl DecisionRule {
    pub fn as_str(self) -> &'static str {
        match self {
            DecisionRule::AdminOverride => "admin-override",
            DecisionRule::GuestScaffolderDenied => "guest-scaffolder-denied",
            DecisionRule::GuestDefaultAllow => "guest-default-allow",
            DecisionRule::NonScaffolderDefault => "non-scaffolder-default",
            DecisionRule::TemplateParameterRead => "template-parameter-read",
            DecisionRule::TemplateStepRead => "template-step-read",
            DecisionRule::TaskOperation => "task-operation",
            DecisionRule::ActionExecute => "action-execute",
            DecisionRule::ScaffolderFallthrough => "scaffolder-fallthrough",
        }
    }
}

impl std::fmt::Display for DecisionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity reference -> role assignments. Immutable once compiled.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    by_identity: HashMap<String, Role>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identity: impl Into<String>, role: Role) -> Option<Role> {
        self.by_identity.insert(identity.into(), role)
    }

    pub fn get(&self, identity: &str) -> Option<&Role> {
        self.by_identity.get(identity)
    }

    pub fn len(&self) -> usize {
        self.by_identity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identity.is_empty()
    }

    /// Identities in sorted order, for stable listings.
    pub fn identities(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.by_identity.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Role -> template patterns. A role missing from the table has no access.
#[derive(Debug, Clone, Default)]
pub struct TemplateAccessTable {
    by_role: HashMap<Role, Vec<String>>,
}

impl TemplateAccessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append patterns for a role, creating the entry if needed. An empty
    /// `patterns` still registers the role with no access.
    pub fn extend(&mut self, role: Role, patterns: impl IntoIterator<Item = String>) {
        let entry = self.by_role.entry(role).or_default();
        for pattern in patterns {
            if !entry.contains(&pattern) {
                entry.push(pattern);
            }
        }
    }

    pub fn patterns(&self, role: &Role) -> &[String] {
        self.by_role
            .get(role)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn roles(&self) -> Vec<&Role> {
        let mut roles: Vec<&Role> = self.by_role.keys().collect();
        roles.sort_unstable();
        roles
    }

    pub fn len(&self) -> usize {
        self.by_role.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_role.is_empty()
    }
}

// ---------- API request/response types ----------

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    /// e.g. "user:default/shrinet82"; absent for anonymous callers
    #[serde(default)]
    pub identity: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    /// The identity actually looked up (after the anonymous fallback)
    pub identity: String,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub identity: Option<String>,
    /// e.g. "scaffolder.action.execute"
    pub permission: String,
    /// e.g. a template name
    #[serde(default)]
    pub resource: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckResponse {
    pub role: Role,
    pub decision: Decision,
    pub allowed: bool,
    pub rule: DecisionRule,
}

#[derive(Debug, Deserialize)]
pub struct TemplateFilterRequest {
    #[serde(default)]
    pub identity: Option<String>,
    pub templates: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateFilterResponse {
    pub role: Role,
    pub unrestricted: bool,
    pub allowed: Vec<String>,
}

// ---------- Policy file types ----------

/// Values of a `defaults` node. Unset fields keep the previous value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyDefaults {
    pub fallback_identity: Option<String>,
    pub default_role: Option<String>,
}

/// A single `assign` node: identity -> role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    pub identity: String,
    pub role: String,
}

/// A single `templates` node: role -> patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateGrant {
    pub role: String,
    pub patterns: Vec<String>,
}

/// Intermediate result from parsing a single KDL file.
#[derive(Debug, Clone, Default)]
pub struct ParsedPolicy {
    pub defaults: PolicyDefaults,
    pub assignments: Vec<RoleAssignment>,
    pub templates: Vec<TemplateGrant>,
}

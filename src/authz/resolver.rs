use std::sync::Arc;

use crate::authz::audit::{AuthzEvent, DecisionRecorder, TracingRecorder};
use crate::authz::types::{Role, RoleTable};

/// Identity used when a request carries no identity at all.
pub const DEFAULT_FALLBACK_IDENTITY: &str = "user:default/guest";

/// Maps identity references to roles.
#[derive(Debug, Clone)]
pub struct RoleResolver {
    table: RoleTable,
    fallback_identity: String,
    default_role: Role,
    recorder: Arc<dyn DecisionRecorder>,
}

impl RoleResolver {
    pub fn new(table: RoleTable, fallback_identity: impl Into<String>, default_role: Role) -> Self {
        Self {
            table,
            fallback_identity: fallback_identity.into(),
            default_role,
            recorder: Arc::new(TracingRecorder),
        }
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn DecisionRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// The identity that is actually looked up for `identity`. Absent and
    /// empty identities both become the fallback identity.
    pub fn effective_identity<'a>(&'a self, identity: Option<&'a str>) -> &'a str {
        match identity {
            Some(id) if !id.is_empty() => id,
            _ => &self.fallback_identity,
        }
    }

    /// Resolve the role for `identity`. Never fails: unmapped identities get
    /// the default role.
    pub fn resolve(&self, identity: Option<&str>) -> Role {
        let identity = self.effective_identity(identity);
        let (role, mapped) = match self.table.get(identity) {
            Some(role) => (role, true),
            None => (&self.default_role, false),
        };
        self.recorder.record(&AuthzEvent::RoleResolved {
            identity,
            role,
            mapped,
        });
        role.clone()
    }

    pub fn table(&self) -> &RoleTable {
        &self.table
    }

    pub fn fallback_identity(&self) -> &str {
        &self.fallback_identity
    }

    pub fn default_role(&self) -> &Role {
        &self.default_role
    }
}

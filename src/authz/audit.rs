//! Observability hook for authorization decisions.
//!
//! The resolver and engine report what they did through a [`DecisionRecorder`]
//! and never read anything back, so a recorder cannot change an outcome.

use crate::authz::types::{Decision, DecisionRule, Role};

/// Something the authorization core did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthzEvent<'a> {
    /// An identity was mapped to a role. `mapped` is false when the
    /// default role was used.
    RoleResolved {
        identity: &'a str,
        role: &'a Role,
        mapped: bool,
    },
    /// A permission check was evaluated.
    Decided {
        role: &'a Role,
        permission: &'a str,
        resource: Option<&'a str>,
        decision: Decision,
        rule: DecisionRule,
    },
    /// A template filter was built for a role.
    TemplateFilterBuilt {
        role: &'a Role,
        patterns: usize,
        unrestricted: bool,
    },
}

pub trait DecisionRecorder: Send + Sync + std::fmt::Debug {
    fn record(&self, event: &AuthzEvent<'_>);
}

/// Emits each event as a `tracing` event under the `opsie_rbac::authz` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRecorder;

impl DecisionRecorder for TracingRecorder {
    fn record(&self, event: &AuthzEvent<'_>) {
        match *event {
            AuthzEvent::RoleResolved {
                identity,
                role,
                mapped,
            } => {
                tracing::debug!(target: "opsie_rbac::authz", identity, %role, mapped, "Resolved role");
            }
            AuthzEvent::Decided {
                role,
                permission,
                resource,
                decision: Decision::Deny,
                rule,
            } => {
                tracing::info!(
                    target: "opsie_rbac::authz",
                    %role,
                    permission,
                    resource,
                    %rule,
                    "Permission denied"
                );
            }
            AuthzEvent::Decided {
                role,
                permission,
                resource,
                decision,
                rule,
            } => {
                tracing::debug!(
                    target: "opsie_rbac::authz",
                    %role,
                    permission,
                    resource,
                    %decision,
                    %rule,
                    "Permission decided"
                );
            }
            AuthzEvent::TemplateFilterBuilt {
                role,
                patterns,
                unrestricted,
            } => {
                tracing::debug!(
                    target: "opsie_rbac::authz",
                    %role,
                    patterns,
                    unrestricted,
                    "Built template filter"
                );
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecorder;

impl DecisionRecorder for NullRecorder {
    fn record(&self, _event: &AuthzEvent<'_>) {}
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Keeps a rendered line per event for assertions.
    #[derive(Debug, Default)]
    pub(crate) struct CapturingRecorder {
        pub(crate) lines: Mutex<Vec<String>>,
    }

    impl CapturingRecorder {
        pub(crate) fn lines(&self) -> Vec<String> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl DecisionRecorder for CapturingRecorder {
        fn record(&self, event: &AuthzEvent<'_>) {
            let line = match *event {
                AuthzEvent::RoleResolved {
                    identity,
                    role,
                    mapped,
                } => format!("resolved {identity} -> {role} mapped={mapped}"),
                AuthzEvent::Decided {
                    role,
                    permission,
                    resource,
                    decision,
                    rule,
                } => format!(
                    "decided {role} {permission} {} -> {decision} ({rule})",
                    resource.unwrap_or("-")
                ),
                AuthzEvent::TemplateFilterBuilt {
                    role,
                    patterns,
                    unrestricted,
                } => format!("filter {role} patterns={patterns} unrestricted={unrestricted}"),
            };
            self.lines.lock().unwrap().push(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::CapturingRecorder;
    use super::*;

    #[test]
    fn test_null_recorder_accepts_all_events() {
        let recorder = NullRecorder;
        recorder.record(&AuthzEvent::TemplateFilterBuilt {
            role: &Role::GUEST,
            patterns: 0,
            unrestricted: false,
        });
    }

    #[test]
    fn test_tracing_recorder_handles_every_variant() {
        let recorder = TracingRecorder;
        recorder.record(&AuthzEvent::RoleResolved {
            identity: "user:default/guest",
            role: &Role::GUEST,
            mapped: true,
        });
        recorder.record(&AuthzEvent::Decided {
            role: &Role::GUEST,
            permission: "scaffolder.action.execute",
            resource: None,
            decision: Decision::Deny,
            rule: DecisionRule::GuestScaffolderDenied,
        });
        recorder.record(&AuthzEvent::Decided {
            role: &Role::DEVELOPER,
            permission: "catalog.entity.read",
            resource: Some("component:default/web"),
            decision: Decision::Allow,
            rule: DecisionRule::NonScaffolderDefault,
        });
    }

    #[test]
    fn test_capturing_recorder_renders_events() {
        let recorder = CapturingRecorder::default();
        recorder.record(&AuthzEvent::Decided {
            role: &Role::DEVELOPER,
            permission: "scaffolder.action.execute",
            resource: Some("deploy-aws-rds"),
            decision: Decision::Allow,
            rule: DecisionRule::ActionExecute,
        });
        assert_eq!(
            recorder.lines(),
            vec!["decided developer scaffolder.action.execute deploy-aws-rds -> ALLOW (action-execute)"]
        );
    }
}

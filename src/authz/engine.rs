use std::sync::Arc;

use crate::authz::audit::{AuthzEvent, DecisionRecorder, TracingRecorder};
use crate::authz::types::{Decision, DecisionRule, Role, TemplateAccessTable};

/// Pattern granting access to every template.
pub const WILDCARD: &str = "*";

/// Guests are denied anything under this bare prefix (no trailing dot).
const SCAFFOLDER_PREFIX: &str = "scaffolder";
const SCAFFOLDER_NAMESPACE: &str = "scaffolder.";
const TEMPLATE_PARAMETER_READ: &str = "scaffolder.template.parameter.read";
const TEMPLATE_STEP_READ: &str = "scaffolder.template.step.read";
const TASK_PREFIX: &str = "scaffolder.task";
const ACTION_EXECUTE: &str = "scaffolder.action.execute";

/// Evaluates permission checks and template visibility for a role.
#[derive(Debug, Clone)]
pub struct AccessDecisionEngine {
    templates: TemplateAccessTable,
    recorder: Arc<dyn DecisionRecorder>,
}

impl AccessDecisionEngine {
    pub fn new(templates: TemplateAccessTable) -> Self {
        Self {
            templates,
            recorder: Arc::new(TracingRecorder),
        }
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn DecisionRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    /// Decide whether `role` may use `permission`, optionally on `resource`.
    pub fn decide(&self, role: &Role, permission: &str, resource: Option<&str>) -> Decision {
        self.evaluate(role, permission, resource).0
    }

    /// Like [`decide`](Self::decide), also returning the rule that matched.
    ///
    /// `scaffolder.action.execute` is not gated by template here; template
    /// restrictions only apply through [`template_filter`](Self::template_filter).
    pub fn evaluate(
        &self,
        role: &Role,
        permission: &str,
        resource: Option<&str>,
    ) -> (Decision, DecisionRule) {
        let (decision, rule) = rule_for(role, permission);
        self.recorder.record(&AuthzEvent::Decided {
            role,
            permission,
            resource,
            decision,
            rule,
        });
        (decision, rule)
    }

    /// Build the template visibility predicate for `role`.
    pub fn template_filter(&self, role: &Role) -> TemplateFilter<'_> {
        let patterns = self.templates.patterns(role);
        let filter = if patterns.iter().any(|p| p == WILDCARD) {
            TemplateFilter::Unrestricted
        } else if patterns.is_empty() {
            TemplateFilter::NoAccess
        } else {
            TemplateFilter::Patterns(patterns)
        };
        self.recorder.record(&AuthzEvent::TemplateFilterBuilt {
            role,
            patterns: patterns.len(),
            unrestricted: filter.is_unrestricted(),
        });
        filter
    }

    pub fn templates(&self) -> &TemplateAccessTable {
        &self.templates
    }
}

/// First matching rule wins.
fn rule_for(role: &Role, permission: &str) -> (Decision, DecisionRule) {
    if *role == Role::ADMIN {
        return (Decision::Allow, DecisionRule::AdminOverride);
    }

    if *role == Role::GUEST {
        if permission.starts_with(SCAFFOLDER_PREFIX) {
            return (Decision::Deny, DecisionRule::GuestScaffolderDenied);
        }
        return (Decision::Allow, DecisionRule::GuestDefaultAllow);
    }

    if !permission.starts_with(SCAFFOLDER_NAMESPACE) {
        return (Decision::Allow, DecisionRule::NonScaffolderDefault);
    }

    let rule = match permission {
        TEMPLATE_PARAMETER_READ => DecisionRule::TemplateParameterRead,
        TEMPLATE_STEP_READ => DecisionRule::TemplateStepRead,
        p if p.starts_with(TASK_PREFIX) => DecisionRule::TaskOperation,
        ACTION_EXECUTE => DecisionRule::ActionExecute,
        _ => DecisionRule::ScaffolderFallthrough,
    };
    (Decision::Allow, rule)
}

/// Which templates a role may see.
///
/// Pattern matching is deliberately loose: a template matches a pattern when
/// it equals it or merely contains it, so `deploy-aws-vpc` also admits
/// `x-deploy-aws-vpc-y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFilter<'a> {
    Unrestricted,
    NoAccess,
    Patterns(&'a [String]),
}

impl TemplateFilter<'_> {
    pub fn matches(&self, template: &str) -> bool {
        match self {
            TemplateFilter::Unrestricted => true,
            TemplateFilter::NoAccess => false,
            TemplateFilter::Patterns(patterns) => patterns
                .iter()
                .any(|p| template == p.as_str() || template.contains(p.as_str())),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, TemplateFilter::Unrestricted)
    }

    /// Keep the templates this filter admits, preserving order.
    pub fn apply<I, S>(&self, templates: I) -> Vec<S>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        templates
            .into_iter()
            .filter(|t| self.matches(t.as_ref()))
            .collect()
    }
}

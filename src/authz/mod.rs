pub mod audit;
pub mod engine;
pub mod errors;
pub mod loader;
pub mod policy;
pub mod resolver;
pub mod types;
pub mod web;

use std::sync::Arc;

use audit::DecisionRecorder;
use engine::AccessDecisionEngine;
use resolver::RoleResolver;

/// Compiled authorization state, loaded from KDL policy files or the
/// built-in policy. Immutable after construction; configuration changes
/// require a service restart.
#[derive(Debug, Clone)]
pub struct AuthzState {
    pub resolver: RoleResolver,
    pub engine: AccessDecisionEngine,
}

impl AuthzState {
    /// Route events from both components to `recorder`.
    pub fn with_recorder(self, recorder: Arc<dyn DecisionRecorder>) -> Self {
        Self {
            resolver: self.resolver.with_recorder(recorder.clone()),
            engine: self.engine.with_recorder(recorder),
        }
    }
}

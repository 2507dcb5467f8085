use std::path::Path;

use crate::authz::engine::AccessDecisionEngine;
use crate::authz::errors::AuthzError;
use crate::authz::policy::parse_kdl_document;
use crate::authz::resolver::{RoleResolver, DEFAULT_FALLBACK_IDENTITY};
use crate::authz::types::*;
use crate::authz::AuthzState;

/// Role given to authenticated identities that have no assignment.
pub const DEFAULT_ROLE: &str = "developer";

/// Load all `.kdl` policy files from the given directory and compile them
/// into a single immutable `AuthzState`.
pub fn load_policies(dir: &Path) -> Result<AuthzState, AuthzError> {
    if !dir.is_dir() {
        return Err(AuthzError::InvalidPolicy(format!(
            "policies directory `{}` does not exist or is not a directory",
            dir.display()
        )));
    }

    let mut all_parsed = Vec::new();

    // An unreadable entry aborts the load rather than yielding a partial policy
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "kdl") {
            paths.push(path);
        }
    }
    paths.sort();

    for path in paths {
        let contents =
            std::fs::read_to_string(&path).map_err(|source| AuthzError::PolicyLoadError {
                path: path.display().to_string(),
                source,
            })?;
        let parsed = parse_kdl_document(&contents)?;
        tracing::debug!(path = %path.display(), "Parsed policy file");
        all_parsed.push(parsed);
    }

    let file_count = all_parsed.len();
    let state = compile_policies(all_parsed)?;

    tracing::info!(
        files = file_count,
        identities = state.resolver.table().len(),
        template_roles = state.engine.templates().len(),
        default_role = %state.resolver.default_role(),
        "Loaded authorization policies"
    );

    Ok(state)
}

/// Merge and compile parsed policies into a single `AuthzState`.
///
/// Later `defaults` override earlier ones, `templates` for the same role are
/// merged, and an identity assigned to two different roles is rejected.
pub fn compile_policies(parsed: Vec<ParsedPolicy>) -> Result<AuthzState, AuthzError> {
    let mut fallback_identity = DEFAULT_FALLBACK_IDENTITY.to_string();
    let mut default_role = DEFAULT_ROLE.to_string();
    let mut roles = RoleTable::new();
    let mut templates = TemplateAccessTable::new();

    for p in parsed {
        if let Some(identity) = p.defaults.fallback_identity {
            fallback_identity = identity;
        }
        if let Some(role) = p.defaults.default_role {
            default_role = role;
        }
        for a in p.assignments {
            let role = Role::new(a.role);
            if let Some(existing) = roles.get(&a.identity) {
                if *existing != role {
                    return Err(AuthzError::ConflictingAssignment {
                        identity: a.identity,
                        first: existing.to_string(),
                        second: role.to_string(),
                    });
                }
                continue;
            }
            roles.insert(a.identity, role);
        }
        for t in p.templates {
            templates.extend(Role::new(t.role), t.patterns);
        }
    }

    let resolver = RoleResolver::new(roles, fallback_identity, Role::new(default_role));
    let engine = AccessDecisionEngine::new(templates);

    Ok(AuthzState { resolver, engine })
}

/// The policy used when no policy directory is configured.
pub fn builtin_policy() -> ParsedPolicy {
    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    ParsedPolicy {
        defaults: PolicyDefaults {
            fallback_identity: Some(DEFAULT_FALLBACK_IDENTITY.to_string()),
            default_role: Some(DEFAULT_ROLE.to_string()),
        },
        assignments: [
            ("user:default/guest", "guest"),
            ("user:default/shrinet82", "admin"),
            ("user:default/mad82-ops", "developer"),
        ]
        .iter()
        .map(|(identity, role)| RoleAssignment {
            identity: identity.to_string(),
            role: role.to_string(),
        })
        .collect(),
        templates: vec![
            TemplateGrant {
                role: "admin".into(),
                patterns: strings(&["*"]),
            },
            TemplateGrant {
                role: "infrastructure-team".into(),
                patterns: strings(&[
                    "create-aws-s3-bucket",
                    "deploy-aws-vpc",
                    "deploy-aws-rds",
                    "deploy-argocd-app",
                ]),
            },
            TemplateGrant {
                role: "developer".into(),
                patterns: strings(&[
                    "react-frontend",
                    "express-backend",
                    "flask-api",
                    "go-rest-service",
                    "springboot-rest-service",
                ]),
            },
            TemplateGrant {
                role: "guest".into(),
                patterns: Vec::new(),
            },
        ],
    }
}

/// Compile the built-in policy.
pub fn builtin_state() -> Result<AuthzState, AuthzError> {
    compile_policies(vec![builtin_policy()])
}

use crate::authz::errors::AuthzError;
use crate::authz::types::*;
use kdl::KdlDocument;

/// Parse a KDL document string into typed policy structs.
pub fn parse_kdl_document(source: &str) -> Result<ParsedPolicy, AuthzError> {
    let doc: KdlDocument = source
        .parse()
        .map_err(|e: kdl::KdlError| AuthzError::KdlParse(e.to_string()))?;

    let mut policy = ParsedPolicy::default();

    for node in doc.nodes() {
        match node.name().value() {
            "defaults" => {
                if let Some(value) = non_empty_property(node, "fallback-identity", "defaults")? {
                    policy.defaults.fallback_identity = Some(value);
                }
                if let Some(value) = non_empty_property(node, "default-role", "defaults")? {
                    policy.defaults.default_role = Some(value);
                }
            }
            "assign" => {
                let identity = first_string_arg(node)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        AuthzError::InvalidAssignment(
                            "assign node requires an identity argument (e.g. assign \"user:default/alice\" role=\"admin\")"
                                .into(),
                        )
                    })?;

                let role = node
                    .get("role")
                    .and_then(|v| v.as_string())
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        AuthzError::InvalidAssignment(format!(
                            "assignment for `{identity}` missing `role` property (e.g. role=\"developer\")"
                        ))
                    })?
                    .to_string();

                policy.assignments.push(RoleAssignment { identity, role });
            }
            "templates" => {
                let role = first_string_arg(node)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| {
                        AuthzError::InvalidTemplates(
                            "templates node requires a role argument (e.g. templates \"developer\" { ... })"
                                .into(),
                        )
                    })?;

                let patterns = pattern_list(node, &role)?;
                policy.templates.push(TemplateGrant { role, patterns });
            }
            other => {
                tracing::warn!("ignoring unknown top-level KDL node `{other}`");
            }
        }
    }

    Ok(policy)
}

/// Read an optional string property, rejecting empty and non-string values.
fn non_empty_property(
    node: &kdl::KdlNode,
    key: &str,
    context: &str,
) -> Result<Option<String>, AuthzError> {
    let Some(value) = node.get(key) else {
        return Ok(None);
    };
    match value.as_string() {
        Some("") => Err(AuthzError::InvalidPolicy(format!(
            "`{key}` in `{context}` must not be empty"
        ))),
        Some(s) => Ok(Some(s.to_string())),
        None => Err(AuthzError::InvalidPolicy(format!(
            "`{key}` in `{context}` must be a string, got `{value}`"
        ))),
    }
}

/// Extract the first string argument from a KDL node.
fn first_string_arg(node: &kdl::KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

/// Extract the patterns of a `templates` node. Every child must be a `-`
/// entry with exactly one non-empty string argument.
/// Example KDL:
/// ```kdl
/// templates "developer" {
///     - "react-frontend"
///     - "flask-api"
/// }
/// ```
fn pattern_list(node: &kdl::KdlNode, role: &str) -> Result<Vec<String>, AuthzError> {
    let Some(children) = node.children() else {
        return Ok(Vec::new());
    };

    let mut patterns = Vec::new();
    for child in children.nodes() {
        let name = child.name().value();
        if name != "-" {
            return Err(AuthzError::InvalidTemplates(format!(
                "unexpected child `{name}` in templates for `{role}` (expected `- \"pattern\"` entries)"
            )));
        }

        let pattern = match child.entries() {
            [entry] if entry.name().is_none() => entry.value().as_string(),
            _ => None,
        }
        .ok_or_else(|| {
            AuthzError::InvalidTemplates(format!(
                "each `-` entry in templates for `{role}` must have exactly one string pattern"
            ))
        })?;

        if pattern.is_empty() {
            return Err(AuthzError::InvalidTemplates(format!(
                "empty pattern in templates for `{role}` would match every template; use \"*\" instead"
            )));
        }
        patterns.push(pattern.to_string());
    }
    Ok(patterns)
}

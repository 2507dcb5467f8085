use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while loading and compiling policy files. Decisions
/// themselves never fail.
#[derive(Debug, Error, Diagnostic)]
pub enum AuthzError {
    #[error("Failed to load policy file `{path}`")]
    #[diagnostic(
        code(opsie_rbac::authz::policy_load),
        help("Check that the file exists and contains valid KDL syntax")
    )]
    PolicyLoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid policy: {0}")]
    #[diagnostic(
        code(opsie_rbac::authz::invalid_policy),
        help("Each policy file may contain `defaults`, `assign`, and `templates` KDL nodes")
    )]
    InvalidPolicy(String),

    #[error("Invalid assignment: {0}")]
    #[diagnostic(
        code(opsie_rbac::authz::invalid_assignment),
        help("Assignment syntax: assign \"user:default/name\" role=\"developer\"")
    )]
    InvalidAssignment(String),

    #[error("Identity `{identity}` is assigned to both `{first}` and `{second}`")]
    #[diagnostic(
        code(opsie_rbac::authz::conflicting_assignment),
        help("Each identity may map to a single role across all policy files")
    )]
    ConflictingAssignment {
        identity: String,
        first: String,
        second: String,
    },

    #[error("Invalid template access list: {0}")]
    #[diagnostic(
        code(opsie_rbac::authz::invalid_templates),
        help("Template list syntax: templates \"developer\" {{ - \"react-frontend\" }}; use \"*\" for all templates")
    )]
    InvalidTemplates(String),

    #[error("KDL parse error: {0}")]
    #[diagnostic(
        code(opsie_rbac::authz::kdl_parse),
        help("Check your KDL file syntax, see https://kdl.dev for the specification")
    )]
    KdlParse(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(opsie_rbac::authz::io))]
    Io(#[from] std::io::Error),
}

use opsie_rbac::authz::loader;
use opsie_rbac::authz::AuthzState;
use tempfile::TempDir;

/// Builder for a temporary directory of KDL policy files
pub struct PolicyDirBuilder {
    defaults: Option<(String, String)>,
    assignments: Vec<(String, String)>,
    templates: Vec<(String, Vec<String>)>,
}

impl PolicyDirBuilder {
    pub fn new() -> Self {
        Self {
            defaults: None,
            assignments: Vec::new(),
            templates: Vec::new(),
        }
    }

    /// The policy shipped with the portal, plus an infrastructure engineer.
    pub fn portal() -> Self {
        Self::new()
            .with_defaults("user:default/guest", "developer")
            .assign("user:default/guest", "guest")
            .assign("user:default/shrinet82", "admin")
            .assign("user:default/mad82-ops", "developer")
            .assign("user:default/ops-lead", "infrastructure-team")
            .templates("admin", &["*"])
            .templates(
                "infrastructure-team",
                &[
                    "create-aws-s3-bucket",
                    "deploy-aws-vpc",
                    "deploy-aws-rds",
                    "deploy-argocd-app",
                ],
            )
            .templates(
                "developer",
                &[
                    "react-frontend",
                    "express-backend",
                    "flask-api",
                    "go-rest-service",
                    "springboot-rest-service",
                ],
            )
            .templates("guest", &[])
    }

    pub fn with_defaults(mut self, fallback_identity: &str, default_role: &str) -> Self {
        self.defaults = Some((fallback_identity.to_string(), default_role.to_string()));
        self
    }

    pub fn assign(mut self, identity: &str, role: &str) -> Self {
        self.assignments
            .push((identity.to_string(), role.to_string()));
        self
    }

    pub fn templates(mut self, role: &str, patterns: &[&str]) -> Self {
        self.templates.push((
            role.to_string(),
            patterns.iter().map(|p| p.to_string()).collect(),
        ));
        self
    }

    /// Write roles and templates to separate files and return the directory.
    pub fn write(self) -> TempDir {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let mut roles = String::new();
        if let Some((fallback, default_role)) = &self.defaults {
            roles.push_str(&format!(
                "defaults fallback-identity=\"{fallback}\" default-role=\"{default_role}\"\n"
            ));
        }
        for (identity, role) in &self.assignments {
            roles.push_str(&format!("assign \"{identity}\" role=\"{role}\"\n"));
        }
        std::fs::write(dir.path().join("10-roles.kdl"), roles).expect("Failed to write roles");

        let mut templates = String::new();
        for (role, patterns) in &self.templates {
            if patterns.is_empty() {
                templates.push_str(&format!("templates \"{role}\"\n"));
                continue;
            }
            templates.push_str(&format!("templates \"{role}\" {{\n"));
            for pattern in patterns {
                templates.push_str(&format!("    - \"{pattern}\"\n"));
            }
            templates.push_str("}\n");
        }
        std::fs::write(dir.path().join("20-templates.kdl"), templates)
            .expect("Failed to write templates");

        dir
    }

    /// Write the files and load them.
    pub fn load(self) -> (TempDir, AuthzState) {
        let dir = self.write();
        let state = loader::load_policies(dir.path()).expect("Failed to load policies");
        (dir, state)
    }
}

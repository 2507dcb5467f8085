use miette::{IntoDiagnostic, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    pub server: Server,
    #[serde(default)]
    pub authz: Authz,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Authz {
    /// Directory of `.kdl` policy files. The built-in policy is used when unset.
    pub policies_dir: Option<PathBuf>,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7007,
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        Self::load_with_env_prefix(path, "OPSIE_RBAC")
    }

    fn load_with_env_prefix(path: &str, env_prefix: &str) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("server.host", Server::default().host)
            .into_diagnostic()?
            .set_default("server.port", Server::default().port)
            .into_diagnostic()?;

        // Optional file
        if Path::new(path).exists() {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment overrides: OPSIE_RBAC__SERVER__PORT=9090, etc.
        builder =
            builder.add_source(config::Environment::with_prefix(env_prefix).separator("__"));

        let cfg = builder.build().into_diagnostic()?;
        let mut s: Settings = cfg.try_deserialize().into_diagnostic()?;

        // Normalize policies dir to be relative to current dir
        if let Some(dir) = s.authz.policies_dir.take() {
            s.authz.policies_dir = Some(if dir.is_relative() {
                std::env::current_dir().into_diagnostic()?.join(dir)
            } else {
                dir
            });
        }

        Ok(s)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_settings_load_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nonexistent.toml");

        let settings = Settings::load(config_path.to_str().unwrap())
            .expect("Failed to load settings");

        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 7007);
        assert!(settings.authz.policies_dir.is_none());
    }

    #[test]
    fn test_settings_load_from_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("test_config.toml");

        let config_content = r#"
[server]
host = "127.0.0.1"
port = 9090

[authz]
policies_dir = "/etc/opsie/policies"
"#;
        fs::write(&config_path, config_content).expect("Failed to write config");

        let settings = Settings::load(config_path.to_str().unwrap())
            .expect("Failed to load settings");

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 9090);
        assert_eq!(
            settings.authz.policies_dir,
            Some(PathBuf::from("/etc/opsie/policies"))
        );
        assert_eq!(settings.listen_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn test_settings_env_override() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("test_config.toml");

        let config_content = r#"
[server]
host = "127.0.0.1"
port = 8080
"#;
        fs::write(&config_path, config_content).expect("Failed to write config");

        // A dedicated prefix keeps this from leaking into the other tests
        env::set_var("OPSIE_RBAC_ENVTEST__SERVER__PORT", "9999");

        let settings =
            Settings::load_with_env_prefix(config_path.to_str().unwrap(), "OPSIE_RBAC_ENVTEST")
                .expect("Failed to load settings");

        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 9999);

        env::remove_var("OPSIE_RBAC_ENVTEST__SERVER__PORT");
    }

    #[test]
    fn test_settings_policies_dir_normalization() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("test_config.toml");

        let config_content = r#"
[authz]
policies_dir = "relative/policies"
"#;
        fs::write(&config_path, config_content).expect("Failed to write config");

        let settings = Settings::load(config_path.to_str().unwrap())
            .expect("Failed to load settings");

        let dir = settings.authz.policies_dir.expect("policies_dir should be set");
        assert!(dir.is_absolute());
        assert!(dir.ends_with("relative/policies"));
    }
}

use birdie_shared::jwt::TokenVerifier;
use serde::Deserialize;
use std::{env, fs, path::Path};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub identity: IdentityConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    pub listen_port: Option<u16>,
    /// Emails that are created or promoted to ADMIN at startup.
    #[serde(default)]
    pub admins: Vec<String>,
}

/// Identity-provider settings used to verify bearer ID tokens.
/// Exactly one of `secret` (HS256) or `public_key_pem` (RS256) must be set.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub issuer: String,
    pub audience: String,
    pub secret: Option<String>,
    pub public_key_pem: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CorsMode {
    Release,
    #[default]
    Dev,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    #[serde(default)]
    pub mode: CorsMode,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Identity(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Yaml(e) => write!(f, "YAML error: {}", e),
            ConfigError::Identity(m) => write!(f, "identity config error: {}", m),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        ConfigError::Yaml(value)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
        Self::load_from_path(path)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(&path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = serde_yaml::from_str(text)?;
        cfg.identity.verifier()?;
        Ok(cfg)
    }
}

impl IdentityConfig {
    pub fn verifier(&self) -> Result<TokenVerifier, ConfigError> {
        match (&self.secret, &self.public_key_pem) {
            (Some(secret), None) => Ok(TokenVerifier::hs256(
                secret.as_bytes(),
                &self.issuer,
                &self.audience,
            )),
            (None, Some(pem)) => {
                TokenVerifier::rs256_pem(pem.as_bytes(), &self.issuer, &self.audience)
                    .map_err(|e| ConfigError::Identity(e.to_string()))
            }
            (Some(_), Some(_)) => Err(ConfigError::Identity(
                "set either secret or public_key_pem, not both".into(),
            )),
            (None, None) => Err(ConfigError::Identity(
                "one of secret or public_key_pem is required".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_config_with_defaults() {
        let cfg = AppConfig::from_yaml(
            r#"
identity:
  issuer: https://issuer.example
  audience: birdie
  secret: s3cret
"#,
        )
        .unwrap();
        assert_eq!(cfg.cors.mode, CorsMode::Dev);
        assert!(cfg.admins.is_empty());
        assert_eq!(cfg.listen_port, None);
    }

    #[test]
    fn parses_release_cors_and_admins() {
        let cfg = AppConfig::from_yaml(
            r#"
identity:
  issuer: https://issuer.example
  audience: birdie
  secret: s3cret
cors:
  mode: release
  allowed_origins: ["https://app.example"]
listen_port: 9000
admins: ["head@example.com"]
"#,
        )
        .unwrap();
        assert_eq!(cfg.cors.mode, CorsMode::Release);
        assert_eq!(cfg.cors.allowed_origins, vec!["https://app.example"]);
        assert_eq!(cfg.listen_port, Some(9000));
        assert_eq!(cfg.admins, vec!["head@example.com"]);
    }

    #[test]
    fn rejects_missing_or_ambiguous_keys() {
        let none = "identity:\n  issuer: i\n  audience: a\n";
        assert!(matches!(
            AppConfig::from_yaml(none),
            Err(ConfigError::Identity(_))
        ));
        let both = "identity:\n  issuer: i\n  audience: a\n  secret: s\n  public_key_pem: p\n";
        assert!(matches!(
            AppConfig::from_yaml(both),
            Err(ConfigError::Identity(_))
        ));
        let bad_pem = "identity:\n  issuer: i\n  audience: a\n  public_key_pem: nope\n";
        assert!(matches!(
            AppConfig::from_yaml(bad_pem),
            Err(ConfigError::Identity(_))
        ));
    }
}

//! Configuration resolution.
//!
//! A [`Settings`] value is built once per invocation and passed into every
//! client constructor; nothing reads credentials or endpoints from globals.
//! Precedence, highest first: CLI flags, config file, environment variables,
//! built-in default (the translator URL only).

use crate::error::{RefsyncError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default endpoint of a locally running Zotero translation server.
pub const DEFAULT_TRANSLATOR_URL: &str = "http://127.0.0.1:1969";

/// Keys accepted in the TOML config file. All optional.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub readwise_token: Option<String>,
    pub zotero_api_key: Option<String>,
    pub zotero_user_id: Option<String>,
    pub translator_url: Option<String>,
    pub verify_ssl: Option<bool>,
}

/// Credential values captured from the process environment.
#[derive(Debug, Default)]
pub struct EnvCredentials {
    pub readwise_token: Option<String>,
    pub zotero_api_key: Option<String>,
    pub zotero_user_id: Option<String>,
}

impl EnvCredentials {
    /// Read `READWISE_API_TOKEN`, `ZOTERO_API_KEY`, and `ZOTERO_USER_ID`.
    pub fn capture() -> Self {
        Self {
            readwise_token: non_empty_var("READWISE_API_TOKEN"),
            zotero_api_key: non_empty_var("ZOTERO_API_KEY"),
            zotero_user_id: non_empty_var("ZOTERO_USER_ID"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// CLI-level overrides. Highest precedence.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub readwise_token: Option<String>,
    pub zotero_api_key: Option<String>,
    pub zotero_user_id: Option<String>,
    pub translator_url: Option<String>,
    pub no_ssl_verify: bool,
}

/// Fully resolved configuration, read-only after construction.
///
/// Credentials stay optional here because the `cite` pipeline runs without
/// them; [`Settings::sync_credentials`] enforces the ones `sync` needs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub readwise_token: Option<String>,
    pub zotero_api_key: Option<String>,
    pub zotero_user_id: Option<String>,
    pub translator_url: String,
    pub verify_ssl: bool,
}

/// The three credentials the sync pipeline requires.
#[derive(Debug, Clone)]
pub struct SyncCredentials {
    pub readwise_token: String,
    pub zotero_api_key: String,
    pub zotero_user_id: String,
}

/// Conventional config file location: `<config_dir>/refsync/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("refsync").join("config.toml"))
}

impl Settings {
    /// Resolve settings from the config file (explicit path or the
    /// conventional one), the environment, and CLI overrides.
    ///
    /// An explicitly given config path must exist and parse; the conventional
    /// path is only loaded if present.
    pub fn resolve(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let file = match config_path {
            Some(path) => load_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => load_file(&path)?,
                _ => ConfigFile::default(),
            },
        };
        Ok(merge(file, EnvCredentials::capture(), overrides))
    }

    /// Require the credentials the sync pipeline needs, naming every missing
    /// one in the error.
    pub fn sync_credentials(&self) -> Result<SyncCredentials> {
        let mut missing = Vec::new();
        if self.readwise_token.is_none() {
            missing.push("READWISE_API_TOKEN");
        }
        if self.zotero_api_key.is_none() {
            missing.push("ZOTERO_API_KEY");
        }
        if self.zotero_user_id.is_none() {
            missing.push("ZOTERO_USER_ID");
        }
        if !missing.is_empty() {
            return Err(RefsyncError::Config(format!(
                "missing credentials: set {} (environment, config file, or flags)",
                missing.join(", ")
            )));
        }
        Ok(SyncCredentials {
            readwise_token: self.readwise_token.clone().unwrap_or_default(),
            zotero_api_key: self.zotero_api_key.clone().unwrap_or_default(),
            zotero_user_id: self.zotero_user_id.clone().unwrap_or_default(),
        })
    }
}

fn load_file(path: &Path) -> Result<ConfigFile> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| RefsyncError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    toml::from_str(&text)
        .map_err(|e| RefsyncError::Config(format!("invalid config file {}: {}", path.display(), e)))
}

/// Pure precedence merge, kept free of process state so it is testable.
pub fn merge(file: ConfigFile, env: EnvCredentials, overrides: &Overrides) -> Settings {
    Settings {
        readwise_token: overrides
            .readwise_token
            .clone()
            .or(file.readwise_token)
            .or(env.readwise_token),
        zotero_api_key: overrides
            .zotero_api_key
            .clone()
            .or(file.zotero_api_key)
            .or(env.zotero_api_key),
        zotero_user_id: overrides
            .zotero_user_id
            .clone()
            .or(file.zotero_user_id)
            .or(env.zotero_user_id),
        translator_url: overrides
            .translator_url
            .clone()
            .or(file.translator_url)
            .unwrap_or_else(|| DEFAULT_TRANSLATOR_URL.to_string()),
        verify_ssl: if overrides.no_ssl_verify {
            false
        } else {
            file.verify_ssl.unwrap_or(true)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(token: Option<&str>, key: Option<&str>, user: Option<&str>) -> EnvCredentials {
        EnvCredentials {
            readwise_token: token.map(String::from),
            zotero_api_key: key.map(String::from),
            zotero_user_id: user.map(String::from),
        }
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let settings = merge(
            ConfigFile::default(),
            EnvCredentials::default(),
            &Overrides::default(),
        );
        assert_eq!(settings.translator_url, DEFAULT_TRANSLATOR_URL);
        assert!(settings.verify_ssl);
        assert!(settings.readwise_token.is_none());
    }

    #[test]
    fn test_file_overrides_env() {
        let file = ConfigFile {
            readwise_token: Some("from-file".to_string()),
            ..Default::default()
        };
        let settings = merge(file, env(Some("from-env"), None, None), &Overrides::default());
        assert_eq!(settings.readwise_token.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_cli_overrides_file_and_env() {
        let file = ConfigFile {
            readwise_token: Some("from-file".to_string()),
            translator_url: Some("http://filehost:1969".to_string()),
            ..Default::default()
        };
        let overrides = Overrides {
            readwise_token: Some("from-cli".to_string()),
            translator_url: Some("http://clihost:1969".to_string()),
            ..Default::default()
        };
        let settings = merge(file, env(Some("from-env"), None, None), &overrides);
        assert_eq!(settings.readwise_token.as_deref(), Some("from-cli"));
        assert_eq!(settings.translator_url, "http://clihost:1969");
    }

    #[test]
    fn test_env_fills_gaps() {
        let settings = merge(
            ConfigFile::default(),
            env(Some("t"), Some("k"), Some("u")),
            &Overrides::default(),
        );
        let creds = settings.sync_credentials().unwrap();
        assert_eq!(creds.readwise_token, "t");
        assert_eq!(creds.zotero_api_key, "k");
        assert_eq!(creds.zotero_user_id, "u");
    }

    #[test]
    fn test_no_ssl_verify_flag_wins() {
        let file = ConfigFile {
            verify_ssl: Some(true),
            ..Default::default()
        };
        let overrides = Overrides {
            no_ssl_verify: true,
            ..Default::default()
        };
        let settings = merge(file, EnvCredentials::default(), &overrides);
        assert!(!settings.verify_ssl);
    }

    #[test]
    fn test_sync_credentials_names_missing_keys() {
        let settings = merge(
            ConfigFile::default(),
            env(Some("t"), None, None),
            &Overrides::default(),
        );
        let err = settings.sync_credentials().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ZOTERO_API_KEY"));
        assert!(msg.contains("ZOTERO_USER_ID"));
        assert!(!msg.contains("READWISE_API_TOKEN"));
    }

    #[test]
    fn test_load_file_parses_toml() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "readwise_token = \"abc\"\ntranslator_url = \"http://translate:1969\"\nverify_ssl = false"
        )
        .unwrap();
        let settings = Settings::resolve(Some(f.path()), &Overrides::default()).unwrap();
        assert_eq!(settings.readwise_token.as_deref(), Some("abc"));
        assert_eq!(settings.translator_url, "http://translate:1969");
        assert!(!settings.verify_ssl);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let err = Settings::resolve(
            Some(Path::new("/nonexistent/refsync.toml")),
            &Overrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RefsyncError::Config(_)));
    }
}

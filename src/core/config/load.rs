//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies the `SERVICE_*` / `LLM_*` env overrides.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::bootstrap::logger::parse_level;
use crate::core::error::AppError;
use crate::llm::{DEFAULT_TEMPERATURE, Profile};

use super::raw::{RawConfig, RawProfile};
use super::types::*;

/// Deep-merge two TOML values.
/// Tables are merged recursively, so the overlay only needs to specify keys that
/// differ from the base. For every other type (string, integer, array, …)
/// the overlay value replaces the base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow any `[meta] base = "..."` chain, and return the
/// fully merged `toml::Value`. `visited` carries canonicalized paths already
/// seen in this chain so circular references are caught early.
fn load_raw_merged(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    if let Some(base_str) = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
    {
        let base_path = if Path::new(base_str).is_absolute() {
            PathBuf::from(base_str)
        } else {
            path.parent().unwrap_or(Path::new(".")).join(base_str)
        };
        let base_val = load_raw_merged(&base_path, visited)?;
        Ok(merge_toml(base_val, overlay_val))
    } else {
        Ok(overlay_val)
    }
}

impl EnvOverrides {
    /// Collect overrides from the process environment.
    pub fn from_env() -> Result<Self, AppError> {
        let timeout_seconds = match env::var("LLM_TIMEOUT_SECONDS").ok() {
            Some(s) => Some(s.trim().parse::<u64>().map_err(|e| {
                AppError::Config(format!("LLM_TIMEOUT_SECONDS must be an integer: {e}"))
            })?),
            None => None,
        };
        Ok(Self {
            log_level: env::var("SERVICE_LOG_LEVEL").ok(),
            default_provider: env::var("LLM_DEFAULT_PROVIDER").ok(),
            timeout_seconds,
            lm_studio_url: env::var("LLM_LM_STUDIO_URL").ok(),
            azure_openai_endpoint: env::var("LLM_AZURE_OPENAI_ENDPOINT").ok(),
            azure_openai_deployment: env::var("LLM_AZURE_OPENAI_DEPLOYMENT").ok(),
            azure_openai_api_key: env::var("LLM_AZURE_OPENAI_API_KEY").ok(),
        })
    }
}

/// Load config from the given path, or `config/default.toml`, then apply env-var overrides.
/// If no path is given and `config/default.toml` does not exist, the built-in defaults are used.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let overrides = EnvOverrides::from_env()?;

    if let Some(path) = config_path {
        return load_from(Path::new(path), &overrides);
    }

    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        load_from(default_path, &overrides)
    } else {
        resolve(RawConfig::default(), &overrides)
    }
}

/// Internal loader. Accepts an explicit path and pre-collected overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(path: &Path, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let mut visited = HashSet::new();
    let merged = load_raw_merged(path, &mut visited)?;
    let parsed = RawConfig::deserialize(merged)
        .map_err(|e| AppError::Config(format!("invalid config in {}: {e}", path.display())))?;
    resolve(parsed, overrides)
}

fn resolve(parsed: RawConfig, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let s = parsed.service;
    let l = parsed.llm;

    let timeout_seconds = overrides.timeout_seconds.unwrap_or(l.timeout_seconds);
    if timeout_seconds == 0 {
        return Err(AppError::Config("llm.timeout_seconds must be greater than zero".into()));
    }
    let timeout = Duration::from_secs(timeout_seconds);

    let default_provider = overrides.default_provider.clone().unwrap_or(l.provider);
    let profile = resolve_profile(parsed.profile, &default_provider)?;

    let log_level = overrides.log_level.clone().unwrap_or(s.log_level);
    check_log_level(&log_level)?;

    Ok(Config {
        service: ServiceConfig {
            name: s.name,
            version: s.version,
            environment: s.environment,
            log_level,
            log_file: s.log_file.as_deref().map(expand_home),
        },
        llm: LlmConfig {
            default_provider,
            timeout,
            health_check_interval: Duration::from_secs(l.health_check_interval_seconds.max(1)),
            lm_studio: LocalInferenceConfig {
                enabled: l.lm_studio.enabled,
                base_url: overrides.lm_studio_url.clone().unwrap_or(l.lm_studio.url),
                timeout,
            },
            azure_openai: HostedConfig {
                enabled: l.azure_openai.enabled,
                endpoint: overrides
                    .azure_openai_endpoint
                    .clone()
                    .unwrap_or(l.azure_openai.endpoint),
                api_key: overrides.azure_openai_api_key.clone(),
                deployment: overrides
                    .azure_openai_deployment
                    .clone()
                    .unwrap_or(l.azure_openai.deployment),
                api_version: l.azure_openai.api_version,
                timeout,
            },
            dummy: DummyConfig { enabled: l.dummy.enabled },
        },
        profile,
    })
}

/// Accept a plain level or a comma-separated `EnvFilter` directive list.
/// A bare word must be a known level: the filter would otherwise read it as
/// a target name and silence everything else.
fn check_log_level(level: &str) -> Result<(), AppError> {
    let directives: Vec<&str> = level
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect();
    if directives.is_empty() {
        return Err(AppError::Config("service.log_level must not be empty".into()));
    }
    for directive in directives.into_iter().filter(|d| !d.contains('=')) {
        parse_level(directive).map_err(|e| AppError::Config(format!("service.log_level: {e}")))?;
    }
    Ok(())
}

fn resolve_profile(raw: RawProfile, default_provider: &str) -> Result<Profile, AppError> {
    let temperature = match raw.temperature {
        None => DEFAULT_TEMPERATURE,
        Some(toml::Value::Float(f)) => f as f32,
        Some(toml::Value::Integer(i)) => i as f32,
        Some(toml::Value::String(s)) => Profile::parse_temperature(&s)
            .map_err(|e| AppError::Config(format!("profile.temperature: {e}")))?,
        Some(other) => {
            return Err(AppError::Config(format!(
                "profile.temperature must be a number, got {}",
                other.type_str()
            )));
        }
    };

    let profile = Profile {
        provider_name: raw.provider.unwrap_or_else(|| default_provider.to_string()),
        model: raw.model.filter(|m| !m.trim().is_empty()),
        temperature,
        max_tokens: raw.max_tokens,
        system_instructions: raw.system_instructions,
    };
    profile
        .validate()
        .map_err(|e| AppError::Config(format!("profile: {e}")))?;
    Ok(profile)
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_TOML: &str = r#"
[service]
name = "test-service"
log_level = "info"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parse_minimal_config_fills_defaults() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.service.name, "test-service");
        assert_eq!(cfg.service.environment, "development");
        assert_eq!(cfg.llm.default_provider, "lm_studio");
        assert_eq!(cfg.llm.timeout, Duration::from_secs(30));
        assert_eq!(cfg.llm.lm_studio.base_url, "http://localhost:3001");
        assert!(cfg.llm.azure_openai.enabled);
        assert_eq!(cfg.llm.azure_openai.api_version, "2023-05-15");
        assert!(cfg.llm.azure_openai.api_key.is_none());
        assert!(!cfg.llm.dummy.enabled);
        assert_eq!(cfg.profile.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(cfg.profile.max_tokens, 1000);
    }

    #[test]
    fn uniform_timeout_applies_to_every_provider() {
        let f = write_toml("[llm]\ntimeout_seconds = 12\n");
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.llm.lm_studio.timeout, Duration::from_secs(12));
        assert_eq!(cfg.llm.azure_openai.timeout, Duration::from_secs(12));
    }

    #[test]
    fn zero_timeout_rejected() {
        let f = write_toml("[llm]\ntimeout_seconds = 0\n");
        let err = load_from(f.path(), &EnvOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn env_overrides_win_over_file() {
        let f = write_toml(
            r#"
[llm]
default = "lm_studio"

[llm.lm_studio]
url = "http://file:1"

[llm.azure_openai]
endpoint = "https://file.example"
deployment = "file-deploy"
"#,
        );
        let overrides = EnvOverrides {
            log_level: Some("debug".into()),
            default_provider: Some("azure_openai".into()),
            timeout_seconds: Some(5),
            lm_studio_url: Some("http://env:2".into()),
            azure_openai_endpoint: Some("https://env.example".into()),
            azure_openai_deployment: Some("env-deploy".into()),
            azure_openai_api_key: Some("secret".into()),
        };
        let cfg = load_from(f.path(), &overrides).unwrap();
        assert_eq!(cfg.service.log_level, "debug");
        assert_eq!(cfg.llm.default_provider, "azure_openai");
        assert_eq!(cfg.profile.provider_name, "azure_openai");
        assert_eq!(cfg.llm.timeout, Duration::from_secs(5));
        assert_eq!(cfg.llm.lm_studio.base_url, "http://env:2");
        assert_eq!(cfg.llm.azure_openai.endpoint, "https://env.example");
        assert_eq!(cfg.llm.azure_openai.deployment, "env-deploy");
        assert_eq!(cfg.llm.azure_openai.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn unknown_log_level_rejected() {
        let f = write_toml("[service]\nlog_level = \"verbose\"\n");
        let err = load_from(f.path(), &EnvOverrides::default()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
        assert!(err.to_string().contains("verbose"));

        let f = write_toml(MINIMAL_TOML);
        let overrides = EnvOverrides { log_level: Some("loud".into()), ..Default::default() };
        assert!(load_from(f.path(), &overrides).is_err());
    }

    #[test]
    fn log_level_accepts_filter_directives() {
        let f = write_toml("[service]\nlog_level = \"warn,chatbot_service=debug\"\n");
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.service.log_level, "warn,chatbot_service=debug");
    }

    #[test]
    fn api_key_in_toml_is_ignored() {
        let f = write_toml("[llm.azure_openai]\napi_key = \"leaked\"\n");
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert!(cfg.llm.azure_openai.api_key.is_none());
    }

    #[test]
    fn profile_temperature_accepts_text_and_numbers() {
        let f = write_toml("[profile]\ntemperature = \"0.3\"\n");
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.profile.temperature, 0.3);

        let f = write_toml("[profile]\ntemperature = 1\n");
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.profile.temperature, 1.0);
    }

    #[test]
    fn explicit_profile_provider_beats_default() {
        let f = write_toml("[llm]\ndefault = \"lm_studio\"\n\n[profile]\nprovider = \"dummy\"\n");
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.llm.default_provider, "lm_studio");
        assert_eq!(cfg.profile.provider_name, "dummy");
    }

    #[test]
    fn invalid_profile_rejected() {
        let f = write_toml("[profile]\nmax_tokens = 0\n");
        let err = load_from(f.path(), &EnvOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("profile"));

        let f = write_toml("[profile]\ntemperature = \"warm\"\n");
        assert!(load_from(f.path(), &EnvOverrides::default()).is_err());
    }

    #[test]
    fn base_chain_merges_tables() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.toml");
        fs::write(&base, "[llm]\ntimeout_seconds = 9\n\n[llm.dummy]\nenabled = true\n").unwrap();
        let child = dir.path().join("child.toml");
        fs::write(&child, "[meta]\nbase = \"base.toml\"\n\n[llm]\ndefault = \"dummy\"\n").unwrap();

        let cfg = load_from(&child, &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.llm.default_provider, "dummy");
        assert_eq!(cfg.llm.timeout, Duration::from_secs(9));
        assert!(cfg.llm.dummy.enabled);
    }

    #[test]
    fn circular_base_detected() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.toml");
        let b = dir.path().join("b.toml");
        fs::write(&a, "[meta]\nbase = \"b.toml\"\n").unwrap();
        fs::write(&b, "[meta]\nbase = \"a.toml\"\n").unwrap();

        let err = load_from(&a, &EnvOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("circular"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), &EnvOverrides::default());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn log_file_tilde_expands() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let f = write_toml("[service]\nlog_file = \"~/chatbot.log\"\n");
        let cfg = load_from(f.path(), &EnvOverrides::default()).unwrap();
        let log_file = cfg.service.log_file.unwrap();
        assert!(log_file.starts_with(&home));
        assert!(log_file.ends_with("chatbot.log"));
    }

    #[test]
    fn absolute_path_unchanged() {
        assert_eq!(expand_home("/absolute/path"), PathBuf::from("/absolute/path"));
    }
}

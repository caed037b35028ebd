//! Configuration module for ovh-reconciler
//!
//! This module handles loading and validating configuration from a TOML
//! file, environment variables and command-line flags.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::constants::{
    DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS, ENV_APPLICATION_KEY, ENV_APPLICATION_SECRET,
    ENV_CONSUMER_KEY, ENV_DNS_ZONE, ENV_ENDPOINT, ENV_INPUT, MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS,
    OVH_CA_API_BASE, OVH_EU_API_BASE, OVH_US_API_BASE,
};
use crate::ovh::OvhCredentials;
use crate::validation::validate_zone_name;

//==============================================================================
// Endpoint
//==============================================================================

/// OVH API region, or an explicit base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    OvhEu,
    OvhCa,
    OvhUs,
    Custom(String),
}

impl Endpoint {
    pub fn base_url(&self) -> &str {
        match self {
            Self::OvhEu => OVH_EU_API_BASE,
            Self::OvhCa => OVH_CA_API_BASE,
            Self::OvhUs => OVH_US_API_BASE,
            Self::Custom(url) => url,
        }
    }
}

/// Parses an endpoint name into an `Endpoint`
///
/// Accepted values:
/// - `OvhEu`: "ovh-eu", "eu"
/// - `OvhCa`: "ovh-ca", "ca"
/// - `OvhUs`: "ovh-us", "us"
/// - `Custom`: any `http://` or `https://` URL
pub fn parse_endpoint(value: &str) -> Result<Endpoint> {
    let trimmed = value.trim();
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        return Ok(Endpoint::Custom(trimmed.trim_end_matches('/').to_string()));
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "ovh-eu" | "eu" => Ok(Endpoint::OvhEu),
        "ovh-ca" | "ca" => Ok(Endpoint::OvhCa),
        "ovh-us" | "us" => Ok(Endpoint::OvhUs),
        _ => Err(anyhow::anyhow!(
            "Invalid endpoint: '{}'. Use: ovh-eu|ovh-ca|ovh-us|<url>",
            value
        )),
    }
}

//==============================================================================
// Config
//==============================================================================

/// Configuration for one reconciliation run
///
/// Secrets are wrapped in `Zeroizing` so they are wiped from memory when
/// the config is dropped.
///
/// # Configuration Loading Priority
///
/// 1. Command-line flags (highest priority)
/// 2. Environment variables
/// 3. Config file (`--config <path>`)
/// 4. Defaults (lowest priority)
#[derive(Clone, ZeroizeOnDrop)]
pub struct Config {
    /// Path of the desired-state record file
    #[zeroize(skip)]
    pub input: PathBuf,
    /// OVH application key
    #[zeroize(skip)]
    pub application_key: String,
    /// OVH application secret
    #[zeroize(skip)]
    pub application_secret: Zeroizing<String>,
    /// OVH consumer key granted on `/domain/zone/<zone>/*`
    #[zeroize(skip)]
    pub consumer_key: Zeroizing<String>,
    /// Zone to reconcile, lowercase without trailing dot
    #[zeroize(skip)]
    pub dns_zone: String,
    /// API endpoint
    ///
    /// Default: `ovh-eu`
    #[zeroize(skip)]
    pub endpoint: Endpoint,
    /// HTTP request timeout
    ///
    /// Default: 30 seconds
    #[zeroize(skip)]
    pub timeout: Duration,
    /// Enable debug logging
    #[zeroize(skip)]
    pub verbose: bool,
    /// Compute and print the plan without changing the zone
    #[zeroize(skip)]
    pub dry_run: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("input", &self.input)
            .field("application_key", &self.application_key)
            .field("application_secret", &"***")
            .field("consumer_key", &"***")
            .field("dns_zone", &self.dns_zone)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("verbose", &self.verbose)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

/// Command-line overrides
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Overrides {
    /// Desired-state record file
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// OVH application key
    #[arg(long = "application_key")]
    pub application_key: Option<String>,
    /// OVH application secret
    #[arg(long = "application_secret")]
    pub application_secret: Option<String>,
    /// OVH consumer key
    #[arg(long = "consumer_key")]
    pub consumer_key: Option<String>,
    /// DNS zone to reconcile, e.g. example.com
    #[arg(long = "dns_zone")]
    pub dns_zone: Option<String>,
    /// API endpoint: ovh-eu, ovh-ca, ovh-us or a base URL
    #[arg(long)]
    pub endpoint: Option<String>,
    /// HTTP request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Increases the amount of information printed on the standard output
    #[arg(short, long)]
    pub verbose: bool,
    /// Print the plan without changing the zone
    #[arg(long = "dry_run")]
    pub dry_run: bool,
}

impl Config {
    /// Loads configuration from file, environment variables and flags
    ///
    /// # Environment Variables
    ///
    /// - `OVH_APPLICATION_KEY`
    /// - `OVH_APPLICATION_SECRET`
    /// - `OVH_CONSUMER_KEY`
    /// - `OVH_DNS_ZONE`
    /// - `OVH_ENDPOINT`
    /// - `OVH_RECONCILER_INPUT`
    pub fn load(config_path: Option<PathBuf>, overrides: &Overrides) -> Result<Self> {
        let mut config = Self::load_from_file(config_path)?;
        Self::override_with_env(&mut config)?;
        Self::override_with_flags(&mut config, overrides)?;
        config.dns_zone = normalize_zone(&config.dns_zone);
        Self::validate(&config)?;
        Ok(config)
    }

    /// Loads configuration from a TOML file
    ///
    /// A missing file yields the defaults.
    fn load_from_file(config_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self {
            input: PathBuf::new(),
            application_key: String::new(),
            application_secret: Zeroizing::new(String::new()),
            consumer_key: Zeroizing::new(String::new()),
            dns_zone: String::new(),
            endpoint: parse_endpoint(DEFAULT_ENDPOINT)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            verbose: false,
            dry_run: false,
        };

        let Some(path) = config_path else {
            return Ok(config);
        };
        if !path.exists() {
            return Ok(config);
        }

        let content = Zeroizing::new(
            std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?,
        );
        let toml_config: TomlConfig =
            toml::from_str(&content).with_context(|| "Failed to parse config file")?;

        if let Some(v) = toml_config.input {
            config.input = v;
        }
        if let Some(v) = toml_config.application_key {
            config.application_key = v;
        }
        if let Some(v) = toml_config.application_secret {
            config.application_secret = v;
        }
        if let Some(v) = toml_config.consumer_key {
            config.consumer_key = v;
        }
        if let Some(v) = toml_config.dns_zone {
            config.dns_zone = v;
        }
        if let Some(v) = toml_config.endpoint.as_deref() {
            config.endpoint = parse_endpoint(v)?;
        }
        if let Some(v) = toml_config.timeout {
            config.timeout = Duration::from_secs(v);
        }
        config.verbose = toml_config.verbose.unwrap_or(false);
        config.dry_run = toml_config.dry_run.unwrap_or(false);

        Ok(config)
    }

    /// Overrides configuration values with environment variables
    ///
    /// Empty variables are ignored.
    fn override_with_env(config: &mut Self) -> Result<()> {
        if let Some(v) = non_empty_env(ENV_INPUT) {
            config.input = PathBuf::from(v);
        }
        if let Some(v) = non_empty_env(ENV_APPLICATION_KEY) {
            config.application_key = v;
        }
        if let Some(v) = non_empty_env(ENV_APPLICATION_SECRET) {
            config.application_secret = Zeroizing::new(v);
        }
        if let Some(v) = non_empty_env(ENV_CONSUMER_KEY) {
            config.consumer_key = Zeroizing::new(v);
        }
        if let Some(v) = non_empty_env(ENV_DNS_ZONE) {
            config.dns_zone = v;
        }
        if let Some(v) = non_empty_env(ENV_ENDPOINT) {
            config.endpoint = parse_endpoint(&v).context("Invalid OVH_ENDPOINT value")?;
        }
        Ok(())
    }

    /// Overrides configuration values with command-line flags
    fn override_with_flags(config: &mut Self, overrides: &Overrides) -> Result<()> {
        if let Some(v) = &overrides.input {
            config.input = v.clone();
        }
        if let Some(v) = &overrides.application_key {
            config.application_key = v.clone();
        }
        if let Some(v) = &overrides.application_secret {
            config.application_secret = Zeroizing::new(v.clone());
        }
        if let Some(v) = &overrides.consumer_key {
            config.consumer_key = Zeroizing::new(v.clone());
        }
        if let Some(v) = &overrides.dns_zone {
            config.dns_zone = v.clone();
        }
        if let Some(v) = &overrides.endpoint {
            config.endpoint = parse_endpoint(v).context("Invalid --endpoint value")?;
        }
        if let Some(v) = overrides.timeout {
            config.timeout = Duration::from_secs(v);
        }
        config.verbose |= overrides.verbose;
        config.dry_run |= overrides.dry_run;
        Ok(())
    }

    /// Validates the configuration
    ///
    /// Returns an error if:
    /// - A credential is missing or not alphanumeric
    /// - The zone is missing or not a valid DNS name
    /// - The input path is missing
    /// - Timeout is out of valid range
    fn validate(&self) -> Result<()> {
        for (value, var) in [
            (self.application_key.as_str(), ENV_APPLICATION_KEY),
            (self.application_secret.as_str(), ENV_APPLICATION_SECRET),
            (self.consumer_key.as_str(), ENV_CONSUMER_KEY),
        ] {
            if value.is_empty() {
                return Err(anyhow::anyhow!("Missing {}", var));
            }
            if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(anyhow::anyhow!("{} must be alphanumeric", var));
            }
        }

        if self.dns_zone.is_empty() {
            return Err(anyhow::anyhow!("Missing {}", ENV_DNS_ZONE));
        }
        validate_zone_name(&self.dns_zone)
            .with_context(|| format!("Invalid {}: {}", ENV_DNS_ZONE, self.dns_zone))?;

        if self.input.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("Missing {} (or --input)", ENV_INPUT));
        }

        let timeout_secs = self.timeout.as_secs();
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&timeout_secs) {
            return Err(anyhow::anyhow!(
                "timeout must be between {} and {} seconds, got {}",
                MIN_TIMEOUT_SECS,
                MAX_TIMEOUT_SECS,
                timeout_secs
            ));
        }

        Ok(())
    }

    /// Credentials for the API client
    pub fn credentials(&self) -> OvhCredentials {
        OvhCredentials {
            application_key: self.application_key.clone(),
            application_secret: self.application_secret.clone(),
            consumer_key: self.consumer_key.clone(),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

/// Lowercases a zone name and strips its trailing dot
pub fn normalize_zone(zone: &str) -> String {
    let trimmed = zone.trim();
    trimmed
        .strip_suffix('.')
        .unwrap_or(trimmed)
        .to_ascii_lowercase()
}

/// TOML configuration file structure
#[derive(serde::Deserialize)]
struct TomlConfig {
    input: Option<PathBuf>,
    application_key: Option<String>,
    application_secret: Option<Zeroizing<String>>,
    consumer_key: Option<Zeroizing<String>>,
    dns_zone: Option<String>,
    endpoint: Option<String>,
    timeout: Option<u64>,
    verbose: Option<bool>,
    dry_run: Option<bool>,
}

//==============================================================================
// Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    struct EnvGuard {
        saved: Vec<(&'static str, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            let keys = [
                ENV_APPLICATION_KEY,
                ENV_APPLICATION_SECRET,
                ENV_CONSUMER_KEY,
                ENV_DNS_ZONE,
                ENV_ENDPOINT,
                ENV_INPUT,
            ];
            let mut saved = Vec::with_capacity(keys.len());
            for key in keys {
                saved.push((key, std::env::var(key).ok()));
                std::env::remove_var(key);
            }
            Self { saved }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.saved.drain(..) {
                if let Some(val) = value {
                    std::env::set_var(key, val);
                } else {
                    std::env::remove_var(key);
                }
            }
        }
    }

    fn write_config(contents: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).expect("write config");
        (dir, path)
    }

    const VALID: &str = r#"
input = "zone.txt"
application_key = "appkey123"
application_secret = "appsecret456"
consumer_key = "consumer789"
dns_zone = "dodges.it"
"#;

    #[test]
    #[serial]
    fn config_load_from_file() {
        let _env = EnvGuard::new();
        let (_dir, path) = write_config(&format!(
            "{VALID}endpoint = \"ovh-ca\"\ntimeout = 45\nverbose = true\ndry_run = true\n"
        ));

        let cfg = Config::load(Some(path), &Overrides::default()).expect("config load");
        assert_eq!(cfg.input, PathBuf::from("zone.txt"));
        assert_eq!(cfg.application_key, "appkey123");
        assert_eq!(cfg.application_secret.as_str(), "appsecret456");
        assert_eq!(cfg.consumer_key.as_str(), "consumer789");
        assert_eq!(cfg.dns_zone, "dodges.it");
        assert_eq!(cfg.endpoint, Endpoint::OvhCa);
        assert_eq!(cfg.timeout, Duration::from_secs(45));
        assert!(cfg.verbose);
        assert!(cfg.dry_run);
    }

    #[test]
    #[serial]
    fn config_defaults() {
        let _env = EnvGuard::new();
        let (_dir, path) = write_config(VALID);
        let cfg = Config::load(Some(path), &Overrides::default()).expect("config load");
        assert_eq!(cfg.endpoint, Endpoint::OvhEu);
        assert_eq!(cfg.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(!cfg.verbose);
        assert!(!cfg.dry_run);
    }

    #[test]
    #[serial]
    fn config_env_overrides_file() {
        let _env = EnvGuard::new();
        let (_dir, path) = write_config(VALID);

        std::env::set_var(ENV_APPLICATION_KEY, "envkey");
        std::env::set_var(ENV_DNS_ZONE, "example.com");
        std::env::set_var(ENV_ENDPOINT, "https://api.example.test/1.0/");

        let cfg = Config::load(Some(path), &Overrides::default()).expect("config load");
        assert_eq!(cfg.application_key, "envkey");
        assert_eq!(cfg.application_secret.as_str(), "appsecret456");
        assert_eq!(cfg.dns_zone, "example.com");
        assert_eq!(
            cfg.endpoint,
            Endpoint::Custom("https://api.example.test/1.0".to_string())
        );
    }

    #[test]
    #[serial]
    fn config_flags_override_env() {
        let _env = EnvGuard::new();
        let (_dir, path) = write_config(VALID);
        std::env::set_var(ENV_DNS_ZONE, "example.com");

        let overrides = Overrides {
            dns_zone: Some("Other.Example.".to_string()),
            input: Some(PathBuf::from("other.txt")),
            timeout: Some(10),
            dry_run: true,
            ..Default::default()
        };
        let cfg = Config::load(Some(path), &overrides).expect("config load");
        assert_eq!(cfg.dns_zone, "other.example");
        assert_eq!(cfg.input, PathBuf::from("other.txt"));
        assert_eq!(cfg.timeout, Duration::from_secs(10));
        assert!(cfg.dry_run);
    }

    #[test]
    #[serial]
    fn config_missing_required_fields() {
        let _env = EnvGuard::new();
        let err = Config::load(None, &Overrides::default()).expect_err("missing required");
        assert!(format!("{err}").starts_with("Missing "));
    }

    #[test]
    #[serial]
    fn config_missing_input() {
        let _env = EnvGuard::new();
        let (_dir, path) = write_config(
            r#"
application_key = "appkey123"
application_secret = "appsecret456"
consumer_key = "consumer789"
dns_zone = "dodges.it"
"#,
        );
        let err = Config::load(Some(path), &Overrides::default()).expect_err("missing input");
        assert!(format!("{err}").contains(ENV_INPUT));
    }

    #[test]
    #[serial]
    fn config_credentials_must_be_alphanumeric() {
        let _env = EnvGuard::new();
        let (_dir, path) = write_config(VALID);
        let overrides = Overrides {
            consumer_key: Some("bad key!".to_string()),
            ..Default::default()
        };
        let err = Config::load(Some(path), &overrides).expect_err("bad consumer key");
        assert!(format!("{err}").contains("alphanumeric"));
    }

    #[test]
    #[serial]
    fn config_invalid_zone() {
        let _env = EnvGuard::new();
        let (_dir, path) = write_config(VALID);
        let overrides = Overrides {
            dns_zone: Some("not a zone".to_string()),
            ..Default::default()
        };
        let err = Config::load(Some(path), &overrides).expect_err("bad zone");
        assert!(format!("{err}").contains(ENV_DNS_ZONE));
    }

    #[test]
    #[serial]
    fn config_timeout_boundary_values() {
        let _env = EnvGuard::new();
        for (timeout, ok) in [(0, false), (1, true), (300, true), (301, false)] {
            let (_dir, path) = write_config(&format!("{VALID}timeout = {timeout}\n"));
            let result = Config::load(Some(path), &Overrides::default());
            match result {
                Ok(cfg) => {
                    assert!(ok, "timeout {timeout} should be rejected");
                    assert_eq!(cfg.timeout, Duration::from_secs(timeout));
                }
                Err(err) => {
                    assert!(!ok, "timeout {timeout} should be accepted");
                    assert!(format!("{err}").contains("timeout"));
                }
            }
        }
    }

    #[test]
    #[serial]
    fn config_empty_env_values() {
        let _env = EnvGuard::new();
        let (_dir, path) = write_config(VALID);

        std::env::set_var(ENV_APPLICATION_KEY, "");
        std::env::set_var(ENV_DNS_ZONE, "");

        let cfg = Config::load(Some(path), &Overrides::default()).expect("config load");
        assert_eq!(cfg.application_key, "appkey123");
        assert_eq!(cfg.dns_zone, "dodges.it");
    }

    #[test]
    #[serial]
    fn config_debug_hides_secrets() {
        let _env = EnvGuard::new();
        let (_dir, path) = write_config(VALID);
        let cfg = Config::load(Some(path), &Overrides::default()).expect("config load");
        let s = format!("{cfg:?}");
        assert!(!s.contains("appsecret456"));
        assert!(!s.contains("consumer789"));
        assert!(s.contains("dodges.it"));
    }

    #[test]
    #[serial]
    fn config_credentials_carry_secrets() {
        let _env = EnvGuard::new();
        let (_dir, path) = write_config(VALID);
        let cfg = Config::load(Some(path), &Overrides::default()).expect("config load");
        let secret: &Zeroizing<String> = &cfg.application_secret;
        assert_eq!(secret.as_str(), "appsecret456");

        let creds = cfg.credentials();
        assert_eq!(creds.application_key, "appkey123");
        assert_eq!(creds.application_secret, cfg.application_secret);
        assert_eq!(creds.consumer_key.as_str(), "consumer789");
    }

    #[test]
    fn parse_endpoint_valid_and_invalid() {
        assert_eq!(parse_endpoint("ovh-eu").unwrap(), Endpoint::OvhEu);
        assert_eq!(parse_endpoint("CA").unwrap(), Endpoint::OvhCa);
        assert_eq!(parse_endpoint("ovh-us").unwrap(), Endpoint::OvhUs);
        assert_eq!(
            parse_endpoint("http://127.0.0.1:8080").unwrap().base_url(),
            "http://127.0.0.1:8080"
        );
        assert!(parse_endpoint("kimsufi").is_err());
    }

    #[test]
    fn normalize_zone_strips_dot_and_case() {
        assert_eq!(normalize_zone("Dodges.IT."), "dodges.it");
        assert_eq!(normalize_zone(" dodges.it "), "dodges.it");
    }
}

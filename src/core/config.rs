//! Validator configuration with layered hierarchy

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the email domain allow-list (comma-separated)
pub const ENV_ALLOWED_EMAIL_DOMAINS: &str = "PATIENT_RECORD_ALLOWED_EMAIL_DOMAINS";
/// Environment variable overriding the allergy count limit
pub const ENV_MAX_ALLERGIES: &str = "PATIENT_RECORD_MAX_ALLERGIES";
/// Environment variable overriding the unknown field policy (`reject` or `ignore`)
pub const ENV_UNKNOWN_FIELDS: &str = "PATIENT_RECORD_UNKNOWN_FIELDS";

/// What to do with input fields the record does not declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFieldPolicy {
    /// Fail with an `UnknownField` violation
    #[default]
    Reject,
    /// Drop the field and keep validating
    Ignore,
}

impl std::str::FromStr for UnknownFieldPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(UnknownFieldPolicy::Reject),
            "ignore" => Ok(UnknownFieldPolicy::Ignore),
            _ => Err(format!("Unknown field policy: {}", s)),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", .path.display())]
    #[diagnostic(code(patient::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {message}", .path.display())]
    #[diagnostic(
        code(patient::config::parse),
        help("Config files are YAML mappings, e.g. `max_allergies: 5`")
    )]
    Parse { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(patient::config::invalid))]
    Invalid(String),
}

/// Constraint data the validator reads
///
/// Immutable once handed to a [`Validator`](crate::schema::Validator); every
/// validation only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Email domains a patient address may use
    pub allowed_email_domains: Vec<String>,

    /// Maximum number of allergy entries
    pub max_allergies: usize,

    /// Maximum characters per allergy entry
    pub allergy_max_length: usize,

    /// Inclusive (min, max) character bounds for the name
    pub name_length_bounds: (usize, usize),

    /// Patients strictly older than this must list an emergency contact
    pub emergency_contact_age: u32,

    /// Handling of undeclared input fields
    pub unknown_fields: UnknownFieldPolicy,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            allowed_email_domains: vec!["hdfc.com".to_string(), "axis.com".to_string()],
            max_allergies: 5,
            allergy_max_length: 100,
            name_length_bounds: (2, 50),
            emergency_contact_age: 60,
            unknown_fields: UnknownFieldPolicy::Reject,
        }
    }
}

/// A partial configuration read from one layer
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigLayer {
    allowed_email_domains: Option<Vec<String>>,
    max_allergies: Option<usize>,
    allergy_max_length: Option<usize>,
    name_length_bounds: Option<(usize, usize)>,
    emergency_contact_age: Option<u32>,
    unknown_fields: Option<UnknownFieldPolicy>,
}

impl ValidatorConfig {
    /// Load configuration from all sources, merging in priority order
    ///
    /// Layers that fail to read or parse are skipped with a warning; the
    /// result is always usable.
    pub fn load() -> Self {
        let mut config = ValidatorConfig::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. User config (~/.config/patient-record/config.yaml)
        if let Some(path) = Self::user_config_path() {
            if path.exists() {
                match read_layer(&path) {
                    Ok(layer) => config.merge(layer),
                    Err(error) => {
                        tracing::warn!(%error, "skipping user config layer");
                    }
                }
            }
        }

        // 3. Environment variables
        config.apply_env(|key| std::env::var(key).ok());

        if let Err(error) = config.check() {
            tracing::warn!(%error, "layered config is inconsistent; using defaults");
            return ValidatorConfig::default();
        }

        config
    }

    /// Load a single YAML config file on top of the defaults
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let layer = read_layer(path)?;
        let mut config = ValidatorConfig::default();
        config.merge(layer);
        config.check()?;
        Ok(config)
    }

    /// Parse a YAML config document on top of the defaults
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let layer = parse_layer(content, Path::new("<inline>"))?;
        let mut config = ValidatorConfig::default();
        config.merge(layer);
        config.check()?;
        Ok(config)
    }

    /// Get the path to the user config file
    pub fn user_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "patient-record")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(domains) = lookup(ENV_ALLOWED_EMAIL_DOMAINS) {
            let domains: Vec<String> = domains
                .split(',')
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect();
            if !domains.is_empty() {
                self.allowed_email_domains = domains;
            }
        }
        if let Some(max) = lookup(ENV_MAX_ALLERGIES) {
            match max.trim().parse() {
                Ok(max) => self.max_allergies = max,
                Err(_) => tracing::warn!(value = %max, "ignoring non-numeric {}", ENV_MAX_ALLERGIES),
            }
        }
        if let Some(policy) = lookup(ENV_UNKNOWN_FIELDS) {
            match policy.parse() {
                Ok(policy) => self.unknown_fields = policy,
                Err(error) => tracing::warn!(%error, "ignoring {}", ENV_UNKNOWN_FIELDS),
            }
        }
    }

    /// Merge a layer into this config (layer takes precedence)
    fn merge(&mut self, other: ConfigLayer) {
        if let Some(domains) = other.allowed_email_domains {
            self.allowed_email_domains = domains;
        }
        if let Some(max) = other.max_allergies {
            self.max_allergies = max;
        }
        if let Some(max) = other.allergy_max_length {
            self.allergy_max_length = max;
        }
        if let Some(bounds) = other.name_length_bounds {
            self.name_length_bounds = bounds;
        }
        if let Some(age) = other.emergency_contact_age {
            self.emergency_contact_age = age;
        }
        if let Some(policy) = other.unknown_fields {
            self.unknown_fields = policy;
        }
    }

    /// Reject configurations no record could satisfy
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.allowed_email_domains.is_empty() {
            return Err(ConfigError::Invalid(
                "allowed_email_domains must list at least one domain".to_string(),
            ));
        }
        if let Some(bad) = self
            .allowed_email_domains
            .iter()
            .find(|d| d.is_empty() || d.contains('@'))
        {
            return Err(ConfigError::Invalid(format!(
                "'{}' is not a valid email domain",
                bad
            )));
        }
        let (min, max) = self.name_length_bounds;
        if min > max {
            return Err(ConfigError::Invalid(format!(
                "name_length_bounds minimum {} exceeds maximum {}",
                min, max
            )));
        }
        Ok(())
    }

    /// Case-insensitive allow-list membership
    pub fn is_allowed_domain(&self, domain: &str) -> bool {
        self.allowed_email_domains
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(domain))
    }
}

fn read_layer(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_layer(&contents, path)
}

fn parse_layer(contents: &str, path: &Path) -> Result<ConfigLayer, ConfigError> {
    if contents.trim().is_empty() {
        return Ok(ConfigLayer::default());
    }
    serde_yml::from_str(contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

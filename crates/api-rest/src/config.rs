//! Startup configuration for the REST server.
//!
//! Environment variables are read once in `main` and handed to [`RestConfig::from_env_values`];
//! request handling never touches the environment.

use std::path::PathBuf;

use anyhow::Context;
use edci_core::resolve_config_path;

pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    pub addr: String,
    /// When set, readings come from this file instead of the synthetic generator.
    pub readings_file: Option<PathBuf>,
    pub seed: Option<u64>,
    pub derive_edci: bool,
    pub engine_config: Option<PathBuf>,
}

/// Raw values of the server's environment variables.
#[derive(Debug, Default, Clone)]
pub struct EnvValues {
    pub rest_addr: Option<String>,
    pub readings_file: Option<String>,
    pub seed: Option<String>,
    pub derive_edci: Option<String>,
    pub engine_config: Option<String>,
}

impl EnvValues {
    pub fn from_env() -> Self {
        Self {
            rest_addr: std::env::var("EDCI_REST_ADDR").ok(),
            readings_file: std::env::var("EDCI_READINGS_FILE").ok(),
            seed: std::env::var("EDCI_SEED").ok(),
            derive_edci: std::env::var("EDCI_DERIVE_EDCI").ok(),
            engine_config: std::env::var(edci_core::constants::CONFIG_ENV_VAR).ok(),
        }
    }
}

impl RestConfig {
    /// # Errors
    ///
    /// Returns an error if `EDCI_SEED` is not an unsigned integer or `EDCI_DERIVE_EDCI` is not a
    /// recognised boolean.
    pub fn from_env_values(values: EnvValues) -> anyhow::Result<Self> {
        let addr = non_blank(values.rest_addr).unwrap_or_else(|| DEFAULT_REST_ADDR.to_string());
        let readings_file = non_blank(values.readings_file).map(PathBuf::from);
        let seed = seed_from_env_value(values.seed)?;
        let derive_edci = bool_from_env_value(values.derive_edci)
            .context("EDCI_DERIVE_EDCI must be a boolean")?;
        let engine_config = resolve_config_path(None, values.engine_config);

        Ok(Self {
            addr,
            readings_file,
            seed,
            derive_edci,
            engine_config,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse `EDCI_SEED`; unset or blank means "no fixed seed".
///
/// # Errors
///
/// Returns an error if the value is not an unsigned 64-bit integer.
pub fn seed_from_env_value(value: Option<String>) -> anyhow::Result<Option<u64>> {
    non_blank(value)
        .map(|v| {
            v.parse::<u64>()
                .with_context(|| format!("EDCI_SEED must be an unsigned integer, got {v:?}"))
        })
        .transpose()
}

/// Parse a boolean flag; unset or blank is `false`.
///
/// # Errors
///
/// Returns an error for anything but `1/0`, `true/false`, `yes/no` or `on/off`.
pub fn bool_from_env_value(value: Option<String>) -> anyhow::Result<bool> {
    let Some(v) = non_blank(value) else {
        return Ok(false);
    };
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("invalid boolean {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_nothing_is_set() {
        let cfg = RestConfig::from_env_values(EnvValues::default()).expect("config");
        assert_eq!(cfg.addr, DEFAULT_REST_ADDR);
        assert_eq!(cfg.readings_file, None);
        assert_eq!(cfg.seed, None);
        assert!(!cfg.derive_edci);
        assert_eq!(cfg.engine_config, None);
    }

    #[test]
    fn values_are_trimmed_and_parsed() {
        let cfg = RestConfig::from_env_values(EnvValues {
            rest_addr: Some("127.0.0.1:8080".into()),
            readings_file: Some(" /data/readings.json ".into()),
            seed: Some("42".into()),
            derive_edci: Some("Yes".into()),
            engine_config: Some("/etc/edci.yaml".into()),
        })
        .expect("config");
        assert_eq!(cfg.addr, "127.0.0.1:8080");
        assert_eq!(cfg.readings_file, Some(PathBuf::from("/data/readings.json")));
        assert_eq!(cfg.seed, Some(42));
        assert!(cfg.derive_edci);
        assert_eq!(cfg.engine_config, Some(PathBuf::from("/etc/edci.yaml")));
    }

    #[test]
    fn blank_values_count_as_unset() {
        assert_eq!(seed_from_env_value(Some("  ".into())).expect("seed"), None);
        assert!(!bool_from_env_value(Some(String::new())).expect("flag"));
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(seed_from_env_value(Some("-3".into())).is_err());
        assert!(bool_from_env_value(Some("maybe".into())).is_err());
        let err = RestConfig::from_env_values(EnvValues {
            derive_edci: Some("2".into()),
            ..EnvValues::default()
        })
        .expect_err("bad flag");
        assert!(err.to_string().contains("EDCI_DERIVE_EDCI"));
    }
}

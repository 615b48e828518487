//! Node configuration.

use crate::error::{AppError, AppResult};
use alloy::primitives::Address;
use dapi_core::DapiName;
use dapi_server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix for overrides, e.g. `DAPI_MANAGER`.
const ENV_PREFIX: &str = "DAPI";

/// Beneficiary an OEV proxy declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryConfig {
    pub oev_proxy: Address,
    pub beneficiary: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Holds every role.
    #[serde(default)]
    pub manager: Address,
    #[serde(default)]
    pub dapi_name_setters: Vec<Address>,
    #[serde(default)]
    pub subscription_registrars: Vec<Address>,
    #[serde(default)]
    pub oev_beneficiaries: Vec<BeneficiaryConfig>,
    /// Names whose feeds are reported after ingestion.
    #[serde(default)]
    pub dapi_names: Vec<DapiName>,
}

impl NodeConfig {
    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load a TOML file with `DAPI_*` environment overrides applied on top.
    pub fn from_file(path: &str) -> AppResult<Self> {
        config::Config::builder()
            .add_source(config::File::new(path, config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AppError::Config(format!("Failed to load config: {e}")))
    }

    /// Parse TOML without environment overrides.
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }
}

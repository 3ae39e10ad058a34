use crate::error::ReweaveError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{
    fs::{read_to_string, write},
    path::PathBuf,
};

/// Default number of visited nodes between cooperative yields.
pub const DEFAULT_YIELD_INTERVAL: usize = 64;

/// Tuning shared by [crate::builder::BuildEngine] and [crate::validation::Validator].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum nesting depth of one traversal. `None` means unbounded.
    pub max_depth: Option<usize>,
    /// Yield to the runtime after this many visited nodes. `None` or `Some(0)` never yields.
    pub yield_interval: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_depth: None,
            yield_interval: Some(DEFAULT_YIELD_INTERVAL),
        }
    }
}

impl EngineConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_yield_interval(mut self, interval: Option<usize>) -> Self {
        self.yield_interval = interval;
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ReweaveError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ReweaveError> {
        Ok(toml::to_string(self)?)
    }

    fn check(&self) -> Result<(), ReweaveError> {
        if self.max_depth == Some(0) {
            return Err(ReweaveError::Config(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub trait ConfigProvider {
    fn get_engine_config(&self) -> Result<EngineConfig, ReweaveError>;
    fn set_engine_config(&self, config: &EngineConfig) -> Result<(), ReweaveError>;
}

/// Reads and writes the `[engine]` table of a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfigProvider {
    path: PathBuf,
}

impl TomlConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        TomlConfigProvider { path }
    }
}

impl ConfigProvider for TomlConfigProvider {
    fn get_engine_config(&self) -> Result<EngineConfig, ReweaveError> {
        tracing::debug!("Attempting to read engine config from: {:?}", &self.path);
        if !self.path.exists() {
            tracing::debug!("Config file not found, using default engine config.");
            return Ok(EngineConfig::default());
        }
        let content = read_to_string(&self.path)?;
        let config: BTreeMap<String, EngineConfig> = toml::from_str(&content)?;
        let engine = config.get("engine").cloned().unwrap_or_default();
        engine.check()?;
        Ok(engine)
    }

    fn set_engine_config(&self, engine: &EngineConfig) -> Result<(), ReweaveError> {
        tracing::debug!("Attempting to write engine config to: {:?}", &self.path);
        engine.check()?;
        let mut config = BTreeMap::new();
        config.insert("engine".to_string(), engine.clone());
        let toml_string = toml::to_string(&config)?;
        write(&self.path, toml_string)?;
        Ok(())
    }
}

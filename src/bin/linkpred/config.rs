use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prediction settings that may come from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PredictSettings {
    pub edges: Option<PathBuf>,
    pub min_degree: Option<u64>,
    pub workers: Option<usize>,
    pub top_k: Option<usize>,
    pub undirected: Option<bool>,
    pub renumber: Option<PathBuf>,
}

impl PredictSettings {
    /// Fills unset fields from `fallback`.
    fn or(self, fallback: &PredictSettings) -> PredictSettings {
        PredictSettings {
            edges: self.edges.or_else(|| fallback.edges.clone()),
            min_degree: self.min_degree.or(fallback.min_degree),
            workers: self.workers.or(fallback.workers),
            top_k: self.top_k.or(fallback.top_k),
            undirected: self.undirected.or(fallback.undirected),
            renumber: self.renumber.or_else(|| fallback.renumber.clone()),
        }
    }
}

#[derive(Debug, Default)]
pub struct CliConfig {
    path: Option<PathBuf>,
    data: RawConfig,
}

impl CliConfig {
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            _ => RawConfig::default(),
        };
        validate(&data)?;
        Ok(Self { path, data })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn default_profile_name(&self) -> Option<&str> {
        self.data.default_profile.as_deref()
    }

    pub fn profiles(&self) -> impl Iterator<Item = (&str, &PredictSettings)> {
        self.data
            .profiles
            .iter()
            .map(|(name, settings)| (name.as_str(), settings))
    }

    /// Settings of the named profile (or the default profile) layered over `[predict]`.
    pub fn resolve(&self, profile: Option<&str>) -> Result<PredictSettings, ConfigError> {
        let name = profile.or(self.data.default_profile.as_deref());
        let selected = match name {
            Some(name) => self
                .data
                .profiles
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::ProfileNotFound {
                    name: name.to_string(),
                })?,
            None => PredictSettings::default(),
        };
        Ok(selected.or(&self.data.predict))
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn validate(data: &RawConfig) -> Result<(), ConfigError> {
    if let Some(default_name) = data.default_profile.as_ref() {
        if !data.profiles.contains_key(default_name) {
            return Err(ConfigError::ProfileNotFound {
                name: default_name.clone(),
            });
        }
    }
    let sections = std::iter::once(("predict", &data.predict)).chain(
        data.profiles
            .iter()
            .map(|(name, settings)| (name.as_str(), settings)),
    );
    for (name, settings) in sections {
        if settings.workers == Some(0) {
            return Err(ConfigError::InvalidValue {
                section: name.to_string(),
                key: "workers",
            });
        }
        if settings.top_k == Some(0) {
            return Err(ConfigError::InvalidValue {
                section: name.to_string(),
                key: "top_k",
            });
        }
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawConfig {
    #[serde(default)]
    predict: PredictSettings,
    #[serde(default)]
    profiles: BTreeMap<String, PredictSettings>,
    #[serde(default)]
    default_profile: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read CLI config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse CLI config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },
    #[error("[{section}] {key} must be at least 1")]
    InvalidValue { section: String, key: &'static str },
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("linkpred").join("cli.toml"))
}

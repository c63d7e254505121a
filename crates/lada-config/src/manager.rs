//! Configuration manager implementation

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_yaml::Value;
use tracing::{debug, info, warn};

use crate::{
    error::Result,
    key::ConfigKey,
    migration::{migrate, needs_migration},
    types::LadaConfig,
};

/// Default configuration file name, resolved against the working directory
pub const DEFAULT_CONFIG_FILE: &str = ".lada_config.yml";

/// Owns the configuration of one project for the lifetime of a process
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// Configuration file path
    config_path: PathBuf,
    config: LadaConfig,
}

impl ConfigManager {
    /// Load `.lada_config.yml` from the current directory
    pub fn new() -> Result<Self> {
        Self::with_path(PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load from a custom config path
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = path.into();
        let config = load_config(&config_path)?;
        Ok(Self {
            config_path,
            config,
        })
    }

    pub fn config(&self) -> &LadaConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut LadaConfig {
        &mut self.config
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Sibling file the migrated data is copied to
    pub fn backup_path(&self) -> PathBuf {
        backup_path_for(&self.config_path)
    }

    /// Whether a file exists at the configured path
    pub fn exists(&self) -> bool {
        self.config_path.exists()
    }

    /// Re-read the file, discarding in-memory changes
    pub fn reload(&mut self) -> Result<()> {
        self.config = load_config(&self.config_path)?;
        Ok(())
    }

    /// Read a value by dotted path
    pub fn get(&self, path: &str) -> Result<Value> {
        let key: ConfigKey = path.parse()?;
        Ok(self.config.get(key))
    }

    /// Set a value by dotted path; the change stays in memory until [`save`](Self::save)
    pub fn set(&mut self, path: &str, raw: &str) -> Result<()> {
        let key: ConfigKey = path.parse()?;
        self.config.set(key, raw)
    }

    /// Persist the current configuration
    pub fn save(&self) -> Result<()> {
        self.config.validate()?;
        let yaml = serde_yaml::to_string(&self.config)?;
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.config_path, yaml)?;
        info!("Saved configuration to {}", self.config_path.display());
        Ok(())
    }
}

fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.into());
    name.push(".backup");
    path.with_file_name(name)
}

fn load_config(path: &Path) -> Result<LadaConfig> {
    if !path.exists() {
        debug!("No configuration at {}, using defaults", path.display());
        return Ok(LadaConfig::default());
    }

    let raw = match fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|text| serde_yaml::from_str::<Value>(&text).map_err(|e| e.to_string()))
    {
        Ok(Value::Null) => return Ok(LadaConfig::default()),
        Ok(raw) => raw,
        Err(e) => {
            warn!("Failed to load config from {}: {}", path.display(), e);
            return Ok(LadaConfig::default());
        }
    };

    let raw = match normalize_document(raw) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Failed to load config from {}: {}", path.display(), e);
            return Ok(LadaConfig::default());
        }
    };

    let raw = if needs_migration(&raw)? {
        let migrated = migrate(raw)?;
        write_backup(path, &migrated);
        migrated
    } else {
        raw
    };

    let config: LadaConfig = match serde_yaml::from_value(raw) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config from {}: {}", path.display(), e);
            return Ok(LadaConfig::default());
        }
    };
    config.validate()?;
    Ok(config)
}

/// Check the document has the shape of a config file
///
/// A null `model` or `model.engines` counts as absent and is dropped.
fn normalize_document(mut raw: Value) -> std::result::Result<Value, String> {
    let root = raw
        .as_mapping_mut()
        .ok_or_else(|| "configuration root must be a mapping".to_string())?;

    if root.get("model").is_some_and(Value::is_null) {
        root.remove("model");
    }
    if let Some(model) = root.get_mut("model") {
        let model = model
            .as_mapping_mut()
            .ok_or_else(|| "'model' must be a mapping".to_string())?;
        if model.get("engines").is_some_and(Value::is_null) {
            model.remove("engines");
        }
        if model.get("engines").is_some_and(|engines| !engines.is_mapping()) {
            return Err("'model.engines' must be a mapping".to_string());
        }
    }
    Ok(raw)
}

fn write_backup(path: &Path, migrated: &Value) {
    let backup = backup_path_for(path);
    let result = serde_yaml::to_string(migrated)
        .map_err(|e| e.to_string())
        .and_then(|yaml| fs::write(&backup, yaml).map_err(|e| e.to_string()));
    match result {
        Ok(()) => info!("Wrote migrated configuration backup to {}", backup.display()),
        Err(e) => warn!("Could not write backup {}: {}", backup.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_path_is_sibling() {
        assert_eq!(
            backup_path_for(Path::new("/tmp/project/.lada_config.yml")),
            PathBuf::from("/tmp/project/.lada_config.yml.backup")
        );
        assert_eq!(
            backup_path_for(Path::new("custom.yaml")),
            PathBuf::from("custom.yaml.backup")
        );
    }

    #[test]
    fn test_null_sections_count_as_absent() {
        let raw: Value = serde_yaml::from_str("model:\n  engines: ~\n  timeout: 5\n").unwrap();
        let normalized = normalize_document(raw).unwrap();
        assert!(normalized["model"].get("engines").is_none());
        assert_eq!(normalized["model"]["timeout"].as_u64(), Some(5));

        let raw: Value = serde_yaml::from_str("model: ~\nauto_save: false\n").unwrap();
        assert!(normalize_document(raw).unwrap().get("model").is_none());
    }

    #[test]
    fn test_wrong_shapes_are_rejected() {
        for text in ["just some text", "- a\n- b", "model: 3", "model:\n  engines: [ollama]"] {
            let raw: Value = serde_yaml::from_str(text).unwrap();
            assert!(normalize_document(raw).is_err(), "accepted {:?}", text);
        }
    }
}

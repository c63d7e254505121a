//! Typed access to configuration values by dotted path
//!
//! Only the paths listed in [`ConfigKey`] are addressable; anything else is
//! rejected when the path is parsed.

use std::{fmt, path::PathBuf, str::FromStr};

use serde_yaml::Value;

use crate::{
    error::{ConfigError, Result},
    types::{EngineName, LadaConfig},
};

/// A supported configuration path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Version,
    ChatModel,
    PlanModel,
    CodeModel,
    DefaultModel,
    OllamaHost,
    Timeout,
    Temperature,
    MaxTokens,
    EngineHost(EngineName),
    EngineTimeout(EngineName),
    EngineMaxRetries(EngineName),
    SessionDir,
    PlanDir,
    BackupDir,
    AutoSave,
    AutoSaveInterval,
}

impl ConfigKey {
    /// Every addressable path
    pub fn all() -> Vec<ConfigKey> {
        let mut keys = vec![
            ConfigKey::Version,
            ConfigKey::ChatModel,
            ConfigKey::PlanModel,
            ConfigKey::CodeModel,
            ConfigKey::DefaultModel,
            ConfigKey::OllamaHost,
            ConfigKey::Timeout,
            ConfigKey::Temperature,
            ConfigKey::MaxTokens,
        ];
        for engine in EngineName::ALL {
            keys.push(ConfigKey::EngineHost(engine));
            keys.push(ConfigKey::EngineTimeout(engine));
            keys.push(ConfigKey::EngineMaxRetries(engine));
        }
        keys.extend([
            ConfigKey::SessionDir,
            ConfigKey::PlanDir,
            ConfigKey::BackupDir,
            ConfigKey::AutoSave,
            ConfigKey::AutoSaveInterval,
        ]);
        keys
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKey::Version => f.write_str("version"),
            ConfigKey::ChatModel => f.write_str("model.chat_model"),
            ConfigKey::PlanModel => f.write_str("model.plan_model"),
            ConfigKey::CodeModel => f.write_str("model.code_model"),
            ConfigKey::DefaultModel => f.write_str("model.default_model"),
            ConfigKey::OllamaHost => f.write_str("model.ollama_host"),
            ConfigKey::Timeout => f.write_str("model.timeout"),
            ConfigKey::Temperature => f.write_str("model.temperature"),
            ConfigKey::MaxTokens => f.write_str("model.max_tokens"),
            ConfigKey::EngineHost(e) => write!(f, "model.engines.{}.host", e),
            ConfigKey::EngineTimeout(e) => write!(f, "model.engines.{}.timeout", e),
            ConfigKey::EngineMaxRetries(e) => write!(f, "model.engines.{}.max_retries", e),
            ConfigKey::SessionDir => f.write_str("session_dir"),
            ConfigKey::PlanDir => f.write_str("plan_dir"),
            ConfigKey::BackupDir => f.write_str("backup_dir"),
            ConfigKey::AutoSave => f.write_str("auto_save"),
            ConfigKey::AutoSaveInterval => f.write_str("auto_save_interval"),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(path: &str) -> Result<Self> {
        let parts: Vec<&str> = path.split('.').collect();
        let key = match parts.as_slice() {
            ["version"] => ConfigKey::Version,
            ["model", "chat_model"] => ConfigKey::ChatModel,
            ["model", "plan_model"] => ConfigKey::PlanModel,
            ["model", "code_model"] => ConfigKey::CodeModel,
            ["model", "default_model"] => ConfigKey::DefaultModel,
            ["model", "ollama_host"] => ConfigKey::OllamaHost,
            ["model", "timeout"] => ConfigKey::Timeout,
            ["model", "temperature"] => ConfigKey::Temperature,
            ["model", "max_tokens"] => ConfigKey::MaxTokens,
            ["model", "engines", engine, field] => {
                let engine: EngineName = engine
                    .parse()
                    .map_err(|_| ConfigError::UnknownKey(path.to_string()))?;
                match *field {
                    "host" => ConfigKey::EngineHost(engine),
                    "timeout" => ConfigKey::EngineTimeout(engine),
                    "max_retries" => ConfigKey::EngineMaxRetries(engine),
                    _ => return Err(ConfigError::UnknownKey(path.to_string())),
                }
            }
            ["session_dir"] => ConfigKey::SessionDir,
            ["plan_dir"] => ConfigKey::PlanDir,
            ["backup_dir"] => ConfigKey::BackupDir,
            ["auto_save"] => ConfigKey::AutoSave,
            ["auto_save_interval"] => ConfigKey::AutoSaveInterval,
            _ => return Err(ConfigError::UnknownKey(path.to_string())),
        };
        Ok(key)
    }
}

impl LadaConfig {
    /// Read a value; unset optionals come back as `Null`
    pub fn get(&self, key: ConfigKey) -> Value {
        let model = &self.model;
        match key {
            ConfigKey::Version => Value::from(self.version),
            ConfigKey::ChatModel => optional(model.chat_model.clone()),
            ConfigKey::PlanModel => optional(model.plan_model.clone()),
            ConfigKey::CodeModel => optional(model.code_model.clone()),
            ConfigKey::DefaultModel => Value::from(model.default_model.clone()),
            ConfigKey::OllamaHost => Value::from(model.ollama_host.clone()),
            ConfigKey::Timeout => Value::from(model.timeout),
            ConfigKey::Temperature => Value::from(f64::from(model.temperature)),
            ConfigKey::MaxTokens => model.max_tokens.map(Value::from).unwrap_or(Value::Null),
            ConfigKey::EngineHost(e) => Value::from(model.engine_config(e).host),
            ConfigKey::EngineTimeout(e) => Value::from(model.engine_config(e).timeout),
            ConfigKey::EngineMaxRetries(e) => Value::from(model.engine_config(e).max_retries),
            ConfigKey::SessionDir => path_value(&self.session_dir),
            ConfigKey::PlanDir => path_value(&self.plan_dir),
            ConfigKey::BackupDir => path_value(&self.backup_dir),
            ConfigKey::AutoSave => Value::from(self.auto_save),
            ConfigKey::AutoSaveInterval => Value::from(self.auto_save_interval),
        }
    }

    /// Parse `raw` for `key` and store it; the result must still validate
    pub fn set(&mut self, key: ConfigKey, raw: &str) -> Result<()> {
        let mut updated = self.clone();
        let model = &mut updated.model;
        match key {
            ConfigKey::Version => {
                return Err(ConfigError::invalid(key.to_string(), "version is read-only"))
            }
            ConfigKey::ChatModel => model.chat_model = non_empty(raw),
            ConfigKey::PlanModel => model.plan_model = non_empty(raw),
            ConfigKey::CodeModel => model.code_model = non_empty(raw),
            ConfigKey::DefaultModel => model.default_model = raw.to_string(),
            ConfigKey::OllamaHost => model.ollama_host = raw.to_string(),
            ConfigKey::Timeout => model.timeout = parse_number(key, raw)?,
            ConfigKey::Temperature => model.temperature = parse_number(key, raw)?,
            ConfigKey::MaxTokens => {
                model.max_tokens = match non_empty(raw) {
                    Some(value) => Some(parse_number(key, &value)?),
                    None => None,
                }
            }
            ConfigKey::EngineHost(e) => {
                let mut engine = model.engine_config(e);
                engine.host = raw.to_string();
                model.engines.insert(e, engine);
            }
            ConfigKey::EngineTimeout(e) => {
                let mut engine = model.engine_config(e);
                engine.timeout = parse_number(key, raw)?;
                model.engines.insert(e, engine);
            }
            ConfigKey::EngineMaxRetries(e) => {
                let mut engine = model.engine_config(e);
                engine.max_retries = parse_number(key, raw)?;
                model.engines.insert(e, engine);
            }
            ConfigKey::SessionDir => updated.session_dir = PathBuf::from(raw),
            ConfigKey::PlanDir => updated.plan_dir = PathBuf::from(raw),
            ConfigKey::BackupDir => updated.backup_dir = PathBuf::from(raw),
            ConfigKey::AutoSave => updated.auto_save = parse_number(key, raw)?,
            ConfigKey::AutoSaveInterval => updated.auto_save_interval = parse_number(key, raw)?,
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }
}

fn optional(value: Option<String>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

fn path_value(path: &std::path::Path) -> Value {
    Value::from(path.to_string_lossy().into_owned())
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_number<T: FromStr>(key: ConfigKey, raw: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid(key.to_string(), format!("'{}': {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_key_round_trips_through_its_path() {
        for key in ConfigKey::all() {
            assert_eq!(key.to_string().parse::<ConfigKey>().unwrap(), key);
        }
    }

    #[test]
    fn test_unknown_paths_are_rejected() {
        for path in ["model", "model.engines.vllm.host", "model.engines.mlx.port", "nope"] {
            assert!(matches!(
                path.parse::<ConfigKey>(),
                Err(ConfigError::UnknownKey(_))
            ));
        }
    }

    #[test]
    fn test_get_reads_values() {
        let config = LadaConfig::default();
        assert_eq!(
            config.get(ConfigKey::DefaultModel).as_str(),
            Some("codellama:7b")
        );
        assert_eq!(
            config.get(ConfigKey::EngineHost(EngineName::Mlx)).as_str(),
            Some("http://localhost:8000")
        );
        assert!(config.get(ConfigKey::ChatModel).is_null());
        assert_eq!(config.get(ConfigKey::SessionDir).as_str(), Some(".lada/sessions"));
    }

    #[test]
    fn test_set_updates_and_validates() {
        let mut config = LadaConfig::default();
        config.set(ConfigKey::PlanModel, "mlx:Qwen2.5-3B-Instruct").unwrap();
        config.set(ConfigKey::EngineTimeout(EngineName::Mlx), "300").unwrap();
        assert_eq!(config.model.plan_model.as_deref(), Some("mlx:Qwen2.5-3B-Instruct"));
        assert_eq!(config.model.engines[&EngineName::Mlx].timeout, 300);

        let err = config.set(ConfigKey::Timeout, "soon").unwrap_err();
        assert_eq!(err.key(), Some("model.timeout"));

        let err = config.set(ConfigKey::EngineHost(EngineName::Ollama), "ftp://x").unwrap_err();
        assert_eq!(err.key(), Some("model.engines.ollama.host"));
        assert_eq!(config.model.engines[&EngineName::Ollama].host, "http://localhost:11434");
    }
}

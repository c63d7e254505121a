//! Schema migration for persisted configuration
//!
//! Migration is a pure transformation over the raw YAML document so it can be
//! exercised without touching the filesystem. Writing the backup is the
//! caller's job (see [`crate::ConfigManager`]).

use serde_yaml::{Mapping, Number, Value};
use tracing::{debug, info};

use crate::{
    error::{ConfigError, Result},
    types::{DEFAULT_MLX_HOST, DEFAULT_TIMEOUT_SECS},
};

/// Schema version written by this build
pub const CURRENT_VERSION: u32 = 2;

/// Files written before versioning carry no `version` key
const UNVERSIONED: u32 = 1;

const VERSION_KEY: &str = "version";

/// Schema version of a raw document; absent means version 1
pub fn schema_version(raw: &Value) -> Result<u32> {
    let root = as_root(raw)?;
    match root.get(VERSION_KEY) {
        None | Some(Value::Null) => Ok(UNVERSIONED),
        Some(value) => value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                ConfigError::Migration(format!("'version' must be an integer, got {:?}", value))
            }),
    }
}

/// Whether the document predates the current schema
pub fn needs_migration(raw: &Value) -> Result<bool> {
    Ok(schema_version(raw)? < CURRENT_VERSION)
}

/// Bring a raw document up to [`CURRENT_VERSION`]
///
/// Documents already at the current version are returned unchanged.
pub fn migrate(mut raw: Value) -> Result<Value> {
    let mut version = schema_version(&raw)?;
    if version >= CURRENT_VERSION {
        return Ok(raw);
    }

    let root = raw
        .as_mapping_mut()
        .ok_or_else(|| ConfigError::Migration("configuration root must be a mapping".into()))?;

    while version < CURRENT_VERSION {
        match version {
            1 => migrate_v1_to_v2(root)?,
            other => {
                return Err(ConfigError::Migration(format!(
                    "no migration path from version {}",
                    other
                )))
            }
        }
        version += 1;
        info!("Migrated configuration to version {}", version);
    }

    Ok(raw)
}

fn migrate_v1_to_v2(root: &mut Mapping) -> Result<()> {
    if let Some(model) = root.get_mut("model") {
        let model = model
            .as_mapping_mut()
            .ok_or_else(|| ConfigError::Migration("'model' must be a mapping".into()))?;
        migrate_model_v1(model)?;
    }

    root.insert(
        Value::String(VERSION_KEY.to_string()),
        Value::Number(Number::from(2u64)),
    );
    Ok(())
}

fn migrate_model_v1(model: &mut Mapping) -> Result<()> {
    // Per-mode models start out as copies of the single legacy model
    if let Some(default_model) = non_null(model.get("default_model")).cloned() {
        let has_mode_model = ["chat_model", "plan_model", "code_model"]
            .iter()
            .any(|key| non_null(model.get(*key)).is_some());
        if !has_mode_model {
            debug!("Copying default_model into per-mode models");
            for key in ["chat_model", "plan_model", "code_model"] {
                model.insert(Value::String(key.to_string()), default_model.clone());
            }
        }
    }

    if let Some(host) = non_null(model.get("ollama_host")).cloned() {
        if model.get("engines").is_none() {
            let timeout = non_null(model.get("timeout"))
                .cloned()
                .unwrap_or_else(|| Value::Number(Number::from(DEFAULT_TIMEOUT_SECS)));
            let mut engines = Mapping::new();
            engines.insert(Value::String("ollama".into()), engine_entry(host, timeout));
            model.insert(Value::String("engines".into()), Value::Mapping(engines));
        }
    }

    if let Some(engines) = model.get_mut("engines") {
        let engines = engines
            .as_mapping_mut()
            .ok_or_else(|| ConfigError::Migration("'model.engines' must be a mapping".into()))?;
        if engines.get("mlx").is_none() {
            engines.insert(
                Value::String("mlx".into()),
                engine_entry(
                    Value::String(DEFAULT_MLX_HOST.into()),
                    Value::Number(Number::from(DEFAULT_TIMEOUT_SECS)),
                ),
            );
        }
    }

    Ok(())
}

fn engine_entry(host: Value, timeout: Value) -> Value {
    let mut entry = Mapping::new();
    entry.insert(Value::String("host".into()), host);
    entry.insert(Value::String("timeout".into()), timeout);
    Value::Mapping(entry)
}

fn non_null(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn as_root(raw: &Value) -> Result<&Mapping> {
    raw.as_mapping()
        .ok_or_else(|| ConfigError::Migration("configuration root must be a mapping".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    fn v1_document() -> Value {
        yaml(
            r#"
model:
  default_model: codellama:13b
  ollama_host: http://localhost:11434
  timeout: 150
  temperature: 0.8
session_dir: .lada/sessions
auto_save: true
"#,
        )
    }

    #[test]
    fn test_unversioned_document_is_v1() {
        assert_eq!(schema_version(&v1_document()).unwrap(), 1);
        assert!(needs_migration(&v1_document()).unwrap());
    }

    #[test]
    fn test_v1_migration() {
        let migrated = migrate(v1_document()).unwrap();
        let model = &migrated["model"];

        assert_eq!(migrated["version"].as_u64(), Some(2));
        for key in ["chat_model", "plan_model", "code_model"] {
            assert_eq!(model[key].as_str(), Some("codellama:13b"));
        }
        assert_eq!(
            model["engines"]["ollama"]["host"].as_str(),
            Some("http://localhost:11434")
        );
        assert_eq!(model["engines"]["ollama"]["timeout"].as_u64(), Some(150));
        assert_eq!(
            model["engines"]["mlx"]["host"].as_str(),
            Some("http://localhost:8000")
        );
        assert_eq!(model["engines"]["mlx"]["timeout"].as_u64(), Some(120));
    }

    #[test]
    fn test_existing_mode_model_is_not_overwritten() {
        let migrated = migrate(yaml(
            "model:\n  default_model: a\n  plan_model: b\n",
        ))
        .unwrap();
        assert_eq!(migrated["model"]["plan_model"].as_str(), Some("b"));
        assert!(migrated["model"].get("chat_model").is_none());
    }

    #[test]
    fn test_existing_engines_gain_mlx_only() {
        let migrated = migrate(yaml(
            "model:\n  ollama_host: http://a:1\n  engines:\n    ollama:\n      host: http://b:2\n",
        ))
        .unwrap();
        let engines = &migrated["model"]["engines"];
        assert_eq!(engines["ollama"]["host"].as_str(), Some("http://b:2"));
        assert!(engines.get("mlx").is_some());
    }

    #[test]
    fn test_missing_timeout_defaults_to_120() {
        let migrated = migrate(yaml("model:\n  ollama_host: http://a:1\n")).unwrap();
        assert_eq!(
            migrated["model"]["engines"]["ollama"]["timeout"].as_u64(),
            Some(120)
        );
    }

    #[test]
    fn test_migration_is_idempotent() {
        let once = migrate(v1_document()).unwrap();
        let twice = migrate(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_current_version_untouched() {
        let doc = yaml("version: 2\nmodel:\n  default_model: x\n");
        assert_eq!(migrate(doc.clone()).unwrap(), doc);
    }

    #[test]
    fn test_malformed_documents_fail() {
        assert!(matches!(
            migrate(yaml("- a\n- b\n")),
            Err(ConfigError::Migration(_))
        ));
        assert!(matches!(
            migrate(yaml("model: nope\n")),
            Err(ConfigError::Migration(_))
        ));
        assert!(matches!(
            migrate(yaml("version: two\n")),
            Err(ConfigError::Migration(_))
        ));
    }
}

// Configuration management

use std::path::PathBuf;

use lada_config::{ConfigKey, ConfigManager};
use serde_yaml::Value;

use super::{open_config, Command};
use crate::{error::CliResult, output::OutputStyle};

/// Manage configuration
pub struct ConfigCommand {
    config_path: Option<PathBuf>,
    pub action: ConfigAction,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    Show,
    Get(String),
    Set(String, String),
    Path,
}

impl ConfigCommand {
    pub fn new(config_path: Option<PathBuf>, action: ConfigAction) -> Self {
        Self {
            config_path,
            action,
        }
    }

    /// Render a value the way it appears in the file, on one line
    pub fn format_value(value: &Value) -> String {
        match value {
            Value::Null => "(unset)".to_string(),
            Value::String(s) => s.clone(),
            other => serde_yaml::to_string(other)
                .map(|yaml| yaml.trim_end().to_string())
                .unwrap_or_else(|_| format!("{:?}", other)),
        }
    }

    fn show(&self, manager: &ConfigManager, style: &OutputStyle) -> CliResult<()> {
        let yaml = serde_yaml::to_string(manager.config()).map_err(lada_config::ConfigError::from)?;
        println!("{}", style.header("LADA Configuration"));
        println!();
        print!("{}", yaml);
        println!();
        if !manager.exists() {
            println!("{}", style.info("No configuration file yet; these are the defaults. Run 'lada init' to write them."));
        }
        Ok(())
    }

    fn get(&self, manager: &ConfigManager, key: &str, style: &OutputStyle) -> CliResult<()> {
        let value = manager.get(key)?;
        println!("{} = {}", style.code(key), Self::format_value(&value));
        Ok(())
    }

    fn set(&self, manager: &mut ConfigManager, key: &str, value: &str, style: &OutputStyle) -> CliResult<()> {
        manager.set(key, value)?;
        manager.save()?;
        println!("{}", style.success(&format!("Set {} = {}", key, value)));
        Ok(())
    }

    fn path(&self, manager: &ConfigManager, style: &OutputStyle) {
        println!("{}", manager.path().display());
        if !manager.exists() {
            println!("{}", style.warning("File does not exist yet"));
        }
        let backup = manager.backup_path();
        if backup.exists() {
            println!("{}", style.info(&format!("Migration backup: {}", backup.display())));
        }
    }
}

/// Every dotted key `lada config get` accepts
pub fn known_keys() -> Vec<String> {
    ConfigKey::all().iter().map(ToString::to_string).collect()
}

#[async_trait::async_trait]
impl Command for ConfigCommand {
    async fn execute(&self) -> CliResult<()> {
        let style = OutputStyle::default();
        let mut manager = open_config(self.config_path.as_deref())?;
        match &self.action {
            ConfigAction::Show => self.show(&manager, &style),
            ConfigAction::Get(key) => self.get(&manager, key, &style),
            ConfigAction::Set(key, value) => self.set(&mut manager, key, value, &style),
            ConfigAction::Path => {
                self.path(&manager, &style);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(ConfigCommand::format_value(&Value::Null), "(unset)");
        assert_eq!(
            ConfigCommand::format_value(&Value::String("codellama:7b".to_string())),
            "codellama:7b"
        );
        assert_eq!(ConfigCommand::format_value(&Value::from(120u64)), "120");
        assert_eq!(ConfigCommand::format_value(&Value::Bool(true)), "true");
    }

    #[test]
    fn test_known_keys_are_dotted_paths() {
        let keys = known_keys();
        assert!(keys.contains(&"model.default_model".to_string()));
        assert!(keys.contains(&"model.engines.mlx.host".to_string()));
    }
}

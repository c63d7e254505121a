// Resolve model identifiers to engines

use std::path::PathBuf;

use lada_config::{Mode, ModelConfig};
use lada_providers::{ensure_model_available, ClientOverrides, ModelRegistry};

use super::{open_config, Command};
use crate::{
    error::{CliError, CliResult},
    output::OutputStyle,
};

/// Show where identifiers route, optionally probing the engines
pub struct ModelsCommand {
    config_path: Option<PathBuf>,
    identifier: Option<String>,
    mode: Option<Mode>,
    check: bool,
}

/// One identifier to resolve, labelled by where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub label: String,
    pub identifier: String,
}

impl ModelsCommand {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            identifier: None,
            mode: None,
            check: false,
        }
    }

    pub fn with_identifier(mut self, identifier: Option<String>) -> Self {
        self.identifier = identifier;
        self
    }

    pub fn with_mode(mut self, mode: Option<Mode>) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    /// The explicit identifier, or the configured model of each selected mode
    pub fn targets(&self, config: &ModelConfig) -> Vec<Target> {
        if let Some(identifier) = &self.identifier {
            return vec![Target {
                label: "model".to_string(),
                identifier: identifier.clone(),
            }];
        }
        Mode::ALL
            .into_iter()
            .filter(|mode| self.mode.map_or(true, |selected| selected == *mode))
            .map(|mode| Target {
                label: mode.to_string(),
                identifier: config.get_model_for_mode(mode).to_string(),
            })
            .collect()
    }

    /// Resolution line for one target
    pub fn describe(registry: &ModelRegistry, target: &Target, style: &OutputStyle) -> String {
        let (engine, model) = registry.parse(&target.identifier);
        let host = registry.engine_config(engine).host;
        format!(
            "  {}: {} -> {} '{}' at {}",
            target.label,
            style.code(&target.identifier),
            engine,
            model,
            host
        )
    }
}

#[async_trait::async_trait]
impl Command for ModelsCommand {
    async fn execute(&self) -> CliResult<()> {
        let style = OutputStyle::default();
        let manager = open_config(self.config_path.as_deref())?;
        let registry = ModelRegistry::from_config(&manager.config().model);

        println!("{}", style.header("Models"));
        for target in self.targets(&manager.config().model) {
            println!("{}", Self::describe(&registry, &target, &style));
            if !self.check {
                continue;
            }

            let client = registry.get_client(&target.identifier, &ClientOverrides::default())?;
            match ensure_model_available(client.as_ref()).await {
                Ok(()) => println!("    {}", style.success("available")),
                Err(e) => println!("    {}", style.error(&CliError::from(e).user_message())),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_default_to_every_mode() {
        let mut config = ModelConfig::default();
        config.code_model = Some("mlx:Qwen2.5-3B-Instruct".to_string());

        let targets = ModelsCommand::new(None).targets(&config);
        let pairs: Vec<_> = targets
            .iter()
            .map(|t| (t.label.as_str(), t.identifier.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("chat", "codellama:7b"),
                ("plan", "codellama:7b"),
                ("code", "mlx:Qwen2.5-3B-Instruct"),
            ]
        );

        let targets = ModelsCommand::new(None)
            .with_mode(Some(Mode::Code))
            .targets(&config);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].identifier, "mlx:Qwen2.5-3B-Instruct");
    }

    #[test]
    fn test_explicit_identifier_wins() {
        let targets = ModelsCommand::new(None)
            .with_identifier(Some("mistral".to_string()))
            .with_mode(Some(Mode::Plan))
            .targets(&ModelConfig::default());
        assert_eq!(
            targets,
            vec![Target {
                label: "model".to_string(),
                identifier: "mistral".to_string()
            }]
        );
    }

    #[test]
    fn test_describe_shows_engine_and_host() {
        let target = Target {
            label: "model".to_string(),
            identifier: "mlx:GLM-4.5-Air".to_string(),
        };
        let line = ModelsCommand::describe(&ModelRegistry::new(), &target, &OutputStyle::plain());
        assert_eq!(
            line,
            "  model: mlx:GLM-4.5-Air -> mlx 'GLM-4.5-Air' at http://localhost:8000"
        );
    }
}

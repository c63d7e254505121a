// List registered engines

use std::path::PathBuf;

use lada_providers::ModelRegistry;

use super::{open_config, Command};
use crate::{error::CliResult, output::OutputStyle};

/// Print every engine the registry knows with its effective settings
pub struct EnginesCommand {
    config_path: Option<PathBuf>,
}

impl EnginesCommand {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self { config_path }
    }

    /// Lines printed for `registry`
    pub fn render(registry: &ModelRegistry, style: &OutputStyle) -> Vec<String> {
        let mut lines = vec![style.header("Engines")];
        for engine in registry.list_engines() {
            let config = registry.engine_config(engine);
            let marker = if engine == registry.default_engine() {
                " (default)"
            } else {
                ""
            };
            lines.push(format!(
                "  {}{}  {}  timeout {}s, {} retries",
                style.code(engine.as_str()),
                marker,
                config.host,
                config.timeout,
                config.max_retries
            ));
        }
        lines
    }
}

#[async_trait::async_trait]
impl Command for EnginesCommand {
    async fn execute(&self) -> CliResult<()> {
        let manager = open_config(self.config_path.as_deref())?;
        let registry = ModelRegistry::from_config(&manager.config().model);
        for line in Self::render(&registry, &OutputStyle::default()) {
            println!("{}", line);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_marks_default_engine() {
        let lines = EnginesCommand::render(&ModelRegistry::new(), &OutputStyle::plain());
        assert_eq!(lines[0], "Engines");
        assert_eq!(lines.len(), 3);
        assert!(lines
            .iter()
            .any(|line| line.starts_with("  ollama (default)  http://localhost:11434")));
        assert!(lines
            .iter()
            .any(|line| line.starts_with("  mlx  http://localhost:8000")));
    }
}

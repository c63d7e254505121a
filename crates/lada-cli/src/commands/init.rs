// Write a default configuration file

use std::path::PathBuf;

use lada_config::LadaConfig;

use super::{open_config, Command};
use crate::{error::CliResult, output::OutputStyle};

/// Create `.lada_config.yml` with defaults unless one exists
pub struct InitCommand {
    config_path: Option<PathBuf>,
    force: bool,
}

impl InitCommand {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            force: false,
        }
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Write the file; returns false when an existing file was left alone
    pub fn run(&self) -> CliResult<bool> {
        let mut manager = open_config(self.config_path.as_deref())?;
        if manager.exists() && !self.force {
            return Ok(false);
        }
        *manager.config_mut() = LadaConfig::default();
        manager.save()?;
        Ok(true)
    }
}

#[async_trait::async_trait]
impl Command for InitCommand {
    async fn execute(&self) -> CliResult<()> {
        let style = OutputStyle::default();
        let path = self
            .config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(lada_config::manager::DEFAULT_CONFIG_FILE));

        if self.run()? {
            println!("{}", style.success(&format!("Wrote {}", path.display())));
            println!("{}", style.info("Edit it with 'lada config set <key> <value>'"));
        } else {
            println!(
                "{}",
                style.warning(&format!(
                    "{} already exists; use --force to overwrite",
                    path.display()
                ))
            );
        }
        Ok(())
    }
}

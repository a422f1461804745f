//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::pagination::into_stream;
use crate::tracker::TrackerList;
use futures::StreamExt;
use std::path::PathBuf;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let mut config = self.load_config()?;

        match &self.cli.command {
            Commands::Serve { port, public_dirs } => {
                Self::apply_serve_flags(&mut config, *port, public_dirs);
                crate::cli::serve(config).await
            }
            Commands::Projects { limit } => {
                let client = config
                    .tracker
                    .client()?
                    .ok_or_else(|| Error::missing_field("tracker.token"))?;
                Self::print_list(client.projects()?, *limit).await
            }
            Commands::Stories { limit } => {
                let project = config.tracker.project()?.ok_or_else(|| {
                    Error::config("Stories need both tracker.token and tracker.project_id")
                })?;
                Self::print_list(project.stories()?, *limit).await
            }
        }
    }

    /// Load configuration: file, then environment
    fn load_config(&self) -> Result<GatewayConfig> {
        let mut config = match &self.cli.config {
            Some(path) => GatewayConfig::from_file(path)?,
            None => GatewayConfig::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Command-line flags take precedence over file and environment
    fn apply_serve_flags(config: &mut GatewayConfig, port: Option<u16>, public_dirs: &[PathBuf]) {
        if let Some(port) = port {
            config.listen_port = port;
        }
        if !public_dirs.is_empty() {
            config.public_dirs = public_dirs.to_vec();
        }
    }

    /// Print list items as JSON lines, pulling no further than `limit`
    async fn print_list(list: TrackerList, limit: Option<usize>) -> Result<()> {
        let mut items = Box::pin(into_stream(list)).take(limit.unwrap_or(usize::MAX));

        while let Some(item) = items.next().await {
            println!("{}", serde_json::to_string(&item?)?);
        }

        Ok(())
    }
}

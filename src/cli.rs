// cli.rs - Command-line interface configuration
use clap::Parser;
use std::path::PathBuf;

use crate::config::LagoonConfig;
use crate::scenes::ScenePreset;

#[derive(Parser, Debug, Clone)]
#[command(name = "lagoon")]
#[command(about = "Water scene demos with a loading screen", long_about = None)]
pub struct Cli {
    /// Scene to show (overrides the config file)
    #[arg(long, value_enum)]
    pub scene: Option<ScenePreset>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory model assets are loaded from
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Hide the debug GUI
    #[arg(long = "no-ui", default_value = "false")]
    pub no_ui: bool,

    /// Write the effective configuration to this file and exit
    #[arg(long = "write-config", value_name = "PATH")]
    pub write_config: Option<PathBuf>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut LagoonConfig) {
        if let Some(scene) = self.scene {
            config.preset = scene;
        }
        if let Some(assets) = &self.assets {
            config.assets_dir = assets.clone();
        }
        if self.no_ui {
            config.show_ui = false;
        }
    }
}

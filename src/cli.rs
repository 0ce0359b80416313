use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::store::FeatureFlag;

/// GPT4Overleaf: AI text completion and improvement for LaTeX documents
#[derive(Parser, Debug)]
#[command(version, about = "AI-assisted LaTeX editing in the terminal")]
pub struct Cli {
    /// Config file (default: <config dir>/gpt4overleaf/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Settings storage file, overrides the config
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    /// Base URL of the text-generation API, overrides the config
    #[arg(long, global = true, env = "GPT4OVERLEAF_API_BASE")]
    pub api_base: Option<String>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a document with the AI shortcuts installed
    Edit {
        /// File to edit; created on first save if missing
        file: PathBuf,
    },

    /// Open the settings form
    Settings,

    /// Set or clear the stored API token
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Turn a feature flag on or off
    Flag {
        /// textCompletion or textImprovement
        #[arg(value_parser = parse_flag)]
        name: FeatureFlag,

        #[arg(value_enum)]
        state: Toggle,
    },

    /// Show the stored settings
    Status {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeyAction {
    /// Validate and store a token
    Set { token: String },
    /// Remove the stored token
    Clear,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    On,
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Toggle::On
    }
}

fn parse_flag(s: &str) -> Result<FeatureFlag, String> {
    FeatureFlag::from_key(s).ok_or_else(|| {
        let known: Vec<&str> = FeatureFlag::ALL.iter().map(|f| f.key()).collect();
        format!("unknown flag {s:?}, expected one of: {}", known.join(", "))
    })
}

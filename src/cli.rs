use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use key_promoter::shortcuts::Platform;

#[derive(Parser, Debug)]
#[command(
    name = "key-promoter",
    version,
    about = "Learn the keyboard shortcuts for the commands you click"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Command catalog JSON (commands, editorCommands, customKeys)")]
    pub catalog: Option<PathBuf>,
    #[arg(long, global = true, help = "Data file [default: ~/.key-promoter/data.json]")]
    pub data: Option<PathBuf>,
    #[arg(long, global = true, value_enum, help = "Render shortcuts for this platform [default: current]")]
    pub platform: Option<PlatformArg>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the most used commands per channel
    Stats,
    /// Write hotkeys-export.md
    Export {
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Attribute a pointer interaction with the given label
    Click {
        label: String,
        #[arg(long, default_value_t = false)]
        excluded: bool,
    },
    /// Dispatch commands programmatically through the interceptor
    Invoke {
        #[arg(required = true)]
        command_ids: Vec<String>,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show one setting, or all of them
    Get { name: Option<String> },
    Set { name: String, value: String },
    Reset { name: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    Macos,
    Windows,
    Linux,
}

impl From<PlatformArg> for Platform {
    fn from(value: PlatformArg) -> Self {
        match value {
            PlatformArg::Macos => Platform::MacOS,
            PlatformArg::Windows => Platform::Windows,
            PlatformArg::Linux => Platform::Linux,
        }
    }
}

use std::path::PathBuf;

use clap::Args;

use crate::output::OutputFormat;

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct StateArgs {
    /// Directory holding circuit_breakers.json and retry_history.json.
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,
    /// YAML or JSON tripwire config.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

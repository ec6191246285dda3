use std::path::PathBuf;

use tripwire_core::{ConfigError, TripwireConfig, load_config};
use tripwire_exec::{DEFAULT_STATE_DIR, Resilience};

use crate::args::{OutputArgs, StateArgs};
use crate::exit_codes;
use crate::output::print_error;

pub const STATE_DIR_ENV: &str = "TRIPWIRE_STATE_DIR";
pub const CONFIG_ENV: &str = "TRIPWIRE_CONFIG";

pub fn config_path(state: &StateArgs) -> Option<PathBuf> {
    state
        .config
        .clone()
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

pub fn load(state: &StateArgs) -> Result<TripwireConfig, ConfigError> {
    match config_path(state) {
        Some(path) => load_config(&path),
        None => Ok(TripwireConfig::default()),
    }
}

/// `--state-dir`, then `TRIPWIRE_STATE_DIR`, then the config, then `./state`.
pub fn resolve_state_dir(state: &StateArgs, config: &TripwireConfig) -> PathBuf {
    state
        .state_dir
        .clone()
        .or_else(|| std::env::var_os(STATE_DIR_ENV).map(PathBuf::from))
        .or_else(|| config.state_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
}

/// One line per violation for validation failures.
pub fn describe_config_error(err: &ConfigError) -> String {
    match err {
        ConfigError::Validation(invalid) => {
            let lines: Vec<String> = invalid.violations.iter().map(|v| format!("  {}: {}", v.path, v.message)).collect();
            format!("{err}\n{}", lines.join("\n"))
        }
        other => other.to_string(),
    }
}

pub fn config_exit_code(err: &ConfigError) -> i32 {
    match err {
        ConfigError::Io { .. } => exit_codes::RUNTIME_ERROR,
        ConfigError::Parse(_) | ConfigError::Validation(_) => exit_codes::VALIDATION_FAILED,
    }
}

/// Loads the config and builds a [`Resilience`] over the resolved state
/// directory, reporting failures and returning the exit code to use.
pub fn open(state: &StateArgs, output: &OutputArgs) -> Result<Resilience, i32> {
    let config = match load(state) {
        Ok(c) => c,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("failed to load config: {}", describe_config_error(&e)));
            return Err(config_exit_code(&e));
        }
    };
    let dir = resolve_state_dir(state, &config);
    tracing::debug!(state_dir = %dir.display(), "using state directory");
    Resilience::builder().state_dir(dir).config(config).build().map_err(|e| {
        print_error(output.format, output.quiet, &format!("invalid config: {e}"));
        exit_codes::VALIDATION_FAILED
    })
}

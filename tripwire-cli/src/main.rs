use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod output;
mod utils;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "tripwire", version, about = "Inspect and reset circuit breaker and retry state")]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[command(flatten)]
    output: OutputArgs,
    #[command(flatten)]
    state: StateArgs,
}

fn main() {
    let cli = Cli::parse();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    std::process::exit(run_command(cli.command, cli.output, cli.state));
}

fn run_command(command: Command, output: OutputArgs, state: StateArgs) -> i32 {
    match command {
        Command::Status { name } => cmd::status::status_cmd(name.as_deref(), output, state),
        Command::Stats { service } => cmd::stats::stats_cmd(service.as_deref(), output, state),
        Command::Reset {
            name,
            breakers,
            history,
        } => cmd::reset::reset_cmd(name.as_deref(), breakers, history, output, state),
        Command::Classify { message } => cmd::classify::classify_cmd(&message, output, state),
        Command::Config {
            service,
            kind,
            attempts,
        } => cmd::config::config_cmd(service.as_deref(), kind.as_deref(), attempts, output, state),
        Command::Doctor => cmd::doctor::doctor_cmd(output, state),
    }
}

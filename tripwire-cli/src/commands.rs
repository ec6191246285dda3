use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show circuit breaker state.
    Status {
        /// Breaker name; all known breakers when omitted.
        name: Option<String>,
    },
    /// Show adaptive retry statistics.
    Stats {
        service: Option<String>,
    },
    /// Reset breakers and/or retry history.
    Reset {
        /// Resource name; everything when omitted.
        name: Option<String>,
        #[arg(long)]
        breakers: bool,
        #[arg(long)]
        history: bool,
    },
    /// Classify an error message.
    Classify {
        message: String,
    },
    /// Show the merged retry config and its delay schedule.
    Config {
        #[arg(long)]
        service: Option<String>,
        #[arg(long)]
        kind: Option<String>,
        #[arg(long, default_value_t = 5)]
        attempts: u32,
    },
    /// Check the state directory, persisted documents and config.
    Doctor,
}

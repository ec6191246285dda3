use serde::Serialize;
use tripwire_core::ErrorKind;

use crate::exit_codes;
use crate::output::{OutputFormat, print_error, print_result, secs};
use crate::utils;
use crate::{OutputArgs, StateArgs};

#[derive(Serialize)]
struct ClassifyResult {
    kind: ErrorKind,
    recoverable: bool,
    max_attempts: u32,
    base_delay: f64,
    backoff_factor: f64,
    description: String,
}

pub fn classify_cmd(message: &str, output: OutputArgs, state: StateArgs) -> i32 {
    let config = match utils::load(&state) {
        Ok(c) => c,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("failed to load config: {}", utils::describe_config_error(&e)));
            return utils::config_exit_code(&e);
        }
    };
    let classifier = match config.classifier() {
        Ok(c) => c,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("invalid pattern: {e}"));
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let kind = classifier.classify_message(message);
    let strategy = classifier.strategy(kind);
    let result = ClassifyResult {
        kind,
        recoverable: strategy.recoverable,
        max_attempts: strategy.max_attempts,
        base_delay: strategy.base_delay.as_secs_f64(),
        backoff_factor: strategy.backoff_factor,
        description: strategy.description.clone(),
    };

    if output.format == OutputFormat::Text && !output.quiet {
        println!("Kind:         {}", result.kind);
        println!("Recoverable:  {}", if result.recoverable { "yes" } else { "no" });
        println!("Max attempts: {}", result.max_attempts);
        println!(
            "Backoff:      {} x{}",
            secs(strategy.base_delay),
            result.backoff_factor
        );
        println!("Description:  {}", result.description);
    } else {
        print_result(output.format, output.quiet, &result);
    }

    exit_codes::SUCCESS
}

use std::str::FromStr;

use serde::Serialize;
use tripwire_core::ErrorKind;
use tripwire_core::retry::calculate_delay_with;

use crate::exit_codes;
use crate::output::{OutputFormat, print_error, print_result, secs};
use crate::utils;
use crate::{OutputArgs, StateArgs};

#[derive(Serialize)]
struct ConfigResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
    max_attempts: u32,
    base_delay: f64,
    backoff_factor: f64,
    jitter: f64,
    max_delay: f64,
    /// Delay after each failed attempt, jitter left out.
    delays: Vec<f64>,
}

pub fn config_cmd(
    service: Option<&str>,
    kind: Option<&str>,
    attempts: u32,
    output: OutputArgs,
    state: StateArgs,
) -> i32 {
    let kind = match kind.map(ErrorKind::from_str).transpose() {
        Ok(k) => k,
        Err(e) => {
            print_error(output.format, output.quiet, &e.to_string());
            return exit_codes::VALIDATION_FAILED;
        }
    };
    let config = match utils::load(&state) {
        Ok(c) => c,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("failed to load config: {}", utils::describe_config_error(&e)));
            return utils::config_exit_code(&e);
        }
    };

    let cfg = config.retry_registry().get(service, kind);
    // a sample of 0.5 cancels the jitter term
    let delays: Vec<_> = (1..=attempts).map(|a| calculate_delay_with(a, &cfg, 0.5)).collect();

    if output.format == OutputFormat::Text && !output.quiet {
        println!("Service:      {}", service.unwrap_or("-"));
        println!("Kind:         {}", kind.map(|k| k.as_str()).unwrap_or("-"));
        println!("Max attempts: {}", cfg.max_attempts);
        println!("Base delay:   {}", secs(cfg.base_delay));
        println!("Factor:       {}", cfg.backoff_factor);
        println!("Jitter:       ±{:.0}%", cfg.jitter * 100.0);
        println!("Max delay:    {}", secs(cfg.max_delay));
        println!();
        println!("Delays:");
        for (i, d) in delays.iter().enumerate() {
            println!("  after attempt {}: {}", i + 1, secs(*d));
        }
    } else {
        let result = ConfigResult {
            service: service.map(String::from),
            kind,
            max_attempts: cfg.max_attempts,
            base_delay: cfg.base_delay.as_secs_f64(),
            backoff_factor: cfg.backoff_factor,
            jitter: cfg.jitter,
            max_delay: cfg.max_delay.as_secs_f64(),
            delays: delays.iter().map(|d| d.as_secs_f64()).collect(),
        };
        print_result(output.format, output.quiet, &result);
    }

    exit_codes::SUCCESS
}

use serde::Serialize;

use crate::exit_codes;
use crate::output::{OutputFormat, print_result};
use crate::utils;
use crate::{OutputArgs, StateArgs};

#[derive(Serialize)]
struct ResetResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    breakers: bool,
    history: bool,
}

/// With neither `--breakers` nor `--history`, both are reset.
pub fn reset_cmd(name: Option<&str>, breakers: bool, history: bool, output: OutputArgs, state: StateArgs) -> i32 {
    let resilience = match utils::open(&state, &output) {
        Ok(r) => r,
        Err(code) => return code,
    };
    let (breakers, history) = if breakers || history {
        (breakers, history)
    } else {
        (true, true)
    };

    match name {
        Some(n) => {
            if breakers {
                resilience.breaker(n).reset();
            }
            if history {
                resilience.retry_policy(n).reset_history();
            }
        }
        None => {
            if breakers {
                resilience.reset_all();
            }
            if history {
                resilience.reset_all_history();
            }
        }
    }

    let result = ResetResult {
        name: name.map(String::from),
        breakers,
        history,
    };
    if output.format == OutputFormat::Text && !output.quiet {
        let target = name.unwrap_or("all resources");
        let what = match (breakers, history) {
            (true, true) => "circuit breaker and retry history",
            (true, false) => "circuit breaker",
            _ => "retry history",
        };
        println!("Reset {what} for {target}.");
    } else {
        print_result(output.format, output.quiet, &result);
    }

    exit_codes::SUCCESS
}

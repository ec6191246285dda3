use std::collections::BTreeMap;

use tripwire_core::BreakerState;

use crate::exit_codes;
use crate::output::{OutputFormat, print_result, secs, timestamp};
use crate::utils;
use crate::{OutputArgs, StateArgs};

pub fn status_cmd(name: Option<&str>, output: OutputArgs, state: StateArgs) -> i32 {
    let resilience = match utils::open(&state, &output) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let states: BTreeMap<String, BreakerState> = match name {
        Some(n) => BTreeMap::from([(n.to_string(), resilience.breaker_state(n))]),
        None => resilience.get_all_states(),
    };

    if output.format == OutputFormat::Text && !output.quiet {
        if states.is_empty() {
            println!("No circuit breakers recorded.");
            return exit_codes::SUCCESS;
        }
        for (name, s) in &states {
            println!("{name}: {}", s.state);
            println!("  Failures:     {}/{}", s.failure_count, s.config.failure_threshold);
            println!("  Successes:    {}", s.success_count);
            println!("  Last failure: {}", timestamp(s.last_failure_time));
            println!("  Since:        {}", timestamp(Some(s.last_state_change)));
            println!("  Reset after:  {}", secs(s.config.reset_timeout));
        }
    } else {
        print_result(output.format, output.quiet, &states);
    }

    exit_codes::SUCCESS
}

use std::collections::BTreeMap;

use tripwire_core::RetryStats;

use crate::exit_codes;
use crate::output::{OutputFormat, print_result, timestamp};
use crate::utils;
use crate::{OutputArgs, StateArgs};

pub fn stats_cmd(service: Option<&str>, output: OutputArgs, state: StateArgs) -> i32 {
    let resilience = match utils::open(&state, &output) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let stats: BTreeMap<String, RetryStats> = match service {
        Some(s) => BTreeMap::from([(s.to_string(), resilience.retry_policy(s).get_stats())]),
        None => resilience.get_all_stats(),
    };

    if output.format == OutputFormat::Text && !output.quiet {
        if stats.is_empty() {
            println!("No retry history recorded.");
            return exit_codes::SUCCESS;
        }
        for (name, s) in &stats {
            println!("{name}:");
            println!(
                "  Max attempts:    {} (range {}-{})",
                s.current_max_attempts, s.min_attempts, s.max_attempts
            );
            println!("  Samples:         {}/{}", s.samples, s.window_size);
            println!("  Success rate:    {:.1}%", s.success_rate * 100.0);
            println!("  Avg attempts:    {:.2}", s.average_attempts);
            println!("  Last adaptation: {}", timestamp(s.last_adaptation_time));
            if !s.success_rate_by_attempt.is_empty() {
                println!("  By attempt:");
                for (a, rate) in &s.success_rate_by_attempt {
                    println!("    #{a}: {:.1}%", rate * 100.0);
                }
            }
            if !s.failures_by_kind.is_empty() {
                println!("  Failures:");
                for (kind, n) in &s.failures_by_kind {
                    println!("    {kind}: {n}");
                }
            }
        }
    } else {
        print_result(output.format, output.quiet, &stats);
    }

    exit_codes::SUCCESS
}

use std::path::Path;

use serde::Serialize;
use tripwire_core::TripwireConfig;
use tripwire_store::{Document, JsonFileStore, StateStore};

use crate::exit_codes;
use crate::output::{OutputFormat, print_result};
use crate::utils;
use crate::{OutputArgs, StateArgs};

#[derive(Serialize)]
struct Check {
    name: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl Check {
    fn ok(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: "ok".to_string(),
            message: Some(message.into()),
        }
    }

    fn error(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status: "error".to_string(),
            message: Some(message.into()),
        }
    }
}

#[derive(Serialize)]
struct DoctorResult {
    checks: Vec<Check>,
    all_passed: bool,
}

pub fn doctor_cmd(output: OutputArgs, state: StateArgs) -> i32 {
    let mut checks = Vec::new();

    let (config_check, config) = check_config(&state);
    checks.push(config_check);

    let dir = utils::resolve_state_dir(&state, &config);
    let dir_check = check_state_dir(&dir);
    let dir_ok = dir_check.status == "ok";
    checks.push(dir_check);

    if dir_ok {
        let store = JsonFileStore::new(&dir);
        for doc in Document::ALL {
            checks.push(check_document(&store, doc));
        }
    }

    let all_passed = checks.iter().all(|c| c.status == "ok");
    let result = DoctorResult { checks, all_passed };

    if output.format == OutputFormat::Text && !output.quiet {
        println!("Environment checks:");
        for c in &result.checks {
            let icon = if c.status == "ok" { "✓" } else { "✗" };
            print!("  {} {}: {}", icon, c.name, c.status);
            if let Some(msg) = &c.message {
                print!(" - {msg}");
            }
            println!();
        }
        if result.all_passed {
            println!("\nAll checks passed.");
        } else {
            println!("\nSome checks failed.");
        }
    } else {
        print_result(output.format, output.quiet, &result);
    }

    if all_passed {
        exit_codes::SUCCESS
    } else {
        exit_codes::RUNTIME_ERROR
    }
}

fn check_config(state: &StateArgs) -> (Check, TripwireConfig) {
    let Some(path) = utils::config_path(state) else {
        return (Check::ok("config", "no config file, using defaults"), TripwireConfig::default());
    };
    let loaded = utils::load(state).and_then(|cfg| {
        cfg.classifier()?;
        Ok(cfg)
    });
    match loaded {
        Ok(cfg) => (Check::ok("config", format!("{} is valid", path.display())), cfg),
        Err(e) => (Check::error("config", utils::describe_config_error(&e)), TripwireConfig::default()),
    }
}

fn check_state_dir(dir: &Path) -> Check {
    if let Err(e) = std::fs::create_dir_all(dir) {
        return Check::error("state_dir", format!("cannot create {}: {e}", dir.display()));
    }
    let probe = dir.join(".tripwire-doctor");
    match std::fs::write(&probe, b"ok") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            Check::ok("state_dir", format!("{} is writable", dir.display()))
        }
        Err(e) => Check::error("state_dir", format!("{} is not writable: {e}", dir.display())),
    }
}

fn check_document(store: &JsonFileStore, doc: Document) -> Check {
    let path = store.path_of(doc);
    if !path.exists() {
        return Check::ok(doc.as_str(), "not created yet");
    }
    match store.load(doc) {
        Ok(entries) => Check::ok(doc.as_str(), format!("{} entries", entries.len())),
        Err(e) => Check::error(doc.as_str(), e.to_string()),
    }
}

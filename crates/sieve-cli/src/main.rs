//! `sieve` binary: replays a message trace through a graph of analyzers.
//!
//! Usage: `sieve [CONFIG]`. The configuration path comes from the first
//! argument, then `SIEVE_CONFIG_PATH`, then `sieve.toml` in the working
//! directory.

use std::process::ExitCode;

use sieve_cli::CliError;
use sieve_engine::{builtin, Engine};

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("SIEVE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

fn main() -> ExitCode {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().unwrap_or("sieve.toml");

    let config = match sieve_cli::load_config(Some(selected_config_path)) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("sieve: {}", CliError::from(err));
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = sieve_observe::init_logging(&config.logging) {
        eprintln!("sieve: {}", CliError::from(err));
        return ExitCode::FAILURE;
    }

    for rejected in &config.rejected_overrides {
        tracing::warn!(
            var = rejected.var,
            value = %rejected.value,
            error = %rejected.reason,
            "ignoring environment override"
        );
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path,
        "resolved startup configuration path"
    );

    // Unresolvable analyzers terminate the process from inside the engine.
    let engine = Engine::new(builtin::factory());
    let stdout = std::io::stdout();
    match sieve_cli::run(&config, &engine, &mut stdout.lock()) {
        Ok(Some(stats)) => {
            tracing::info!(events = stats.events, callbacks = stats.callbacks, "sieve run complete");
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "sieve run failed");
            ExitCode::FAILURE
        }
    }
}

//! The `intake` binary.
//!
//! ```bash
//! intake validate-email john@gmail.com
//! intake --config intake.toml fill
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use intake_cli::command::CommandRegistry;
use intake_cli::commands::register_builtin_commands;
use intake_core::logging::setup_logging;
use intake_core::{settings_loader, IntakeResult, Settings, SETTINGS};

fn load_settings(config: Option<&PathBuf>) -> IntakeResult<Settings> {
    config.map_or_else(
        || Ok(settings_loader::from_env()),
        settings_loader::from_toml_file_with_env,
    )
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);
    let matches = registry.build_cli().get_matches();

    let settings = match load_settings(matches.get_one::<PathBuf>("config")) {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("intake: {err}");
            return ExitCode::FAILURE;
        }
    };
    setup_logging(&settings);
    if let Err(err) = SETTINGS.configure(settings) {
        eprintln!("intake: {err}");
        return ExitCode::FAILURE;
    }

    let result = match SETTINGS.get() {
        Ok(settings) => registry.execute(&matches, settings).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(code = err.code(), error = %err, "Command failed");
            eprintln!("intake: {err}");
            ExitCode::FAILURE
        }
    }
}

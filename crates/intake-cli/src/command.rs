//! Command framework for the `intake` binary.
//!
//! Each subcommand implements [`IntakeCommand`] and is registered in a
//! [`CommandRegistry`], which builds the `clap` command line and dispatches
//! parsed matches to the right handler.
//!
//! ## Defining a Command
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use intake_cli::command::IntakeCommand;
//! use intake_core::{IntakeError, Settings};
//!
//! struct EndpointCommand;
//!
//! #[async_trait]
//! impl IntakeCommand for EndpointCommand {
//!     fn name(&self) -> &str { "endpoint" }
//!     fn help(&self) -> &str { "Print the email validation endpoint" }
//!
//!     async fn handle(
//!         &self,
//!         _matches: &clap::ArgMatches,
//!         settings: &Settings,
//!     ) -> Result<(), IntakeError> {
//!         println!("{}", settings.email_validation.endpoint);
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use intake_core::{IntakeError, Settings};

/// A subcommand of the `intake` binary.
#[async_trait]
pub trait IntakeCommand: Send + Sync {
    /// The name used to invoke this command.
    fn name(&self) -> &str;

    /// One-line help text.
    fn help(&self) -> &str;

    /// Adds this command's arguments. The default adds none.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Runs the command.
    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings)
        -> Result<(), IntakeError>;
}

/// Registered commands, keyed by name.
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn IntakeCommand>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Registers a command, replacing any command with the same name.
    pub fn register(&mut self, command: Box<dyn IntakeCommand>) {
        let name = command.name().to_string();
        self.commands.insert(name, command);
    }

    /// Returns the command with the given name, if registered.
    pub fn get(&self, name: &str) -> Option<&dyn IntakeCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Returns all command names, sorted.
    pub fn list_commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Builds the top-level `clap` command with a global `--config` option
    /// and one subcommand per registered command.
    pub fn build_cli(&self) -> clap::Command {
        let mut app = clap::Command::new("intake")
            .about("Person intake form with remote email validation")
            .subcommand_required(true)
            .arg(
                clap::Arg::new("config")
                    .long("config")
                    .short('c')
                    .global(true)
                    .value_name("FILE")
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("TOML settings file; INTAKE_* environment variables override it"),
            );

        let mut entries: Vec<_> = self.commands.iter().collect();
        entries.sort_by_key(|(name, _)| (*name).clone());

        for (name, cmd) in entries {
            let subcmd = clap::Command::new(name.clone()).about(cmd.help().to_string());
            app = app.subcommand(cmd.add_arguments(subcmd));
        }

        app
    }

    /// Dispatches `matches` to the selected command.
    ///
    /// # Errors
    ///
    /// [`IntakeError::Configuration`] when no or an unknown subcommand was
    /// given, otherwise whatever the command returns.
    pub async fn execute(
        &self,
        matches: &clap::ArgMatches,
        settings: &Settings,
    ) -> Result<(), IntakeError> {
        let (name, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| IntakeError::Configuration("No subcommand specified".to_string()))?;

        let cmd = self
            .get(name)
            .ok_or_else(|| IntakeError::Configuration(format!("Unknown command: {name}")))?;

        cmd.handle(sub_matches, settings).await
    }
}

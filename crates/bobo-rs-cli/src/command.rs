//! Command framework.
//!
//! A [`ManagementCommand`] names itself, declares its clap arguments, and
//! handles a parsed invocation. [`CommandRegistry`] collects commands into a
//! single clap CLI and dispatches to the one that was invoked.
//!
//! ## Defining a Custom Command
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use bobo_rs_cli::command::{CommandContext, ManagementCommand};
//! use bobo_rs_core::BoboResult;
//!
//! struct GreetCommand;
//!
//! #[async_trait]
//! impl ManagementCommand for GreetCommand {
//!     fn name(&self) -> &'static str { "greet" }
//!     fn help(&self) -> &'static str { "Say hello" }
//!
//!     async fn handle(
//!         &self,
//!         _matches: &clap::ArgMatches,
//!         _context: &CommandContext,
//!     ) -> BoboResult<()> {
//!         println!("Hello from bobo-rs!");
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;

use bobo_rs_app::{AppFactory, Application};
use bobo_rs_core::logging::setup_logging;
use bobo_rs_core::settings_loader::{from_env, from_file_with_env};
use bobo_rs_core::{BoboError, BoboResult, Settings};

/// What every command runs against.
pub struct CommandContext {
    /// Settings loaded from `--config` (or the environment) for this run.
    pub settings: Settings,
    /// The settings file, when one was given.
    pub config_path: Option<PathBuf>,
    /// Builds the application from settings.
    pub factory: AppFactory,
}

impl CommandContext {
    /// Loads settings from `config_path`, or from the environment alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be read or parsed.
    pub fn load(config_path: Option<PathBuf>, factory: AppFactory) -> BoboResult<Self> {
        let settings = match &config_path {
            Some(path) => from_file_with_env(path)?,
            None => from_env(),
        };
        Ok(Self {
            settings,
            config_path,
            factory,
        })
    }

    /// Builds the application with this context's settings.
    ///
    /// # Errors
    ///
    /// Returns the factory's error.
    pub fn build_application(&self) -> BoboResult<Application> {
        (self.factory)(&self.settings)
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("settings", &self.settings)
            .field("config_path", &self.config_path)
            .finish_non_exhaustive()
    }
}

/// A command that can be registered and invoked through the CLI.
#[async_trait]
pub trait ManagementCommand: Send + Sync {
    /// The subcommand name.
    fn name(&self) -> &'static str;

    /// A short help description.
    fn help(&self) -> &'static str;

    /// Adds command-specific arguments. `--config` is added for every command.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Runs the command.
    async fn handle(&self, matches: &clap::ArgMatches, context: &CommandContext)
        -> BoboResult<()>;
}

/// A registry of management commands.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, Box<dyn ManagementCommand>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command, replacing any command with the same name.
    pub fn register(&mut self, command: Box<dyn ManagementCommand>) {
        self.commands.insert(command.name(), command);
    }

    /// Returns the command with the given name.
    pub fn get(&self, name: &str) -> Option<&dyn ManagementCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Returns the registered command names, sorted.
    pub fn list_commands(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Builds the top-level clap command with one subcommand per entry.
    pub fn build_cli(&self) -> clap::Command {
        let mut cli = clap::Command::new("bobo")
            .about("bobo-rs application runner")
            .subcommand_required(true)
            .arg_required_else_help(true);

        for name in self.list_commands() {
            let Some(cmd) = self.get(name) else { continue };
            let sub = clap::Command::new(name).about(cmd.help()).arg(
                clap::Arg::new("config")
                    .long("config")
                    .short('c')
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("Settings file (TOML, or JSON with a .json extension)"),
            );
            cli = cli.subcommand(cmd.add_arguments(sub));
        }

        cli
    }

    /// Loads settings for the invoked subcommand, installs logging, and runs
    /// the command.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown command, unreadable settings, or a
    /// failing command.
    pub async fn execute(&self, matches: &clap::ArgMatches, factory: AppFactory) -> BoboResult<()> {
        let (name, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| BoboError::ConfigurationError("No subcommand specified".to_string()))?;

        let cmd = self
            .get(name)
            .ok_or_else(|| BoboError::ConfigurationError(format!("Unknown command: {name}")))?;

        let config_path = sub_matches.get_one::<PathBuf>("config").cloned();
        let context = CommandContext::load(config_path, factory)?;
        setup_logging(&context.settings);
        tracing::debug!(command = name, config = ?context.config_path, "running command");

        cmd.handle(sub_matches, &context).await
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.list_commands())
            .finish()
    }
}

//! The `serve` command.
//!
//! Builds the application and serves it with the axum adapter. With
//! `--reload`, the settings file given by `--config` is watched and the
//! application is rebuilt whenever it changes.

use std::sync::Arc;

use async_trait::async_trait;

use bobo_rs_app::server::serve;
use bobo_rs_app::{ReloadWatcher, SharedApplication};
use bobo_rs_core::{BoboError, BoboResult, Settings};

use crate::command::{CommandContext, ManagementCommand};

/// Serves the application.
///
/// The address comes from the settings (`host`, `port`) unless `--host` or
/// `--port` is given.
pub struct ServeCommand;

impl ServeCommand {
    /// Applies `--host` and `--port` to `settings`.
    pub fn apply_arguments(matches: &clap::ArgMatches, settings: &mut Settings) {
        if let Some(host) = matches.get_one::<String>("host") {
            settings.host.clone_from(host);
        }
        if let Some(port) = matches.get_one::<u16>("port") {
            settings.port = *port;
        }
    }
}

#[async_trait]
impl ManagementCommand for ServeCommand {
    fn name(&self) -> &'static str {
        "serve"
    }

    fn help(&self) -> &'static str {
        "Serves the application over HTTP"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("host")
                .long("host")
                .help("Host to bind to (overrides the settings)"),
        )
        .arg(
            clap::Arg::new("port")
                .long("port")
                .value_parser(clap::value_parser!(u16))
                .help("Port to bind to (overrides the settings)"),
        )
        .arg(
            clap::Arg::new("reload")
                .long("reload")
                .action(clap::ArgAction::SetTrue)
                .requires("config")
                .help("Rebuild the application when the settings file changes"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, context: &CommandContext) -> BoboResult<()> {
        let mut settings = context.settings.clone();
        Self::apply_arguments(matches, &mut settings);

        let app = (context.factory)(&settings)?;
        let shared = Arc::new(SharedApplication::new(app));

        // Dropping the watcher stops it, so it lives until the server returns.
        let _watcher = match (&context.config_path, matches.get_flag("reload")) {
            (Some(path), true) => {
                let watcher =
                    ReloadWatcher::new(path, Arc::clone(&shared), Arc::clone(&context.factory));
                Some(watcher.run().map_err(|e| {
                    BoboError::ConfigurationError(format!(
                        "Cannot watch {}: {e}",
                        path.display()
                    ))
                })?)
            }
            (None, true) => {
                return Err(BoboError::ConfigurationError(
                    "--reload needs a settings file (--config)".to_string(),
                ))
            }
            (_, false) => None,
        };

        let addr = settings.bind_address();
        tracing::info!(debug = settings.debug, "starting server at http://{addr}/");
        serve(shared, &addr).await
    }
}

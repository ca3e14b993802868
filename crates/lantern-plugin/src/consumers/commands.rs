//! CLI commands contributed by plugins.
//!
//! Plugins receive the host's root [`clap::Command`] wrapped in a
//! [`CommandRegistry`] and attach subcommands to it, each with a handler
//! that receives the parsed [`ArgMatches`].

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::sync::Arc;

use clap::{ArgMatches, Command};
use parking_lot::Mutex;
use tracing::{debug, info};

use lantern_core::error::AppError;
use lantern_core::result::AppResult;

use crate::hooks::context::CallContext;
use crate::hooks::definitions::HookPoint;
use crate::manager::PluginManager;

type CommandFn = Arc<dyn Fn(&ArgMatches) -> AppResult<String> + Send + Sync>;

/// The command group plugins add to, passed to hooks as `cli`.
pub struct CommandRegistry {
    root: Mutex<Command>,
    handlers: Mutex<BTreeMap<String, CommandFn>>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("root", &self.root.lock().get_name())
            .field("commands", &self.names())
            .finish()
    }
}

impl CommandRegistry {
    /// Wraps the host's root command.
    ///
    /// Subcommands already present on `root` are host built-ins: plugins
    /// cannot reuse their names and [`CommandRegistry::dispatch`] leaves
    /// them to the host.
    pub fn new(root: Command) -> Self {
        Self {
            root: Mutex::new(root),
            handlers: Mutex::new(BTreeMap::new()),
        }
    }

    /// Attaches a subcommand; a name already taken is a startup error.
    pub fn add<F>(&self, command: Command, run: F) -> AppResult<()>
    where
        F: Fn(&ArgMatches) -> AppResult<String> + Send + Sync + 'static,
    {
        let name = command.get_name().to_string();
        let mut root = self.root.lock();
        if root.find_subcommand(&name).is_some() {
            return Err(AppError::startup(format!("Duplicate command: {name}")));
        }

        *root = root.clone().subcommand(command);
        self.handlers.lock().insert(name.clone(), Arc::new(run));
        debug!(command = %name, "Plugin command added");
        Ok(())
    }

    /// Plugin command names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.handlers.lock().keys().cloned().collect()
    }

    /// The root command with every plugin subcommand attached.
    pub fn command(&self) -> Command {
        self.root.lock().clone()
    }

    /// Runs the plugin handler for the matched subcommand.
    ///
    /// Returns `None` when no subcommand matched or the match belongs to a
    /// host built-in.
    pub fn dispatch(&self, matches: &ArgMatches) -> AppResult<Option<String>> {
        let Some((name, sub)) = matches.subcommand() else {
            return Ok(None);
        };
        let handler = self.handlers.lock().get(name).cloned();
        match handler {
            Some(run) => run(sub).map(Some),
            None => Ok(None),
        }
    }

    /// Parses `args` (program name first) and dispatches.
    ///
    /// Parse failures, including `--help`, are validation errors carrying
    /// clap's rendered message.
    pub fn run_from<I, T>(&self, args: I) -> AppResult<Option<String>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = self
            .command()
            .try_get_matches_from(args)
            .map_err(|e| AppError::validation(e.to_string()))?;
        self.dispatch(&matches)
    }
}

impl PluginManager {
    /// Lets every plugin attach its commands to `root`.
    pub async fn register_commands(&self, root: Command) -> AppResult<Arc<CommandRegistry>> {
        let cli = Arc::new(CommandRegistry::new(root));
        self.call(
            HookPoint::RegisterCommands.as_str(),
            CallContext::new().with_object("cli", cli.clone()),
        )
        .await?;
        info!(commands = ?cli.names(), "Plugin commands registered");
        Ok(cli)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Arg;
    use lantern_core::error::ErrorKind;

    fn root() -> Command {
        Command::new("lantern").subcommand(Command::new("plugins").about("List installed plugins"))
    }

    #[test]
    fn test_add_and_dispatch() {
        let cli = CommandRegistry::new(root());
        cli.add(
            Command::new("hello")
                .about("Say hello")
                .arg(Arg::new("name").required(true)),
            |m| {
                let name = m.get_one::<String>("name").cloned().unwrap_or_default();
                Ok(format!("hello {name}"))
            },
        )
        .expect("add");

        assert_eq!(
            cli.run_from(["lantern", "hello", "world"]).expect("run"),
            Some("hello world".to_string())
        );
        assert_eq!(cli.run_from(["lantern", "plugins"]).expect("builtin"), None);
        assert_eq!(cli.run_from(["lantern"]).expect("bare"), None);

        let err = cli.run_from(["lantern", "hello"]).expect_err("missing arg");
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(cli.names(), vec!["hello"]);
    }

    #[test]
    fn test_names_are_unique_including_builtins() {
        let cli = CommandRegistry::new(root());
        let err = cli
            .add(Command::new("plugins"), |_| Ok(String::new()))
            .expect_err("builtin clash");
        assert_eq!(err.kind, ErrorKind::Startup);

        cli.add(Command::new("hello"), |_| Ok(String::new())).expect("first");
        let err = cli.add(Command::new("hello"), |_| Ok(String::new())).expect_err("dup");
        assert_eq!(err.kind, ErrorKind::Startup);
        assert_eq!(cli.names().len(), 1);
    }
}

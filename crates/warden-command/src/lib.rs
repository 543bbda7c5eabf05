//! Command registry, permission checks, player directory and built-in commands.

pub mod broadcast;
pub mod builtin;
pub mod command;
pub mod directory;
pub mod error;
pub mod permission;
pub mod sender;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, info, warn};

pub use broadcast::{Broadcast, FeedbackBroadcaster};
pub use builtin::{KickCommand, PardonIpCommand, WhitelistCommand};
pub use command::{Command, CommandContext, CommandMeta, Services};
pub use directory::{DirectoryStore, LoginVerdict, MemoryStore, OfflinePlayer, PlayerDirectory};
pub use error::{CommandError, StoreError};
pub use permission::{Permission, PermissionChecker, SenderPermissions};
pub use sender::{CommandSender, Player, SenderKind};

use command::RED;
use util::{sort_ignore_case, starts_with_ignore_case};

const INTERNAL_ERROR: &str = "An internal error occurred while attempting to perform this command";

/// Split a command line into its label and argument tokens.
///
/// A leading `/` is ignored. Tokens are separated by runs of whitespace;
/// there is no quoting.
pub fn parse_command_line(line: &str) -> Option<(&str, Vec<String>)> {
    let line = line.strip_prefix('/').unwrap_or(line);
    let mut parts = line.split_whitespace();
    let label = parts.next()?;
    Some((label, parts.map(String::from).collect()))
}

/// Registry of available server commands.
pub struct CommandRegistry {
    services: Services,
    commands: Vec<Command>,
    /// Lowercased name or alias -> index into `commands`.
    labels: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new(services: Services) -> Self {
        Self {
            services,
            commands: Vec::new(),
            labels: HashMap::new(),
        }
    }

    /// Create a registry with the built-in commands.
    pub fn with_defaults(services: Services) -> Result<Self, CommandError> {
        let mut registry = Self::new(services);
        registry.register(KickCommand::new())?;
        registry.register(PardonIpCommand::new())?;
        registry.register(WhitelistCommand::new())?;
        Ok(registry)
    }

    /// Register a command under its name and aliases.
    ///
    /// Fails if the name is already taken. Aliases that collide with an
    /// existing label are skipped.
    pub fn register(&mut self, command: impl Into<Command>) -> Result<(), CommandError> {
        let command = command.into();
        let name = command.name().to_lowercase();
        if self.labels.contains_key(&name) {
            return Err(CommandError::AlreadyRegistered(name));
        }

        let idx = self.commands.len();
        self.labels.insert(name.clone(), idx);
        for alias in &command.meta().aliases {
            let alias = alias.to_lowercase();
            if self.labels.contains_key(&alias) {
                warn!("Alias {alias} for /{name} is already taken, skipping");
                continue;
            }
            self.labels.insert(alias, idx);
        }
        debug!("Registered command /{name}");
        self.commands.push(command);
        Ok(())
    }

    /// Resolve a name or alias, ignoring case.
    pub fn get(&self, label: &str) -> Option<&Command> {
        self.labels
            .get(&label.to_lowercase())
            .map(|&idx| &self.commands[idx])
    }

    /// All registered commands, in registration order.
    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Collaborators handed to every command this registry runs.
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Parse and run a command line on behalf of `sender`.
    ///
    /// Returns `Err(UnknownCommand)` for an unknown label, without side
    /// effects. Otherwise returns what the command returned: `true` if it
    /// handled the input, `false` on a usage error. A command that fails or
    /// panics is logged, the sender gets a generic error, and the result is
    /// `false`.
    pub fn dispatch(&self, sender: &dyn CommandSender, line: &str) -> Result<bool, CommandError> {
        let (label, args) = parse_command_line(line).ok_or(CommandError::EmptyCommandLine)?;
        let Some(command) = self.get(label) else {
            debug!("{} issued unknown command: {label}", sender.name());
            return Err(CommandError::UnknownCommand(label.to_string()));
        };

        info!("{} issued server command: {line}", sender.name());
        let ctx = CommandContext {
            sender,
            alias: label,
            args: &args,
            services: &self.services,
        };

        match panic::catch_unwind(AssertUnwindSafe(|| command.execute(&ctx))) {
            Ok(Ok(handled)) => Ok(handled),
            Ok(Err(e)) => {
                error!("Couldn't execute '{line}' for {}: {e}", sender.name());
                report_internal_error(sender);
                Ok(false)
            }
            Err(_) => {
                error!("Command /{} panicked while running '{line}'", command.name());
                report_internal_error(sender);
                Ok(false)
            }
        }
    }

    /// Completion candidates for a partially typed command line.
    ///
    /// With no whitespace yet, the label itself is completed against the
    /// names and aliases the sender may use. Otherwise the command's own
    /// completion runs on the arguments; a trailing space starts a new empty
    /// token. Unknown commands and senders without permission get nothing.
    pub fn complete(
        &self,
        sender: &dyn CommandSender,
        line: &str,
    ) -> Result<Vec<String>, CommandError> {
        let slash = line.starts_with('/');
        let body = line.strip_prefix('/').unwrap_or(line);
        let checker = self.services.permissions.as_ref();

        let Some(split) = body.find(char::is_whitespace) else {
            let mut labels: Vec<String> = self
                .labels
                .iter()
                .filter(|(label, idx)| {
                    starts_with_ignore_case(label, body)
                        && self.commands[**idx]
                            .meta()
                            .test_permission_silent(sender, checker)
                })
                .map(|(label, _)| {
                    if slash {
                        format!("/{label}")
                    } else {
                        label.clone()
                    }
                })
                .collect();
            sort_ignore_case(&mut labels);
            return Ok(labels);
        };

        let label = &body[..split];
        let Some(command) = self.get(label) else {
            return Ok(Vec::new());
        };
        if !command.meta().test_permission_silent(sender, checker) {
            return Ok(Vec::new());
        }

        let mut args: Vec<String> = body[split..].split_whitespace().map(String::from).collect();
        if body.ends_with(char::is_whitespace) {
            args.push(String::new());
        }
        let ctx = CommandContext {
            sender,
            alias: label,
            args: &args,
            services: &self.services,
        };
        match panic::catch_unwind(AssertUnwindSafe(|| command.tab_complete(&ctx))) {
            Ok(result) => result,
            Err(_) => {
                error!("Command /{} panicked while completing '{line}'", command.name());
                Ok(Vec::new())
            }
        }
    }
}

fn report_internal_error(sender: &dyn CommandSender) {
    let reply = format!("{RED}{INTERNAL_ERROR}");
    if panic::catch_unwind(AssertUnwindSafe(|| sender.send_message(&reply))).is_err() {
        warn!("Couldn't report command failure to {}", sender.name());
    }
}

// ===========================================================================
// Tests
// ===========================================================================

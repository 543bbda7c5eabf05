//! The command contract shared by every built-in command.

use std::sync::Arc;

use crate::broadcast::Broadcast;
use crate::builtin::{KickCommand, PardonIpCommand, WhitelistCommand};
use crate::directory::PlayerDirectory;
use crate::error::CommandError;
use crate::permission::{Permission, PermissionChecker};
use crate::sender::CommandSender;
use crate::util::sort_ignore_case;

/// Formatting code that renders the rest of a line red.
pub const RED: &str = "\u{a7}c";

const DEFAULT_PERMISSION_MESSAGE: &str = "I'm sorry, but you do not have permission to perform this command. Please contact the server administrators if you believe that this is in error.";

/// Collaborators a command consults while running.
#[derive(Clone)]
pub struct Services {
    pub directory: Arc<PlayerDirectory>,
    pub broadcast: Arc<dyn Broadcast>,
    pub permissions: Arc<dyn PermissionChecker>,
}

/// Everything a command handler gets for one invocation.
pub struct CommandContext<'a> {
    pub sender: &'a dyn CommandSender,
    /// The label the command was invoked by (name or alias).
    pub alias: &'a str,
    /// Tokens after the label.
    pub args: &'a [String],
    pub services: &'a Services,
}

impl CommandContext<'_> {
    /// Private reply to the invoking sender.
    pub fn reply(&self, message: &str) {
        self.sender.send_message(message);
    }

    /// Broadcast command feedback on behalf of the sender.
    pub fn broadcast(&self, message: &str) {
        self.services.broadcast.command_feedback(self.sender, message);
    }

    /// Whether the sender holds a single permission node.
    pub fn allows(&self, node: &str) -> bool {
        self.services.permissions.allows_node(self.sender, node)
    }

    pub fn directory(&self) -> &PlayerDirectory {
        &self.services.directory
    }
}

/// Name, help text and permission shared by every command.
#[derive(Debug, Clone)]
pub struct CommandMeta {
    pub name: String,
    pub description: String,
    pub usage: String,
    pub aliases: Vec<String>,
    pub permission: Permission,
    pub permission_message: Option<String>,
}

impl CommandMeta {
    pub fn new(name: &str, description: &str, usage: &str, permission: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            usage: usage.to_string(),
            aliases: Vec::new(),
            permission: Permission::parse(permission),
            permission_message: None,
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_permission_message(mut self, message: &str) -> Self {
        self.permission_message = Some(message.to_string());
        self
    }

    /// Whether the sender holds any of this command's permissions.
    pub fn test_permission_silent(
        &self,
        sender: &dyn CommandSender,
        checker: &dyn PermissionChecker,
    ) -> bool {
        checker.allows(sender, &self.permission)
    }

    /// Like [`test_permission_silent`](Self::test_permission_silent), but tells
    /// the sender when they are refused.
    pub fn test_permission(&self, ctx: &CommandContext<'_>) -> bool {
        if self.test_permission_silent(ctx.sender, ctx.services.permissions.as_ref()) {
            return true;
        }
        match &self.permission_message {
            Some(message) => {
                for line in message.lines() {
                    ctx.reply(line);
                }
            }
            None => ctx.reply(&format!("{RED}{DEFAULT_PERMISSION_MESSAGE}")),
        }
        false
    }

    /// Reply with this command's usage text.
    pub fn send_usage(&self, ctx: &CommandContext<'_>) {
        ctx.reply(&format!("{RED}Usage: {}", self.usage));
    }
}

/// The built-in commands.
pub enum Command {
    Kick(KickCommand),
    PardonIp(PardonIpCommand),
    Whitelist(WhitelistCommand),
}

impl Command {
    pub fn meta(&self) -> &CommandMeta {
        match self {
            Command::Kick(c) => &c.meta,
            Command::PardonIp(c) => &c.meta,
            Command::Whitelist(c) => &c.meta,
        }
    }

    pub fn name(&self) -> &str {
        &self.meta().name
    }

    /// Run the command.
    ///
    /// `Ok(true)` means the command was handled, including a refusal for
    /// lack of permission. `Ok(false)` means a usage error, already reported
    /// to the sender.
    pub fn execute(&self, ctx: &CommandContext<'_>) -> Result<bool, CommandError> {
        match self {
            Command::Kick(c) => c.execute(ctx),
            Command::PardonIp(c) => c.execute(ctx),
            Command::Whitelist(c) => c.execute(ctx),
        }
    }

    /// Completion candidates for the last token of `ctx.args`.
    pub fn tab_complete(&self, ctx: &CommandContext<'_>) -> Result<Vec<String>, CommandError> {
        if ctx.alias.is_empty() {
            return Err(CommandError::InvalidArgument("alias cannot be empty"));
        }
        Ok(match self {
            Command::Kick(c) => c.tab_complete(ctx),
            Command::PardonIp(c) => c.tab_complete(ctx),
            Command::Whitelist(c) => c.tab_complete(ctx),
        })
    }
}

impl From<KickCommand> for Command {
    fn from(c: KickCommand) -> Self {
        Command::Kick(c)
    }
}

impl From<PardonIpCommand> for Command {
    fn from(c: PardonIpCommand) -> Self {
        Command::PardonIp(c)
    }
}

impl From<WhitelistCommand> for Command {
    fn from(c: WhitelistCommand) -> Self {
        Command::Whitelist(c)
    }
}

/// Online player names matching `token`, sorted case-insensitively.
///
/// Uses the directory's fuzzy lookup: an exact name wins outright, otherwise
/// every name starting with `token`.
pub fn complete_online_players(ctx: &CommandContext<'_>, token: &str) -> Vec<String> {
    let mut names: Vec<String> = ctx
        .directory()
        .match_players(token)
        .iter()
        .map(|p| p.name().to_string())
        .collect();
    sort_ignore_case(&mut names);
    names
}

/// Join `args[start..]` with single spaces.
pub fn join_args(args: &[String], start: usize) -> String {
    args.get(start..).unwrap_or_default().join(" ")
}

//! `/whitelist` and its subcommands.
//!
//! Each subcommand has its own permission node on top of the command-level
//! check. The enabled flag toggled by `on`/`off` is independent of who is on
//! the list.

use crate::command::{CommandContext, CommandMeta, RED};
use crate::error::CommandError;
use crate::permission;
use crate::util::{copy_partial_matches, starts_with_ignore_case};

const SUBCOMMANDS: [&str; 6] = ["add", "remove", "on", "off", "list", "reload"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subcommand {
    Reload,
    On,
    Off,
    List,
    Add,
    Remove,
}

impl Subcommand {
    /// Match a subcommand label against the number of arguments it was given.
    fn parse(label: &str, arity: usize) -> Option<Self> {
        let sub = match label.to_ascii_lowercase().as_str() {
            "reload" => Subcommand::Reload,
            "on" => Subcommand::On,
            "off" => Subcommand::Off,
            "list" => Subcommand::List,
            "add" => Subcommand::Add,
            "remove" => Subcommand::Remove,
            _ => return None,
        };
        (sub.arity() == arity).then_some(sub)
    }

    fn arity(self) -> usize {
        match self {
            Subcommand::Add | Subcommand::Remove => 2,
            _ => 1,
        }
    }

    fn permission(self) -> &'static str {
        match self {
            Subcommand::Reload => permission::WHITELIST_RELOAD,
            Subcommand::On => permission::WHITELIST_ENABLE,
            Subcommand::Off => permission::WHITELIST_DISABLE,
            Subcommand::List => permission::WHITELIST_LIST,
            Subcommand::Add => permission::WHITELIST_ADD,
            Subcommand::Remove => permission::WHITELIST_REMOVE,
        }
    }
}

/// `/whitelist (add|remove) <player>` and `/whitelist (on|off|list|reload)`
pub struct WhitelistCommand {
    pub meta: CommandMeta,
}

impl WhitelistCommand {
    pub fn new() -> Self {
        let permission = [
            permission::WHITELIST_RELOAD,
            permission::WHITELIST_ENABLE,
            permission::WHITELIST_DISABLE,
            permission::WHITELIST_LIST,
            permission::WHITELIST_ADD,
            permission::WHITELIST_REMOVE,
        ]
        .join(";");
        Self {
            meta: CommandMeta::new(
                "whitelist",
                "Manages the list of players allowed to use this server",
                "/whitelist (add|remove) <player>\n/whitelist (on|off|list|reload)",
                &permission,
            ),
        }
    }

    pub fn execute(&self, ctx: &CommandContext<'_>) -> Result<bool, CommandError> {
        if !self.meta.test_permission(ctx) {
            return Ok(true);
        }

        let Some(sub) = ctx
            .args
            .first()
            .and_then(|label| Subcommand::parse(label, ctx.args.len()))
        else {
            ctx.reply(&format!("{RED}Correct command usage:\n{}", self.meta.usage));
            return Ok(false);
        };

        if !ctx.allows(sub.permission()) {
            ctx.reply(&format!("{RED}You do not have permission to perform this action."));
            return Ok(true);
        }

        let directory = ctx.directory();
        match sub {
            Subcommand::Reload => {
                directory.reload_whitelist()?;
                ctx.broadcast("Reloaded white-list from file");
            }
            Subcommand::On => {
                directory.set_whitelist_enabled(true);
                ctx.broadcast("Turned on white-listing");
            }
            Subcommand::Off => {
                directory.set_whitelist_enabled(false);
                ctx.broadcast("Turned off white-listing");
            }
            Subcommand::List => {
                let names: Vec<String> = directory
                    .whitelisted_players()
                    .iter()
                    .map(|p| p.name().to_string())
                    .collect();
                ctx.reply(&format!("White-listed players: {}", names.join(", ")));
            }
            Subcommand::Add => {
                let name = &ctx.args[1];
                directory.set_whitelisted(name, true);
                ctx.broadcast(&format!("Added {name} to white-list"));
            }
            Subcommand::Remove => {
                let name = &ctx.args[1];
                directory.set_whitelisted(name, false);
                ctx.broadcast(&format!("Removed {name} from white-list"));
            }
        }
        Ok(true)
    }

    /// First token: subcommand literals. Second token of `add`: known players
    /// not yet whitelisted. Second token of `remove`: whitelisted players.
    pub fn tab_complete(&self, ctx: &CommandContext<'_>) -> Vec<String> {
        match ctx.args {
            [token] => copy_partial_matches(token, SUBCOMMANDS),
            [sub, token] if sub.eq_ignore_ascii_case("add") => ctx
                .directory()
                .offline_players()
                .into_iter()
                .filter(|p| !p.is_whitelisted() && starts_with_ignore_case(p.name(), token))
                .map(|p| p.name().to_string())
                .collect(),
            [sub, token] if sub.eq_ignore_ascii_case("remove") => ctx
                .directory()
                .whitelisted_players()
                .into_iter()
                .filter(|p| starts_with_ignore_case(p.name(), token))
                .map(|p| p.name().to_string())
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl Default for WhitelistCommand {
    fn default() -> Self {
        Self::new()
    }
}

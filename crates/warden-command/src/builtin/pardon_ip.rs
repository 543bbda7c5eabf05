use crate::command::{CommandContext, CommandMeta};
use crate::error::CommandError;
use crate::permission;
use crate::util::{copy_partial_matches, is_ipv4_literal};

/// `/pardon-ip <address>`
pub struct PardonIpCommand {
    pub meta: CommandMeta,
}

impl PardonIpCommand {
    pub fn new() -> Self {
        Self {
            meta: CommandMeta::new(
                "pardon-ip",
                "Allows the specified IP address to use this server",
                "/pardon-ip <address>",
                permission::UNBAN_IP,
            ),
        }
    }

    pub fn execute(&self, ctx: &CommandContext<'_>) -> Result<bool, CommandError> {
        if !self.meta.test_permission(ctx) {
            return Ok(true);
        }
        let [address] = ctx.args else {
            self.meta.send_usage(ctx);
            return Ok(false);
        };

        // The grammar check comes first: a malformed address never reaches
        // the ban set, even when it is not in it.
        if !is_ipv4_literal(address) {
            ctx.reply("Invalid ip");
            return Ok(true);
        }

        ctx.directory().unban_ip(address);
        ctx.broadcast(&format!("Pardoned ip {address}"));
        Ok(true)
    }

    /// Completes against the current ban list.
    pub fn tab_complete(&self, ctx: &CommandContext<'_>) -> Vec<String> {
        match ctx.args {
            [token] => copy_partial_matches(token, ctx.directory().ip_bans()),
            _ => Vec::new(),
        }
    }
}

impl Default for PardonIpCommand {
    fn default() -> Self {
        Self::new()
    }
}

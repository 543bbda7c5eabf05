use crate::command::{complete_online_players, join_args, CommandContext, CommandMeta};
use crate::error::CommandError;
use crate::permission;

const DEFAULT_REASON: &str = "Kicked by an operator.";

/// `/kick <player> [reason ...]`
pub struct KickCommand {
    pub meta: CommandMeta,
}

impl KickCommand {
    pub fn new() -> Self {
        Self {
            meta: CommandMeta::new(
                "kick",
                "Removes the specified player from the server",
                "/kick <player> [reason ...]",
                permission::KICK,
            ),
        }
    }

    pub fn execute(&self, ctx: &CommandContext<'_>) -> Result<bool, CommandError> {
        if !self.meta.test_permission(ctx) {
            return Ok(true);
        }
        let target = match ctx.args.first() {
            Some(name) if !name.is_empty() => name,
            _ => {
                self.meta.send_usage(ctx);
                return Ok(false);
            }
        };

        let Some(player) = ctx.directory().player_exact(target) else {
            ctx.reply(&format!("{target} not found."));
            return Ok(true);
        };

        let reason = if ctx.args.len() > 1 {
            join_args(ctx.args, 1)
        } else {
            DEFAULT_REASON.to_string()
        };

        player.kick(&reason);
        ctx.broadcast(&format!(
            "Kicked player {}. With reason:\n{reason}",
            player.name()
        ));
        Ok(true)
    }

    /// Completes the player name only; the reason is free text.
    pub fn tab_complete(&self, ctx: &CommandContext<'_>) -> Vec<String> {
        match ctx.args {
            [token] => complete_online_players(ctx, token),
            _ => Vec::new(),
        }
    }
}

impl Default for KickCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Services, RED};
    use crate::permission::KICK;
    use crate::testing::{MockPlayer, MockSender, TestServices};

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    fn run(services: &Services, sender: &MockSender, tokens: &[&str]) -> bool {
        let args = args(tokens);
        let ctx = CommandContext {
            sender,
            alias: "kick",
            args: &args,
            services,
        };
        KickCommand::new().execute(&ctx).unwrap()
    }

    #[test]
    fn kicks_with_default_reason() {
        let t = TestServices::new();
        let steve = MockPlayer::arc("Steve");
        t.directory.player_joined(steve.clone());

        let op = MockSender::player("Op").with_permission(KICK);
        assert!(run(&t.services, &op, &["steve"]));
        assert_eq!(steve.kicks(), vec![DEFAULT_REASON]);
        let broadcasts = t.broadcast.messages();
        assert_eq!(broadcasts.len(), 1);
        assert_eq!(broadcasts[0].0, "Op");
        assert!(broadcasts[0].1.contains("Kicked player Steve"));
        assert!(broadcasts[0].1.contains(DEFAULT_REASON));
    }

    #[test]
    fn kicks_with_given_reason() {
        let t = TestServices::new();
        let steve = MockPlayer::arc("Steve");
        t.directory.player_joined(steve.clone());

        let op = MockSender::console();
        assert!(run(&t.services, &op, &["Steve", "too", "loud"]));
        assert_eq!(steve.kicks(), vec!["too loud"]);
        assert!(t.broadcast.messages()[0].1.ends_with("too loud"));
    }

    #[test]
    fn missing_player_is_reported_without_broadcast() {
        let t = TestServices::new();
        let op = MockSender::console();
        assert!(run(&t.services, &op, &["Nobody"]));
        assert!(op.last_message().unwrap().contains("Nobody not found"));
        assert!(t.broadcast.messages().is_empty());
    }

    #[test]
    fn missing_argument_is_usage_error() {
        let t = TestServices::new();
        let op = MockSender::console();
        assert!(!run(&t.services, &op, &[]));
        assert!(!run(&t.services, &op, &[""]));
        let msg = op.last_message().unwrap();
        assert!(msg.starts_with(RED));
        assert!(msg.contains("/kick <player>"));
    }

    #[test]
    fn denied_sender_changes_nothing() {
        let t = TestServices::new();
        let steve = MockPlayer::arc("Steve");
        t.directory.player_joined(steve.clone());

        let guest = MockSender::player("Guest");
        assert!(run(&t.services, &guest, &["Steve"]));
        assert!(steve.kicks().is_empty());
        assert!(t.broadcast.messages().is_empty());
        assert!(guest.last_message().unwrap().contains("permission"));
    }

    #[test]
    fn completes_first_token_only() {
        let t = TestServices::new();
        t.directory.player_joined(MockPlayer::arc("Steve"));
        t.directory.player_joined(MockPlayer::arc("Alex"));
        let sender = MockSender::console();
        let complete = |tokens: &[&str]| {
            let args = args(tokens);
            let ctx = CommandContext {
                sender: &sender,
                alias: "kick",
                args: &args,
                services: &t.services,
            };
            KickCommand::new().tab_complete(&ctx)
        };
        assert_eq!(complete(&["s"]), vec!["Steve"]);
        assert_eq!(complete(&[""]), vec!["Alex", "Steve"]);
        assert!(complete(&["Steve", ""]).is_empty());
        assert!(complete(&[]).is_empty());
    }
}

//! The server console as a command sender.

use tracing::info;
use warden_command::{CommandSender, SenderKind};

const COLOR_CHAR: char = '\u{a7}';

/// Holds every permission. Replies go to the log.
pub struct ConsoleSender;

impl CommandSender for ConsoleSender {
    fn name(&self) -> &str {
        "CONSOLE"
    }

    fn kind(&self) -> SenderKind {
        SenderKind::Console
    }

    fn send_message(&self, message: &str) {
        for line in strip_colors(message).lines() {
            info!(target: "console", "{line}");
        }
    }

    fn has_permission(&self, _permission: &str) -> bool {
        true
    }
}

/// Remove `§x` formatting codes, which mean nothing in a terminal.
fn strip_colors(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let mut chars = message.chars();
    while let Some(c) = chars.next() {
        if c == COLOR_CHAR {
            chars.next();
        } else {
            out.push(c);
        }
    }
    out
}

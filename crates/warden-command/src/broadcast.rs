//! Command feedback broadcast.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::warn;

use crate::directory::PlayerDirectory;
use crate::sender::{same_sender, CommandSender};

/// Fan-out of a command's side effects to everyone who watches commands.
pub trait Broadcast: Send + Sync {
    /// Tell `source` what happened, and tell every other feedback recipient
    /// who did it.
    fn command_feedback(&self, source: &dyn CommandSender, message: &str);
}

/// Broadcasts to the console and to online players that receive command
/// feedback.
pub struct FeedbackBroadcaster {
    directory: Arc<PlayerDirectory>,
    console: Arc<dyn CommandSender>,
}

impl FeedbackBroadcaster {
    pub fn new(directory: Arc<PlayerDirectory>, console: Arc<dyn CommandSender>) -> Self {
        Self { directory, console }
    }
}

impl Broadcast for FeedbackBroadcaster {
    fn command_feedback(&self, source: &dyn CommandSender, message: &str) {
        deliver(source, message);

        let relayed = format!("[{}: {message}]", source.name());
        for player in self.directory.online_players() {
            if !same_sender(player.as_ref(), source) && player.receives_command_feedback() {
                deliver(player.as_ref(), &relayed);
            }
        }
        if !same_sender(self.console.as_ref(), source) {
            deliver(self.console.as_ref(), &relayed);
        }
    }
}

/// Send one message, containing a panicking recipient.
fn deliver<R: CommandSender + ?Sized>(recipient: &R, message: &str) {
    if panic::catch_unwind(AssertUnwindSafe(|| recipient.send_message(message))).is_err() {
        warn!("Failed to deliver command feedback to {}", recipient.name());
    }
}

//! Command senders: anything that can issue a command and read a reply.

use std::net::IpAddr;

use crate::permission::BROADCAST_ADMIN;

/// Where a command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderKind {
    /// The local server console.
    Console,
    /// A connected player.
    Player,
    /// A remote administrator (e.g. RCON).
    Remote,
}

/// Capability shared by every command issuer.
///
/// Implementations are owned by the connection layer. Delivery through
/// [`send_message`](Self::send_message) is best effort; an implementation that
/// cannot deliver should drop the message rather than panic.
pub trait CommandSender: Send + Sync {
    /// Display name, unique among online senders.
    fn name(&self) -> &str;

    fn kind(&self) -> SenderKind;

    /// Deliver a private reply to this sender.
    fn send_message(&self, message: &str);

    /// Whether this sender holds the exact permission node.
    fn has_permission(&self, permission: &str) -> bool;

    /// Whether this sender sees other senders' command feedback.
    fn receives_command_feedback(&self) -> bool {
        self.kind() == SenderKind::Console || self.has_permission(BROADCAST_ADMIN)
    }
}

/// A connected player. Referenced here, owned by the connection layer.
pub trait Player: CommandSender {
    /// Remote address of the player's connection.
    fn address(&self) -> IpAddr;

    /// Disconnect the player with the given reason.
    fn kick(&self, reason: &str);
}

/// Whether two senders are the same actor. Names are unique per kind.
pub(crate) fn same_sender<A: CommandSender + ?Sized>(a: &A, b: &dyn CommandSender) -> bool {
    a.kind() == b.kind() && a.name() == b.name()
}

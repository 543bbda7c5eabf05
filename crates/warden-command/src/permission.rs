//! Permission strings and the checker that evaluates them.
//!
//! A permission string may carry several alternatives joined by `;`. It is
//! split once, when the owning command is built, and a sender is authorized
//! if it holds any one of the alternatives.

use crate::sender::CommandSender;

/// Separator between alternatives in a permission string.
pub const PERMISSION_SEPARATOR: char = ';';

/// Holders of this node receive other senders' command feedback.
pub const BROADCAST_ADMIN: &str = "server.broadcast.admin";

pub const KICK: &str = "server.command.kick";
pub const UNBAN_IP: &str = "server.command.unban.ip";
pub const WHITELIST_RELOAD: &str = "server.command.whitelist.reload";
pub const WHITELIST_ENABLE: &str = "server.command.whitelist.enable";
pub const WHITELIST_DISABLE: &str = "server.command.whitelist.disable";
pub const WHITELIST_LIST: &str = "server.command.whitelist.list";
pub const WHITELIST_ADD: &str = "server.command.whitelist.add";
pub const WHITELIST_REMOVE: &str = "server.command.whitelist.remove";

/// A parsed permission string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permission {
    alternatives: Vec<String>,
}

impl Permission {
    /// Parse a `;`-joined permission string. Blank segments are dropped.
    pub fn parse(raw: &str) -> Self {
        let alternatives = raw
            .split(PERMISSION_SEPARATOR)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Self { alternatives }
    }

    /// A permission that every sender holds.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    /// True if this permission has no alternatives and therefore always allows.
    pub fn is_unrestricted(&self) -> bool {
        self.alternatives.is_empty()
    }
}

impl From<&str> for Permission {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Answers whether a sender may do what a permission guards.
pub trait PermissionChecker: Send + Sync {
    fn allows(&self, sender: &dyn CommandSender, permission: &Permission) -> bool;

    /// Check a single permission node.
    fn allows_node(&self, sender: &dyn CommandSender, node: &str) -> bool {
        self.allows(sender, &Permission::parse(node))
    }
}

/// Defers to the sender's own permission query.
#[derive(Debug, Clone, Copy, Default)]
pub struct SenderPermissions;

impl PermissionChecker for SenderPermissions {
    fn allows(&self, sender: &dyn CommandSender, permission: &Permission) -> bool {
        permission.is_unrestricted()
            || permission
                .alternatives
                .iter()
                .any(|node| sender.has_permission(node))
    }
}

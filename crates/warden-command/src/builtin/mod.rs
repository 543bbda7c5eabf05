//! Built-in commands.

mod kick;
mod pardon_ip;
mod whitelist;

pub use kick::KickCommand;
pub use pardon_ip::PardonIpCommand;
pub use whitelist::WhitelistCommand;

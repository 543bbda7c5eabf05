//! The entry points the connection layer calls into.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{error, info};
use warden_command::{
    CommandError, CommandRegistry, CommandSender, DirectoryStore, FeedbackBroadcaster,
    LoginVerdict, Player, PlayerDirectory, SenderPermissions, Services,
};
use warden_messaging::MessagingChannelRegistry;

use crate::config::ServerConfig;
use crate::console::ConsoleSender;
use crate::store::JsonStore;

/// Owns the player directory, the commands and the plugin channels.
pub struct Server {
    console: Arc<ConsoleSender>,
    directory: Arc<PlayerDirectory>,
    commands: CommandRegistry,
    messaging: MessagingChannelRegistry,
}

impl Server {
    /// Build a server persisting to the configured data directory.
    pub fn open(config: &ServerConfig) -> Result<Self, CommandError> {
        let store = Arc::new(JsonStore::new(&config.permissions.data_directory));
        Self::with_store(store, config.permissions.whitelist_enabled)
    }

    pub fn with_store(
        store: Arc<dyn DirectoryStore>,
        whitelist_enabled: bool,
    ) -> Result<Self, CommandError> {
        let directory = Arc::new(PlayerDirectory::load(store, whitelist_enabled)?);
        let console = Arc::new(ConsoleSender);
        let services = Services {
            directory: directory.clone(),
            broadcast: Arc::new(FeedbackBroadcaster::new(directory.clone(), console.clone())),
            permissions: Arc::new(SenderPermissions),
        };
        Ok(Self {
            console,
            directory,
            commands: CommandRegistry::with_defaults(services)?,
            messaging: MessagingChannelRegistry::new(),
        })
    }

    pub fn directory(&self) -> &PlayerDirectory {
        &self.directory
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn messaging(&self) -> &MessagingChannelRegistry {
        &self.messaging
    }

    /// Run one console line. Returns whether a command handled it.
    pub fn handle_console_line(&self, line: &str) -> bool {
        match self.commands.dispatch(self.console.as_ref(), line) {
            Ok(handled) => handled,
            Err(CommandError::EmptyCommandLine) => false,
            Err(CommandError::UnknownCommand(label)) => {
                self.console
                    .send_message(&format!("Unknown command \"{label}\"."));
                false
            }
            Err(e) => {
                error!("Console command failed: {e}");
                false
            }
        }
    }

    /// Completion candidates for a partially typed console line.
    pub fn complete_console_line(&self, line: &str) -> Vec<String> {
        self.commands
            .complete(self.console.as_ref(), line)
            .unwrap_or_else(|e| {
                error!("Completion failed for '{line}': {e}");
                Vec::new()
            })
    }

    /// Decide whether a connecting player may join.
    ///
    /// Only an allowed player is added to the online roster. The caller
    /// disconnects a refused one with [`LoginVerdict::reason`].
    pub fn handle_player_join(&self, player: Arc<dyn Player>) -> LoginVerdict {
        let name = player.name().to_string();
        let address = player.address();
        let verdict = self.directory.check_login(&name, address);
        match verdict {
            LoginVerdict::Allowed => {
                info!("{name} joined from {address}");
                self.directory.player_joined(player);
            }
            refused => info!("Refused {name} from {address}: {refused:?}"),
        }
        verdict
    }

    /// Returns whether the player was online.
    pub fn handle_player_quit(&self, name: &str) -> bool {
        let left = self.directory.player_left(name).is_some();
        if left {
            info!("{name} left");
        }
        left
    }

    /// Route an inbound plugin message to the channel's listeners.
    pub fn handle_plugin_message(&self, channel: &str, player: &str, payload: Bytes) -> usize {
        self.messaging.dispatch(channel, player, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Mutex;
    use warden_command::{MemoryStore, SenderKind};
    use warden_messaging::PluginMessageListener;

    struct TestPlayer {
        name: String,
        address: IpAddr,
        messages: Mutex<Vec<String>>,
        kicks: Mutex<Vec<String>>,
    }

    impl TestPlayer {
        fn arc(name: &str, address: [u8; 4]) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                address: IpAddr::V4(Ipv4Addr::from(address)),
                messages: Mutex::new(Vec::new()),
                kicks: Mutex::new(Vec::new()),
            })
        }
    }

    impl CommandSender for TestPlayer {
        fn name(&self) -> &str {
            &self.name
        }

        fn kind(&self) -> SenderKind {
            SenderKind::Player
        }

        fn send_message(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }

        fn has_permission(&self, _permission: &str) -> bool {
            false
        }
    }

    impl Player for TestPlayer {
        fn address(&self) -> IpAddr {
            self.address
        }

        fn kick(&self, reason: &str) {
            self.kicks.lock().unwrap().push(reason.to_string());
        }
    }

    #[derive(Default)]
    struct Counter(Mutex<Vec<Vec<u8>>>);

    impl PluginMessageListener for Counter {
        fn on_plugin_message(&self, _channel: &str, _source: &str, payload: Bytes) {
            self.0.lock().unwrap().push(payload.to_vec());
        }
    }

    fn server(whitelist: &[&str], bans: &[&str], enabled: bool) -> (Server, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::seeded(whitelist, bans));
        let server = Server::with_store(store.clone(), enabled).unwrap();
        (server, store)
    }

    #[test]
    fn console_runs_whitelist_commands() {
        let (server, store) = server(&[], &[], false);
        assert!(server.handle_console_line("whitelist add Steve"));
        assert!(server.handle_console_line("/whitelist on"));

        assert!(server.directory().is_whitelist_enabled());
        assert!(server.directory().is_whitelisted("steve"));
        assert_eq!(store.whitelist(), vec!["Steve"]);
    }

    #[test]
    fn console_usage_errors_and_unknown_commands() {
        let (server, _) = server(&[], &[], false);
        assert!(!server.handle_console_line("whitelist"));
        assert!(!server.handle_console_line("fly"));
        assert!(!server.handle_console_line("   "));
    }

    #[test]
    fn console_completes_labels_and_arguments() {
        let (server, _) = server(&["Steve"], &[], false);
        assert_eq!(server.complete_console_line("/wh"), vec!["/whitelist"]);
        assert_eq!(server.complete_console_line("whitelist remove "), vec!["Steve"]);
    }

    #[test]
    fn join_respects_bans_and_whitelist() {
        let (server, _) = server(&["Steve"], &["10.0.0.9"], true);

        let steve = TestPlayer::arc("Steve", [127, 0, 0, 1]);
        assert_eq!(server.handle_player_join(steve), LoginVerdict::Allowed);

        let alex = TestPlayer::arc("Alex", [127, 0, 0, 2]);
        assert_eq!(server.handle_player_join(alex), LoginVerdict::NotWhitelisted);

        let banned = TestPlayer::arc("Steve2", [10, 0, 0, 9]);
        assert_eq!(server.handle_player_join(banned), LoginVerdict::IpBanned);

        let online: Vec<String> = server
            .directory()
            .online_players()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(online, vec!["Steve"]);
    }

    #[test]
    fn whitelist_off_admits_anyone_not_banned() {
        let (server, _) = server(&[], &[], false);
        let alex = TestPlayer::arc("Alex", [127, 0, 0, 2]);
        assert_eq!(server.handle_player_join(alex), LoginVerdict::Allowed);
    }

    #[test]
    fn console_kicks_online_player() {
        let (server, _) = server(&[], &[], false);
        let steve = TestPlayer::arc("Steve", [127, 0, 0, 1]);
        server.handle_player_join(steve.clone());

        assert!(server.handle_console_line("kick Steve spamming"));
        assert_eq!(*steve.kicks.lock().unwrap(), vec!["spamming"]);
        // the kicked player holds no feedback permission
        assert!(steve.messages.lock().unwrap().is_empty());

        assert!(server.handle_player_quit("steve"));
        assert!(!server.handle_player_quit("steve"));
    }

    #[test]
    fn pardon_ip_from_console() {
        let (server, store) = server(&[], &["10.0.0.9"], false);
        assert!(server.handle_console_line("pardon-ip 10.0.0.9"));
        assert!(store.ip_bans().is_empty());
    }

    #[test]
    fn plugin_messages_reach_listeners() {
        let (server, _) = server(&[], &[], false);
        let listener = Arc::new(Counter::default());
        server
            .messaging()
            .register("warden:test", listener.clone())
            .unwrap();

        assert_eq!(
            server.handle_plugin_message("warden:test", "Steve", Bytes::from_static(b"ping")),
            1
        );
        assert_eq!(
            server.handle_plugin_message("warden:other", "Steve", Bytes::new()),
            0
        );
        assert_eq!(*listener.0.lock().unwrap(), vec![b"ping".to_vec()]);
    }
}

//! Recording senders and players for unit tests.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::broadcast::Broadcast;
use crate::command::Services;
use crate::directory::{MemoryStore, PlayerDirectory};
use crate::permission::SenderPermissions;
use crate::sender::{CommandSender, Player, SenderKind};

pub struct MockSender {
    name: String,
    kind: SenderKind,
    permissions: HashSet<String>,
    all_permissions: bool,
    failing: bool,
    messages: Mutex<Vec<String>>,
}

impl MockSender {
    pub fn player(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: SenderKind::Player,
            permissions: HashSet::new(),
            all_permissions: false,
            failing: false,
            messages: Mutex::new(Vec::new()),
        }
    }

    /// The console holds every permission.
    pub fn console() -> Self {
        Self {
            kind: SenderKind::Console,
            all_permissions: true,
            ..Self::player("CONSOLE")
        }
    }

    pub fn with_permission(mut self, node: &str) -> Self {
        self.permissions.insert(node.to_string());
        self
    }

    /// Panic on every delivery.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn last_message(&self) -> Option<String> {
        self.messages.lock().last().cloned()
    }
}

impl CommandSender for MockSender {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SenderKind {
        self.kind
    }

    fn send_message(&self, message: &str) {
        if self.failing {
            panic!("connection closed");
        }
        self.messages.lock().push(message.to_string());
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.all_permissions || self.permissions.contains(permission)
    }
}

pub struct MockPlayer {
    sender: MockSender,
    address: IpAddr,
    kicks: Mutex<Vec<String>>,
}

impl MockPlayer {
    pub fn new(name: &str) -> Self {
        Self {
            sender: MockSender::player(name),
            address: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            kicks: Mutex::new(Vec::new()),
        }
    }

    pub fn arc(name: &str) -> Arc<Self> {
        Arc::new(Self::new(name))
    }

    pub fn with_permission(mut self, node: &str) -> Self {
        self.sender = self.sender.with_permission(node);
        self
    }

    pub fn failing(mut self) -> Self {
        self.sender = self.sender.failing();
        self
    }

    pub fn messages(&self) -> Vec<String> {
        self.sender.messages()
    }

    pub fn kicks(&self) -> Vec<String> {
        self.kicks.lock().clone()
    }
}

impl CommandSender for MockPlayer {
    fn name(&self) -> &str {
        self.sender.name()
    }

    fn kind(&self) -> SenderKind {
        SenderKind::Player
    }

    fn send_message(&self, message: &str) {
        self.sender.send_message(message);
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.sender.has_permission(permission)
    }
}

impl Player for MockPlayer {
    fn address(&self) -> IpAddr {
        self.address
    }

    fn kick(&self, reason: &str) {
        self.kicks.lock().push(reason.to_string());
    }
}

/// Records every broadcast instead of delivering it.
#[derive(Default)]
pub struct RecordingBroadcast {
    messages: Mutex<Vec<(String, String)>>,
}

impl RecordingBroadcast {
    /// `(source name, message)` pairs in broadcast order.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().clone()
    }
}

impl Broadcast for RecordingBroadcast {
    fn command_feedback(&self, source: &dyn CommandSender, message: &str) {
        self.messages
            .lock()
            .push((source.name().to_string(), message.to_string()));
    }
}

/// Services over a fresh in-memory directory, plus handles to inspect them.
pub struct TestServices {
    pub store: Arc<MemoryStore>,
    pub directory: Arc<PlayerDirectory>,
    pub broadcast: Arc<RecordingBroadcast>,
    pub services: Services,
}

impl TestServices {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_store(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        let directory =
            Arc::new(PlayerDirectory::load(store.clone(), false).expect("memory store loads"));
        let broadcast = Arc::new(RecordingBroadcast::default());
        let services = Services {
            directory: directory.clone(),
            broadcast: broadcast.clone(),
            permissions: Arc::new(SenderPermissions),
        };
        Self {
            store,
            directory,
            broadcast,
            services,
        }
    }
}

//! Player directory: online roster, offline records, whitelist and IP bans.
//!
//! One `PlayerDirectory` is shared (behind an `Arc`) by every command and by
//! the connection layer, so a mutation made by one caller is visible to the
//! next read from any other. Each collection sits behind its own lock, and
//! the persistence store is only ever called with no collection lock held.
//! Store writes for one set are serialized so they land in mutation order.

use std::collections::{BTreeMap, BTreeSet};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::error::{CommandError, StoreError};
use crate::sender::Player;
use crate::util::{is_ip_literal, is_ipv4_literal, starts_with_ignore_case};

/// Durable storage for the whitelist and IP-ban sets.
pub trait DirectoryStore: Send + Sync {
    fn load_whitelist(&self) -> Result<Vec<String>, StoreError>;
    fn save_whitelist(&self, names: &[String]) -> Result<(), StoreError>;
    fn load_ip_bans(&self) -> Result<Vec<String>, StoreError>;
    fn save_ip_bans(&self, addresses: &[String]) -> Result<(), StoreError>;
}

/// In-memory store, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    whitelist: Mutex<Vec<String>>,
    ip_bans: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with whitelist names and banned addresses.
    pub fn seeded(whitelist: &[&str], ip_bans: &[&str]) -> Self {
        Self {
            whitelist: Mutex::new(whitelist.iter().map(|s| s.to_string()).collect()),
            ip_bans: Mutex::new(ip_bans.iter().map(|s| s.to_string()).collect()),
        }
    }

    /// Replace the stored whitelist, as an operator editing the file would.
    pub fn set_whitelist(&self, names: &[&str]) {
        *self.whitelist.lock() = names.iter().map(|s| s.to_string()).collect();
    }

    pub fn whitelist(&self) -> Vec<String> {
        self.whitelist.lock().clone()
    }

    pub fn ip_bans(&self) -> Vec<String> {
        self.ip_bans.lock().clone()
    }
}

impl DirectoryStore for MemoryStore {
    fn load_whitelist(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.whitelist.lock().clone())
    }

    fn save_whitelist(&self, names: &[String]) -> Result<(), StoreError> {
        *self.whitelist.lock() = names.to_vec();
        Ok(())
    }

    fn load_ip_bans(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.ip_bans.lock().clone())
    }

    fn save_ip_bans(&self, addresses: &[String]) -> Result<(), StoreError> {
        *self.ip_bans.lock() = addresses.to_vec();
        Ok(())
    }
}

/// A player record that exists whether or not the player is connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfflinePlayer {
    name: String,
    whitelisted: bool,
}

impl OfflinePlayer {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_whitelisted(&self) -> bool {
        self.whitelisted
    }
}

/// Outcome of the join-time checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginVerdict {
    Allowed,
    IpBanned,
    NotWhitelisted,
}

impl LoginVerdict {
    /// Disconnect text shown to a rejected player.
    pub fn reason(self) -> Option<&'static str> {
        match self {
            LoginVerdict::Allowed => None,
            LoginVerdict::IpBanned => Some("Your IP address is banned from this server."),
            LoginVerdict::NotWhitelisted => Some("You are not white-listed on this server!"),
        }
    }
}

/// Shared lookup and mutation point for player state.
pub struct PlayerDirectory {
    store: Arc<dyn DirectoryStore>,
    online: RwLock<Vec<Arc<dyn Player>>>,
    /// Keyed by lowercased name. The whitelist is exactly the records with
    /// `whitelisted == true`.
    offline: RwLock<BTreeMap<String, OfflinePlayer>>,
    ip_bans: RwLock<BTreeSet<String>>,
    whitelist_enabled: AtomicBool,
    /// Held across mutate-then-save and load-then-swap of the whitelist, so
    /// the store sees snapshots in the order they were taken. Always taken
    /// before the collection lock.
    whitelist_io: Mutex<()>,
    /// Same as `whitelist_io`, for the ban set.
    ip_ban_io: Mutex<()>,
}

impl PlayerDirectory {
    /// Create an empty directory backed by `store`. Nothing is read yet.
    pub fn new(store: Arc<dyn DirectoryStore>, whitelist_enabled: bool) -> Self {
        Self {
            store,
            online: RwLock::new(Vec::new()),
            offline: RwLock::new(BTreeMap::new()),
            ip_bans: RwLock::new(BTreeSet::new()),
            whitelist_enabled: AtomicBool::new(whitelist_enabled),
            whitelist_io: Mutex::new(()),
            ip_ban_io: Mutex::new(()),
        }
    }

    /// Create a directory and read both sets from `store`.
    pub fn load(
        store: Arc<dyn DirectoryStore>,
        whitelist_enabled: bool,
    ) -> Result<Self, StoreError> {
        let directory = Self::new(store, whitelist_enabled);
        directory.reload_whitelist()?;
        directory.reload_ip_bans()?;
        Ok(directory)
    }

    // --- Online players ---

    /// Add a connected player, replacing any stale entry with the same name.
    pub fn player_joined(&self, player: Arc<dyn Player>) {
        let mut online = self.online.write();
        online.retain(|p| !p.name().eq_ignore_ascii_case(player.name()));
        online.push(player);
    }

    /// Remove a player from the roster.
    pub fn player_left(&self, name: &str) -> Option<Arc<dyn Player>> {
        let mut online = self.online.write();
        let idx = online.iter().position(|p| p.name().eq_ignore_ascii_case(name))?;
        Some(online.remove(idx))
    }

    /// Snapshot of the online roster, in join order.
    pub fn online_players(&self) -> Vec<Arc<dyn Player>> {
        self.online.read().clone()
    }

    /// The online player with exactly this name (ignoring case).
    pub fn player_exact(&self, name: &str) -> Option<Arc<dyn Player>> {
        self.online
            .read()
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Online players matching a name fragment. An exact match wins outright;
    /// otherwise every player whose name starts with the fragment.
    pub fn match_players(&self, fragment: &str) -> Vec<Arc<dyn Player>> {
        let online = self.online.read();
        if let Some(exact) = online.iter().find(|p| p.name().eq_ignore_ascii_case(fragment)) {
            return vec![exact.clone()];
        }
        online
            .iter()
            .filter(|p| starts_with_ignore_case(p.name(), fragment))
            .cloned()
            .collect()
    }

    // --- Whitelist ---

    pub fn is_whitelist_enabled(&self) -> bool {
        self.whitelist_enabled.load(Ordering::Acquire)
    }

    /// Turn enforcement on or off. Membership is left untouched.
    pub fn set_whitelist_enabled(&self, enabled: bool) {
        self.whitelist_enabled.store(enabled, Ordering::Release);
        info!("White-listing {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Look up a record by name, creating a non-whitelisted one if absent.
    pub fn offline_player(&self, name: &str) -> OfflinePlayer {
        let key = name.to_lowercase();
        if let Some(record) = self.offline.read().get(&key) {
            return record.clone();
        }
        self.offline
            .write()
            .entry(key)
            .or_insert_with(|| OfflinePlayer {
                name: name.to_string(),
                whitelisted: false,
            })
            .clone()
    }

    /// Every known record, sorted by name.
    pub fn offline_players(&self) -> Vec<OfflinePlayer> {
        self.offline.read().values().cloned().collect()
    }

    /// Records currently on the whitelist, sorted by name.
    pub fn whitelisted_players(&self) -> Vec<OfflinePlayer> {
        self.offline
            .read()
            .values()
            .filter(|p| p.whitelisted)
            .cloned()
            .collect()
    }

    pub fn is_whitelisted(&self, name: &str) -> bool {
        self.offline
            .read()
            .get(&name.to_lowercase())
            .is_some_and(|p| p.whitelisted)
    }

    /// Set a player's whitelisted flag, creating the record if needed.
    ///
    /// Setting the flag to its current value is a no-op on the set. The new
    /// whitelist is persisted afterwards; a failed save is logged and the
    /// in-memory change stands.
    pub fn set_whitelisted(&self, name: &str, whitelisted: bool) -> OfflinePlayer {
        let _io = self.whitelist_io.lock();
        let (record, names) = {
            let mut offline = self.offline.write();
            let record = offline
                .entry(name.to_lowercase())
                .or_insert_with(|| OfflinePlayer {
                    name: name.to_string(),
                    whitelisted: false,
                });
            record.whitelisted = whitelisted;
            let record = record.clone();
            (record, whitelisted_names(&offline))
        };
        if let Err(e) = self.store.save_whitelist(&names) {
            warn!("Failed to save whitelist: {e}");
        }
        record
    }

    /// Re-read the whitelist from the store and make membership match it.
    ///
    /// Returns the number of whitelisted names. On error the current
    /// membership is kept.
    pub fn reload_whitelist(&self) -> Result<usize, StoreError> {
        let _io = self.whitelist_io.lock();
        let names = self.store.load_whitelist()?;
        let mut offline = self.offline.write();
        for record in offline.values_mut() {
            record.whitelisted = false;
        }
        for name in &names {
            offline
                .entry(name.to_lowercase())
                .or_insert_with(|| OfflinePlayer {
                    name: name.clone(),
                    whitelisted: false,
                })
                .whitelisted = true;
        }
        let count = offline.values().filter(|p| p.whitelisted).count();
        info!("Loaded {count} white-listed players");
        Ok(count)
    }

    // --- IP bans ---

    /// Banned addresses, sorted.
    pub fn ip_bans(&self) -> Vec<String> {
        self.ip_bans.read().iter().cloned().collect()
    }

    pub fn is_ip_banned(&self, address: &str) -> bool {
        self.ip_bans.read().contains(address)
    }

    /// Ban an address. Only IPv4 dotted-quad and IPv6 literals are accepted.
    ///
    /// Returns whether the address was newly added.
    pub fn ban_ip(&self, address: &str) -> Result<bool, CommandError> {
        let address =
            canonical_ip(address).ok_or_else(|| CommandError::InvalidIp(address.to_string()))?;
        let _io = self.ip_ban_io.lock();
        let (added, snapshot) = {
            let mut bans = self.ip_bans.write();
            let added = bans.insert(address);
            (added, bans.iter().cloned().collect::<Vec<_>>())
        };
        if added {
            self.persist_ip_bans(&snapshot);
        }
        Ok(added)
    }

    /// Lift a ban. Returns whether the address was banned.
    pub fn unban_ip(&self, address: &str) -> bool {
        let key = canonical_ip(address).unwrap_or_else(|| address.to_string());
        let _io = self.ip_ban_io.lock();
        let (removed, snapshot) = {
            let mut bans = self.ip_bans.write();
            let removed = bans.remove(&key);
            (removed, bans.iter().cloned().collect::<Vec<_>>())
        };
        if removed {
            self.persist_ip_bans(&snapshot);
        }
        removed
    }

    /// Re-read the ban set from the store. Malformed entries are skipped.
    pub fn reload_ip_bans(&self) -> Result<usize, StoreError> {
        let _io = self.ip_ban_io.lock();
        let loaded = self.store.load_ip_bans()?;
        let mut valid = BTreeSet::new();
        for entry in loaded {
            match canonical_ip(&entry) {
                Some(addr) => {
                    valid.insert(addr);
                }
                None => warn!("Ignoring malformed banned ip: {entry}"),
            }
        }
        let count = valid.len();
        *self.ip_bans.write() = valid;
        info!("Loaded {count} banned ips");
        Ok(count)
    }

    fn persist_ip_bans(&self, addresses: &[String]) {
        if let Err(e) = self.store.save_ip_bans(addresses) {
            warn!("Failed to save banned ips: {e}");
        }
    }

    // --- Join checks ---

    /// Decide whether a player may join. IP bans always apply; the whitelist
    /// only while it is enabled.
    pub fn check_login(&self, name: &str, address: IpAddr) -> LoginVerdict {
        if self.is_ip_banned(&address.to_string()) {
            return LoginVerdict::IpBanned;
        }
        if self.is_whitelist_enabled() && !self.is_whitelisted(name) {
            return LoginVerdict::NotWhitelisted;
        }
        LoginVerdict::Allowed
    }
}

fn whitelisted_names(offline: &BTreeMap<String, OfflinePlayer>) -> Vec<String> {
    offline
        .values()
        .filter(|p| p.whitelisted)
        .map(|p| p.name.clone())
        .collect()
}

/// The stored form of an address, or `None` if it is not an IP literal.
///
/// Both families are normalised to what `IpAddr::to_string` prints, so that
/// `010.0.0.1` and `10.0.0.1` (or `::1` and `0:0:0:0:0:0:0:1`) are one entry
/// and match the address of a connecting player.
fn canonical_ip(address: &str) -> Option<String> {
    if is_ipv4_literal(address) {
        // The grammar allows leading zeros, which `Ipv4Addr::from_str` rejects.
        let mut octets = [0u8; 4];
        for (octet, part) in octets.iter_mut().zip(address.split('.')) {
            *octet = part.parse().ok()?;
        }
        return Some(Ipv4Addr::from(octets).to_string());
    }
    if !is_ip_literal(address) {
        return None;
    }
    address.parse::<Ipv6Addr>().ok().map(|a| a.to_string())
}

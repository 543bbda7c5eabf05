//! Plugin messaging: named channels carrying opaque byte payloads.
//!
//! Listeners register on one or more channels. An inbound payload is handed to
//! every listener on that exact channel, in registration order. The registry
//! lock is never held while a listener runs, so listeners may register or
//! unregister (themselves or others) from inside a callback.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Longest accepted channel name, in bytes.
pub const MAX_CHANNEL_LENGTH: usize = 64;

/// Channel names used by the transport for channel negotiation.
pub const RESERVED_CHANNELS: [&str; 2] = ["REGISTER", "UNREGISTER"];

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessagingError {
    #[error("channel name cannot be empty")]
    EmptyChannel,

    #[error("channel name too long: {len} bytes (max {max})")]
    ChannelTooLong { len: usize, max: usize },

    #[error("channel name is reserved: {0}")]
    ReservedChannel(String),
}

/// Check that `channel` may be registered.
pub fn validate_channel(channel: &str) -> Result<(), MessagingError> {
    if channel.is_empty() {
        return Err(MessagingError::EmptyChannel);
    }
    if channel.len() > MAX_CHANNEL_LENGTH {
        return Err(MessagingError::ChannelTooLong {
            len: channel.len(),
            max: MAX_CHANNEL_LENGTH,
        });
    }
    if RESERVED_CHANNELS.contains(&channel) {
        return Err(MessagingError::ReservedChannel(channel.to_string()));
    }
    Ok(())
}

// ─── Listener trait ──────────────────────────────────────────────────────────

/// Receives payloads sent on the channels it is registered for.
pub trait PluginMessageListener: Send + Sync {
    /// Called once per payload on a registered channel.
    ///
    /// `source` is the name of the player the payload came from. The payload
    /// format is up to the plugins using the channel.
    fn on_plugin_message(&self, channel: &str, source: &str, payload: Bytes);
}

/// Listeners compare by identity, not by value.
fn same_listener(a: &Arc<dyn PluginMessageListener>, b: &Arc<dyn PluginMessageListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// One (channel, listener) pair. Cleared on unregister so that a dispatch
/// already holding a snapshot skips it.
struct Registration {
    listener: Arc<dyn PluginMessageListener>,
    active: AtomicBool,
}

/// Maps channel names to their listeners.
#[derive(Default)]
pub struct MessagingChannelRegistry {
    channels: RwLock<HashMap<String, Vec<Arc<Registration>>>>,
}

impl MessagingChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` on `channel`.
    ///
    /// Returns `Ok(false)` if it was already registered there.
    pub fn register(
        &self,
        channel: &str,
        listener: Arc<dyn PluginMessageListener>,
    ) -> Result<bool, MessagingError> {
        validate_channel(channel)?;
        let mut channels = self.channels.write();
        let registrations = channels.entry(channel.to_string()).or_default();
        if registrations
            .iter()
            .any(|r| same_listener(&r.listener, &listener))
        {
            return Ok(false);
        }
        registrations.push(Arc::new(Registration {
            listener,
            active: AtomicBool::new(true),
        }));
        debug!("Registered listener on channel {channel}");
        Ok(true)
    }

    /// Remove `listener` from `channel`. Returns whether it was registered.
    ///
    /// Takes effect immediately, including for a dispatch in progress.
    pub fn unregister(&self, channel: &str, listener: &Arc<dyn PluginMessageListener>) -> bool {
        let mut channels = self.channels.write();
        let Some(registrations) = channels.get_mut(channel) else {
            return false;
        };
        let Some(idx) = registrations
            .iter()
            .position(|r| same_listener(&r.listener, listener))
        else {
            return false;
        };
        registrations.remove(idx).active.store(false, Ordering::Release);
        if registrations.is_empty() {
            channels.remove(channel);
        }
        debug!("Unregistered listener from channel {channel}");
        true
    }

    /// Remove `listener` from every channel. Returns how many registrations
    /// were dropped.
    pub fn unregister_all(&self, listener: &Arc<dyn PluginMessageListener>) -> usize {
        let mut channels = self.channels.write();
        let mut removed = 0;
        channels.retain(|_, registrations| {
            registrations.retain(|r| {
                if same_listener(&r.listener, listener) {
                    r.active.store(false, Ordering::Release);
                    removed += 1;
                    false
                } else {
                    true
                }
            });
            !registrations.is_empty()
        });
        removed
    }

    /// Deliver `payload` from `source` to every listener on `channel`.
    ///
    /// A channel without listeners drops the payload. Returns the number of
    /// listeners that received it.
    pub fn dispatch(&self, channel: &str, source: &str, payload: Bytes) -> usize {
        let snapshot = match self.channels.read().get(channel) {
            Some(registrations) => registrations.clone(),
            None => {
                trace!("Dropping {} byte payload on idle channel {channel}", payload.len());
                return 0;
            }
        };

        let mut delivered = 0;
        for registration in snapshot {
            if !registration.active.load(Ordering::Acquire) {
                continue;
            }
            let listener = &registration.listener;
            let payload = payload.clone();
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                listener.on_plugin_message(channel, source, payload)
            }));
            match result {
                Ok(()) => delivered += 1,
                Err(_) => warn!("Listener on channel {channel} panicked handling message from {source}"),
            }
        }
        delivered
    }

    /// Channels with at least one listener, sorted.
    pub fn channels(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn listener_count(&self, channel: &str) -> usize {
        self.channels.read().get(channel).map_or(0, Vec::len)
    }

    pub fn is_registered(&self, channel: &str, listener: &Arc<dyn PluginMessageListener>) -> bool {
        self.channels.read().get(channel).is_some_and(|registrations| {
            registrations
                .iter()
                .any(|r| same_listener(&r.listener, listener))
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

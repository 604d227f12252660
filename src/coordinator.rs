//! Layered persistence coordinator
//!
//! Reads and writes the cart through an ordered chain of durable tiers,
//! falling back to an in-process copy when the primary store refuses writes.
//!
//! Read order:
//! 1. Transient copy, if a previous write fell back to it
//! 2. Durable tiers in priority order (first parseable value wins)
//! 3. Transient copy, adopted as empty
//!
//! Nothing here returns an error: every tier failure degrades to the next
//! tier and is only logged.

use crate::model::CartState;
use crate::notify::{CartEvent, ChangeKind, Listener, ListenerId, Listeners};
use crate::tier::{Tier, TierRole, TransientStore};

pub struct Coordinator {
    tiers: Vec<Box<dyn Tier>>,
    transient: TransientStore,
    listeners: Listeners,
}

impl Coordinator {
    /// Build a coordinator over tiers given in priority order
    pub fn new(tiers: Vec<Box<dyn Tier>>) -> Self {
        Self {
            tiers,
            transient: TransientStore::new(),
            listeners: Listeners::new(),
        }
    }

    /// Append a lower-priority tier
    pub fn with_tier(mut self, tier: impl Tier + 'static) -> Self {
        self.tiers.push(Box::new(tier));
        self
    }

    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers.iter().map(|t| t.name()).collect()
    }

    /// Whether writes are currently landing in the transient copy only
    pub fn fallback_active(&self) -> bool {
        self.transient.is_armed()
    }

    /// Current authoritative cart
    pub fn read(&mut self) -> CartState {
        if let Some(state) = self.transient.get() {
            return state.clone();
        }

        for tier in &self.tiers {
            let text = match tier.try_read() {
                Ok(text) => text.filter(|t| !t.is_empty()),
                Err(e) => {
                    log::debug!("Cart {} store unreadable: {}", tier.name(), e);
                    continue;
                }
            };
            match text {
                Some(text) => match serde_json::from_str::<CartState>(&text) {
                    Ok(state) => return state,
                    Err(e) => {
                        log::warn!("Ignoring malformed cart in {} store: {}", tier.name(), e)
                    }
                },
                None if tier.role().absent_means_empty() => return CartState::new(),
                None => log::debug!("No cart in {} store", tier.name()),
            }
        }

        log::debug!("No durable cart store readable, using in-memory cart");
        self.transient.adopt().clone()
    }

    /// Persist `state` across the chain, then notify listeners
    pub fn write(&mut self, state: &CartState, kind: ChangeKind) {
        let stored_durably = match serde_json::to_string(state) {
            Ok(text) => self.write_tiers(&text),
            Err(e) => {
                log::error!("Failed to serialize cart: {}", e);
                false
            }
        };

        if stored_durably {
            if self.transient.clear() {
                log::info!("Cart storage recovered, leaving in-memory fallback");
            }
        } else {
            if !self.transient.is_armed() {
                log::warn!("Cart storage unavailable, keeping cart in memory for this session");
            }
            self.transient.set(state.clone());
        }

        self.listeners.emit(&CartEvent { kind, items: state });
    }

    /// Write every tier; true if a primary tier accepted the value
    fn write_tiers(&mut self, text: &str) -> bool {
        let mut stored = false;
        for tier in &mut self.tiers {
            let role = tier.role();
            match tier.try_write(text) {
                Ok(()) => stored |= role == TierRole::Primary,
                Err(e) => log::debug!(
                    "Cart write to {} store ({}) failed: {}",
                    tier.name(),
                    role.as_str(),
                    e
                ),
            }
        }
        stored
    }

    /// Drop the cart from every mirror tier
    pub fn purge_mirrors(&mut self) {
        for tier in &mut self.tiers {
            if tier.role() != TierRole::Mirror {
                continue;
            }
            if let Err(e) = tier.purge() {
                log::debug!("Cart mirror {} not purged: {}", tier.name(), e);
            }
        }
    }

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Notify listeners of the stored cart without writing
    pub fn announce(&mut self) {
        let state = self.read();
        self.listeners.emit(&CartEvent {
            kind: ChangeKind::Loaded,
            items: &state,
        });
    }
}

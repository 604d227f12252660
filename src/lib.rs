//! Vege Cart - browser shopping cart with layered persistence
//!
//! Core modules:
//! - `model`: Cart items, cart state, input coercion
//! - `tier`: Storage backends (localStorage, cookie mirror, memory, transient)
//! - `coordinator`: Fallback and mirroring policy across tiers
//! - `cart`: Mutation API (add, remove, set quantity, clear)
//! - `notify`: Change listeners and the item-count badge
//! - `config`: Storage keys and mirror lifetime
//! - `web`: wasm-bindgen facade published as `window.VegeCart`

pub mod cart;
pub mod config;
pub mod coordinator;
pub mod model;
pub mod notify;
pub mod tier;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use cart::Cart;
pub use config::CartConfig;
pub use coordinator::Coordinator;
pub use model::{CartItem, CartState, NewItem};
pub use notify::{BadgeNotifier, CartEvent, ChangeKind, CountDisplay, ListenerId};
pub use tier::{Tier, TierError, TierRole};

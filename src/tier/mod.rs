//! Storage tiers
//!
//! Every durable backend implements [`Tier`] over serialized text. Backends
//! report failure through [`TierError`] instead of panicking, so the
//! coordinator can walk the chain in priority order:
//! - `memory`: in-process slot with switchable failure modes
//! - `cookie`: percent-encoded mirror behind a [`CookieJar`]
//! - `local_storage`: `window.localStorage` (wasm only)
//! - `transient`: last-resort typed copy, never fails

pub mod cookie;
#[cfg(target_arch = "wasm32")]
pub mod local_storage;
pub mod memory;
pub mod transient;

pub use cookie::{Clock, CookieJar, CookieMirror, MemoryCookieJar, StoredCookie, system_clock};
#[cfg(target_arch = "wasm32")]
pub use local_storage::{DocumentCookieJar, LocalStorageTier};
pub use memory::{FailureMode, MemoryTier};
pub use transient::TransientStore;

/// Why a tier refused a read or write
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TierError {
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("quota exceeded")]
    QuotaExceeded,
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("corrupt content: {0}")]
    Corrupt(String),
}

/// Position of a tier in the fallback policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierRole {
    /// Preferred store. An absent value is an empty cart, and a successful
    /// write disarms the transient fallback.
    Primary,
    /// Best-effort copy. An absent value means "no data here".
    Mirror,
}

impl TierRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierRole::Primary => "primary",
            TierRole::Mirror => "mirror",
        }
    }

    /// Whether a missing value is trusted as an empty cart
    pub fn absent_means_empty(&self) -> bool {
        matches!(self, TierRole::Primary)
    }
}

/// A durable storage backend holding the serialized cart
pub trait Tier {
    /// Short name for logs
    fn name(&self) -> &'static str;

    fn role(&self) -> TierRole;

    /// `Ok(None)` when the tier is reachable but holds no cart
    fn try_read(&self) -> Result<Option<String>, TierError>;

    fn try_write(&mut self, text: &str) -> Result<(), TierError>;

    /// Remove the stored cart entirely
    fn purge(&mut self) -> Result<(), TierError>;
}

/// Stand-in for a backend the environment does not provide
///
/// Keeps the chain shape constant when e.g. `localStorage` is missing.
#[derive(Debug, Clone)]
pub struct UnavailableTier {
    name: &'static str,
    role: TierRole,
    reason: String,
}

impl UnavailableTier {
    pub fn new(name: &'static str, role: TierRole, reason: impl Into<String>) -> Self {
        Self {
            name,
            role,
            reason: reason.into(),
        }
    }

    fn error(&self) -> TierError {
        TierError::Unavailable(self.reason.clone())
    }
}

impl Tier for UnavailableTier {
    fn name(&self) -> &'static str {
        self.name
    }

    fn role(&self) -> TierRole {
        self.role
    }

    fn try_read(&self) -> Result<Option<String>, TierError> {
        Err(self.error())
    }

    fn try_write(&mut self, _text: &str) -> Result<(), TierError> {
        Err(self.error())
    }

    fn purge(&mut self) -> Result<(), TierError> {
        Err(self.error())
    }
}

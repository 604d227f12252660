//! Cart storage configuration
//!
//! Names and lifetimes of the durable tiers. Defaults match the keys the
//! storefront pages have always used, so existing carts keep loading.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// LocalStorage key holding the serialized cart
pub const DEFAULT_STORAGE_KEY: &str = "vegefoods.cart.v1";
/// Cookie carrying the mirror copy
pub const DEFAULT_MIRROR_COOKIE: &str = "vege_cart";
/// Mirror cookie lifetime
pub const DEFAULT_MIRROR_TTL_DAYS: u32 = 7;
/// Per-cookie size browsers reliably accept (name, value and attributes)
pub const DEFAULT_MIRROR_MAX_BYTES: usize = 4096;

/// Cookie `SameSite` policy for the mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "strict" => Some(SameSite::Strict),
            "lax" => Some(SameSite::Lax),
            "none" => Some(SameSite::None),
            _ => None,
        }
    }
}

/// Where and how long the cart is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartConfig {
    /// LocalStorage key for the persistent tier
    pub storage_key: String,
    /// Cookie name for the mirror tier
    pub mirror_cookie: String,
    /// Mirror expiration horizon in days
    pub mirror_ttl_days: u32,
    /// Cookie `Path` attribute (whole site by default)
    pub cookie_path: String,
    /// Cookie `SameSite` attribute
    pub same_site: SameSite,
    /// Largest mirror cookie written, in bytes
    pub mirror_max_bytes: usize,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            mirror_cookie: DEFAULT_MIRROR_COOKIE.to_string(),
            mirror_ttl_days: DEFAULT_MIRROR_TTL_DAYS,
            cookie_path: "/".to_string(),
            same_site: SameSite::Lax,
            mirror_max_bytes: DEFAULT_MIRROR_MAX_BYTES,
        }
    }
}

impl CartConfig {
    /// Parse a (possibly partial) JSON config; missing fields keep defaults
    pub fn from_json(json: &str) -> Option<Self> {
        match serde_json::from_str(json) {
            Ok(config) => Some(config),
            Err(e) => {
                log::warn!("Ignoring invalid cart config: {}", e);
                None
            }
        }
    }

    /// Mirror lifetime as a duration
    pub fn mirror_ttl(&self) -> Duration {
        Duration::days(i64::from(self.mirror_ttl_days))
    }
}

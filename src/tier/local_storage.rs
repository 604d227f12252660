//! Browser-backed tiers (wasm only)
//!
//! Both are detected once at construction. A missing window, a storage access
//! `SecurityError`, or a private-mode quota of zero all surface as
//! `TierError`s on use instead of exceptions.

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{DomException, HtmlDocument, Storage};

use super::cookie::CookieJar;
use super::{Tier, TierError, TierRole};

fn describe(value: &JsValue) -> String {
    if let Some(exception) = value.dyn_ref::<DomException>() {
        format!("{}: {}", exception.name(), exception.message())
    } else {
        format!("{value:?}")
    }
}

fn is_quota_error(value: &JsValue) -> bool {
    value
        .dyn_ref::<DomException>()
        .is_some_and(|e| e.name() == "QuotaExceededError" || e.name() == "NS_ERROR_DOM_QUOTA_REACHED")
}

/// `window.localStorage` under one key
pub struct LocalStorageTier {
    storage: Option<Storage>,
    key: String,
}

impl LocalStorageTier {
    pub fn detect(key: &str) -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("localStorage unavailable, cart will rely on fallbacks");
        }
        Self {
            storage,
            key: key.to_string(),
        }
    }

    fn storage(&self) -> Result<&Storage, TierError> {
        self.storage
            .as_ref()
            .ok_or_else(|| TierError::Unavailable("localStorage unavailable".to_string()))
    }
}

impl Tier for LocalStorageTier {
    fn name(&self) -> &'static str {
        "localStorage"
    }

    fn role(&self) -> TierRole {
        TierRole::Primary
    }

    fn try_read(&self) -> Result<Option<String>, TierError> {
        self.storage()?
            .get_item(&self.key)
            .map_err(|e| TierError::Unavailable(describe(&e)))
    }

    fn try_write(&mut self, text: &str) -> Result<(), TierError> {
        self.storage()?.set_item(&self.key, text).map_err(|e| {
            if is_quota_error(&e) {
                TierError::QuotaExceeded
            } else {
                TierError::Unavailable(describe(&e))
            }
        })
    }

    fn purge(&mut self) -> Result<(), TierError> {
        self.storage()?
            .remove_item(&self.key)
            .map_err(|e| TierError::Unavailable(describe(&e)))
    }
}

/// `document.cookie`
pub struct DocumentCookieJar {
    document: Option<HtmlDocument>,
}

impl DocumentCookieJar {
    pub fn detect() -> Self {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.dyn_into::<HtmlDocument>().ok());
        if document.is_none() {
            log::warn!("document.cookie unavailable, cart mirror disabled");
        }
        Self { document }
    }

    fn document(&self) -> Result<&HtmlDocument, TierError> {
        self.document
            .as_ref()
            .ok_or_else(|| TierError::Unavailable("document.cookie unavailable".to_string()))
    }
}

impl CookieJar for DocumentCookieJar {
    fn cookie_header(&self) -> Result<String, TierError> {
        self.document()?
            .cookie()
            .map_err(|e| TierError::Unavailable(describe(&e)))
    }

    fn set_cookie(&mut self, cookie: &str) -> Result<(), TierError> {
        self.document()?
            .set_cookie(cookie)
            .map_err(|e| TierError::Unavailable(describe(&e)))
    }
}

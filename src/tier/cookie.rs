//! Cookie mirror tier
//!
//! Stores a percent-encoded copy of the cart in a site-wide cookie so a
//! context without usable localStorage can still recover it. Cookies are
//! small, so oversized carts are refused rather than silently truncated.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};

use super::{Tier, TierError, TierRole};
use crate::config::{CartConfig, SameSite};

/// Expiry date that makes browsers drop a cookie immediately
pub const EXPIRED: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Source of "now" for expiry computation
pub type Clock = fn() -> DateTime<Utc>;

pub fn system_clock() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp the way `Date.prototype.toUTCString` does
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Access to a `document.cookie`-style cookie store
pub trait CookieJar {
    /// All visible cookies as `name=value` pairs joined by `"; "`
    fn cookie_header(&self) -> Result<String, TierError>;

    /// Apply one `Set-Cookie`-style assignment
    fn set_cookie(&mut self, cookie: &str) -> Result<(), TierError>;
}

/// Mirror tier writing the cart into a single cookie
#[derive(Debug, Clone)]
pub struct CookieMirror<J> {
    jar: J,
    cookie_name: String,
    path: String,
    same_site: SameSite,
    ttl: Duration,
    max_bytes: usize,
    clock: Clock,
}

impl<J: CookieJar> CookieMirror<J> {
    pub fn new(jar: J, config: &CartConfig) -> Self {
        Self {
            jar,
            cookie_name: config.mirror_cookie.clone(),
            path: config.cookie_path.clone(),
            same_site: config.same_site,
            ttl: config.mirror_ttl(),
            max_bytes: config.mirror_max_bytes,
            clock: system_clock,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn jar(&self) -> &J {
        &self.jar
    }

    fn assignment(&self, value: &str, expires: &str) -> String {
        format!(
            "{}={}; Expires={}; Path={}; SameSite={}",
            self.cookie_name,
            value,
            expires,
            self.path,
            self.same_site.as_str()
        )
    }

    fn expiry(&self) -> String {
        let now = (self.clock)();
        http_date(now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }
}

impl<J: CookieJar> Tier for CookieMirror<J> {
    fn name(&self) -> &'static str {
        "cookie"
    }

    fn role(&self) -> TierRole {
        TierRole::Mirror
    }

    fn try_read(&self) -> Result<Option<String>, TierError> {
        let header = self.jar.cookie_header()?;
        let prefix = format!("{}=", self.cookie_name);
        let Some(raw) = header.split("; ").find_map(|c| c.strip_prefix(prefix.as_str())) else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        urlencoding::decode(raw)
            .map(|text| Some(text.into_owned()))
            .map_err(|e| TierError::Corrupt(e.to_string()))
    }

    fn try_write(&mut self, text: &str) -> Result<(), TierError> {
        let cookie = self.assignment(&urlencoding::encode(text), &self.expiry());
        if cookie.len() > self.max_bytes {
            return Err(TierError::Rejected(format!(
                "cookie of {} bytes exceeds {} byte limit",
                cookie.len(),
                self.max_bytes
            )));
        }
        self.jar.set_cookie(&cookie)
    }

    fn purge(&mut self) -> Result<(), TierError> {
        let cookie = self.assignment("", EXPIRED);
        self.jar.set_cookie(&cookie)
    }
}

/// A cookie as held by [`MemoryCookieJar`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub expires: Option<DateTime<Utc>>,
    pub path: Option<String>,
    pub same_site: Option<String>,
}

/// Browser-like cookie jar for native builds and tests
///
/// Honors `Expires`: an assignment dated in the past deletes the cookie and
/// expired cookies are hidden from the header. Clones share one jar.
#[derive(Debug, Clone)]
pub struct MemoryCookieJar {
    cookies: Rc<RefCell<Vec<StoredCookie>>>,
    clock: Clock,
}

impl Default for MemoryCookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self {
            cookies: Rc::new(RefCell::new(Vec::new())),
            clock: system_clock,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Live cookie by name
    pub fn get(&self, name: &str) -> Option<StoredCookie> {
        let now = (self.clock)();
        self.cookies
            .borrow()
            .iter()
            .find(|c| c.name == name && is_live(c, now))
            .cloned()
    }

    pub fn len(&self) -> usize {
        let now = (self.clock)();
        self.cookies.borrow().iter().filter(|c| is_live(c, now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_live(cookie: &StoredCookie, now: DateTime<Utc>) -> bool {
    cookie.expires.is_none_or(|at| at > now)
}

fn parse_assignment(cookie: &str) -> Result<StoredCookie, TierError> {
    let mut parts = cookie.split(';');
    let pair = parts.next().unwrap_or_default().trim();
    let Some((name, value)) = pair.split_once('=') else {
        return Err(TierError::Rejected(format!("malformed cookie: {pair}")));
    };
    if name.is_empty() {
        return Err(TierError::Rejected("cookie without a name".to_string()));
    }

    let mut stored = StoredCookie {
        name: name.to_string(),
        value: value.to_string(),
        expires: None,
        path: None,
        same_site: None,
    };
    for attr in parts {
        let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
        let val = val.trim();
        match key.trim().to_lowercase().as_str() {
            "expires" => {
                let at = DateTime::parse_from_rfc2822(val)
                    .map_err(|e| TierError::Rejected(format!("bad expiry {val:?}: {e}")))?;
                stored.expires = Some(at.with_timezone(&Utc));
            }
            "path" => stored.path = Some(val.to_string()),
            "samesite" => stored.same_site = Some(val.to_string()),
            _ => {}
        }
    }
    Ok(stored)
}

impl CookieJar for MemoryCookieJar {
    fn cookie_header(&self) -> Result<String, TierError> {
        let now = (self.clock)();
        let header = self
            .cookies
            .borrow()
            .iter()
            .filter(|c| is_live(c, now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        Ok(header)
    }

    fn set_cookie(&mut self, cookie: &str) -> Result<(), TierError> {
        let stored = parse_assignment(cookie)?;
        let now = (self.clock)();
        let mut cookies = self.cookies.borrow_mut();
        cookies.retain(|c| c.name != stored.name);
        if is_live(&stored, now) {
            cookies.push(stored);
        }
        Ok(())
    }
}

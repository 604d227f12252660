//! In-process string tier
//!
//! Used as the persistent store off the web and in tests. Clones share one
//! slot, so a test can hold a handle to inspect or tamper with what the
//! coordinator wrote (the way another tab would).

use std::cell::RefCell;
use std::rc::Rc;

use super::{Tier, TierError, TierRole};

/// Simulated storage failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    #[default]
    None,
    /// Reads throw (storage access denied)
    FailReads,
    /// Writes throw (private browsing)
    FailWrites,
    /// Every access throws (storage disabled)
    FailAll,
    /// Writes larger than `limit_bytes` are refused
    Quota { limit_bytes: usize },
}

#[derive(Debug, Default)]
struct Slot {
    value: Option<String>,
    mode: FailureMode,
}

/// Shared in-memory tier
#[derive(Debug, Clone)]
pub struct MemoryTier {
    name: &'static str,
    role: TierRole,
    slot: Rc<RefCell<Slot>>,
}

impl MemoryTier {
    pub fn new(name: &'static str, role: TierRole) -> Self {
        Self {
            name,
            role,
            slot: Rc::new(RefCell::new(Slot::default())),
        }
    }

    /// Memory-backed persistent store
    pub fn primary() -> Self {
        Self::new("memory", TierRole::Primary)
    }

    pub fn set_failure_mode(&self, mode: FailureMode) {
        self.slot.borrow_mut().mode = mode;
    }

    /// Raw stored text, ignoring the failure mode
    pub fn contents(&self) -> Option<String> {
        self.slot.borrow().value.clone()
    }

    /// Overwrite the stored text, ignoring the failure mode
    pub fn set_contents(&self, value: Option<&str>) {
        self.slot.borrow_mut().value = value.map(str::to_string);
    }

    fn denied(&self, op: &str) -> TierError {
        TierError::Unavailable(format!("{} {} disabled", self.name, op))
    }
}

impl Tier for MemoryTier {
    fn name(&self) -> &'static str {
        self.name
    }

    fn role(&self) -> TierRole {
        self.role
    }

    fn try_read(&self) -> Result<Option<String>, TierError> {
        let slot = self.slot.borrow();
        match slot.mode {
            FailureMode::FailReads | FailureMode::FailAll => Err(self.denied("reads")),
            _ => Ok(slot.value.clone()),
        }
    }

    fn try_write(&mut self, text: &str) -> Result<(), TierError> {
        let mut slot = self.slot.borrow_mut();
        match slot.mode {
            FailureMode::FailWrites | FailureMode::FailAll => Err(self.denied("writes")),
            FailureMode::Quota { limit_bytes } if text.len() > limit_bytes => {
                Err(TierError::QuotaExceeded)
            }
            _ => {
                slot.value = Some(text.to_string());
                Ok(())
            }
        }
    }

    fn purge(&mut self) -> Result<(), TierError> {
        let mut slot = self.slot.borrow_mut();
        match slot.mode {
            FailureMode::FailWrites | FailureMode::FailAll => Err(self.denied("writes")),
            _ => {
                slot.value = None;
                Ok(())
            }
        }
    }
}

//! Last-resort in-process cart copy
//!
//! Armed only while the primary tier refuses writes. Lost on reload.

use crate::model::CartState;

#[derive(Debug, Clone, Default)]
pub struct TransientStore {
    value: Option<CartState>,
}

impl TransientStore {
    pub fn new() -> Self {
        Self { value: None }
    }

    pub fn is_armed(&self) -> bool {
        self.value.is_some()
    }

    pub fn get(&self) -> Option<&CartState> {
        self.value.as_ref()
    }

    pub fn set(&mut self, state: CartState) {
        self.value = Some(state);
    }

    /// Disarm; returns whether a value was held
    pub fn clear(&mut self) -> bool {
        self.value.take().is_some()
    }

    /// Current value, arming with an empty cart if unset
    pub fn adopt(&mut self) -> &CartState {
        self.value.get_or_insert_with(CartState::new)
    }
}

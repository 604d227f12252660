//! Change notification
//!
//! Listeners run synchronously after every cart write, in registration
//! order. The storefront badge is one listener among others.

use crate::model::CartState;

/// What triggered a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Initial announcement of the stored cart
    Loaded,
    Added,
    Removed,
    QuantitySet,
    Cleared,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Loaded => "loaded",
            ChangeKind::Added => "added",
            ChangeKind::Removed => "removed",
            ChangeKind::QuantitySet => "quantity",
            ChangeKind::Cleared => "cleared",
        }
    }
}

/// Delivered to every listener
#[derive(Debug, Clone, Copy)]
pub struct CartEvent<'a> {
    pub kind: ChangeKind,
    pub items: &'a CartState,
}

impl CartEvent<'_> {
    pub fn total_quantity(&self) -> u64 {
        self.items.total_quantity()
    }
}

pub type Listener = Box<dyn FnMut(&CartEvent<'_>)>;

/// Handle returned by `subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }

    /// Handle passed back from a page script; ids are whole numbers from 1
    pub fn from_js(raw: f64) -> Option<Self> {
        if raw.fract() == 0.0 && (1.0..=u64::MAX as f64).contains(&raw) {
            Some(Self(raw as u64))
        } else {
            None
        }
    }
}

/// Registered listeners
pub struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

impl Default for Listeners {
    fn default() -> Self {
        Self::new()
    }
}

impl Listeners {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            entries: Vec::new(),
        }
    }

    pub fn add(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn emit(&mut self, event: &CartEvent<'_>) {
        for (_, listener) in &mut self.entries {
            listener(event);
        }
    }
}

/// Something that shows the cart's item count
pub trait CountDisplay {
    fn show_count(&mut self, total: u64);
}

/// A display that may not exist on this page
impl<D: CountDisplay> CountDisplay for Option<D> {
    fn show_count(&mut self, total: u64) {
        if let Some(display) = self {
            display.show_count(total);
        }
    }
}

/// Forwards the total quantity to a [`CountDisplay`]
pub struct BadgeNotifier;

impl BadgeNotifier {
    pub fn listener<D: CountDisplay + 'static>(mut display: D) -> Listener {
        Box::new(move |event: &CartEvent<'_>| display.show_count(event.total_quantity()))
    }
}

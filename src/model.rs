//! Cart data model
//!
//! `CartState` serializes as a bare JSON array of `{id, name, qty}` objects,
//! the layout shared by every durable tier.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single line in the cart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product identifier (unique within a cart)
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Quantity; zero-quantity lines are never written back
    #[serde(default)]
    pub qty: u32,
}

impl CartItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, qty: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            qty,
        }
    }
}

/// Ordered cart contents; insertion order is display order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartState {
    items: Vec<CartItem>,
}

impl CartState {
    /// Create an empty cart
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Append a line (callers keep ids unique)
    pub fn push(&mut self, item: CartItem) {
        self.items.push(item);
    }

    pub fn retain(&mut self, keep: impl FnMut(&CartItem) -> bool) {
        self.items.retain(keep);
    }

    /// Sum of every line's quantity
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.qty)).sum()
    }
}

impl From<Vec<CartItem>> for CartState {
    fn from(items: Vec<CartItem>) -> Self {
        Self { items }
    }
}

impl<'a> IntoIterator for &'a CartState {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// An add-to-cart request
///
/// Deserializes leniently from whatever a page script hands over: numeric
/// ids are stringified, non-numeric quantities count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewItem {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_qty")]
    pub qty: Option<i64>,
}

impl NewItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            qty: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_qty(mut self, qty: i64) -> Self {
        self.qty = Some(qty);
        self
    }
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_qty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite())
        .map(coerce_js_number))
}

/// Quantity used by an add: absent or non-positive counts as one
pub fn add_quantity(qty: Option<i64>) -> u32 {
    match qty {
        Some(q) if q > 0 => u32::try_from(q).unwrap_or(u32::MAX),
        _ => 1,
    }
}

/// Clamp a requested quantity into `0..=u32::MAX`
pub fn clamp_quantity(qty: i64) -> u32 {
    u32::try_from(qty.max(0)).unwrap_or(u32::MAX)
}

/// Truncate a JS number toward zero (`NaN` and infinities become 0)
pub fn coerce_js_number(n: f64) -> i64 {
    if n.is_finite() { n.trunc() as i64 } else { 0 }
}

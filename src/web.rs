//! Browser bindings
//!
//! Exposes the cart to page scripts as `window.VegeCart`:
//! `addItem({id, qty?, name?})`, `removeItem(id)`, `setQty(id, qty)`,
//! `getItems()`, `clear()`, `totalQuantity()`, `onChange(fn)` / `offChange(id)`.
//! Change callbacks receive `(total, kind, items)`.
//! The `#cart-count` badge is kept in sync automatically.

use wasm_bindgen::prelude::*;
use web_sys::Element;

use crate::cart::Cart;
use crate::config::CartConfig;
use crate::coordinator::Coordinator;
use crate::model::{CartState, NewItem, coerce_js_number};
use crate::notify::{BadgeNotifier, CartEvent, CountDisplay, ListenerId};
use crate::tier::{CookieMirror, DocumentCookieJar, LocalStorageTier};

/// Element id of the header cart badge
const BADGE_ID: &str = "cart-count";

/// `#cart-count` text badge
pub struct DomBadge {
    element: Option<Element>,
}

impl DomBadge {
    pub fn find() -> Self {
        let element = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(BADGE_ID));
        Self { element }
    }
}

impl CountDisplay for DomBadge {
    fn show_count(&mut self, total: u64) {
        if let Some(el) = &self.element {
            el.set_text_content(Some(&total.to_string()));
        }
    }
}

fn to_json(value: &JsValue) -> Option<String> {
    if value.is_undefined() || value.is_null() {
        return None;
    }
    js_sys::JSON::stringify(value).ok()?.as_string()
}

/// Cart as a plain JS array of `{id, name, qty}`
fn items_to_js(items: &CartState) -> JsValue {
    serde_json::to_string(items)
        .ok()
        .and_then(|json| js_sys::JSON::parse(&json).ok())
        .unwrap_or_else(|| js_sys::Array::new().into())
}

#[wasm_bindgen]
pub struct VegeCart {
    cart: Cart,
}

#[wasm_bindgen]
impl VegeCart {
    /// Build a cart over localStorage and the cookie mirror.
    /// `config` is an optional partial `CartConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> VegeCart {
        let config = to_json(&config)
            .and_then(|json| CartConfig::from_json(&json))
            .unwrap_or_default();

        let coordinator = Coordinator::new(Vec::new())
            .with_tier(LocalStorageTier::detect(&config.storage_key))
            .with_tier(CookieMirror::new(DocumentCookieJar::detect(), &config));
        log::debug!("Cart tiers: {}", coordinator.tier_names().join(" -> "));
        let mut cart = Cart::new(coordinator);
        cart.subscribe(BadgeNotifier::listener(DomBadge::find()));
        cart.announce();
        VegeCart { cart }
    }

    #[wasm_bindgen(js_name = addItem)]
    pub fn add_item(&mut self, item: JsValue) {
        let Some(json) = to_json(&item) else {
            log::debug!("addItem called without an item");
            return;
        };
        match serde_json::from_str::<NewItem>(&json) {
            Ok(item) => self.cart.add_item(item),
            Err(e) => log::debug!("Ignoring unreadable cart item: {}", e),
        }
    }

    #[wasm_bindgen(js_name = removeItem)]
    pub fn remove_item(&mut self, id: &str) {
        self.cart.remove_item(id);
    }

    #[wasm_bindgen(js_name = setQty)]
    pub fn set_qty(&mut self, id: &str, qty: f64) {
        self.cart.set_quantity(id, coerce_js_number(qty));
    }

    #[wasm_bindgen(js_name = setQuantity)]
    pub fn set_quantity(&mut self, id: &str, qty: f64) {
        self.set_qty(id, qty);
    }

    /// Array of `{id, name, qty}`
    #[wasm_bindgen(js_name = getItems)]
    pub fn get_items(&mut self) -> JsValue {
        items_to_js(&self.cart.get_items())
    }

    pub fn clear(&mut self) {
        self.cart.clear();
    }

    #[wasm_bindgen(js_name = totalQuantity)]
    pub fn total_quantity(&mut self) -> f64 {
        self.cart.total_quantity() as f64
    }

    /// Call `callback(total, kind, items)` after every change; returns a handle for `offChange`.
    /// The callback runs mid-update and must not call back into this cart.
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&mut self, callback: js_sys::Function) -> f64 {
        let id = self.cart.subscribe(Box::new(move |event: &CartEvent<'_>| {
            let total = JsValue::from_f64(event.total_quantity() as f64);
            let kind = JsValue::from_str(event.kind.as_str());
            let items = items_to_js(event.items);
            if let Err(e) = callback.call3(&JsValue::NULL, &total, &kind, &items) {
                log::warn!("Cart change callback failed: {:?}", e);
            }
        }));
        id.as_raw() as f64
    }

    #[wasm_bindgen(js_name = offChange)]
    pub fn off_change(&mut self, id: f64) -> bool {
        match ListenerId::from_js(id) {
            Some(id) => self.cart.unsubscribe(id),
            None => {
                log::debug!("Ignoring offChange with invalid handle {}", id);
                false
            }
        }
    }
}

/// Module start: logging, then publish `window.VegeCart`
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"vege-cart: logger already initialized".into());
    }

    let Some(window) = web_sys::window() else {
        return;
    };
    let cart = VegeCart::new(JsValue::UNDEFINED);
    if js_sys::Reflect::set(&window, &JsValue::from_str("VegeCart"), &JsValue::from(cart)).is_err() {
        log::error!("Failed to publish window.VegeCart");
    } else {
        log::info!("VegeCart ready");
    }
}

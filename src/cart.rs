//! Cart mutation API
//!
//! Every mutation re-reads the cart from storage, edits it, and writes it
//! back, so changes made by another tab between calls are picked up.
//! Invalid input is coerced or ignored, never reported.

use crate::coordinator::Coordinator;
use crate::model::{CartItem, CartState, NewItem, add_quantity, clamp_quantity};
use crate::notify::{ChangeKind, Listener, ListenerId};

pub struct Cart {
    coordinator: Coordinator,
}

impl Cart {
    pub fn new(coordinator: Coordinator) -> Self {
        Self { coordinator }
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Add `item`, merging into an existing line with the same id
    pub fn add_item(&mut self, item: NewItem) {
        if item.id.is_empty() {
            log::debug!("Ignoring add without a product id");
            return;
        }
        let qty = add_quantity(item.qty);

        let mut state = self.coordinator.read();
        match state.find_mut(&item.id) {
            Some(existing) => existing.qty = existing.qty.saturating_add(qty),
            None => {
                let name = item
                    .name
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| item.id.clone());
                state.push(CartItem::new(item.id, name, qty));
            }
        }
        self.commit(state, ChangeKind::Added);
    }

    pub fn remove_item(&mut self, id: &str) {
        let mut state = self.coordinator.read();
        state.retain(|item| item.id != id);
        self.commit(state, ChangeKind::Removed);
    }

    /// Set a line's quantity; zero or negative removes it
    pub fn set_quantity(&mut self, id: &str, qty: i64) {
        let mut state = self.coordinator.read();
        if let Some(item) = state.find_mut(id) {
            item.qty = clamp_quantity(qty);
        }
        self.commit(state, ChangeKind::QuantitySet);
    }

    /// Write back, dropping zero-quantity lines (including stale ones read from storage)
    fn commit(&mut self, mut state: CartState, kind: ChangeKind) {
        state.retain(|item| item.qty > 0);
        self.coordinator.write(&state, kind);
    }

    /// Empty the cart and drop the mirror copy right away
    pub fn clear(&mut self) {
        self.coordinator.write(&CartState::new(), ChangeKind::Cleared);
        self.coordinator.purge_mirrors();
    }

    pub fn get_items(&mut self) -> CartState {
        self.coordinator.read()
    }

    pub fn total_quantity(&mut self) -> u64 {
        self.get_items().total_quantity()
    }

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.coordinator.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.coordinator.unsubscribe(id)
    }

    /// Tell listeners about the stored cart (page load)
    pub fn announce(&mut self) {
        self.coordinator.announce();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CartConfig;
    use crate::notify::{BadgeNotifier, CartEvent, CountDisplay};
    use crate::tier::{CookieMirror, FailureMode, MemoryCookieJar, MemoryTier, Tier};
    use proptest::prelude::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Badge(Rc<Cell<Option<u64>>>);

    impl CountDisplay for Badge {
        fn show_count(&mut self, total: u64) {
            self.0.set(Some(total));
        }
    }

    struct Fixture {
        cart: Cart,
        primary: MemoryTier,
        jar: MemoryCookieJar,
        badge: Badge,
    }

    fn fixture() -> Fixture {
        let primary = MemoryTier::primary();
        let jar = MemoryCookieJar::new();
        let coordinator = Coordinator::new(Vec::new())
            .with_tier(primary.clone())
            .with_tier(CookieMirror::new(jar.clone(), &CartConfig::default()));
        let mut cart = Cart::new(coordinator);
        let badge = Badge::default();
        cart.subscribe(BadgeNotifier::listener(badge.clone()));
        Fixture {
            cart,
            primary,
            jar,
            badge,
        }
    }

    fn ids(state: &CartState) -> Vec<&str> {
        state.iter().map(|item| item.id.as_str()).collect()
    }

    #[test]
    fn test_add_to_empty_cart() {
        let mut f = fixture();
        f.cart.add_item(NewItem::new("apple").with_qty(1));
        assert_eq!(
            f.cart.get_items().items(),
            &[CartItem::new("apple", "apple", 1)]
        );
        assert_eq!(f.badge.0.get(), Some(1));
    }

    #[test]
    fn test_add_merges_quantities() {
        let mut f = fixture();
        f.cart.add_item(NewItem::new("a").with_qty(2));
        f.cart.add_item(NewItem::new("a").with_qty(3));
        let items = f.cart.get_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items.find("a").map(|i| i.qty), Some(5));
        assert_eq!(f.badge.0.get(), Some(5));
    }

    #[test]
    fn test_add_coerces_quantity() {
        let mut f = fixture();
        f.cart.add_item(NewItem::new("a"));
        f.cart.add_item(NewItem::new("a").with_qty(0));
        f.cart.add_item(NewItem::new("a").with_qty(-7));
        assert_eq!(f.cart.get_items().find("a").map(|i| i.qty), Some(3));
    }

    #[test]
    fn test_add_keeps_name_and_order() {
        let mut f = fixture();
        f.cart.add_item(NewItem::new("carrot").with_name("Organic Carrots"));
        f.cart.add_item(NewItem::new("apple").with_name(""));
        f.cart.add_item(NewItem::new("carrot").with_name("Renamed"));
        let items = f.cart.get_items();
        assert_eq!(ids(&items), vec!["carrot", "apple"]);
        assert_eq!(items.find("carrot").unwrap().name, "Organic Carrots");
        assert_eq!(items.find("apple").unwrap().name, "apple");
    }

    #[test]
    fn test_add_without_id_is_noop() {
        let mut f = fixture();
        f.cart.add_item(NewItem::default());
        assert!(f.cart.get_items().is_empty());
        assert_eq!(f.badge.0.get(), None);
        assert_eq!(f.primary.contents(), None);
    }

    #[test]
    fn test_add_saturates() {
        let mut f = fixture();
        f.cart.add_item(NewItem::new("a").with_qty(i64::MAX));
        f.cart.add_item(NewItem::new("a").with_qty(10));
        assert_eq!(f.cart.get_items().find("a").map(|i| i.qty), Some(u32::MAX));
    }

    #[test]
    fn test_remove_item() {
        let mut f = fixture();
        f.cart.add_item(NewItem::new("a"));
        f.cart.add_item(NewItem::new("b").with_qty(2));
        f.cart.remove_item("a");
        assert_eq!(ids(&f.cart.get_items()), vec!["b"]);
        assert_eq!(f.badge.0.get(), Some(2));

        f.cart.remove_item("missing");
        assert_eq!(ids(&f.cart.get_items()), vec!["b"]);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut f = fixture();
        f.cart.add_item(NewItem::new("a").with_qty(2));
        f.cart.add_item(NewItem::new("a").with_qty(3));
        f.cart.set_quantity("a", 0);
        assert!(f.cart.get_items().find("a").is_none());
        assert_eq!(f.badge.0.get(), Some(0));
    }

    #[test]
    fn test_set_quantity_negative_matches_zero() {
        let mut zero = fixture();
        let mut negative = fixture();
        for f in [&mut zero, &mut negative] {
            f.cart.add_item(NewItem::new("a").with_qty(4));
            f.cart.add_item(NewItem::new("b"));
        }
        zero.cart.set_quantity("a", 0);
        negative.cart.set_quantity("a", -5);
        assert_eq!(zero.cart.get_items(), negative.cart.get_items());
        assert_eq!(zero.primary.contents(), negative.primary.contents());
    }

    #[test]
    fn test_set_quantity_updates_and_ignores_missing() {
        let mut f = fixture();
        f.cart.add_item(NewItem::new("a"));
        f.cart.set_quantity("a", 9);
        f.cart.set_quantity("missing", 4);
        assert_eq!(f.cart.get_items().items(), &[CartItem::new("a", "a", 9)]);
    }

    #[test]
    fn test_set_quantity_drops_stale_zero_lines() {
        let mut f = fixture();
        f.primary
            .set_contents(Some(r#"[{"id":"a","name":"a","qty":0},{"id":"b","name":"b","qty":1}]"#));
        f.cart.set_quantity("b", 2);
        assert_eq!(f.cart.get_items().items(), &[CartItem::new("b", "b", 2)]);
    }

    #[test]
    fn test_add_and_remove_drop_stale_zero_lines() {
        let mut f = fixture();
        let stale = r#"[{"id":"z","qty":0},{"id":"b","name":"b","qty":1}]"#;

        f.primary.set_contents(Some(stale));
        f.cart.add_item(NewItem::new("c"));
        assert_eq!(ids(&f.cart.get_items()), vec!["b", "c"]);

        f.primary.set_contents(Some(stale));
        f.cart.remove_item("b");
        assert!(f.cart.get_items().is_empty());
        assert_eq!(f.primary.contents().as_deref(), Some("[]"));
    }

    #[test]
    fn test_clear_is_idempotent_and_purges_mirror() {
        let mut f = fixture();
        f.cart.add_item(NewItem::new("a").with_qty(2));
        assert!(!f.jar.is_empty());

        f.cart.clear();
        assert!(f.cart.get_items().is_empty());
        assert!(f.jar.is_empty());
        f.cart.clear();
        assert!(f.cart.get_items().is_empty());
        assert!(f.jar.get("vege_cart").is_none());
        assert_eq!(f.badge.0.get(), Some(0));
    }

    #[test]
    fn test_get_items_does_not_notify() {
        let mut f = fixture();
        f.primary.set_contents(Some(r#"[{"id":"a","name":"a","qty":4}]"#));
        assert_eq!(f.cart.total_quantity(), 4);
        assert_eq!(f.badge.0.get(), None);

        f.cart.announce();
        assert_eq!(f.badge.0.get(), Some(4));
    }

    #[test]
    fn test_failing_storage_keeps_session_cart() {
        let mut f = fixture();
        f.primary.set_failure_mode(FailureMode::FailWrites);
        f.cart.add_item(NewItem::new("x"));
        assert_eq!(f.cart.get_items().items(), &[CartItem::new("x", "x", 1)]);
        assert!(f.cart.coordinator().fallback_active());
        assert_eq!(f.primary.contents(), None);
        assert_eq!(f.badge.0.get(), Some(1));
    }

    #[test]
    fn test_mirror_recovers_cart_in_new_context() {
        let jar = MemoryCookieJar::new();
        {
            let primary = MemoryTier::primary();
            primary.set_failure_mode(FailureMode::FailAll);
            let mut cart = Cart::new(
                Coordinator::new(Vec::new())
                    .with_tier(primary)
                    .with_tier(CookieMirror::new(jar.clone(), &CartConfig::default())),
            );
            cart.add_item(NewItem::new("spinach").with_qty(2));
        }

        // a fresh context whose localStorage is also broken
        let primary = MemoryTier::primary();
        primary.set_failure_mode(FailureMode::FailAll);
        let mut cart = Cart::new(
            Coordinator::new(Vec::new())
                .with_tier(primary)
                .with_tier(CookieMirror::new(jar, &CartConfig::default())),
        );
        assert_eq!(
            cart.get_items().items(),
            &[CartItem::new("spinach", "spinach", 2)]
        );
    }

    #[test]
    fn test_external_modification_seen_between_calls() {
        let mut f = fixture();
        f.cart.add_item(NewItem::new("a"));
        f.primary.set_contents(Some(r#"[{"id":"b","name":"b","qty":1}]"#));
        f.cart.add_item(NewItem::new("a"));
        assert_eq!(ids(&f.cart.get_items()), vec!["b", "a"]);
    }

    #[test]
    fn test_add_event_drives_toast() {
        let mut f = fixture();
        let toasts = Rc::new(RefCell::new(0));
        {
            let toasts = toasts.clone();
            f.cart.subscribe(Box::new(move |event: &CartEvent<'_>| {
                if event.kind == ChangeKind::Added {
                    *toasts.borrow_mut() += 1;
                }
            }));
        }
        f.cart.add_item(NewItem::new("a"));
        f.cart.set_quantity("a", 3);
        f.cart.add_item(NewItem::new("b"));
        f.cart.remove_item("a");
        assert_eq!(*toasts.borrow(), 2);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(String, Option<i64>),
        Remove(String),
        Set(String, i64),
        Clear,
        BreakStorage(bool),
    }

    fn op() -> impl Strategy<Value = Op> {
        let id = prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(str::to_string);
        prop_oneof![
            4 => (id.clone(), prop::option::of(-3i64..6)).prop_map(|(id, q)| Op::Add(id, q)),
            1 => id.clone().prop_map(Op::Remove),
            2 => (id, -3i64..6).prop_map(|(id, q)| Op::Set(id, q)),
            1 => Just(Op::Clear),
            1 => any::<bool>().prop_map(Op::BreakStorage),
        ]
    }

    proptest! {
        #[test]
        fn prop_cart_invariants(ops in prop::collection::vec(op(), 1..40)) {
            let mut f = fixture();
            for op in ops {
                match op {
                    Op::Add(id, qty) => f.cart.add_item(NewItem { id, name: None, qty }),
                    Op::Remove(id) => f.cart.remove_item(&id),
                    Op::Set(id, qty) => f.cart.set_quantity(&id, qty),
                    Op::Clear => f.cart.clear(),
                    Op::BreakStorage(broken) => f.primary.set_failure_mode(if broken {
                        FailureMode::FailWrites
                    } else {
                        FailureMode::None
                    }),
                }

                let items = f.cart.get_items();
                let unique: HashSet<_> = items.iter().map(|i| i.id.as_str()).collect();
                prop_assert_eq!(unique.len(), items.len());
                prop_assert!(items.iter().all(|i| i.qty > 0));
                if let Some(shown) = f.badge.0.get() {
                    prop_assert_eq!(shown, items.total_quantity());
                }
            }
        }

        #[test]
        fn prop_durable_write_round_trips(qtys in prop::collection::vec(1u32..50, 0..6)) {
            let mut f = fixture();
            for (i, qty) in qtys.iter().enumerate() {
                f.cart.add_item(NewItem::new(format!("item-{i}")).with_qty(i64::from(*qty)));
            }
            let expected = f.cart.get_items();
            let stored = f.primary.try_read().ok().flatten().unwrap_or_default();
            let decoded: CartState = serde_json::from_str(&stored).unwrap_or_default();
            prop_assert_eq!(decoded, expected);
        }
    }
}

//! Vege Cart entry point
//!
//! On the web the library's start function installs `window.VegeCart`.
//! Natively this walks a cart through a storage outage using in-memory tiers.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use vege_cart::config::CartConfig;
    use vege_cart::tier::{CookieMirror, FailureMode, MemoryCookieJar, MemoryTier};
    use vege_cart::{BadgeNotifier, Cart, Coordinator, CountDisplay, NewItem};

    struct StdoutBadge;

    impl CountDisplay for StdoutBadge {
        fn show_count(&mut self, total: u64) {
            println!("  cart badge: {}", total);
        }
    }

    env_logger::init();
    log::info!("Vege Cart (native) starting...");

    let config = CartConfig::default();
    let primary = MemoryTier::primary();
    let jar = MemoryCookieJar::new();
    let coordinator = Coordinator::new(Vec::new())
        .with_tier(primary.clone())
        .with_tier(CookieMirror::new(jar.clone(), &config));
    log::info!("Cart tiers: {}", coordinator.tier_names().join(" -> "));
    let mut cart = Cart::new(coordinator);
    cart.subscribe(BadgeNotifier::listener(StdoutBadge));
    cart.announce();

    println!("\nAdding with storage available...");
    cart.add_item(NewItem::new("apple").with_name("Fresh Apples").with_qty(2));
    cart.add_item(NewItem::new("carrot").with_name("Organic Carrots"));

    println!("\nStorage goes away (private mode)...");
    primary.set_failure_mode(FailureMode::FailAll);
    cart.add_item(NewItem::new("apple"));
    println!("  fallback active: {}", cart.coordinator().fallback_active());

    println!("\nStorage comes back...");
    primary.set_failure_mode(FailureMode::None);
    cart.set_quantity("carrot", 0);
    println!("  fallback active: {}", cart.coordinator().fallback_active());

    for item in &cart.get_items() {
        println!("  {} x{} ({})", item.id, item.qty, item.name);
    }
    if let Some(cookie) = jar.get(&config.mirror_cookie) {
        println!("  mirror cookie expires {:?}", cookie.expires);
    }

    cart.clear();
    println!("✓ Cart cleared, mirror cookies left: {}", jar.len());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::start, this is just to satisfy the compiler
}

use std::sync::Arc;
use tokio::time::{Duration, interval};

use crate::clock::Clock;
use crate::metrics::ACTIVE_WINDOWS;
use crate::store::CounterStore;

// Sweep cadence. Lazy expiry on access already keeps decisions correct;
// the reaper only bounds memory for keys that stop being accessed.
pub const REAP_INTERVAL: Duration = Duration::from_secs(300);

// Background task - runs every 5 minutes, drops expired counters
pub async fn reaper(store: Arc<CounterStore>, clock: Arc<dyn Clock>) {
    let mut interval = interval(REAP_INTERVAL);

    println!("Reaper started (interval: {:?})", REAP_INTERVAL);

    loop {
        interval.tick().await;

        let removed = store.sweep(clock.now_ms());
        ACTIVE_WINDOWS.set(store.len() as f64);

        if removed > 0 {
            println!(
                "[Reaper] Removed {} expired counters, {} remain",
                removed,
                store.len()
            );
        }
    }
}

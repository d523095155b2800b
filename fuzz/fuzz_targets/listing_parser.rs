#![no_main]

use libfuzzer_sys::fuzz_target;
use packwatch_tracker::{Snapshot, difference, my_summary, parse_listing};

fuzz_target!(|data: &[u8]| {
    let Ok(payload) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Ok(listing) = parse_listing(payload) else {
        return;
    };
    if let Ok(snapshot) = my_summary("4B", &listing) {
        // 자기 자신과의 델타는 항상 비어 있어야 한다
        assert!(difference(&snapshot, &snapshot).is_empty());
        let delta = difference(&snapshot, &Snapshot::default());
        assert!(delta.len() <= snapshot.len());
    }
});

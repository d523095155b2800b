//! 델타 계산 -- 이전 스냅샷 대비 증가분만 추출
//!
//! 감소, 변화 없음, 사라진 벤더는 결과에 포함되지 않습니다.

use crate::types::{Delta, Snapshot};

/// `current`에서 `previous`를 뺀 양수 증가분을 계산합니다.
///
/// `previous`에 없는 벤더는 이전 값을 0으로 간주합니다.
pub fn difference(current: &Snapshot, previous: &Snapshot) -> Delta {
    let mut delta = Delta::default();
    for (vendor, count) in current.iter() {
        let before = previous.get(vendor).unwrap_or(0);
        delta.record_growth(vendor, count.saturating_sub(before));
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_is_new_against_empty_baseline() {
        let current = Snapshot::from([("acme", 3), ("globex", 5)]);
        let delta = difference(&current, &Snapshot::new());
        assert_eq!(delta.get("acme"), Some(3));
        assert_eq!(delta.get("globex"), Some(5));
    }

    #[test]
    fn unchanged_counts_produce_empty_delta() {
        let current = Snapshot::from([("acme", 3)]);
        assert!(difference(&current, &current.clone()).is_empty());
    }

    #[test]
    fn growth_and_disappearance() {
        let previous = Snapshot::from([("acme", 3), ("globex", 5)]);
        let current = Snapshot::from([("acme", 5)]);
        let delta = difference(&current, &previous);
        assert_eq!(delta.len(), 1);
        assert_eq!(delta.get("acme"), Some(2));
        assert_eq!(delta.get("globex"), None);
    }

    #[test]
    fn decreases_are_dropped() {
        let previous = Snapshot::from([("acme", 4)]);
        let current = Snapshot::from([("acme", 1)]);
        assert!(difference(&current, &previous).is_empty());
    }

    #[test]
    fn zero_count_vendor_is_not_growth() {
        let current = Snapshot::from([("acme", 0)]);
        assert!(difference(&current, &Snapshot::new()).is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeMap;

        fn snapshot_strategy() -> impl Strategy<Value = Snapshot> {
            prop::collection::btree_map("[a-e]{1,3}", 0u64..1_000, 0..8).prop_map(
                |map: BTreeMap<String, u64>| {
                    let mut snapshot = Snapshot::new();
                    for (vendor, count) in map {
                        snapshot.insert_if_absent(vendor, count);
                    }
                    snapshot
                },
            )
        }

        proptest! {
            #[test]
            fn no_growth_against_itself(s in snapshot_strategy()) {
                prop_assert!(difference(&s, &s).is_empty());
            }

            #[test]
            fn empty_baseline_keeps_positive_counts(s in snapshot_strategy()) {
                let delta = difference(&s, &Snapshot::new());
                for (vendor, count) in s.iter() {
                    if count > 0 {
                        prop_assert_eq!(delta.get(vendor), Some(count));
                    } else {
                        prop_assert_eq!(delta.get(vendor), None);
                    }
                }
                prop_assert_eq!(delta.total(), s.total());
            }

            #[test]
            fn delta_values_are_strictly_positive(
                current in snapshot_strategy(),
                previous in snapshot_strategy(),
            ) {
                let delta = difference(&current, &previous);
                for (vendor, added) in delta.iter() {
                    prop_assert!(added > 0);
                    prop_assert!(current.get(vendor).is_some());
                }
            }
        }
    }
}

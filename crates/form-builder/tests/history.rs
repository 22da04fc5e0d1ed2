use form_builder::HistoryLedger;
use proptest::prelude::*;

#[test]
fn first_record_stores_an_empty_initial_state() {
    let mut ledger = HistoryLedger::<Vec<u32>>::new();
    assert!(ledger.is_back_disabled());
    assert!(ledger.is_forward_disabled());

    ledger.record(vec![1]);
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger.pointer(), 1);
    assert_eq!(ledger.back(), Some(Vec::new()));
    assert!(ledger.is_back_disabled());
    assert_eq!(ledger.forward(), Some(vec![1]));
    assert_eq!(ledger.forward(), None);
}

#[test]
fn seeded_ledger_starts_from_the_given_state() {
    let mut ledger = HistoryLedger::with_initial(vec![7, 8]);
    assert!(ledger.is_back_disabled());
    ledger.record(vec![7]);
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger.back(), Some(vec![7, 8]));
    assert!(ledger.is_back_disabled());
}

#[test]
fn limit_drops_the_oldest_slots() {
    let mut ledger = HistoryLedger::new().with_limit(Some(2));
    for snapshot in 1..=4 {
        ledger.record(vec![snapshot]);
    }
    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger.pointer(), 2);
    assert_eq!(ledger.back(), Some(vec![3]));
    assert_eq!(ledger.back(), Some(vec![2]));
    assert!(ledger.is_back_disabled());
    assert_eq!(ledger.forward(), Some(vec![3]));
}

#[test]
fn recording_after_back_makes_later_slots_unreachable_forward() {
    let mut ledger = HistoryLedger::new();
    ledger.record(vec![1]);
    ledger.record(vec![2]);
    ledger.record(vec![3]);
    assert_eq!(ledger.back(), Some(vec![2]));
    assert!(!ledger.is_forward_disabled());

    ledger.record(vec![4]);
    assert!(ledger.is_forward_disabled());
    assert_eq!(ledger.forward(), None);
    assert_eq!(ledger.pointer(), ledger.len() - 1);
}

#[test]
fn back_at_the_start_keeps_returning_the_initial_state() {
    let mut ledger = HistoryLedger::new();
    ledger.record(vec![1]);
    assert_eq!(ledger.back(), Some(Vec::new()));
    assert_eq!(ledger.back(), Some(Vec::new()));
    assert_eq!(ledger.pointer(), 0);

    let mut empty = HistoryLedger::<Vec<u32>>::new();
    assert_eq!(empty.back(), None);
}

proptest! {
    #[test]
    fn back_walks_snapshots_in_reverse(snapshots in proptest::collection::vec(any::<u16>(), 1..32)) {
        let mut ledger = HistoryLedger::new();
        for snapshot in &snapshots {
            ledger.record(vec![*snapshot]);
        }
        prop_assert!(!ledger.is_back_disabled());

        for expected in snapshots.iter().rev().skip(1) {
            prop_assert_eq!(ledger.back(), Some(vec![*expected]));
        }
        prop_assert_eq!(ledger.back(), Some(Vec::new()));
        prop_assert!(ledger.is_back_disabled());

        for expected in &snapshots {
            prop_assert_eq!(ledger.forward(), Some(vec![*expected]));
        }
        prop_assert!(ledger.is_forward_disabled());
    }
}

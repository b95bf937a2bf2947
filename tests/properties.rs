//! Property tests for merge and notification behaviour.

use proptest::prelude::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tincan_store::{aggregate, Listener, Store};

aggregate! {
    #[derive(Clone, Debug, PartialEq)]
    pub struct Record => RecordPatch {
        pub label: String,
        pub flag: bool,
        pub count: i64,
    }
}

fn record() -> impl Strategy<Value = Record> {
    (".{0,8}", any::<bool>(), any::<i64>()).prop_map(|(label, flag, count)| Record {
        label,
        flag,
        count,
    })
}

type Fields = (Option<String>, Option<bool>, Option<i64>);

fn fields() -> impl Strategy<Value = Fields> {
    (
        proptest::option::of(".{0,8}"),
        proptest::option::of(any::<bool>()),
        proptest::option::of(any::<i64>()),
    )
}

fn patch((label, flag, count): Fields) -> RecordPatch {
    RecordPatch { label, flag, count }
}

fn expected(state: &Record, (label, flag, count): Fields) -> Record {
    Record {
        label: label.unwrap_or_else(|| state.label.clone()),
        flag: flag.unwrap_or(state.flag),
        count: count.unwrap_or(state.count),
    }
}

proptest! {
    #[test]
    fn write_overwrites_exactly_the_given_fields(initial in record(), given in fields()) {
        let store = Store::new(initial.clone());

        store.set(patch(given.clone())).unwrap();

        let state = store.get();
        prop_assert_eq!(&*state, &expected(&initial, given));
    }

    #[test]
    fn updater_reads_the_state_before_the_write(initial in record(), delta in -1000i64..1000) {
        let store = Store::new(initial.clone());

        store
            .update(move |prev| RecordPatch::default().count(prev.count.wrapping_add(delta)))
            .unwrap();

        let state = store.get();
        prop_assert_eq!(state.count, initial.count.wrapping_add(delta));
        prop_assert_eq!(&state.label, &initial.label);
    }

    #[test]
    fn each_write_notifies_each_listener_once(
        writes in proptest::collection::vec(fields(), 0..8),
        subscribers in 1usize..5,
        duplicates in 0usize..3,
    ) {
        let store = Store::new(Record { label: String::new(), flag: false, count: 0 });
        let calls = Arc::new(AtomicUsize::new(0));

        let mut subscriptions = Vec::new();
        for _ in 0..subscribers {
            let calls = calls.clone();
            let listener = Listener::new(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            });
            for _ in 0..=duplicates {
                subscriptions.push(store.subscribe(&listener));
            }
        }
        prop_assert_eq!(store.listener_count(), subscribers);

        let count = writes.len();
        for given in writes {
            store.set(patch(given)).unwrap();
        }

        prop_assert_eq!(calls.load(Ordering::SeqCst), count * subscribers);
    }

    #[test]
    fn reads_are_stable_between_writes(initial in record(), reads in 1usize..10) {
        let store = Store::new(initial);
        let first = store.get();

        for _ in 0..reads {
            prop_assert!(Arc::ptr_eq(&first, &store.get()));
        }
    }
}

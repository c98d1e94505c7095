use std::collections::HashSet;

use interview_board::backend::MemoryBackend;
use interview_board::candidate::{Candidate, Stage};
use interview_board::store::Store;
use proptest::prelude::*;

fn arb_stage() -> impl Strategy<Value = Stage> {
    prop_oneof![
        Just(Stage::Waiting),
        Just(Stage::InChinese),
        Just(Stage::InEnglish),
        Just(Stage::Completed),
    ]
}

fn flags(list: &[Candidate]) -> Vec<(String, bool, bool)> {
    list.iter()
        .map(|c| (c.id.clone(), c.has_completed_chinese, c.has_completed_english))
        .collect()
}

proptest! {
    #[test]
    fn added_candidates_get_distinct_ids(names in prop::collection::vec("[a-zA-Z ]{0,12}", 1..20)) {
        let store = Store::new(MemoryBackend::new());
        for name in &names {
            store.add(name, "QA Engineer").unwrap();
        }
        let list = store.list().unwrap();
        let ids: HashSet<_> = list.iter().map(|c| c.id.clone()).collect();
        prop_assert_eq!(ids.len(), list.len());
        prop_assert_eq!(list.len(), names.len() + 3);
    }

    #[test]
    fn completion_flags_never_reset(moves in prop::collection::vec((0usize..4, arb_stage()), 1..40)) {
        let store = Store::new(MemoryBackend::new());
        let extra = store.add("extra", "QA Engineer").unwrap();
        let ids = ["1".to_string(), "2".to_string(), "3".to_string(), extra.id];

        let mut before = flags(&store.list().unwrap());
        for (idx, stage) in moves {
            store.move_stage(&ids[idx], stage).unwrap();
            let list = store.list().unwrap();
            let after = flags(&list);
            for ((id, zh0, en0), (_, zh1, en1)) in before.iter().zip(after.iter()) {
                prop_assert!(!zh0 || *zh1, "chinese flag cleared for {}", id);
                prop_assert!(!en0 || *en1, "english flag cleared for {}", id);
            }
            let moved = list.iter().find(|c| c.id == ids[idx]).unwrap();
            prop_assert_eq!(moved.current_stage, stage);
            before = after;
        }
    }

    #[test]
    fn unknown_ids_are_ignored(id in "[a-z]{4,10}", stage in arb_stage()) {
        let store = Store::new(MemoryBackend::new());
        let before = store.list().unwrap();
        store.move_stage(&id, stage).unwrap();
        store.remove(&id).unwrap();
        prop_assert_eq!(store.list().unwrap(), before);
    }
}

#[test]
fn list_reflects_each_mutation_immediately() {
    let store = Store::new(MemoryBackend::new());
    let added = store.add("Ann", "QA Engineer").unwrap();
    assert!(store.list().unwrap().contains(&added));

    store.move_stage(&added.id, Stage::InEnglish).unwrap();
    let list = store.list().unwrap();
    let moved = list.iter().find(|c| c.id == added.id).unwrap();
    assert_eq!(moved.current_stage, Stage::InEnglish);
    assert_eq!(moved.check_in_time, added.check_in_time);

    store.remove(&added.id).unwrap();
    assert!(store.list().unwrap().iter().all(|c| c.id != added.id));
}

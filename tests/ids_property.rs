#[macro_use]
extern crate proptest;

use proptest::prelude::{prop, Strategy};
use rustc_hash::FxHashSet;
use weaveboard::ids::{parse_suffix, IdAllocator, NODE_ID_PREFIX};

/// One step of an allocator workload: allocate, or reconcile against a set
/// of externally observed IDs.
#[derive(Clone, Debug)]
enum Step {
    Next,
    Reconcile(Vec<u64>),
}

fn step_strategy() -> impl proptest::strategy::Strategy<Value = Step> {
    prop_oneof![
        3 => proptest::strategy::Just(Step::Next),
        1 => prop::collection::vec(0u64..200, 0..6).prop_map(Step::Reconcile),
    ]
}

proptest! {
    /// No returned ID ever collides with a previously returned one or with
    /// any ID handed to reconcile, whatever the interleaving.
    #[test]
    fn prop_allocator_never_collides(steps in prop::collection::vec(step_strategy(), 1..40)) {
        let mut allocator = IdAllocator::new();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut returned: FxHashSet<String> = FxHashSet::default();

        for step in steps {
            match step {
                Step::Next => {
                    let id = allocator.next();
                    prop_assert!(!seen.contains(&id), "collision with reconciled id {id}");
                    prop_assert!(returned.insert(id.clone()), "repeated allocation {id}");
                    seen.insert(id);
                }
                Step::Reconcile(suffixes) => {
                    let ids: Vec<String> = suffixes
                        .iter()
                        .map(|n| format!("{NODE_ID_PREFIX}{n}"))
                        .collect();
                    allocator.reconcile(&ids);
                    seen.extend(ids);
                }
            }
        }
    }

    /// Reconciliation never lowers the counter.
    #[test]
    fn prop_reconcile_is_monotonic(
        before in 0u64..100,
        suffixes in prop::collection::vec(0u64..100, 0..8),
    ) {
        let mut allocator = IdAllocator::new();
        allocator.reconcile([format!("{NODE_ID_PREFIX}{}", before.saturating_sub(1))]);
        let floor = allocator.peek();
        allocator.reconcile(suffixes.iter().map(|n| format!("{NODE_ID_PREFIX}{n}")));
        prop_assert!(allocator.peek() >= floor);
    }

    /// Every allocated ID parses back to its counter value.
    #[test]
    fn prop_allocated_ids_round_trip(count in 1usize..20) {
        let mut allocator = IdAllocator::new();
        for expected in 0..count {
            let id = allocator.next();
            prop_assert_eq!(parse_suffix(&id), Some(expected as u64));
        }
    }
}

#[test]
fn reconcile_on_load_continues_after_highest_suffix() {
    let mut allocator = IdAllocator::new();
    allocator.reconcile(["dndnode_3", "dndnode_7"]);
    assert_eq!(allocator.next(), "dndnode_8");
    assert_eq!(allocator.next(), "dndnode_9");
}

use proptest::prelude::*;
use rusqlite::Connection;
use tether_core::{Direction, Registry, RegistryBuilder, RelationError, RelationshipDefinition};

fn ordered_registry(conn: &Connection, cardinality: &str) -> Registry {
    let mut builder = RegistryBuilder::new();
    builder
        .register(
            RelationshipDefinition::parse("items", "list", "item", cardinality, true)
                .expect("definition"),
        )
        .expect("register");
    builder.freeze(conn).expect("freeze")
}

fn arb_ids() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(1_i64..50, 0..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn replace_then_read_returns_list(seed in arb_ids(), ids in arb_ids()) {
        let conn = Connection::open_in_memory().expect("open");
        let registry = ordered_registry(&conn, "many-to-many");
        let store = registry.get_by_name("items").expect("store")[0];

        store.replace(&conn, 1, &seed).expect("seed");
        store.replace(&conn, 1, &ids).expect("replace");
        prop_assert_eq!(store.get_related_ids(&conn, 1, Direction::From).expect("read"), ids);
    }

    #[test]
    fn reorder_with_permutation_is_applied(
        ids in prop::collection::vec(1_i64..20, 1..10),
        rotate_seed in any::<usize>(),
    ) {
        let conn = Connection::open_in_memory().expect("open");
        let registry = ordered_registry(&conn, "many-to-many");
        let store = registry.get_by_name("items").expect("store")[0];
        store.replace(&conn, 1, &ids).expect("seed");

        let mut permuted = ids.clone();
        let rotate_by = rotate_seed % permuted.len();
        permuted.rotate_left(rotate_by);
        permuted.reverse();

        store.reorder(&conn, 1, &permuted).expect("reorder");
        prop_assert_eq!(store.get_related_ids(&conn, 1, Direction::From).expect("read"), permuted);
    }

    #[test]
    fn reorder_mismatch_changes_nothing(
        ids in prop::collection::vec(1_i64..20, 1..10),
        extra in 20_i64..40,
        drop_last in any::<bool>(),
    ) {
        let conn = Connection::open_in_memory().expect("open");
        let registry = ordered_registry(&conn, "many-to-many");
        let store = registry.get_by_name("items").expect("store")[0];
        store.replace(&conn, 1, &ids).expect("seed");

        let mut bad = ids.clone();
        if drop_last {
            bad.pop();
        } else {
            bad.push(extra);
        }

        let err = store.reorder(&conn, 1, &bad).expect_err("mismatch");
        prop_assert!(matches!(err, RelationError::Validation { .. }), "expected Validation error");
        prop_assert_eq!(store.get_related_ids(&conn, 1, Direction::From).expect("read"), ids);
    }

    #[test]
    fn one_to_many_targets_have_single_owner(
        writes in prop::collection::vec((1_i64..5, 1_i64..10), 0..30),
    ) {
        let conn = Connection::open_in_memory().expect("open");
        let registry = ordered_registry(&conn, "one-to-many");
        let store = registry.get_by_name("items").expect("store")[0];

        for (from_id, to_id) in writes {
            let result = store.add(&conn, from_id, to_id);
            if let Err(err) = result {
                prop_assert!(matches!(err, RelationError::CardinalityViolation { .. }), "expected CardinalityViolation error");
            }
        }
        for to_id in 1..10 {
            prop_assert!(store.count(&conn, to_id, Direction::To).expect("count") <= 1);
        }
    }
}

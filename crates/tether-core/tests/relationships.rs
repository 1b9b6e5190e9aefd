//! End-to-end behaviour of registered relationships against a file-backed
//! database: cardinality, ordering, same-name aggregation, and cascades.

use rusqlite::Connection;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;
use tether_core::config::{RelationshipConfig, TetherConfig};
use tether_core::db::{self, DEFAULT_BUSY_TIMEOUT};
use tether_core::{
    Cardinality, Direction, EntityType, RegistryBuilder, RelationError, Registry,
    RelationshipDefinition, get_related_ids_by_name,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ty(s: &str) -> EntityType {
    s.parse().expect("entity type")
}

fn file_db() -> (TempDir, std::path::PathBuf, Connection) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tether.db");
    let conn = db::open(&path, DEFAULT_BUSY_TIMEOUT).expect("open db");
    (dir, path, conn)
}

fn registry_with(conn: &Connection, defs: Vec<RelationshipDefinition>) -> Registry {
    let mut builder = RegistryBuilder::new();
    for def in defs {
        builder.register(def).expect("register");
    }
    builder.freeze(conn).expect("freeze")
}

fn def(name: &str, from: &str, to: &str, cardinality: &str, ordered: bool) -> RelationshipDefinition {
    RelationshipDefinition::parse(name, from, to, cardinality, ordered).expect("definition")
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn same_name_results_concatenate_in_registration_order() {
    let (_dir, _path, conn) = file_db();
    let registry = registry_with(
        &conn,
        vec![
            def("same-name", "car", "post", "many-to-many", false),
            def("same-name", "tire", "post", "many-to-many", false),
        ],
    );

    registry
        .get("same-name", &ty("car"), &ty("post"))
        .expect("car store")
        .add(&conn, 1, 11)
        .expect("add car");
    registry
        .get("same-name", &ty("tire"), &ty("post"))
        .expect("tire store")
        .add(&conn, 1, 21)
        .expect("add tire");

    // ID 1 names both a car and a tire.
    let car_and_tire = [ty("car"), ty("tire")];
    assert_eq!(
        get_related_ids_by_name(&registry, &conn, &car_and_tire[..], 1, "same-name")
            .expect("query"),
        vec![11, 21]
    );
    assert_eq!(
        get_related_ids_by_name(&registry, &conn, &ty("tire"), 1, "same-name").expect("tire"),
        vec![21]
    );
}

#[test]
fn same_name_stores_do_not_share_rows() {
    let (_dir, _path, conn) = file_db();
    let registry = registry_with(
        &conn,
        vec![
            def("fits", "car", "tire", "one-to-one", false),
            def("fits", "bike", "tire", "one-to-one", false),
        ],
    );
    let car = registry.get("fits", &ty("car"), &ty("tire")).expect("car");
    let bike = registry.get("fits", &ty("bike"), &ty("tire")).expect("bike");
    assert_eq!(car.table(), bike.table());

    car.add(&conn, 1, 10).expect("car fits tire 10");
    bike.add(&conn, 1, 10).expect("bike store has its own rows");

    assert_eq!(car.count(&conn, 10, Direction::To).expect("count"), 1);
    assert_eq!(bike.remove(&conn, 1, 10).expect("remove"), 1);
    assert!(car.contains(&conn, 1, 10).expect("contains"));
}

#[test]
fn one_to_one_rejects_second_target() {
    let (_dir, _path, conn) = file_db();
    let registry = registry_with(&conn, vec![def("spouse", "user:person", "user:person", "1:1", false)]);
    let store = registry.get_by_name("spouse").expect("store")[0];

    store.add(&conn, 1, 2).expect("first");
    let err = store.add(&conn, 1, 3).expect_err("second target");
    assert!(matches!(err, RelationError::CardinalityViolation { .. }));
    assert_eq!(err.code().code(), "E2001");
    assert!(err.is_recoverable());
}

#[test]
fn ordered_replace_and_reorder_round_trip() {
    let (_dir, path, conn) = file_db();
    let registry = registry_with(&conn, vec![def("gallery", "car", "attachment", "n:n", true)]);
    let store = registry
        .get("gallery", &ty("car"), &ty("attachment"))
        .expect("store");

    store.replace(&conn, 7, &[30, 10, 20]).expect("replace");
    assert_eq!(
        store.get_related_ids(&conn, 7, Direction::From).expect("read"),
        vec![30, 10, 20]
    );

    store.reorder(&conn, 7, &[10, 20, 30]).expect("reorder");
    store.add(&conn, 7, 40).expect("append");

    // Order survives reopening the database.
    drop(conn);
    let conn = db::open(&path, DEFAULT_BUSY_TIMEOUT).expect("reopen");
    let rows = store.rows(&conn, 7, Direction::From).expect("rows");
    let ids: Vec<_> = rows.iter().map(|row| row.to_id).collect();
    let orders: Vec<_> = rows.iter().map(|row| row.order).collect();
    assert_eq!(ids, vec![10, 20, 30, 40]);
    assert_eq!(orders, vec![Some(0), Some(1), Some(2), Some(3)]);
}

#[test]
fn reorder_mismatch_is_validation_error() {
    let (_dir, _path, conn) = file_db();
    let registry = registry_with(&conn, vec![def("gallery", "car", "attachment", "n:n", true)]);
    let store = registry.get_by_name("gallery").expect("store")[0];
    store.replace(&conn, 7, &[1, 2, 3]).expect("replace");

    let err = store.reorder(&conn, 7, &[3, 2]).expect_err("missing id");
    assert_eq!(err.code().code(), "E2002");
    assert_eq!(
        store.get_related_ids(&conn, 7, Direction::From).expect("read"),
        vec![1, 2, 3]
    );
}

#[test]
fn replace_violation_keeps_previous_rows() {
    let (_dir, _path, conn) = file_db();
    let registry = registry_with(&conn, vec![def("owns", "user:owner", "car", "one-to-many", true)]);
    let store = registry.get_by_name("owns").expect("store")[0];
    store.replace(&conn, 1, &[100, 101]).expect("owner 1");
    store.replace(&conn, 2, &[200]).expect("owner 2");

    assert!(store.replace(&conn, 1, &[102, 200]).is_err());
    assert_eq!(
        store.get_related_ids(&conn, 1, Direction::From).expect("read"),
        vec![100, 101]
    );
    assert_eq!(
        store.get_related_ids(&conn, 200, Direction::To).expect("read"),
        vec![2]
    );
}

#[test]
fn purge_entity_cascades_across_categories() {
    let (_dir, _path, conn) = file_db();
    let registry = registry_with(
        &conn,
        vec![
            def("drivers", "car", "user:driver", "n:n", false),
            def("similar", "car", "car", "n:n", true),
            def("colors", "car", "term:color", "n:n", false),
        ],
    );
    let car = ty("car");
    let drivers = registry.get("drivers", &car, &ty("user:driver")).expect("drivers");
    let similar = registry.get("similar", &car, &car).expect("similar");
    let colors = registry.get("colors", &car, &ty("term:color")).expect("colors");

    drivers.add(&conn, 5, 1).expect("add");
    similar.add(&conn, 5, 6).expect("add");
    similar.add(&conn, 6, 5).expect("add");
    colors.add(&conn, 5, 3).expect("add");
    colors.add(&conn, 6, 3).expect("add");

    assert_eq!(registry.purge_entity(&conn, &car, 5).expect("purge"), 4);
    assert!(get_related_ids_by_name(&registry, &conn, &car, 5, "similar").expect("similar").is_empty());
    assert_eq!(
        colors.get_related_ids(&conn, 3, Direction::To).expect("read"),
        vec![6]
    );
    assert_eq!(registry.tables().ensured_tables(&conn).expect("catalog").len(), 3);
}

#[test]
fn config_bootstrap_builds_working_registry() {
    let (_dir, _path, conn) = file_db();
    let config = TetherConfig {
        relationships: vec![RelationshipConfig {
            name: "related-cars".into(),
            from: "post:car".into(),
            to: "post:car".into(),
            cardinality: "many_to_many".into(),
            ordered: false,
            unique: true,
        }],
        ..TetherConfig::default()
    };

    let registry = RegistryBuilder::from_config(&config)
        .expect("builder")
        .freeze(&conn)
        .expect("freeze");
    let store = registry.get_by_name("related-cars").expect("store")[0];
    assert_eq!(store.definition().cardinality(), Cardinality::ManyToMany);

    store.add(&conn, 1, 2).expect("add");
    let err = store.add(&conn, 1, 2).expect_err("unique pair");
    assert!(matches!(err, RelationError::CardinalityViolation { .. }));
}

#[test]
fn frozen_registry_is_shared_across_threads() {
    let (_dir, path, conn) = file_db();
    let registry = Arc::new(registry_with(
        &conn,
        vec![def("tags", "car", "term:tag", "n:n", false)],
    ));

    let handles: Vec<_> = (0..4_i64)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            let path = path.clone();
            thread::spawn(move || {
                let conn = db::open(&path, DEFAULT_BUSY_TIMEOUT).expect("open per thread");
                let store = registry.get_by_name("tags").expect("store")[0];
                for tag in 0..10 {
                    store.add(&conn, worker, tag).expect("add");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker");
    }

    let store = registry.get_by_name("tags").expect("store")[0];
    for worker in 0..4 {
        assert_eq!(store.count(&conn, worker, Direction::From).expect("count"), 10);
    }
    assert_eq!(store.count(&conn, 3, Direction::To).expect("count"), 4);
}

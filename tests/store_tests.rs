use graphloom::{GraphLoomError, GraphSource, GraphValue, ScratchGraph, SqliteTripleStore, Triple};

#[test]
fn test_insert_and_count() {
    let store = SqliteTripleStore::open_in_memory().expect("store");
    assert_eq!(store.triple_count().expect("count"), 0);
    store
        .insert_triple(&Triple::new("s", "p", GraphValue::resource("o")))
        .expect("insert");
    store
        .insert_triple(&Triple::new("s", "p", GraphValue::literal("text")))
        .expect("insert");
    assert_eq!(store.triple_count().expect("count"), 2);
    assert_eq!(store.count_with_predicate("p").expect("count"), 2);
    assert_eq!(store.count_with_predicate("q").expect("count"), 0);
}

#[test]
fn test_insert_rejects_blank_terms() {
    let store = SqliteTripleStore::open_in_memory().expect("store");
    let err = store
        .insert_triple(&Triple::new("  ", "p", GraphValue::resource("o")))
        .expect_err("blank subject");
    assert!(matches!(err, GraphLoomError::InvalidInput(_)));
    let err = store
        .insert_triple(&Triple::new("s", "", GraphValue::resource("o")))
        .expect_err("blank predicate");
    assert!(matches!(err, GraphLoomError::InvalidInput(_)));
}

#[test]
fn test_resource_and_literal_objects_are_distinct() {
    let store = SqliteTripleStore::open_in_memory().expect("store");
    store
        .insert_triple(&Triple::new("s", "p", GraphValue::resource("x")))
        .expect("insert");
    store
        .insert_triple(&Triple::new("s", "p", GraphValue::literal("x")))
        .expect("insert");
    let resources = store.execute("?s <p> <x>").expect("resources");
    assert_eq!(resources.len(), 1);
    let literals = store.execute("?s <p> \"x\"").expect("literals");
    assert_eq!(literals.len(), 1);
}

#[test]
fn test_query_results_refresh_after_write() {
    let store = SqliteTripleStore::open_in_memory().expect("store");
    store
        .insert_triple(&Triple::new("a", "link", GraphValue::resource("b")))
        .expect("insert");
    assert_eq!(store.execute("?x <link> ?y").expect("rows").len(), 1);
    store
        .insert_triple(&Triple::new("a", "link", GraphValue::resource("c")))
        .expect("insert");
    assert_eq!(store.execute("?x <link> ?y").expect("rows").len(), 2);
}

#[test]
fn test_merge_is_the_single_commit_point() {
    let store = SqliteTripleStore::open_in_memory().expect("store");
    let mut scratch = ScratchGraph::new();
    scratch.add_triple(Triple::new("s1", "p", GraphValue::resource("o1")));
    scratch.add_triple(Triple::new("s2", "p", GraphValue::resource("o2")));
    assert_eq!(store.triple_count().expect("count"), 0);

    let merged = store.merge(&scratch).expect("merge");
    assert_eq!(merged, 2);
    assert_eq!(store.triple_count().expect("count"), 2);
}

#[test]
fn test_merge_rolls_back_entirely_on_invalid_triple() {
    let store = SqliteTripleStore::open_in_memory().expect("store");
    let mut scratch = ScratchGraph::new();
    scratch.add_triple(Triple::new("s1", "p", GraphValue::resource("o1")));
    scratch.add_triple(Triple::new("s2", "", GraphValue::resource("o2")));

    let err = store.merge(&scratch).expect_err("blank predicate");
    assert!(matches!(err, GraphLoomError::InvalidInput(_)));
    // The valid triple staged before the bad one must not persist.
    assert_eq!(store.triple_count().expect("count"), 0);
}

#[test]
fn test_scratch_graph_accumulates_and_clears() {
    let mut scratch = ScratchGraph::new();
    assert!(scratch.is_empty());
    scratch.add_triple(Triple::new("s", "p", GraphValue::literal("v")));
    scratch.extend(vec![Triple::new("s2", "p2", GraphValue::literal("w"))]);
    assert_eq!(scratch.len(), 2);
    scratch.clear();
    assert!(scratch.is_empty());
}

#[test]
fn test_open_on_disk_roundtrip() {
    let path = std::env::temp_dir().join("graphloom_store_test.db");
    let _ = std::fs::remove_file(&path);
    {
        let store = SqliteTripleStore::open(&path).expect("store");
        store
            .insert_triple(&Triple::new("s", "p", GraphValue::resource("o")))
            .expect("insert");
    }
    let store = SqliteTripleStore::open(&path).expect("reopen");
    assert_eq!(store.triple_count().expect("count"), 1);
    let _ = std::fs::remove_file(&path);
}

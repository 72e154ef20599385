use ahash::{AHashMap, AHashSet};
use graphloom::{
    CachePolicy, GraphLoomError, GraphValue, QueryCache, QueryExecutor, QuerySpec, SamplingMode,
    Selection, SqliteTripleStore, Triple,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn department_store(count: usize) -> SqliteTripleStore {
    let store = SqliteTripleStore::open_in_memory().expect("store");
    for i in 0..count {
        store
            .insert_triple(&Triple::new(
                format!("d{i}"),
                "rdf:type",
                GraphValue::resource("Department"),
            ))
            .expect("insert");
    }
    store
}

fn executor(mode: SamplingMode, selection: Selection) -> QueryExecutor {
    let spec = QuerySpec::new("?d <rdf:type> <Department>", mode, selection).expect("spec");
    QueryExecutor::new(spec)
}

fn drain(executor: &mut QueryExecutor, rng: &mut StdRng) -> Vec<String> {
    let mut drawn = Vec::new();
    while executor.has_next() {
        let binding = executor.next_match(rng).expect("match");
        drawn.push(binding.get("d").expect("d").as_str().to_string());
    }
    drawn
}

#[test]
fn test_global_distinct_draws_pool_without_repetition() {
    let store = department_store(6);
    let mut cache = QueryCache::new(CachePolicy::NoCache);
    let mut rng = StdRng::seed_from_u64(0xF00D);
    let mut exec = executor(SamplingMode::GlobalDistinct, Selection::All);
    exec.init(&store, &mut cache, 0).expect("init");

    let drawn = drain(&mut exec, &mut rng);
    assert_eq!(drawn.len(), 6);
    let distinct: AHashSet<&String> = drawn.iter().collect();
    assert_eq!(distinct.len(), 6);

    let err = exec.next_match(&mut rng).expect_err("exhausted");
    assert!(matches!(err, GraphLoomError::Exhausted(_)));
}

#[test]
fn test_reset_replays_same_permutation() {
    let store = department_store(5);
    let mut cache = QueryCache::new(CachePolicy::NoCache);
    let mut rng = StdRng::seed_from_u64(0xBEEF);
    let mut exec = executor(SamplingMode::GlobalDistinct, Selection::All);
    exec.init(&store, &mut cache, 0).expect("init");

    let first = drain(&mut exec, &mut rng);
    exec.reset_counter();
    let second = drain(&mut exec, &mut rng);
    assert_eq!(first, second);
}

#[test]
fn test_local_distinct_pool_is_fresh_per_branch() {
    let store = department_store(4);
    let mut cache = QueryCache::new(CachePolicy::NoCache);
    let mut rng = StdRng::seed_from_u64(0xCAFE);
    let mut exec = executor(SamplingMode::LocalDistinct, Selection::All);

    // Branch A consumes the full pool.
    exec.init(&store, &mut cache, 1).expect("init");
    let branch_a: AHashSet<String> = drain(&mut exec, &mut rng).into_iter().collect();
    assert_eq!(branch_a.len(), 4);

    // Branch B re-initializes and must see every binding again.
    exec.init(&store, &mut cache, 1).expect("init");
    let branch_b: AHashSet<String> = drain(&mut exec, &mut rng).into_iter().collect();
    assert_eq!(branch_a, branch_b);
}

#[test]
fn test_repeatable_mode_draws_independently() {
    let store = department_store(3);
    let mut cache = QueryCache::new(CachePolicy::NoCache);
    let mut rng = StdRng::seed_from_u64(0xD00D);
    let mut exec = executor(SamplingMode::Repeatable, Selection::All);
    exec.init(&store, &mut cache, 0).expect("init");

    let drawn = drain(&mut exec, &mut rng);
    assert_eq!(drawn.len(), 3);
    assert!(drawn.iter().all(|d| ["d0", "d1", "d2"].contains(&d.as_str())));

    // A reset allows the same bindings to recur; repeatable draws carry
    // no distinctness state at all.
    exec.reset_counter();
    let again = drain(&mut exec, &mut rng);
    assert_eq!(again.len(), 3);
}

#[test]
fn test_repeatable_draw_count_bounded_by_selection() {
    let store = department_store(10);
    let mut cache = QueryCache::new(CachePolicy::NoCache);
    let mut rng = StdRng::seed_from_u64(0xD00E);
    let mut exec = executor(SamplingMode::Repeatable, Selection::Count(4));
    exec.init(&store, &mut cache, 0).expect("init");
    let drawn = drain(&mut exec, &mut rng);
    assert_eq!(drawn.len(), 4);
}

#[test]
fn test_selection_fraction_caps_consumption() {
    let store = department_store(10);
    let mut cache = QueryCache::new(CachePolicy::NoCache);
    let mut rng = StdRng::seed_from_u64(0x1234);
    let mut exec = executor(SamplingMode::GlobalDistinct, Selection::Fraction(0.5));
    exec.init(&store, &mut cache, 0).expect("init");
    let drawn = drain(&mut exec, &mut rng);
    assert_eq!(drawn.len(), 5);
    let distinct: AHashSet<String> = drawn.into_iter().collect();
    assert_eq!(distinct.len(), 5);
}

#[test]
fn test_empty_pool_has_no_next() {
    let store = SqliteTripleStore::open_in_memory().expect("store");
    let mut cache = QueryCache::new(CachePolicy::NoCache);
    let mut exec = executor(SamplingMode::GlobalDistinct, Selection::All);
    exec.init(&store, &mut cache, 0).expect("init");
    assert!(!exec.has_next());
}

#[test]
fn test_uninitialized_executor_errors() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut exec = executor(SamplingMode::GlobalDistinct, Selection::All);
    assert!(!exec.has_next());
    let err = exec.next_match(&mut rng).expect_err("no init");
    assert!(matches!(err, GraphLoomError::ConfigError(_)));
}

#[test]
fn test_update_query_variables_substitutes_resolved_attributes() {
    let spec = QuerySpec::new_dynamic(
        "?dept <subOrganizationOf> ?univ",
        SamplingMode::GlobalDistinct,
        Selection::All,
    )
    .expect("spec");
    let mut exec = QueryExecutor::new(spec);

    let mut attributes = AHashMap::new();
    attributes.insert("dept".to_string(), GraphValue::resource("d1"));
    let substituted = exec.update_query_variables(&attributes).expect("rewrite");
    assert_eq!(substituted, vec!["dept".to_string()]);
    assert_eq!(exec.text(), "<d1> <subOrganizationOf> ?univ");
    assert!(!exec.is_initialized());

    // Rewriting again from a different outer binding starts from the
    // original text, not the substituted one.
    let mut attributes = AHashMap::new();
    attributes.insert("dept".to_string(), GraphValue::resource("d2"));
    exec.update_query_variables(&attributes).expect("rewrite");
    assert_eq!(exec.text(), "<d2> <subOrganizationOf> ?univ");
}

#[test]
fn test_update_query_variables_requires_dynamic_spec() {
    let mut exec = executor(SamplingMode::GlobalDistinct, Selection::All);
    let err = exec
        .update_query_variables(&AHashMap::new())
        .expect_err("static spec");
    assert!(matches!(err, GraphLoomError::ConfigError(_)));
}

#[test]
fn test_prefix_variable_names_do_not_collide() {
    let spec = QuerySpec::new_dynamic(
        "?dept <memberOf> ?department",
        SamplingMode::Repeatable,
        Selection::All,
    )
    .expect("spec");
    let mut exec = QueryExecutor::new(spec);
    let mut attributes = AHashMap::new();
    attributes.insert("dept".to_string(), GraphValue::resource("d9"));
    exec.update_query_variables(&attributes).expect("rewrite");
    assert_eq!(exec.text(), "<d9> <memberOf> ?department");
}

use graphloom::{
    Binding, ConstructionPattern, DictionarySampler, GraphLoomError, GraphValue, Matcher,
    NodeTemplate, ScratchGraph,
    pattern::{PropertyTemplate, RDF_TYPE},
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

fn professor_pattern() -> ConstructionPattern {
    let department = NodeTemplate::new(1, "Department");
    let professor = NodeTemplate::new(2, "Professor").with_edge(1, "worksFor", 1);
    let mut pattern = ConstructionPattern::new(vec![department], vec![professor]).expect("pattern");
    pattern.register_namespace("Professor", "http://ex.org/");
    pattern.register_label_sampler("Professor", DictionarySampler::counter_suffixed("Prof"));
    pattern
}

fn binding_for(variable: &str, iri: &str) -> Binding {
    let mut binding = Binding::new();
    binding.set(variable, GraphValue::resource(iri));
    binding
}

#[test]
fn test_matcher_rejects_duplicate_mapping() {
    let mut matcher = Matcher::new();
    matcher.add_mapping(1, "dept").expect("first mapping");
    let err = matcher.add_mapping(1, "other").expect_err("duplicate");
    assert!(matches!(err, GraphLoomError::ConfigError(_)));
}

#[test]
fn test_set_nodes_mapping_resolves_old_nodes() {
    let mut pattern = professor_pattern();
    let mut matcher = Matcher::new();
    matcher.add_mapping(1, "dept").expect("mapping");
    matcher
        .set_nodes_mapping(&[binding_for("dept", "http://ex.org/d1")], &mut pattern)
        .expect("resolve");
    assert_eq!(
        pattern.old_node(1).expect("node").bound_resource,
        Some(GraphValue::resource("http://ex.org/d1"))
    );
}

#[test]
fn test_set_nodes_mapping_fails_on_unbound_variable() {
    let mut pattern = professor_pattern();
    let mut matcher = Matcher::new();
    matcher.add_mapping(1, "dept").expect("mapping");
    let err = matcher
        .set_nodes_mapping(&[binding_for("other", "http://ex.org/x")], &mut pattern)
        .expect_err("unbound");
    assert!(matches!(err, GraphLoomError::ResolutionError(_)));
}

#[test]
fn test_set_nodes_mapping_fails_without_mapping() {
    let mut pattern = professor_pattern();
    let matcher = Matcher::new();
    let err = matcher
        .set_nodes_mapping(&[binding_for("dept", "http://ex.org/d1")], &mut pattern)
        .expect_err("no mapping");
    assert!(matches!(err, GraphLoomError::ConfigError(_)));
}

#[test]
fn test_newest_binding_wins_for_shadowed_variable() {
    let mut pattern = professor_pattern();
    let mut matcher = Matcher::new();
    matcher.add_mapping(1, "dept").expect("mapping");
    let stack = vec![
        binding_for("dept", "http://ex.org/outer"),
        binding_for("dept", "http://ex.org/inner"),
    ];
    matcher.set_nodes_mapping(&stack, &mut pattern).expect("resolve");
    assert_eq!(
        pattern.old_node(1).expect("node").bound_resource,
        Some(GraphValue::resource("http://ex.org/inner"))
    );
}

#[test]
fn test_duplicate_node_ids_rejected() {
    let err = ConstructionPattern::new(
        vec![NodeTemplate::new(1, "Department")],
        vec![NodeTemplate::new(1, "Professor")],
    )
    .expect_err("shared id");
    assert!(matches!(err, GraphLoomError::InvalidInput(_)));
}

#[test]
fn test_empty_relation_label_rejected_at_build() {
    let professor = NodeTemplate::new(1, "Professor").with_edge(1, "", 1);
    let err = ConstructionPattern::new(vec![], vec![professor]).expect_err("blank relation");
    assert!(matches!(err, GraphLoomError::ConfigError(_)));
}

#[test]
fn test_empty_class_label_rejected_at_build() {
    let err = ConstructionPattern::new(vec![], vec![NodeTemplate::new(1, "  ")])
        .expect_err("blank class");
    assert!(matches!(err, GraphLoomError::ConfigError(_)));
}

#[test]
fn test_apply_mints_node_type_and_edge() {
    let mut pattern = professor_pattern();
    let mut matcher = Matcher::new();
    matcher.add_mapping(1, "dept").expect("mapping");
    matcher
        .set_nodes_mapping(&[binding_for("dept", "http://ex.org/d1")], &mut pattern)
        .expect("resolve");

    let mut scratch = ScratchGraph::new();
    let mut rng = rng(0xA11);
    let added = pattern.apply_on_scratch(&mut scratch, &mut rng).expect("apply");
    assert_eq!(added, 2);

    let triples = scratch.triples();
    assert_eq!(triples[0].subject, "http://ex.org/Prof0");
    assert_eq!(triples[0].predicate, RDF_TYPE);
    assert_eq!(triples[0].object, GraphValue::resource("Professor"));
    assert_eq!(triples[1].subject, "http://ex.org/Prof0");
    assert_eq!(triples[1].predicate, "worksFor");
    assert_eq!(triples[1].object, GraphValue::resource("http://ex.org/d1"));
}

#[test]
fn test_apply_attaches_properties_with_late_bound_sampler() {
    let professor = NodeTemplate::new(1, "Professor");
    let mut pattern = ConstructionPattern::new(vec![], vec![professor]).expect("pattern");
    pattern.register_namespace("Professor", "http://ex.org/");
    pattern.register_label_sampler("Professor", DictionarySampler::counter_suffixed("Prof"));
    pattern.register_property(
        "Professor",
        PropertyTemplate {
            predicate: "rank".into(),
            sampler: DictionarySampler::constant("Assistant"),
            late_bound: false,
        },
    );
    pattern.register_property(
        "Professor",
        PropertyTemplate {
            predicate: "name".into(),
            sampler: DictionarySampler::injected(),
            late_bound: true,
        },
    );

    let mut scratch = ScratchGraph::new();
    let mut rng = rng(0xA12);
    pattern.apply_on_scratch(&mut scratch, &mut rng).expect("apply");

    let triples = scratch.triples();
    assert_eq!(triples.len(), 3);
    assert_eq!(triples[1].predicate, "rank");
    assert_eq!(triples[1].object, GraphValue::literal("Assistant"));
    // The late-bound property received the freshly drawn label.
    assert_eq!(triples[2].predicate, "name");
    assert_eq!(triples[2].object, GraphValue::literal("Prof0"));
}

#[test]
fn test_edges_may_target_new_nodes_minted_later() {
    let first = NodeTemplate::new(1, "Group").with_edge(1, "contains", 2);
    let second = NodeTemplate::new(2, "Member");
    let mut pattern = ConstructionPattern::new(vec![], vec![first, second]).expect("pattern");
    pattern.register_label_sampler("Group", DictionarySampler::counter_suffixed("G"));
    pattern.register_label_sampler("Member", DictionarySampler::counter_suffixed("M"));

    let mut scratch = ScratchGraph::new();
    let mut rng = rng(0xA13);
    pattern.apply_on_scratch(&mut scratch, &mut rng).expect("apply");

    let edge = scratch
        .triples()
        .iter()
        .find(|t| t.predicate == "contains")
        .expect("edge triple");
    assert!(edge.object.as_str().ends_with("M0"));
}

#[test]
fn test_dangling_edge_target_leaves_scratch_untouched() {
    let professor = NodeTemplate::new(1, "Professor").with_edge(1, "worksFor", 99);
    let mut pattern = ConstructionPattern::new(vec![], vec![professor]).expect("pattern");
    pattern.register_label_sampler("Professor", DictionarySampler::counter_suffixed("Prof"));

    let mut scratch = ScratchGraph::new();
    scratch.add_triple(graphloom::Triple::new(
        "pre",
        "existing",
        GraphValue::literal("triple"),
    ));
    let mut rng = rng(0xA14);
    let err = pattern
        .apply_on_scratch(&mut scratch, &mut rng)
        .expect_err("dangling target");
    assert!(matches!(err, GraphLoomError::ResolutionError(_)));
    assert_eq!(scratch.len(), 1);
    assert_eq!(scratch.triples()[0].subject, "pre");
}

#[test]
fn test_apply_requires_label_sampler() {
    let professor = NodeTemplate::new(1, "Professor");
    let mut pattern = ConstructionPattern::new(vec![], vec![professor]).expect("pattern");
    let mut scratch = ScratchGraph::new();
    let mut rng = rng(0xA15);
    let err = pattern
        .apply_on_scratch(&mut scratch, &mut rng)
        .expect_err("no sampler");
    assert!(matches!(err, GraphLoomError::ConfigError(_)));
    assert!(scratch.is_empty());
}

#[test]
fn test_apply_fails_when_old_node_unresolved() {
    let mut pattern = professor_pattern();
    let mut scratch = ScratchGraph::new();
    let mut rng = rng(0xA16);
    let err = pattern
        .apply_on_scratch(&mut scratch, &mut rng)
        .expect_err("unresolved old node");
    assert!(matches!(err, GraphLoomError::ResolutionError(_)));
    assert!(scratch.is_empty());
}

//! Seeded dataset builders shared by the benches, the CLI demo, and the
//! end-to-end tests.

use crate::{
    dictionary::DictionarySampler,
    errors::GraphLoomError,
    executor::ConstructCommand,
    number_sampler::{DrawStrategy, RepetitionSampler},
    pattern::{ConstructionPattern, DEFAULT_NAMESPACE, Matcher, NodeTemplate, RDF_TYPE},
    query_spec::{QuerySpec, SamplingMode, Selection},
    store::SqliteTripleStore,
    value::{GraphValue, Triple},
};

pub const UNIVERSITY_CLASS: &str = "University";
pub const DEPARTMENT_CLASS: &str = "Department";
pub const PROFESSOR_CLASS: &str = "Professor";
pub const SUB_ORGANIZATION_OF: &str = "subOrganizationOf";
pub const WORKS_FOR: &str = "worksFor";

/// Seeds `universities` universities with `departments` departments each.
pub fn seed_university_graph(
    store: &SqliteTripleStore,
    universities: usize,
    departments: usize,
) -> Result<(), GraphLoomError> {
    for u in 0..universities {
        let university = format!("{DEFAULT_NAMESPACE}University{u}");
        store.insert_triple(&Triple::new(
            university.clone(),
            RDF_TYPE,
            GraphValue::resource(UNIVERSITY_CLASS),
        ))?;
        for d in 0..departments {
            let department = format!("{DEFAULT_NAMESPACE}University{u}Department{d}");
            store.insert_triple(&Triple::new(
                department.clone(),
                RDF_TYPE,
                GraphValue::resource(DEPARTMENT_CLASS),
            ))?;
            store.insert_triple(&Triple::new(
                department,
                SUB_ORGANIZATION_OF,
                GraphValue::resource(university.clone()),
            ))?;
        }
    }
    Ok(())
}

/// The canonical demo command: for every department, mint `per_department`
/// professors linked by `worksFor`.
pub fn professor_command(per_department: u32) -> Result<ConstructCommand, GraphLoomError> {
    let spec = QuerySpec::new(
        format!("?dept <{RDF_TYPE}> <{DEPARTMENT_CLASS}>"),
        SamplingMode::GlobalDistinct,
        Selection::All,
    )?;

    let department = NodeTemplate::new(1, DEPARTMENT_CLASS);
    let professor = NodeTemplate::new(2, PROFESSOR_CLASS).with_edge(1, WORKS_FOR, 1);
    let mut pattern = ConstructionPattern::new(vec![department], vec![professor])?;
    pattern.register_label_sampler(
        PROFESSOR_CLASS,
        DictionarySampler::counter_suffixed("Professor"),
    );

    let mut matcher = Matcher::new();
    matcher.add_mapping(1, "dept")?;

    let mut repetition = RepetitionSampler::constant(per_department)?;
    repetition.init();

    Ok(ConstructCommand {
        specs: vec![spec],
        pattern,
        matcher,
        repetition,
    })
}

/// A distinct label pool of `count` surnames, for benches that exercise
/// the without-replacement samplers.
pub fn surname_pool(count: usize, strategy: DrawStrategy) -> Result<DictionarySampler, GraphLoomError> {
    let labels: Vec<String> = (0..count).map(|i| format!("Surname{i}")).collect();
    DictionarySampler::distinct_set(labels, strategy)
}

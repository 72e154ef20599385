use ahash::AHashMap;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::{
    errors::GraphLoomError,
    number_sampler::RepetitionSampler,
    pattern::{ConstructionPattern, Matcher},
    query_cache::{CachePolicy, QueryCache, StepMeta},
    query_executor::QueryExecutor,
    query_spec::{QuerySpec, SamplingMode},
    store::{GraphSource, ScratchGraph},
    triple_query,
    value::{Binding, GraphValue},
};

/// One full construction command: a query chain, the pattern it
/// instantiates, the matcher tying them together, and the per-match
/// repetition count.
pub struct ConstructCommand {
    pub specs: Vec<QuerySpec>,
    pub pattern: ConstructionPattern,
    pub matcher: Matcher,
    pub repetition: RepetitionSampler,
}

/// Diagnostics for one command, purely observational.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructReport {
    pub new_triples: usize,
    pub pattern_applications: u64,
    pub query_executions: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

/// The recursive backtracking driver. Pulls matches from the query chain,
/// accumulates a binding stack, and at full depth applies the pattern a
/// sampled number of times onto a scratch graph that is merged into the
/// target store only after the whole traversal succeeds.
pub struct ConstructionExecutor<'a, S: GraphSource> {
    source: &'a S,
    policy: CachePolicy,
    legacy_inverted: bool,
    rng: StdRng,
}

impl<'a, S: GraphSource> ConstructionExecutor<'a, S> {
    pub fn new(source: &'a S, policy: CachePolicy, seed: u64) -> Self {
        Self {
            source,
            policy,
            legacy_inverted: false,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Opt into the original generator's inverted SmartCache decision.
    pub fn set_legacy_inverted(&mut self, on: bool) {
        self.legacy_inverted = on;
    }

    /// Runs a static query chain. Every spec must be non-dynamic.
    pub fn construct(
        &mut self,
        command: ConstructCommand,
    ) -> Result<ConstructReport, GraphLoomError> {
        if let Some(step) = command.specs.iter().position(|s| s.dynamic) {
            return Err(GraphLoomError::config(format!(
                "step {step} is dynamic; use construct_dynamic"
            )));
        }
        self.run(command, false)
    }

    /// Runs a chain with forward value propagation: dynamic steps have
    /// their placeholders rewritten from attributes bound upstream.
    pub fn construct_dynamic(
        &mut self,
        command: ConstructCommand,
    ) -> Result<ConstructReport, GraphLoomError> {
        self.run(command, true)
    }

    fn run(
        &mut self,
        command: ConstructCommand,
        dynamic: bool,
    ) -> Result<ConstructReport, GraphLoomError> {
        let ConstructCommand {
            specs,
            mut pattern,
            matcher,
            mut repetition,
        } = command;

        if !repetition.is_initialized() {
            return Err(GraphLoomError::config(
                "repetition sampler was never initialized",
            ));
        }
        for id in pattern.old_node_ids() {
            if !matcher.covers(id) {
                return Err(GraphLoomError::config(format!(
                    "old node {id} has no matcher mapping"
                )));
            }
        }

        let mut cache = QueryCache::new(self.policy);
        cache.set_legacy_inverted(self.legacy_inverted);

        let executors: Vec<QueryExecutor> =
            specs.iter().cloned().map(QueryExecutor::new).collect();
        let downstream = downstream_needs(&specs)?;

        let mut traversal = Traversal {
            source: self.source,
            cache: &mut cache,
            rng: &mut self.rng,
            specs: &specs,
            executors,
            pattern: &mut pattern,
            matcher: &matcher,
            repetition: &mut repetition,
            stack: Vec::new(),
            attributes: AHashMap::new(),
            downstream,
            dynamic,
            scratch: ScratchGraph::new(),
            applications: 0,
            executions: 0,
        };
        traversal.descend(1)?;

        let Traversal {
            scratch,
            applications,
            executions,
            ..
        } = traversal;
        let new_triples = self.source.merge(&scratch)?;
        Ok(ConstructReport {
            new_triples,
            pattern_applications: applications,
            query_executions: executions,
            cache_hits: cache.hits(),
            cache_misses: cache.misses(),
        })
    }
}

struct Traversal<'a, S: GraphSource> {
    source: &'a S,
    cache: &'a mut QueryCache,
    rng: &'a mut StdRng,
    specs: &'a [QuerySpec],
    executors: Vec<QueryExecutor>,
    pattern: &'a mut ConstructionPattern,
    matcher: &'a Matcher,
    repetition: &'a mut RepetitionSampler,
    stack: Vec<Binding>,
    attributes: AHashMap<String, GraphValue>,
    downstream: Vec<Vec<String>>,
    dynamic: bool,
    scratch: ScratchGraph,
    applications: u64,
    executions: u64,
}

impl<S: GraphSource> Traversal<'_, S> {
    fn descend(&mut self, depth: usize) -> Result<(), GraphLoomError> {
        if depth == self.specs.len() + 1 {
            return self.apply_terminal();
        }
        let step = depth - 1;

        if self.dynamic && self.executors[step].is_dynamic() {
            let attributes = self.attributes.clone();
            self.executors[step].update_query_variables(&attributes)?;
        }
        self.record_step_meta(step)?;

        if !self.executors[step].is_initialized()
            || self.executors[step].mode() == SamplingMode::LocalDistinct
        {
            let executed = self.executors[step].init(self.source, self.cache, step)?;
            if executed {
                self.executions += 1;
            }
        }

        while self.executors[step].has_next() {
            let binding = self.executors[step].next_match(self.rng)?;
            let recorded = if self.dynamic {
                self.record_attributes(step, &binding)
            } else {
                Vec::new()
            };
            self.stack.push(binding);
            let outcome = self.descend(depth + 1);
            self.stack.pop();
            for name in recorded {
                self.attributes.remove(&name);
            }
            outcome?;
        }
        self.executors[step].reset_counter();
        Ok(())
    }

    fn apply_terminal(&mut self) -> Result<(), GraphLoomError> {
        self.matcher.set_nodes_mapping(&self.stack, self.pattern)?;
        let count = self.repetition.sample(self.rng)?;
        for _ in 0..count {
            self.pattern.apply_on_scratch(&mut self.scratch, self.rng)?;
            self.applications += 1;
        }
        Ok(())
    }

    fn record_step_meta(&mut self, step: usize) -> Result<(), GraphLoomError> {
        let input_vars = triple_query::query_variables(&self.specs[step].text)?;
        let output_vars = triple_query::query_variables(self.executors[step].text())?;
        self.cache.record_step(
            step,
            StepMeta {
                mode: self.specs[step].mode,
                input_vars,
                output_vars,
            },
        );
        Ok(())
    }

    /// Records the attributes of this match that downstream dynamic steps
    /// reference, returning the names to remove on backtrack. An
    /// attribute already bound by an outer scope is left untouched.
    fn record_attributes(&mut self, step: usize, binding: &Binding) -> Vec<String> {
        let mut recorded = Vec::new();
        for name in &self.downstream[step] {
            if self.attributes.contains_key(name.as_str()) {
                continue;
            }
            if let Some(value) = binding.get(name) {
                self.attributes.insert(name.clone(), value.clone());
                recorded.push(name.clone());
            }
        }
        recorded
    }
}

/// For each step, the variables any later step's query text references.
fn downstream_needs(specs: &[QuerySpec]) -> Result<Vec<Vec<String>>, GraphLoomError> {
    let per_step: Vec<Vec<String>> = specs
        .iter()
        .map(|spec| triple_query::query_variables(&spec.text))
        .collect::<Result<_, _>>()?;
    let mut needs = vec![Vec::new(); specs.len()];
    for (step, need) in needs.iter_mut().enumerate() {
        for later in per_step.iter().skip(step + 1) {
            for name in later {
                if !need.iter().any(|n| n == name) {
                    need.push(name.clone());
                }
            }
        }
    }
    Ok(needs)
}

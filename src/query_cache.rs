use ahash::AHashMap;

use crate::{query_spec::SamplingMode, value::Binding};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Never reuse results.
    NoCache,
    /// Always store and reuse, regardless of correctness risk.
    AlwaysCache,
    /// Dependency-aware reuse (see `QueryCache::cacheable`).
    SmartCache,
}

/// Per-depth metadata for the dependency test: the step's sampling mode,
/// the variables its query text references, and the variables its results
/// bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMeta {
    pub mode: SamplingMode,
    pub input_vars: Vec<String>,
    pub output_vars: Vec<String>,
}

/// Scoped to one construction-command invocation. Stores only raw,
/// pre-sampling binding sequences; consumption counters and permutation
/// state live in the query executors.
pub struct QueryCache {
    policy: CachePolicy,
    entries: AHashMap<String, Vec<Binding>>,
    steps: Vec<Option<StepMeta>>,
    hits: u64,
    misses: u64,
    legacy_inverted: bool,
}

impl QueryCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: AHashMap::new(),
            steps: Vec::new(),
            hits: 0,
            misses: 0,
            legacy_inverted: false,
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Reproduces the original generator's literal (inverted) dependency
    /// decision, for compatibility with datasets produced by it.
    pub fn set_legacy_inverted(&mut self, on: bool) {
        self.legacy_inverted = on;
    }

    pub fn record_step(&mut self, depth: usize, meta: StepMeta) {
        if self.steps.len() <= depth {
            self.steps.resize(depth + 1, None);
        }
        self.steps[depth] = Some(meta);
    }

    pub fn step_meta(&self, depth: usize) -> Option<&StepMeta> {
        self.steps.get(depth).and_then(|m| m.as_ref())
    }

    /// Whether the results of the step at `depth` may be reused across
    /// different outer bindings.
    ///
    /// Under SmartCache the step is cacheable iff every earlier step ran
    /// GlobalDistinct and every variable those steps bind appears among
    /// this step's input variables: then the raw result set does not
    /// depend on which upper bindings are currently active. Depth 0 is
    /// never cached under SmartCache.
    pub fn cacheable(&self, depth: usize) -> bool {
        match self.policy {
            CachePolicy::NoCache => false,
            CachePolicy::AlwaysCache => true,
            CachePolicy::SmartCache => {
                if depth == 0 {
                    return false;
                }
                let independent = self.dependency_test(depth);
                if self.legacy_inverted {
                    !independent
                } else {
                    independent
                }
            }
        }
    }

    fn dependency_test(&self, depth: usize) -> bool {
        let Some(current) = self.step_meta(depth) else {
            return false;
        };
        for earlier in 0..depth {
            let Some(meta) = self.step_meta(earlier) else {
                return false;
            };
            if meta.mode != SamplingMode::GlobalDistinct {
                return false;
            }
            for bound in &meta.output_vars {
                if !current.input_vars.iter().any(|v| v == bound) {
                    return false;
                }
            }
        }
        true
    }

    pub fn fetch(&mut self, text: &str) -> Option<Vec<Binding>> {
        match self.entries.get(text) {
            Some(bindings) => {
                self.hits += 1;
                Some(bindings.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn store(&mut self, text: &str, bindings: Vec<Binding>) {
        self.entries.insert(text.to_string(), bindings);
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

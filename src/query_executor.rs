use ahash::AHashMap;
use rand::Rng;
use rand::rngs::StdRng;

use crate::{
    errors::GraphLoomError,
    query_cache::QueryCache,
    query_spec::{QuerySpec, SamplingMode},
    store::GraphSource,
    value::{Binding, GraphValue},
};

/// One query step bound to a concrete raw result sequence, with the
/// mode-specific iteration state layered on top. The raw sequence itself
/// may come from the cache; everything consumable lives here.
pub struct QueryExecutor {
    spec: QuerySpec,
    text: String,
    raw: Vec<Binding>,
    order: Vec<usize>,
    counter: usize,
    /// High watermark of distinct draws; positions below it replay in
    /// their already-drawn order after a counter reset.
    drawn: usize,
    max: usize,
    initialized: bool,
}

impl QueryExecutor {
    pub fn new(spec: QuerySpec) -> Self {
        let text = spec.text.clone();
        Self {
            spec,
            text,
            raw: Vec::new(),
            order: Vec::new(),
            counter: 0,
            drawn: 0,
            max: 0,
            initialized: false,
        }
    }

    pub fn mode(&self) -> SamplingMode {
        self.spec.mode
    }

    pub fn is_dynamic(&self) -> bool {
        self.spec.dynamic
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Executes (or fetches from cache) the raw result sequence and caps
    /// it per the spec's selection. Returns true when the query actually
    /// ran against the store. LocalDistinct always re-executes so each
    /// parent binding gets an independent pool.
    pub fn init<S: GraphSource>(
        &mut self,
        source: &S,
        cache: &mut QueryCache,
        depth: usize,
    ) -> Result<bool, GraphLoomError> {
        let (raw, executed) = if self.spec.mode == SamplingMode::LocalDistinct {
            (source.execute(&self.text)?, true)
        } else if cache.cacheable(depth) {
            match cache.fetch(&self.text) {
                Some(bindings) => (bindings, false),
                None => {
                    let bindings = source.execute(&self.text)?;
                    cache.store(&self.text, bindings.clone());
                    (bindings, true)
                }
            }
        } else {
            (source.execute(&self.text)?, true)
        };
        self.max = self.spec.selection.cap(raw.len());
        self.order = (0..raw.len()).collect();
        self.raw = raw;
        self.counter = 0;
        self.drawn = 0;
        self.initialized = true;
        Ok(executed)
    }

    pub fn deinit(&mut self) {
        self.initialized = false;
    }

    pub fn has_next(&self) -> bool {
        self.initialized && self.counter < self.max
    }

    pub fn next_match(&mut self, rng: &mut StdRng) -> Result<Binding, GraphLoomError> {
        if !self.initialized {
            return Err(GraphLoomError::config("query executor used before init"));
        }
        if self.counter >= self.max {
            return Err(GraphLoomError::exhausted(format!(
                "query '{}' has no further matches",
                self.text
            )));
        }
        match self.spec.mode {
            SamplingMode::GlobalDistinct | SamplingMode::LocalDistinct => {
                if self.counter >= self.drawn {
                    let pick = rng.gen_range(self.counter..self.order.len());
                    self.order.swap(self.counter, pick);
                    self.drawn = self.counter + 1;
                }
                let binding = self.raw[self.order[self.counter]].clone();
                self.counter += 1;
                Ok(binding)
            }
            SamplingMode::Repeatable => {
                let pick = rng.gen_range(0..self.raw.len());
                self.counter += 1;
                Ok(self.raw[pick].clone())
            }
        }
    }

    /// Rewinds consumption without discarding cached bindings or
    /// reshuffling: a sibling outer iteration re-consumes the same
    /// permutation from the top.
    pub fn reset_counter(&mut self) {
        self.counter = 0;
    }

    /// Rewrites the query text by substituting each placeholder that has
    /// a currently-resolved value, starting from the spec's original
    /// text. Returns the substituted attribute names. Must be called
    /// before the next `init`.
    pub fn update_query_variables(
        &mut self,
        attributes: &AHashMap<String, GraphValue>,
    ) -> Result<Vec<String>, GraphLoomError> {
        if !self.spec.dynamic {
            return Err(GraphLoomError::config(
                "update_query_variables requires a dynamic query",
            ));
        }
        let (text, substituted) = substitute_placeholders(&self.spec.text, attributes);
        self.text = text;
        self.deinit();
        Ok(substituted)
    }
}

fn substitute_placeholders(
    text: &str,
    attributes: &AHashMap<String, GraphValue>,
) -> (String, Vec<String>) {
    let mut rewritten = String::with_capacity(text.len());
    let mut substituted: Vec<String> = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '?' {
            rewritten.push(ch);
            continue;
        }
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                chars.next();
            } else {
                break;
            }
        }
        match attributes.get(&name) {
            Some(value) => {
                rewritten.push_str(&value.render());
                if !substituted.iter().any(|n| n == &name) {
                    substituted.push(name);
                }
            }
            None => {
                rewritten.push('?');
                rewritten.push_str(&name);
            }
        }
    }
    (rewritten, substituted)
}

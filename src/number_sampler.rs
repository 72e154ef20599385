use ahash::AHashSet;
use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::errors::GraphLoomError;

/// Without-replacement draw strategy. All three are interchangeable; they
/// trade memory for speed as the remaining pool shrinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawStrategy {
    /// Materialize the range, shuffle once, pop from the front. O(n) memory.
    RemainingList,
    /// Partial Fisher-Yates: draw a uniform index within the live prefix,
    /// swap it to the boundary, shrink the prefix. O(1) per draw.
    RemainingListSwap,
    /// Draw-and-reject against the set of already-returned values. O(k)
    /// memory for k draws; degrades as the pool nears exhaustion.
    UsedSet,
}

#[derive(Debug, Clone)]
enum PoolState {
    RemainingList { shuffled: Vec<i64>, cursor: usize },
    RemainingListSwap { values: Vec<i64>, live: usize },
    UsedSet { min: i64, max: i64, used: AHashSet<i64> },
}

/// Draws each integer in `[min, max]` exactly once, in uniform random
/// order, behind one `init`/`has_next`/`next` capability.
#[derive(Debug, Clone)]
pub struct DistinctRange {
    strategy: DrawStrategy,
    state: Option<PoolState>,
}

impl DistinctRange {
    pub fn new(strategy: DrawStrategy) -> Self {
        Self {
            strategy,
            state: None,
        }
    }

    pub fn init(&mut self, min: i64, max: i64, rng: &mut StdRng) -> Result<(), GraphLoomError> {
        if min > max {
            return Err(GraphLoomError::invalid_input(format!(
                "distinct range requires min <= max, got [{min}, {max}]"
            )));
        }
        let state = match self.strategy {
            DrawStrategy::RemainingList => {
                let mut shuffled: Vec<i64> = (min..=max).collect();
                shuffled.shuffle(rng);
                PoolState::RemainingList {
                    shuffled,
                    cursor: 0,
                }
            }
            DrawStrategy::RemainingListSwap => PoolState::RemainingListSwap {
                values: (min..=max).collect(),
                live: (max - min + 1) as usize,
            },
            DrawStrategy::UsedSet => PoolState::UsedSet {
                min,
                max,
                used: AHashSet::new(),
            },
        };
        self.state = Some(state);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    pub fn has_next(&self) -> bool {
        match &self.state {
            None => false,
            Some(PoolState::RemainingList { shuffled, cursor }) => *cursor < shuffled.len(),
            Some(PoolState::RemainingListSwap { live, .. }) => *live > 0,
            Some(PoolState::UsedSet { min, max, used }) => {
                used.len() < (max - min + 1) as usize
            }
        }
    }

    pub fn next(&mut self, rng: &mut StdRng) -> Result<i64, GraphLoomError> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| GraphLoomError::config("distinct range used before init"))?;
        match state {
            PoolState::RemainingList { shuffled, cursor } => {
                if *cursor >= shuffled.len() {
                    return Err(GraphLoomError::exhausted("distinct range empty"));
                }
                let value = shuffled[*cursor];
                *cursor += 1;
                Ok(value)
            }
            PoolState::RemainingListSwap { values, live } => {
                if *live == 0 {
                    return Err(GraphLoomError::exhausted("distinct range empty"));
                }
                let idx = rng.gen_range(0..*live);
                values.swap(idx, *live - 1);
                *live -= 1;
                Ok(values[*live])
            }
            PoolState::UsedSet { min, max, used } => {
                let pool = (*max - *min + 1) as usize;
                if used.len() >= pool {
                    return Err(GraphLoomError::exhausted("distinct range empty"));
                }
                loop {
                    let candidate = rng.gen_range(*min..=*max);
                    if used.insert(candidate) {
                        return Ok(candidate);
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RepetitionKind {
    Constant(u32),
    Uniform { min: u32, max: u32 },
    CyclicCounter { min: u32, max: u32 },
}

/// Produces the per-match instantiation count for a construction pattern,
/// or (as a cyclic counter) mints monotonically increasing numeric ids.
/// Must be initialized before the first draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepetitionSampler {
    kind: RepetitionKind,
    cursor: u32,
    initialized: bool,
}

impl RepetitionSampler {
    pub fn constant(value: u32) -> Result<Self, GraphLoomError> {
        if value == 0 {
            return Err(GraphLoomError::invalid_input(
                "constant repetition must be positive",
            ));
        }
        Ok(Self {
            kind: RepetitionKind::Constant(value),
            cursor: 0,
            initialized: false,
        })
    }

    pub fn uniform(min: u32, max: u32) -> Result<Self, GraphLoomError> {
        if min > max {
            return Err(GraphLoomError::invalid_input(format!(
                "uniform repetition requires min <= max, got [{min}, {max}]"
            )));
        }
        Ok(Self {
            kind: RepetitionKind::Uniform { min, max },
            cursor: 0,
            initialized: false,
        })
    }

    pub fn cyclic(min: u32, max: u32) -> Result<Self, GraphLoomError> {
        if min > max {
            return Err(GraphLoomError::invalid_input(format!(
                "cyclic counter requires min <= max, got [{min}, {max}]"
            )));
        }
        Ok(Self {
            kind: RepetitionKind::CyclicCounter { min, max },
            cursor: min,
            initialized: false,
        })
    }

    pub fn init(&mut self) {
        if let RepetitionKind::CyclicCounter { min, .. } = self.kind {
            self.cursor = min;
        }
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn sample(&mut self, rng: &mut StdRng) -> Result<u32, GraphLoomError> {
        if !self.initialized {
            return Err(GraphLoomError::config(
                "repetition sampler used before init",
            ));
        }
        match self.kind {
            RepetitionKind::Constant(value) => Ok(value),
            RepetitionKind::Uniform { min, max } => Ok(rng.gen_range(min..=max)),
            RepetitionKind::CyclicCounter { min, max } => {
                let value = self.cursor;
                self.cursor = if self.cursor >= max {
                    min
                } else {
                    self.cursor + 1
                };
                Ok(value)
            }
        }
    }
}

use std::fs;
use std::path::Path;

use ahash::AHashSet;
use rand::Rng;
use rand::rngs::StdRng;

use crate::{
    errors::GraphLoomError,
    number_sampler::{DistinctRange, DrawStrategy},
};

const WEIGHT_SLOTS: u32 = 100;

#[derive(Debug, Clone)]
enum SuffixCounter {
    Plain(u64),
    Distinct { min: i64, max: i64, pool: DistinctRange },
}

/// Label-generating strategy for naming newly minted graph entities and
/// property values.
#[derive(Debug, Clone)]
pub enum DictionarySampler {
    Constant {
        label: String,
    },
    CounterSuffixed {
        base: String,
        counter: SuffixCounterConfig,
    },
    Weighted {
        slots: Vec<String>,
    },
    DistinctSet {
        labels: Vec<String>,
        order: DistinctRange,
    },
    /// Value injected via `set_value` immediately before each use.
    Injected {
        value: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct SuffixCounterConfig {
    inner: SuffixCounter,
}

impl DictionarySampler {
    pub fn constant<T: Into<String>>(label: T) -> Self {
        DictionarySampler::Constant {
            label: label.into(),
        }
    }

    pub fn counter_suffixed<T: Into<String>>(base: T) -> Self {
        DictionarySampler::CounterSuffixed {
            base: base.into(),
            counter: SuffixCounterConfig {
                inner: SuffixCounter::Plain(0),
            },
        }
    }

    /// Counter-suffixed labels whose numeric suffixes are drawn without
    /// replacement from `[min, max]`.
    pub fn counter_suffixed_distinct<T: Into<String>>(
        base: T,
        min: i64,
        max: i64,
        strategy: DrawStrategy,
    ) -> Result<Self, GraphLoomError> {
        if min > max {
            return Err(GraphLoomError::invalid_input(format!(
                "suffix range requires min <= max, got [{min}, {max}]"
            )));
        }
        Ok(DictionarySampler::CounterSuffixed {
            base: base.into(),
            counter: SuffixCounterConfig {
                inner: SuffixCounter::Distinct {
                    min,
                    max,
                    pool: DistinctRange::new(strategy),
                },
            },
        })
    }

    /// Builds the 100-slot weighted table. Percentages must sum to exactly
    /// 100 and labels must not repeat.
    pub fn weighted(entries: &[(String, u32)]) -> Result<Self, GraphLoomError> {
        let mut seen = AHashSet::new();
        let mut total = 0u32;
        for (label, percent) in entries {
            if !seen.insert(label.as_str()) {
                return Err(GraphLoomError::config(format!(
                    "duplicate label '{label}' in weighted table"
                )));
            }
            total = total.checked_add(*percent).ok_or_else(|| {
                GraphLoomError::config("weighted table percentages overflow")
            })?;
        }
        if total != WEIGHT_SLOTS {
            return Err(GraphLoomError::config(format!(
                "weighted table percentages must sum to 100, got {total}"
            )));
        }
        let mut slots = Vec::with_capacity(WEIGHT_SLOTS as usize);
        for (label, percent) in entries {
            for _ in 0..*percent {
                slots.push(label.clone());
            }
        }
        Ok(DictionarySampler::Weighted { slots })
    }

    /// Labels drawn without repetition until the pool is exhausted.
    pub fn distinct_set(labels: Vec<String>, strategy: DrawStrategy) -> Result<Self, GraphLoomError> {
        if labels.is_empty() {
            return Err(GraphLoomError::config("distinct label set is empty"));
        }
        let mut seen = AHashSet::new();
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(GraphLoomError::config(format!(
                    "duplicate label '{label}' in distinct set"
                )));
            }
        }
        Ok(DictionarySampler::DistinctSet {
            labels,
            order: DistinctRange::new(strategy),
        })
    }

    pub fn injected() -> Self {
        DictionarySampler::Injected { value: None }
    }

    pub fn from_label_file<P: AsRef<Path>>(
        path: P,
        strategy: DrawStrategy,
    ) -> Result<Self, GraphLoomError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            GraphLoomError::config(format!(
                "cannot read label file {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_label_text(&content, strategy)
    }

    pub fn from_label_text(text: &str, strategy: DrawStrategy) -> Result<Self, GraphLoomError> {
        match parse_label_lines(text)? {
            LabelFile::Uniform(labels) => Self::distinct_set(labels, strategy),
            LabelFile::Weighted(entries) => Self::weighted(&entries),
        }
    }

    /// False once a distinct sampler has run out of labels, or while an
    /// injected sampler has no pending value.
    pub fn is_usable(&self) -> bool {
        match self {
            DictionarySampler::Constant { .. } | DictionarySampler::Weighted { .. } => true,
            DictionarySampler::CounterSuffixed { counter, .. } => match &counter.inner {
                SuffixCounter::Plain(_) => true,
                SuffixCounter::Distinct { pool, .. } => {
                    !pool.is_initialized() || pool.has_next()
                }
            },
            DictionarySampler::DistinctSet { order, .. } => {
                !order.is_initialized() || order.has_next()
            }
            DictionarySampler::Injected { value } => value.is_some(),
        }
    }

    pub fn set_value<T: Into<String>>(&mut self, value: T) -> Result<(), GraphLoomError> {
        match self {
            DictionarySampler::Injected { value: slot } => {
                *slot = Some(value.into());
                Ok(())
            }
            _ => Err(GraphLoomError::config(
                "set_value only applies to injected samplers",
            )),
        }
    }

    pub fn next_label(&mut self, rng: &mut StdRng) -> Result<String, GraphLoomError> {
        match self {
            DictionarySampler::Constant { label } => Ok(label.clone()),
            DictionarySampler::CounterSuffixed { base, counter } => match &mut counter.inner {
                SuffixCounter::Plain(next) => {
                    let label = format!("{base}{next}");
                    *next += 1;
                    Ok(label)
                }
                SuffixCounter::Distinct { min, max, pool } => {
                    if !pool.is_initialized() {
                        pool.init(*min, *max, rng)?;
                    }
                    if !pool.has_next() {
                        return Err(GraphLoomError::exhausted(format!(
                            "suffix pool for '{base}' is spent"
                        )));
                    }
                    let suffix = pool.next(rng)?;
                    Ok(format!("{base}{suffix}"))
                }
            },
            DictionarySampler::Weighted { slots } => {
                let idx = rng.gen_range(0..slots.len());
                Ok(slots[idx].clone())
            }
            DictionarySampler::DistinctSet { labels, order } => {
                if !order.is_initialized() {
                    order.init(0, labels.len() as i64 - 1, rng)?;
                }
                if !order.has_next() {
                    return Err(GraphLoomError::exhausted("distinct label set is spent"));
                }
                let idx = order.next(rng)? as usize;
                Ok(labels[idx].clone())
            }
            DictionarySampler::Injected { value } => value.take().ok_or_else(|| {
                GraphLoomError::config("injected sampler drawn with no pending value")
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelFile {
    Uniform(Vec<String>),
    Weighted(Vec<(String, u32)>),
}

/// Parses the label-file format: one label per line, or `label; NN%`
/// lines. Blank lines and `//` comments are ignored; mixing the two line
/// forms in one file is an error.
pub fn parse_label_lines(text: &str) -> Result<LabelFile, GraphLoomError> {
    let mut plain: Vec<String> = Vec::new();
    let mut weighted: Vec<(String, u32)> = Vec::new();
    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if let Some((label, spec)) = line.split_once(';') {
            let label = label.trim();
            let spec = spec.trim();
            let digits = spec.strip_suffix('%').ok_or_else(|| {
                GraphLoomError::config(format!(
                    "line {}: weighted entry must end with '%'",
                    number + 1
                ))
            })?;
            let percent: u32 = digits.trim().parse().map_err(|_| {
                GraphLoomError::config(format!(
                    "line {}: invalid percentage '{}'",
                    number + 1,
                    digits.trim()
                ))
            })?;
            weighted.push((label.to_string(), percent));
        } else {
            plain.push(line.to_string());
        }
    }
    match (plain.is_empty(), weighted.is_empty()) {
        (true, true) => Err(GraphLoomError::config("label file has no entries")),
        (false, true) => Ok(LabelFile::Uniform(plain)),
        (true, false) => Ok(LabelFile::Weighted(weighted)),
        (false, false) => Err(GraphLoomError::config(
            "label file mixes plain and weighted lines",
        )),
    }
}

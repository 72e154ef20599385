use serde::{Deserialize, Serialize};

use crate::errors::GraphLoomError;

/// Controls whether and at what scope a query's results may recur.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SamplingMode {
    /// No repetition across the entire construction command.
    GlobalDistinct,
    /// No repetition within one parent binding; each parent binding gets
    /// a fresh pool.
    LocalDistinct,
    /// Independent uniform draw per call; repeats allowed.
    Repeatable,
}

/// Caps how many of a query's raw results are consumable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Selection {
    All,
    Count(usize),
    Fraction(f64),
}

impl Selection {
    pub fn cap(&self, raw_len: usize) -> usize {
        match self {
            Selection::All => raw_len,
            Selection::Count(count) => (*count).min(raw_len),
            Selection::Fraction(fraction) => {
                let capped = (fraction * raw_len as f64).ceil() as usize;
                capped.min(raw_len)
            }
        }
    }

    fn validate(&self) -> Result<(), GraphLoomError> {
        if let Selection::Fraction(fraction) = self {
            if !(*fraction > 0.0 && *fraction <= 1.0) {
                return Err(GraphLoomError::invalid_input(format!(
                    "selection fraction must be in (0, 1], got {fraction}"
                )));
            }
        }
        Ok(())
    }
}

/// Immutable description of one step in a query dependency chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuerySpec {
    pub text: String,
    pub mode: SamplingMode,
    pub selection: Selection,
    /// True when the query text contains placeholders resolved from
    /// earlier steps' bindings.
    pub dynamic: bool,
}

impl QuerySpec {
    pub fn new<T: Into<String>>(
        text: T,
        mode: SamplingMode,
        selection: Selection,
    ) -> Result<Self, GraphLoomError> {
        selection.validate()?;
        let text = text.into();
        if text.trim().is_empty() {
            return Err(GraphLoomError::invalid_input("query text must be set"));
        }
        Ok(Self {
            text,
            mode,
            selection,
            dynamic: false,
        })
    }

    pub fn new_dynamic<T: Into<String>>(
        text: T,
        mode: SamplingMode,
        selection: Selection,
    ) -> Result<Self, GraphLoomError> {
        let mut spec = Self::new(text, mode, selection)?;
        spec.dynamic = true;
        Ok(spec)
    }
}

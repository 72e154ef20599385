//! Synthetic RDF-style graph generation: match a small structural
//! template against an existing triple store and instantiate new nodes
//! and edges per sampled quantities and labels.

pub mod bench_utils;
pub mod dictionary;
pub mod errors;
pub mod executor;
pub mod number_sampler;
pub mod pattern;
pub mod query_cache;
pub mod query_executor;
pub mod query_spec;
pub mod schema;
pub mod store;
pub mod triple_query;
pub mod value;

pub use crate::dictionary::DictionarySampler;
pub use crate::errors::GraphLoomError;
pub use crate::executor::{ConstructCommand, ConstructReport, ConstructionExecutor};
pub use crate::number_sampler::{DistinctRange, DrawStrategy, RepetitionSampler};
pub use crate::pattern::{ConstructionPattern, EdgeTemplate, Matcher, NodeTemplate};
pub use crate::query_cache::{CachePolicy, QueryCache};
pub use crate::query_executor::QueryExecutor;
pub use crate::query_spec::{QuerySpec, SamplingMode, Selection};
pub use crate::store::{GraphSource, ScratchGraph, SqliteTripleStore};
pub use crate::value::{Binding, GraphValue, Triple};

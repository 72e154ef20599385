use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A term stored in the graph: either a resource IRI or a plain literal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum GraphValue {
    Resource(String),
    Literal(String),
}

impl GraphValue {
    pub fn resource<T: Into<String>>(iri: T) -> Self {
        GraphValue::Resource(iri.into())
    }

    pub fn literal<T: Into<String>>(text: T) -> Self {
        GraphValue::Literal(text.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            GraphValue::Resource(iri) => iri,
            GraphValue::Literal(text) => text,
        }
    }

    /// Renders the value as a query-text term so it can be substituted
    /// into a dynamic query.
    pub fn render(&self) -> String {
        match self {
            GraphValue::Resource(iri) => format!("<{iri}>"),
            GraphValue::Literal(text) => format!("\"{text}\""),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: GraphValue,
}

impl Triple {
    pub fn new<S, P>(subject: S, predicate: P, object: GraphValue) -> Self
    where
        S: Into<String>,
        P: Into<String>,
    {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object,
        }
    }
}

/// One query result row: variable name to graph value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    values: AHashMap<String, GraphValue>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Into<String>>(&mut self, variable: T, value: GraphValue) {
        self.values.insert(variable.into(), value);
    }

    pub fn get(&self, variable: &str) -> Option<&GraphValue> {
        self.values.get(variable)
    }

    pub fn contains(&self, variable: &str) -> bool {
        self.values.contains_key(variable)
    }

    pub fn variables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

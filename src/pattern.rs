use ahash::AHashMap;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::{
    dictionary::DictionarySampler,
    errors::GraphLoomError,
    store::ScratchGraph,
    value::{Binding, GraphValue, Triple},
};

pub const RDF_TYPE: &str = "rdf:type";
pub const DEFAULT_NAMESPACE: &str = "http://graphloom.dev/data#";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EdgeTemplate {
    pub id: i64,
    pub relation_label: String,
    pub target_node_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeTemplate {
    pub id: i64,
    pub class_label: String,
    /// Set once the node is matched against the store or freshly minted.
    #[serde(skip)]
    pub bound_resource: Option<GraphValue>,
    pub edges: Vec<EdgeTemplate>,
}

impl NodeTemplate {
    pub fn new<T: Into<String>>(id: i64, class_label: T) -> Self {
        Self {
            id,
            class_label: class_label.into(),
            bound_resource: None,
            edges: Vec::new(),
        }
    }

    pub fn with_edge<T: Into<String>>(mut self, id: i64, relation: T, target: i64) -> Self {
        self.edges.push(EdgeTemplate {
            id,
            relation_label: relation.into(),
            target_node_id: target,
        });
        self
    }
}

/// Auto-generated property attached to every minted node of a class.
/// A late-bound property has the node's freshly drawn label injected
/// into its sampler before each draw.
#[derive(Debug, Clone)]
pub struct PropertyTemplate {
    pub predicate: String,
    pub sampler: DictionarySampler,
    pub late_bound: bool,
}

/// Maps template node ids to the query-result variables they were
/// matched from. Read-only after construction except for `add_mapping`.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    mapping: AHashMap<i64, String>,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mapping<T: Into<String>>(
        &mut self,
        node_id: i64,
        variable: T,
    ) -> Result<(), GraphLoomError> {
        let variable = variable.into();
        if self.mapping.contains_key(&node_id) {
            return Err(GraphLoomError::config(format!(
                "node {node_id} already has a matcher mapping"
            )));
        }
        self.mapping.insert(node_id, variable);
        Ok(())
    }

    pub fn variable_for(&self, node_id: i64) -> Option<&str> {
        self.mapping.get(&node_id).map(|s| s.as_str())
    }

    pub fn covers(&self, node_id: i64) -> bool {
        self.mapping.contains_key(&node_id)
    }

    /// Resolves every old node's bound resource from the accumulated
    /// binding stack (newest binding wins). Fails when a mapping is
    /// missing or its variable is absent from every supplied binding.
    pub fn set_nodes_mapping(
        &self,
        bindings: &[Binding],
        pattern: &mut ConstructionPattern,
    ) -> Result<(), GraphLoomError> {
        let ids: Vec<i64> = pattern.old_nodes.keys().copied().collect();
        for id in ids {
            let variable = self.variable_for(id).ok_or_else(|| {
                GraphLoomError::config(format!("old node {id} has no matcher mapping"))
            })?;
            let value = bindings
                .iter()
                .rev()
                .find_map(|binding| binding.get(variable))
                .cloned()
                .ok_or_else(|| {
                    GraphLoomError::resolution(format!(
                        "variable '{variable}' for old node {id} is unbound"
                    ))
                })?;
            let node = pattern.old_nodes.get_mut(&id).expect("old node present");
            node.bound_resource = Some(value);
        }
        Ok(())
    }
}

/// The node/edge template one construction command instantiates: nodes
/// expected to already exist (`old_nodes`) and nodes minted fresh on each
/// application (`new_nodes`), plus per-class naming configuration.
#[derive(Debug)]
pub struct ConstructionPattern {
    old_nodes: AHashMap<i64, NodeTemplate>,
    new_nodes: AHashMap<i64, NodeTemplate>,
    namespaces: AHashMap<String, String>,
    label_samplers: AHashMap<String, DictionarySampler>,
    properties: AHashMap<String, Vec<PropertyTemplate>>,
}

impl ConstructionPattern {
    pub fn new(
        old_nodes: Vec<NodeTemplate>,
        new_nodes: Vec<NodeTemplate>,
    ) -> Result<Self, GraphLoomError> {
        let mut old_map = AHashMap::with_capacity(old_nodes.len());
        let mut new_map = AHashMap::with_capacity(new_nodes.len());
        for node in old_nodes {
            if old_map.insert(node.id, node).is_some() {
                return Err(GraphLoomError::invalid_input(
                    "duplicate node id in construction pattern",
                ));
            }
        }
        for node in new_nodes {
            let id = node.id;
            if old_map.contains_key(&id) || new_map.insert(id, node).is_some() {
                return Err(GraphLoomError::invalid_input(
                    "duplicate node id in construction pattern",
                ));
            }
        }
        for node in old_map.values().chain(new_map.values()) {
            if node.class_label.trim().is_empty() {
                return Err(GraphLoomError::config(format!(
                    "node {} has an empty class label",
                    node.id
                )));
            }
            for edge in &node.edges {
                if edge.relation_label.trim().is_empty() {
                    return Err(GraphLoomError::config(format!(
                        "edge {} on node {} has an empty relation label",
                        edge.id, node.id
                    )));
                }
            }
        }
        // Dangling edge targets surface during application, where the
        // failed call leaves the scratch graph untouched.
        Ok(Self {
            old_nodes: old_map,
            new_nodes: new_map,
            namespaces: AHashMap::new(),
            label_samplers: AHashMap::new(),
            properties: AHashMap::new(),
        })
    }

    pub fn register_namespace<C, N>(&mut self, class_label: C, namespace: N)
    where
        C: Into<String>,
        N: Into<String>,
    {
        self.namespaces.insert(class_label.into(), namespace.into());
    }

    pub fn register_label_sampler<C: Into<String>>(
        &mut self,
        class_label: C,
        sampler: DictionarySampler,
    ) {
        self.label_samplers.insert(class_label.into(), sampler);
    }

    pub fn register_property<C: Into<String>>(&mut self, class_label: C, property: PropertyTemplate) {
        self.properties
            .entry(class_label.into())
            .or_default()
            .push(property);
    }

    pub fn old_node_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.old_nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn new_node_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.new_nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn old_node(&self, id: i64) -> Option<&NodeTemplate> {
        self.old_nodes.get(&id)
    }

    /// Instantiates the pattern once onto the scratch graph: mints every
    /// new node first (label, type triple, auto properties), then attaches
    /// new-node edges, then old-node edges against their already-resolved
    /// resources. Buffers everything so a failure leaves the scratch graph
    /// untouched.
    pub fn apply_on_scratch(
        &mut self,
        scratch: &mut ScratchGraph,
        rng: &mut StdRng,
    ) -> Result<usize, GraphLoomError> {
        let mut staged: Vec<Triple> = Vec::new();
        let mut minted: AHashMap<i64, String> = AHashMap::new();

        // New-node creation must fully complete before any edge is
        // attached; edges may target any new node regardless of order.
        for id in self.new_node_ids() {
            let class = self.new_nodes[&id].class_label.clone();
            let label = self.draw_label(&class, rng)?;
            let namespace = self
                .namespaces
                .get(&class)
                .map(|s| s.as_str())
                .unwrap_or(DEFAULT_NAMESPACE);
            let iri = format!("{namespace}{label}");
            staged.push(Triple::new(
                iri.clone(),
                RDF_TYPE,
                GraphValue::resource(class.clone()),
            ));
            if let Some(templates) = self.properties.get_mut(&class) {
                for property in templates.iter_mut() {
                    if property.late_bound {
                        property.sampler.set_value(label.clone())?;
                    }
                    let value = property.sampler.next_label(rng)?;
                    staged.push(Triple::new(
                        iri.clone(),
                        property.predicate.clone(),
                        GraphValue::literal(value),
                    ));
                }
            }
            let node = self.new_nodes.get_mut(&id).expect("new node present");
            node.bound_resource = Some(GraphValue::resource(iri.clone()));
            minted.insert(id, iri);
        }

        for id in self.new_node_ids() {
            let subject = minted[&id].clone();
            let edges = self.new_nodes[&id].edges.clone();
            for edge in edges {
                let target = self.resolve_target(&minted, &edge)?;
                staged.push(Triple::new(
                    subject.clone(),
                    edge.relation_label,
                    GraphValue::resource(target),
                ));
            }
        }

        for id in self.old_node_ids() {
            let node = &self.old_nodes[&id];
            let subject = match &node.bound_resource {
                Some(GraphValue::Resource(iri)) => iri.clone(),
                _ => {
                    return Err(GraphLoomError::resolution(format!(
                        "old node {id} has no resolved resource"
                    )));
                }
            };
            let edges = node.edges.clone();
            for edge in edges {
                let target = self.resolve_target(&minted, &edge)?;
                staged.push(Triple::new(
                    subject.clone(),
                    edge.relation_label,
                    GraphValue::resource(target),
                ));
            }
        }

        let count = staged.len();
        scratch.extend(staged);
        Ok(count)
    }

    fn draw_label(&mut self, class: &str, rng: &mut StdRng) -> Result<String, GraphLoomError> {
        let sampler = self.label_samplers.get_mut(class).ok_or_else(|| {
            GraphLoomError::config(format!("no label sampler registered for class '{class}'"))
        })?;
        sampler.next_label(rng)
    }

    fn resolve_target(
        &self,
        minted: &AHashMap<i64, String>,
        edge: &EdgeTemplate,
    ) -> Result<String, GraphLoomError> {
        let target = edge.target_node_id;
        if let Some(iri) = minted.get(&target) {
            return Ok(iri.clone());
        }
        if let Some(node) = self.old_nodes.get(&target) {
            if let Some(GraphValue::Resource(iri)) = &node.bound_resource {
                return Ok(iri.clone());
            }
            return Err(GraphLoomError::resolution(format!(
                "edge {} targets old node {target} with no resolved resource",
                edge.id
            )));
        }
        Err(GraphLoomError::resolution(format!(
            "edge {} has dangling target node {target}",
            edge.id
        )))
    }
}

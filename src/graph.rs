//! Room adjacency graph: the solver's input
//!
//! A graph is built either programmatically (`LayoutGraph::new().with_room(..)`)
//! or from a TOML document:
//!
//! ```toml
//! anchor = "entry"
//!
//! [[rooms]]
//! id = "entry"
//! label = "Entrance"
//!
//! [[rooms]]
//! id = "kitchen"
//! label = "Kitchen"
//! metadata = { area = 9.0 }
//!
//! [[edges]]
//! a = "entry"
//! b = "kitchen"
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, GraphError};
use crate::shapes::{normalize_label, ShapeLibrary};

/// Free-form per-room annotations, carried through to the output
pub type Metadata = BTreeMap<String, MetaValue>;

/// A metadata value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl MetaValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<f64> for MetaValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

pub const DEFAULT_ASPECT_RATIO_RANGE: (f64, f64) = (1.0, 2.0);
pub const DEFAULT_MIN_DIMENSION: f64 = 1.0;

/// A room to be placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSpec {
    pub id: String,
    pub label: String,
    /// m²
    pub target_area: f64,
    /// Permitted long/short ratio, both ends ≥ 1
    pub aspect_ratio_range: (f64, f64),
    /// m
    pub min_dimension: f64,
    #[serde(default)]
    pub metadata: Metadata,
}

impl RoomSpec {
    pub fn new(id: impl Into<String>, label: impl Into<String>, target_area: f64) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            target_area,
            aspect_ratio_range: DEFAULT_ASPECT_RATIO_RANGE,
            min_dimension: DEFAULT_MIN_DIMENSION,
            metadata: Metadata::new(),
        }
    }

    /// Pin the aspect ratio to a single value
    pub fn with_aspect_ratio(mut self, aspect: f64) -> Self {
        self.aspect_ratio_range = (aspect, aspect);
        self
    }

    pub fn with_aspect_range(mut self, min: f64, max: f64) -> Self {
        self.aspect_ratio_range = (min, max);
        self
    }

    pub fn with_min_dimension(mut self, min_dimension: f64) -> Self {
        self.min_dimension = min_dimension;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    fn validate(&self) -> Result<(), GraphError> {
        if !(self.target_area.is_finite() && self.target_area > 0.0) {
            return Err(GraphError::invalid_area(&self.id, self.target_area));
        }
        let (min, max) = self.aspect_ratio_range;
        if !(min.is_finite() && max.is_finite() && min >= 1.0 && min <= max) {
            return Err(GraphError::InvalidAspectRange {
                id: self.id.clone(),
                min,
                max,
            });
        }
        if !(self.min_dimension.is_finite() && self.min_dimension > 0.0) {
            return Err(GraphError::InvalidMinDimension {
                id: self.id.clone(),
                value: self.min_dimension,
            });
        }
        Ok(())
    }
}

/// An undirected "must share a wall" relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyEdge {
    #[serde(alias = "a")]
    pub room_a: String,
    #[serde(alias = "b")]
    pub room_b: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl AdjacencyEdge {
    pub fn new(room_a: impl Into<String>, room_b: impl Into<String>) -> Self {
        Self {
            room_a: room_a.into(),
            room_b: room_b.into(),
            weight: default_weight(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Order-insensitive endpoint test
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.room_a == a && self.room_b == b) || (self.room_a == b && self.room_b == a)
    }

    /// The endpoint that is not `id`
    pub fn other(&self, id: &str) -> Option<&str> {
        if self.room_a == id {
            Some(self.room_b.as_str())
        } else if self.room_b == id {
            Some(self.room_a.as_str())
        } else {
            None
        }
    }
}

/// Undirected adjacency graph over room ids.
///
/// Nodes are added in room order and edges in insertion order, so both
/// index spaces are stable for a given [`LayoutGraph`].
#[derive(Debug, Clone, Default)]
pub struct RoomGraph {
    graph: UnGraph<String, f64>,
    nodes: HashMap<String, NodeIndex>,
}

impl RoomGraph {
    pub fn from_layout(layout: &LayoutGraph) -> Self {
        let mut rooms = Self::default();
        for room in &layout.rooms {
            rooms.node_or_insert(&room.id);
        }
        for edge in &layout.edges {
            rooms.add_edge(edge);
        }
        rooms
    }

    /// Graph over just the rooms the edges mention
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a AdjacencyEdge>) -> Self {
        let mut rooms = Self::default();
        for edge in edges {
            rooms.add_edge(edge);
        }
        rooms
    }

    fn node_or_insert(&mut self, id: &str) -> NodeIndex {
        if let Some(&node) = self.nodes.get(id) {
            return node;
        }
        let node = self.graph.add_node(id.to_string());
        self.nodes.insert(id.to_string(), node);
        node
    }

    fn add_edge(&mut self, edge: &AdjacencyEdge) {
        let a = self.node_or_insert(&edge.room_a);
        let b = self.node_or_insert(&edge.room_b);
        self.graph.add_edge(a, b, edge.weight);
    }

    pub fn graph(&self) -> &UnGraph<String, f64> {
        &self.graph
    }

    pub fn node(&self, id: &str) -> Option<NodeIndex> {
        self.nodes.get(id).copied()
    }

    pub fn room_id(&self, node: NodeIndex) -> Option<&str> {
        self.graph.node_weight(node).map(String::as_str)
    }

    /// Order-insensitive adjacency test
    pub fn contains(&self, a: &str, b: &str) -> bool {
        match (self.node(a), self.node(b)) {
            (Some(a), Some(b)) => self.graph.contains_edge(a, b),
            _ => false,
        }
    }

    /// Neighbours of `id` in edge insertion order, without duplicates
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self.graph.edges(node).collect();
        edges.sort_by_key(|e| e.id());

        let mut out: Vec<&str> = Vec::with_capacity(edges.len());
        for edge in edges {
            let other = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            let id = self.graph[other].as_str();
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }

    pub fn component_count(&self) -> usize {
        connected_components(&self.graph)
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }
}

/// Rooms and the adjacencies between them.
///
/// Room and edge order is significant: it drives placement order and the
/// order edges are aligned in each pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutGraph {
    pub rooms: Vec<RoomSpec>,
    pub edges: Vec<AdjacencyEdge>,
    /// Room held fixed while the others are arranged around it
    #[serde(default)]
    pub anchor: Option<String>,
}

impl LayoutGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_room(&mut self, room: RoomSpec) {
        self.rooms.push(room);
    }

    pub fn add_edge(&mut self, edge: AdjacencyEdge) {
        self.edges.push(edge);
    }

    pub fn with_room(mut self, room: RoomSpec) -> Self {
        self.add_room(room);
        self
    }

    pub fn with_edge(mut self, a: impl Into<String>, b: impl Into<String>) -> Self {
        self.add_edge(AdjacencyEdge::new(a, b));
        self
    }

    pub fn with_anchor(mut self, id: impl Into<String>) -> Self {
        self.anchor = Some(id.into());
        self
    }

    pub fn room(&self, id: &str) -> Option<&RoomSpec> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn room_ids(&self) -> impl Iterator<Item = &str> {
        self.rooms.iter().map(|r| r.id.as_str())
    }

    pub fn room_graph(&self) -> RoomGraph {
        RoomGraph::from_layout(self)
    }

    /// The explicit anchor, else the first room labelled as an entrance,
    /// else the first room
    pub fn anchor_room_id(&self) -> Option<&str> {
        if let Some(anchor) = &self.anchor {
            return Some(anchor.as_str());
        }
        self.rooms
            .iter()
            .find(|r| matches!(normalize_label(&r.label).as_str(), "entrance" | "entry" | "foyer"))
            .or_else(|| self.rooms.first())
            .map(|r| r.id.as_str())
    }

    pub fn total_target_area(&self) -> f64 {
        self.rooms.iter().map(|r| r.target_area).sum()
    }

    /// Check every reference resolves and every room is solvable
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.rooms.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut ids = HashSet::new();
        for room in &self.rooms {
            if !ids.insert(room.id.clone()) {
                return Err(GraphError::DuplicateRoom {
                    id: room.id.clone(),
                });
            }
            room.validate()?;
        }

        for edge in &self.edges {
            for endpoint in [&edge.room_a, &edge.room_b] {
                if !ids.contains(endpoint) {
                    return Err(GraphError::unknown_room(
                        &edge.room_a,
                        &edge.room_b,
                        endpoint,
                        find_similar(&ids, endpoint, 2),
                    ));
                }
            }
            if edge.room_a == edge.room_b {
                return Err(GraphError::SelfLoop {
                    id: edge.room_a.clone(),
                });
            }
            if !(edge.weight.is_finite() && edge.weight >= 0.0) {
                return Err(GraphError::NegativeWeight {
                    room_a: edge.room_a.clone(),
                    room_b: edge.room_b.clone(),
                    weight: edge.weight,
                });
            }
        }

        if let Some(anchor) = &self.anchor {
            if !ids.contains(anchor) {
                return Err(GraphError::UnknownAnchor {
                    id: anchor.clone(),
                    suggestions: find_similar(&ids, anchor, 2),
                });
            }
        }
        Ok(())
    }

    /// Load a graph document from a TOML file
    pub fn from_file(path: &Path, library: &ShapeLibrary) -> Result<Self, crate::SolveError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_toml_str(&content, library)
    }

    /// Parse a graph document, filling room defaults from `library`
    pub fn from_toml_str(content: &str, library: &ShapeLibrary) -> Result<Self, crate::SolveError> {
        let doc: GraphDocument = toml::from_str(content).map_err(ConfigError::from)?;
        let graph = doc.into_graph(library);
        graph.validate()?;
        Ok(graph)
    }
}

/// On-disk graph format: rooms carry a label and optional overrides
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphDocument {
    #[serde(default)]
    pub anchor: Option<String>,
    #[serde(default)]
    pub rooms: Vec<RoomNode>,
    #[serde(default)]
    pub edges: Vec<AdjacencyEdge>,
}

#[derive(Debug, Deserialize)]
pub struct RoomNode {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl GraphDocument {
    pub fn into_graph(self, library: &ShapeLibrary) -> LayoutGraph {
        LayoutGraph {
            rooms: self
                .rooms
                .into_iter()
                .map(|node| library.room_spec(&node.id, &node.label, node.metadata))
                .collect(),
            edges: self.edges,
            anchor: self.anchor,
        }
    }
}

/// Levenshtein edit distance between two strings
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut row = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            row[j + 1] = (prev[j + 1] + 1).min(row[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}

/// Up to three known ids within `max_distance` edits of `target`, closest
/// first
fn find_similar(known: &HashSet<String>, target: &str, max_distance: usize) -> Vec<String> {
    let mut candidates: Vec<(&String, usize)> = known
        .iter()
        .map(|name| (name, levenshtein_distance(name, target)))
        .filter(|(_, d)| *d > 0 && *d <= max_distance)
        .collect();
    candidates.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    candidates
        .into_iter()
        .take(3)
        .map(|(name, _)| name.clone())
        .collect()
}

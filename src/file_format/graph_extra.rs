use std::collections::HashMap;
use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Adjacency information for a single rendered diagram node.  Neighbor nodes
/// may come with the classes that should be applied to them on hover; an empty
/// class list means the default in/out styling applies.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct GraphNodeExtra {
    #[serde(default)]
    pub in_nodes: Vec<(String, Vec<String>)>,
    #[serde(default)]
    pub out_nodes: Vec<(String, Vec<String>)>,
    #[serde(default)]
    pub in_edges: Vec<String>,
    #[serde(default)]
    pub out_edges: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GraphExtra {
    #[serde(default)]
    nodes: HashMap<String, GraphNodeExtra>,
}

/// Diagram pages emit GRAPH_EXTRA as an array with one entry per graph, but we
/// also accept a bare single graph.
#[derive(Deserialize)]
#[serde(untagged)]
enum GraphExtraPayload {
    Graphs(Vec<GraphExtra>),
    Single(GraphExtra),
}

/// Read-only GRAPH_EXTRA lookup keyed by diagram node id.
#[derive(Debug, Default)]
pub struct GraphAdjacency {
    nodes: HashMap<String, GraphNodeExtra>,
}

impl GraphAdjacency {
    /// Only the first graph of a multi-graph payload is consulted; the hover
    /// logic has never supported more than one diagram per page.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let payload: GraphExtraPayload = serde_json::from_str(json)?;
        let nodes = match payload {
            GraphExtraPayload::Graphs(graphs) => graphs
                .into_iter()
                .next()
                .map(|graph| graph.nodes)
                .unwrap_or_default(),
            GraphExtraPayload::Single(graph) => graph.nodes,
        };
        Ok(GraphAdjacency { nodes })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNodeExtra> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

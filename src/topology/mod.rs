//! Network topology collaborator: node relationships, grid connectivity,
//! and weighted connection edges. The engine only sees the [`Topology`]
//! trait; [`Network`] is the in-memory implementation used by tests and
//! small scenario runs.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A unique, stable identifier for a node within a network.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One connection incident to a node; `weight` is the line length in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub target: NodeId,
    pub weight: f64,
}

/// Grid connectivity of a node under the scenario being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridStatus {
    /// Not connected to the grid.
    Off,
    /// Connected by this scenario.
    New,
    /// Connected before the scenario ran.
    Existing,
}

/// Queries the engine and the fold rules need from the network.
pub trait Topology: Sync {
    /// A node's children, in a stable order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Whether the node ends up grid-connected, pre-existing or new.
    fn is_node_connected(&self, node: NodeId) -> bool;

    /// Whether the node was grid-connected before the scenario ran.
    fn was_node_already_connected(&self, node: NodeId) -> bool;

    /// Connections incident to the node, filtered to existing or new lines.
    fn connections(&self, node: NodeId, is_existing: bool) -> Vec<Edge>;

    /// Sum of connection weights across the whole network, same filter.
    /// Each connection is counted once, regardless of its endpoints.
    fn sum_network_weight(&self, is_existing: bool) -> f64;
}

#[derive(Debug, Clone, Copy)]
struct Connection {
    a: NodeId,
    b: NodeId,
    weight: f64,
    is_existing: bool,
}

/// In-memory network: a tree of nodes plus undirected weighted connections.
#[derive(Debug, Default)]
pub struct Network {
    status: Vec<GridStatus>,
    children: Vec<SmallVec<[NodeId; 4]>>,
    connections: Vec<Connection>,
}

impl Network {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, status: GridStatus) -> NodeId {
        let id = NodeId(self.status.len() as u32);
        self.status.push(status);
        self.children.push(SmallVec::new());
        id
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.children[parent.index()].push(child);
    }

    pub fn connect(&mut self, a: NodeId, b: NodeId, weight: f64, is_existing: bool) {
        self.connections.push(Connection {
            a,
            b,
            weight,
            is_existing,
        });
    }

    pub fn len(&self) -> usize {
        self.status.len()
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_empty()
    }
}

impl Topology for Network {
    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.children[node.index()].to_vec()
    }

    fn is_node_connected(&self, node: NodeId) -> bool {
        self.status[node.index()] != GridStatus::Off
    }

    fn was_node_already_connected(&self, node: NodeId) -> bool {
        self.status[node.index()] == GridStatus::Existing
    }

    fn connections(&self, node: NodeId, is_existing: bool) -> Vec<Edge> {
        self.connections
            .iter()
            .filter(|c| c.is_existing == is_existing)
            .filter_map(|c| {
                let target = if c.a == node {
                    c.b
                } else if c.b == node {
                    c.a
                } else {
                    return None;
                };
                Some(Edge {
                    target,
                    weight: c.weight,
                })
            })
            .collect()
    }

    fn sum_network_weight(&self, is_existing: bool) -> f64 {
        self.connections
            .iter()
            .filter(|c| c.is_existing == is_existing)
            .map(|c| c.weight)
            .sum()
    }
}

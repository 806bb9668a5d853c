use serde::{Deserialize, Serialize};

pub mod instance;
pub mod route;

pub type NodeId = u32;

/// Station id reserved for the depot.
pub const DEPOT: NodeId = 0;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn dist(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    ServiceLocation,
    RechargeStation,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
}

impl Node {
    pub fn location(id: NodeId) -> Self {
        Node { id, kind: NodeKind::ServiceLocation }
    }

    pub fn station(id: NodeId) -> Self {
        Node { id, kind: NodeKind::RechargeStation }
    }

    pub fn is_station(&self) -> bool {
        self.kind == NodeKind::RechargeStation
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            NodeKind::ServiceLocation => write!(f, "L{}", self.id),
            NodeKind::RechargeStation => write!(f, "R{}", self.id),
        }
    }
}

//! Layout computation for process graphs and the cluster overview.
//!
//! Both engines are pure: they take model data and return positioned
//! geometry without touching any rendering backend.

mod force;
mod graph;
mod order;
mod overview;
mod types;

pub use force::{ForceParams, Particle, Simulation};
pub use graph::{GraphLayoutConfig, GraphLayoutEngine, route_forward, route_loopback};
pub use order::{NodeOrdering, build_node_index, topological_order};
pub use overview::{OverviewConfig, OverviewEngine, SeedNode, Selection, Viewport};
pub use types::{
    BoundingBox, Canvas, ClusterPosition, EdgeKind, EdgePath, GraphLayoutResult, LayoutEdge,
    LayoutNode, OverviewLayout, OverviewResult, Point, ProcessGraphLayout,
};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("Cluster {0} not found")]
    ClusterNotFound(String),
    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),
    #[error("Cluster {0} has no seed coordinate")]
    MissingSeed(String),
    #[error("Invalid viewport {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },
}

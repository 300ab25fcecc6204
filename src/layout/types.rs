//! Data structures produced by layout computation.

use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

/// A positioned process-graph node.
///
/// `x` is the shared vertical axis (node center), `y` the top edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutNode {
    pub id: String,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Position in the linear ordering
    pub layer: usize,
}

impl LayoutNode {
    pub fn left(&self) -> f64 {
        self.x - self.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Forward,
    Loopback,
}

impl EdgeKind {
    /// Classification is a pure function of the layer indices.
    pub fn classify(from_layer: usize, to_layer: usize) -> Self {
        if to_layer > from_layer {
            Self::Forward
        } else {
            Self::Loopback
        }
    }
}

/// Edge geometry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EdgePath {
    /// Straight segment, bottom-center of source to top-center of target
    Line { start: Point, end: Point },
    /// Side loop: two quadratic curves bowing out to `bow_x`
    Loop { start: Point, bow_x: f64, end: Point },
}

impl EdgePath {
    pub fn start(&self) -> Point {
        match self {
            Self::Line { start, .. } | Self::Loop { start, .. } => *start,
        }
    }

    pub fn end(&self) -> Point {
        match self {
            Self::Line { end, .. } | Self::Loop { end, .. } => *end,
        }
    }

    /// SVG path data.
    pub fn to_svg_d(&self) -> String {
        let mut d = String::new();
        match self {
            Self::Line { start, end } => {
                write!(d, "M{},{} L{},{}", start.x, start.y, end.x, end.y).unwrap();
            }
            Self::Loop { start, bow_x, end } => {
                let mid_y = (start.y + end.y) / 2.0;
                write!(
                    d,
                    "M{},{} Q{},{} {},{} Q{},{} {},{}",
                    start.x, start.y, bow_x, start.y, bow_x, mid_y, bow_x, end.y, end.x, end.y
                )
                .unwrap();
            }
        }
        d
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    pub path: EdgePath,
    /// Index into `ProcessGraph::edges`
    pub edge_index: usize,
}

/// A laid-out process graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessGraphLayout {
    /// Nodes in layer order
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
    pub canvas: Canvas,
    /// Edges dropped because an endpoint was unknown
    pub dropped_edges: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GraphLayoutResult {
    Positioned(ProcessGraphLayout),
    /// Zero nodes or zero edges
    NoData,
}

impl GraphLayoutResult {
    pub fn layout(&self) -> Option<&ProcessGraphLayout> {
        match self {
            Self::Positioned(layout) => Some(layout),
            Self::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}

/// Final position of a cluster glyph, in simulation space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterPosition {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// Extent of the final positions, padded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewLayout {
    pub positions: Vec<ClusterPosition>,
    pub bounds: BoundingBox,
    pub canvas: Canvas,
}

impl OverviewLayout {
    /// Translate a simulation-space point into canvas space.
    pub fn to_canvas(&self, x: f64, y: f64) -> Point {
        Point::new(x - self.bounds.min_x, y - self.bounds.min_y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OverviewResult {
    Positioned(OverviewLayout),
    /// No cluster survived the selection
    Empty,
}

impl OverviewResult {
    pub fn layout(&self) -> Option<&OverviewLayout> {
        match self {
            Self::Positioned(layout) => Some(layout),
            Self::Empty => None,
        }
    }
}

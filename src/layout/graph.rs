//! Single-column layered layout for process graphs.

use crate::measure::{Font, TextMeasure, TextMetrics};
use crate::model::ProcessGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::LayoutError;
use super::order::topological_order;
use super::types::{
    Canvas, EdgeKind, EdgePath, GraphLayoutResult, LayoutEdge, LayoutNode, Point,
    ProcessGraphLayout,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphLayoutConfig {
    pub node_height: f64,
    /// Space above the first node
    pub margin: f64,
    /// Vertical distance between consecutive layers
    pub node_spacing: f64,
    /// Side padding outside the loop-back lane
    pub padding: f64,
    /// How far loop-back edges bow beyond the widest node
    pub loop_offset: f64,
    pub min_node_width: f64,
    /// Added to the measured label width
    pub label_padding: f64,
    pub font: Font,
}

impl Default for GraphLayoutConfig {
    fn default() -> Self {
        Self {
            node_height: 40.0,
            margin: 20.0,
            node_spacing: 100.0,
            padding: 20.0,
            loop_offset: 50.0,
            min_node_width: 200.0,
            label_padding: 60.0,
            font: Font::default(),
        }
    }
}

/// Process graph layout engine.
pub struct GraphLayoutEngine {
    pub(crate) config: GraphLayoutConfig,
    measurer: Box<dyn TextMeasure>,
}

impl Default for GraphLayoutEngine {
    fn default() -> Self {
        Self::new(GraphLayoutConfig::default())
    }
}

impl GraphLayoutEngine {
    pub fn new(config: GraphLayoutConfig) -> Self {
        Self {
            config,
            measurer: Box::new(TextMetrics::default()),
        }
    }

    /// Replace the text-metric provider.
    pub fn with_measurer(mut self, measurer: impl TextMeasure + 'static) -> Self {
        self.measurer = Box::new(measurer);
        self
    }

    pub fn config(&self) -> &GraphLayoutConfig {
        &self.config
    }

    /// Display width for one label; falls back to the minimum width when
    /// measurement is unavailable.
    pub fn node_width(&self, label: &str) -> f64 {
        let min = self.config.min_node_width;
        match self.measurer.measure(label, &self.config.font) {
            Some(w) if w.is_finite() && w >= 0.0 => min.max(w + self.config.label_padding),
            _ => {
                tracing::debug!(label, "text measurement unavailable, using minimum width");
                min
            }
        }
    }

    /// Compute layout for the given graph.
    ///
    /// `available_width` is the width offered by the host; the canvas grows
    /// beyond it when the widest node and its loop lane need more room.
    pub fn layout(
        &self,
        graph: &ProcessGraph,
        available_width: f64,
    ) -> Result<GraphLayoutResult, LayoutError> {
        if graph.is_empty() {
            tracing::debug!(
                nodes = graph.nodes.len(),
                edges = graph.edges.len(),
                "no process graph data"
            );
            return Ok(GraphLayoutResult::NoData);
        }
        if let Some(dup) = graph.duplicate_node() {
            return Err(LayoutError::DuplicateNode(dup.to_string()));
        }

        let cfg = &self.config;

        // Phase 1: ordering
        let ordering = topological_order(graph);

        // Phase 2: sizing
        let widths: Vec<f64> = ordering
            .order
            .iter()
            .map(|&i| self.node_width(&graph.nodes[i].label))
            .collect();
        let max_width = widths.iter().copied().fold(0.0, f64::max);

        // Phase 3: canvas and axis
        let canvas_width = if available_width.is_finite() {
            available_width.max(self.required_width(max_width))
        } else {
            self.required_width(max_width)
        };
        let axis_x = canvas_width / 2.0;
        let canvas_height =
            cfg.margin + ordering.order.len() as f64 * cfg.node_spacing + cfg.node_height;

        // Phase 4: placement
        let nodes: Vec<LayoutNode> = ordering
            .order
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(layer, (&i, &width))| LayoutNode {
                id: graph.nodes[i].id.clone(),
                label: graph.nodes[i].label.clone(),
                x: axis_x,
                y: cfg.margin + layer as f64 * cfg.node_spacing,
                width,
                height: cfg.node_height,
                layer,
            })
            .collect();

        // Phase 5: edge routing
        let positions: HashMap<&str, &LayoutNode> =
            nodes.iter().map(|n| (n.id.as_str(), n)).collect();
        let bow_x = axis_x + max_width / 2.0 + cfg.loop_offset;

        let mut edges = Vec::with_capacity(graph.edges.len());
        let mut dropped_edges = 0;
        for (edge_index, edge) in graph.edges.iter().enumerate() {
            let (Some(source), Some(target)) = (
                positions.get(edge.from.as_str()),
                positions.get(edge.to.as_str()),
            ) else {
                tracing::debug!(from = %edge.from, to = %edge.to, "dropping dangling edge");
                dropped_edges += 1;
                continue;
            };

            let kind = EdgeKind::classify(source.layer, target.layer);
            let path = match kind {
                EdgeKind::Forward => route_forward(source, target),
                EdgeKind::Loopback => route_loopback(source, target, bow_x),
            };
            edges.push(LayoutEdge {
                from: edge.from.clone(),
                to: edge.to.clone(),
                kind,
                path,
                edge_index,
            });
        }

        Ok(GraphLayoutResult::Positioned(ProcessGraphLayout {
            nodes,
            edges,
            canvas: Canvas {
                width: canvas_width,
                height: canvas_height,
            },
            dropped_edges,
        }))
    }

    /// Width needed for the widest node plus a loop lane and padding on
    /// each side.
    fn required_width(&self, max_node_width: f64) -> f64 {
        max_node_width + 2.0 * self.config.loop_offset + 2.0 * self.config.padding
    }
}

/// Straight segment from the source's bottom-center to the target's top-center.
pub fn route_forward(source: &LayoutNode, target: &LayoutNode) -> EdgePath {
    EdgePath::Line {
        start: Point::new(source.x, source.bottom()),
        end: Point::new(target.x, target.y),
    }
}

/// Side loop from the source's right edge to the target's right edge.
pub fn route_loopback(source: &LayoutNode, target: &LayoutNode, bow_x: f64) -> EdgePath {
    EdgePath::Loop {
        start: Point::new(source.right(), source.y + source.height / 2.0),
        bow_x,
        end: Point::new(target.right(), target.y + target.height / 2.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, Node};

    fn engine() -> GraphLayoutEngine {
        GraphLayoutEngine::default().with_measurer(|text: &str, _: &Font| Some(text.len() as f64 * 10.0))
    }

    fn graph(nodes: &[(&str, &str)], edges: &[(&str, &str)]) -> ProcessGraph {
        ProcessGraph::new(
            nodes.iter().map(|(id, label)| Node::new(*id, *label)).collect(),
            edges.iter().map(|(f, t)| Edge::new(*f, *t)).collect(),
        )
    }

    #[test]
    fn test_basic_layout() {
        let g = graph(&[("1", "A"), ("2", "B")], &[("1", "2")]);
        let result = engine().layout(&g, 0.0).unwrap();
        let layout = result.layout().unwrap();

        assert_eq!(layout.nodes.len(), 2);
        assert_eq!(layout.nodes[0].label, "A");
        assert_eq!(layout.nodes[1].y, 120.0);
        assert_eq!(layout.edges[0].kind, EdgeKind::Forward);
        // 200 + 2 * 50 + 2 * 20
        assert_eq!(layout.canvas.width, 340.0);
        assert_eq!(layout.canvas.height, 20.0 + 2.0 * 100.0 + 40.0);
    }

    #[test]
    fn test_node_width_rule() {
        let e = engine();
        assert_eq!(e.node_width("short"), 200.0);
        let long = "x".repeat(30);
        assert_eq!(e.node_width(&long), 360.0);
    }

    #[test]
    fn test_measurement_unavailable_falls_back() {
        let e = GraphLayoutEngine::default().with_measurer(|_: &str, _: &Font| None);
        assert_eq!(e.node_width(&"x".repeat(100)), 200.0);
        let nan = GraphLayoutEngine::default().with_measurer(|_: &str, _: &Font| Some(f64::NAN));
        assert_eq!(nan.node_width("abc"), 200.0);
    }

    #[test]
    fn test_available_width_wins_when_larger() {
        let g = graph(&[("1", "A"), ("2", "B")], &[("1", "2")]);
        let result = engine().layout(&g, 800.0).unwrap();
        let layout = result.layout().unwrap();
        assert_eq!(layout.canvas.width, 800.0);
        assert!(layout.nodes.iter().all(|n| n.x == 400.0));
    }

    #[test]
    fn test_loopback_clears_widest_node() {
        let wide = "w".repeat(40);
        let g = graph(
            &[("1", "A"), ("2", wide.as_str()), ("3", "C")],
            &[("1", "2"), ("2", "3"), ("3", "1")],
        );
        let result = engine().layout(&g, 0.0).unwrap();
        let layout = result.layout().unwrap();

        let back = layout.edges.iter().find(|e| e.from == "3").unwrap();
        assert_eq!(back.kind, EdgeKind::Loopback);
        let EdgePath::Loop { bow_x, start, end } = back.path else {
            panic!("expected loop path");
        };
        let widest_right = layout.nodes.iter().map(|n| n.right()).fold(0.0, f64::max);
        assert_eq!(bow_x, widest_right + 50.0);
        assert!(bow_x <= layout.canvas.width);
        assert_eq!(start.x, layout.nodes[2].right());
        assert_eq!(end.y, layout.nodes[0].y + 20.0);
    }

    #[test]
    fn test_self_loop_is_loopback() {
        let g = graph(&[("1", "A")], &[("1", "1")]);
        let result = engine().layout(&g, 0.0).unwrap();
        let layout = result.layout().unwrap();
        assert_eq!(layout.edges[0].kind, EdgeKind::Loopback);
        assert_eq!(layout.edges[0].path.start(), layout.edges[0].path.end());
    }

    #[test]
    fn test_forward_path_geometry() {
        let g = graph(&[("1", "A"), ("2", "B")], &[("1", "2")]);
        let result = engine().layout(&g, 0.0).unwrap();
        let layout = result.layout().unwrap();
        let d = layout.edges[0].path.to_svg_d();
        assert_eq!(d, "M170,60 L170,120");
    }

    #[test]
    fn test_no_data() {
        let no_edges = graph(&[("1", "A")], &[]);
        assert!(engine().layout(&no_edges, 0.0).unwrap().is_no_data());
        let no_nodes = graph(&[], &[("1", "2")]);
        assert!(engine().layout(&no_nodes, 0.0).unwrap().is_no_data());
    }

    #[test]
    fn test_duplicate_node_is_error() {
        let g = graph(&[("1", "A"), ("1", "B")], &[("1", "1")]);
        assert!(matches!(
            engine().layout(&g, 0.0),
            Err(LayoutError::DuplicateNode(id)) if id == "1"
        ));
    }
}

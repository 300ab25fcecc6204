use crate::layout::{EdgeKind, LayoutNode, OverviewLayout, ProcessGraphLayout};
use crate::model::{Document, size_ring_radius};
use std::collections::HashMap;
use std::f64::consts::TAU;
use std::fmt::Write;

/// Categorical colors assigned to legend labels in order.
pub const CATEGORY_COLORS: [&str; 12] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf", "#aec7e8", "#ffbb78",
];

const UNKNOWN_COLOR: &str = "#cccccc";

/// Ordinal mapping from activity label to color.
#[derive(Debug, Clone, Default)]
pub struct ActivityPalette {
    index: HashMap<String, usize>,
}

impl ActivityPalette {
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = HashMap::new();
        for label in labels {
            let next = index.len();
            index.entry(label.to_string()).or_insert(next);
        }
        Self { index }
    }

    pub fn from_document(document: &Document) -> Self {
        Self::new(document.legend_labels())
    }

    pub fn color(&self, label: &str) -> &'static str {
        self.index
            .get(label)
            .map(|&i| CATEGORY_COLORS[i % CATEGORY_COLORS.len()])
            .unwrap_or(UNKNOWN_COLOR)
    }
}

pub struct SvgRenderer {
    palette: ActivityPalette,
    end_activities: Vec<String>,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self::new(ActivityPalette::default(), Vec::new())
    }
}

impl SvgRenderer {
    pub fn new(palette: ActivityPalette, end_activities: Vec<String>) -> Self {
        Self {
            palette,
            end_activities,
        }
    }

    pub fn render_process_graph(&self, layout: &ProcessGraphLayout) -> String {
        let mut svg = String::new();
        let (w, h) = (layout.canvas.width, layout.canvas.height);

        writeln!(
            &mut svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            w, h, w, h
        )
        .unwrap();

        writeln!(
            &mut svg,
            r##"<style>
  .node {{ fill: #4682B4; stroke: #333; stroke-width: 1; }}
  .node-text {{ font-family: sans-serif; font-size: 12px; fill: #fff; }}
  .link {{ stroke: #000; stroke-width: 2; fill: none; stroke-opacity: 0.7; }}
  .end-symbol {{ fill: #000; }}
</style>"##
        )
        .unwrap();

        writeln!(
            &mut svg,
            r#"<defs><marker id="arrow" viewBox="0 -5 10 10" refX="5" refY="0" markerWidth="6" markerHeight="6" orient="auto"><path d="M0,-5L10,0L0,5" fill="black" /></marker></defs>"#
        )
        .unwrap();

        // Edges first (behind nodes)
        for edge in &layout.edges {
            let class = match edge.kind {
                EdgeKind::Forward => "link forward",
                EdgeKind::Loopback => "link loopback",
            };
            writeln!(
                &mut svg,
                r#"<path class="{}" d="{}" marker-end="url(#arrow)" />"#,
                class,
                edge.path.to_svg_d()
            )
            .unwrap();
        }

        for node in &layout.nodes {
            self.render_node(&mut svg, node);
        }

        writeln!(&mut svg, "</svg>").unwrap();
        svg
    }

    fn render_node(&self, svg: &mut String, node: &LayoutNode) {
        let w = node.width;
        let h = node.height;

        writeln!(
            svg,
            r#"<g class="node-group" transform="translate({},{})">"#,
            node.left(),
            node.y
        )
        .unwrap();

        writeln!(
            svg,
            r#"<rect class="node" width="{}" height="{}" rx="5" ry="5" />"#,
            w, h
        )
        .unwrap();

        writeln!(
            svg,
            r#"<circle class="activity-circle" cx="{}" cy="{}" r="10" fill="{}" />"#,
            w - 20.0,
            h / 2.0,
            self.palette.color(&node.label)
        )
        .unwrap();

        writeln!(
            svg,
            r#"<text class="node-text" x="{}" y="{}" text-anchor="middle">{}</text>"#,
            w / 2.0 - 15.0,
            h / 2.0 + 5.0,
            escape_xml(&node.label)
        )
        .unwrap();

        if self.end_activities.iter().any(|a| *a == node.label) {
            writeln!(
                svg,
                r#"<rect class="end-symbol" x="{}" y="{}" width="10" height="10" />"#,
                w - 20.0,
                h - 15.0
            )
            .unwrap();
        }

        writeln!(svg, "</g>").unwrap();
    }

    /// Placeholder shown when a cluster has no process graph.
    pub fn render_no_data(&self, cluster_id: &str) -> String {
        let mut svg = String::new();
        writeln!(
            &mut svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="50">"#
        )
        .unwrap();
        writeln!(
            &mut svg,
            r#"<text x="10" y="20">No process graph data for Cluster {}</text>"#,
            escape_xml(cluster_id)
        )
        .unwrap();
        writeln!(&mut svg, "</svg>").unwrap();
        svg
    }

    /// Cluster glyphs: activity pie plus size ring, in canvas coordinates.
    pub fn render_overview(&self, layout: &OverviewLayout, document: &Document) -> String {
        let mut svg = String::new();
        let (w, h) = (layout.canvas.width, layout.canvas.height);

        writeln!(
            &mut svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            w, h, w, h
        )
        .unwrap();

        for pos in &layout.positions {
            let Some(cluster) = document.cluster(&pos.id) else {
                continue;
            };
            let at = layout.to_canvas(pos.x, pos.y);
            writeln!(
                &mut svg,
                r#"<g class="cluster-glyph" data-label="{}" transform="translate({},{})">"#,
                escape_xml(&pos.id),
                at.x,
                at.y
            )
            .unwrap();

            let slices: Vec<(&str, f64)> = cluster
                .activity_distribution
                .iter()
                .map(|(label, &count)| (label.as_str(), count))
                .collect();
            for (label, d) in pie_arcs(&slices, 15.0) {
                writeln!(
                    &mut svg,
                    r#"<path class="arc" d="{}" fill="{}" />"#,
                    d,
                    self.palette.color(label)
                )
                .unwrap();
            }

            writeln!(
                &mut svg,
                r#"<circle r="{}" fill="none" stroke="black" />"#,
                size_ring_radius(cluster.size)
            )
            .unwrap();
            writeln!(&mut svg, "</g>").unwrap();
        }

        writeln!(&mut svg, "</svg>").unwrap();
        svg
    }
}

/// Pie slice paths centred on the origin, clockwise from 12 o'clock.
fn pie_arcs<'a>(slices: &[(&'a str, f64)], radius: f64) -> Vec<(&'a str, String)> {
    let total: f64 = slices.iter().map(|(_, v)| v.max(0.0)).sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut arcs = Vec::new();
    let mut angle = 0.0_f64;
    for &(label, value) in slices {
        let sweep = value.max(0.0) / total * TAU;
        if sweep <= 0.0 {
            continue;
        }
        let d = if sweep >= TAU - 1e-9 {
            // full circle: two half arcs
            format!(
                "M0,{} A{r},{r} 0 1,1 0,{} A{r},{r} 0 1,1 0,{}Z",
                -radius,
                radius,
                -radius,
                r = radius
            )
        } else {
            let (x0, y0) = (radius * angle.sin(), -radius * angle.cos());
            let end = angle + sweep;
            let (x1, y1) = (radius * end.sin(), -radius * end.cos());
            let large = if sweep > TAU / 2.0 { 1 } else { 0 };
            format!(
                "M0,0L{},{}A{r},{r} 0 {},1 {},{}Z",
                x0,
                y0,
                large,
                x1,
                y1,
                r = radius
            )
        };
        arcs.push((label, d));
        angle += sweep;
    }
    arcs
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

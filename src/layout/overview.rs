//! Cluster overview: seed scaling, relaxation and canvas bounds.

use crate::model::{ClusterSummary, NOISE_CLUSTER};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::LayoutError;
use super::force::{ForceParams, Particle, Simulation};
use super::types::{BoundingBox, Canvas, ClusterPosition, OverviewLayout, OverviewResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    All,
    Cluster(String),
}

impl Selection {
    /// `"all"` selects every cluster, anything else a single cluster id.
    pub fn parse(s: &str) -> Self {
        if s == "all" {
            Self::All
        } else {
            Self::Cluster(s.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewConfig {
    /// Cluster label excluded from the overview
    pub noise_label: String,
    /// Inset of the data-to-viewport scales
    pub scale_margin: f64,
    pub clamp_margin: f64,
    pub canvas_padding: f64,
    pub steps: usize,
    pub collide_strength: f64,
    pub position_strength: f64,
    pub velocity_decay: f64,
    pub alpha_min: f64,
    pub separation_sweeps: usize,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            noise_label: NOISE_CLUSTER.to_string(),
            scale_margin: 40.0,
            clamp_margin: 20.0,
            canvas_padding: 40.0,
            steps: 100,
            collide_strength: 0.7,
            position_strength: 0.1,
            velocity_decay: 0.4,
            alpha_min: 0.001,
            separation_sweeps: 1000,
        }
    }
}

/// A cluster seed mapped into viewport space.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// Linear map from a data extent onto a pixel range.
#[derive(Debug, Clone, Copy)]
struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    fn fit(values: impl Iterator<Item = f64>, range: (f64, f64)) -> Self {
        let domain = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        Self { domain, range }
    }

    fn apply(&self, v: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 || !span.is_finite() {
            // degenerate extent maps to the middle of the range
            return (r0 + r1) / 2.0;
        }
        r0 + (v - d0) / span * (r1 - r0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct OverviewEngine {
    pub(crate) config: OverviewConfig,
}

impl OverviewEngine {
    pub fn new(config: OverviewConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OverviewConfig {
        &self.config
    }

    /// Apply the selection, keeping document order.
    pub fn filter<'a>(
        &self,
        clusters: &'a IndexMap<String, ClusterSummary>,
        selection: &Selection,
    ) -> Result<Vec<(&'a str, &'a ClusterSummary)>, LayoutError> {
        let noise = self.config.noise_label.as_str();
        match selection {
            Selection::All => Ok(clusters
                .iter()
                .filter(|(id, _)| id.as_str() != noise)
                .map(|(id, c)| (id.as_str(), c))
                .collect()),
            Selection::Cluster(wanted) => {
                let (id, cluster) = clusters
                    .get_key_value(wanted.as_str())
                    .ok_or_else(|| LayoutError::ClusterNotFound(wanted.clone()))?;
                if id == noise {
                    Ok(Vec::new())
                } else {
                    Ok(vec![(id.as_str(), cluster)])
                }
            }
        }
    }

    /// Map each cluster's first coordinate into the viewport.
    ///
    /// The scales fit the union of all coordinates of the given clusters.
    pub fn seeds(
        &self,
        clusters: &[(&str, &ClusterSummary)],
        viewport: Viewport,
    ) -> Result<Vec<SeedNode>, LayoutError> {
        check_viewport(viewport)?;
        let m = self.config.scale_margin;
        let all = || clusters.iter().flat_map(|(_, c)| c.coords.iter());
        let x_scale = LinearScale::fit(all().map(|p| p[0]), (m, viewport.width - m));
        let y_scale = LinearScale::fit(all().map(|p| p[1]), (m, viewport.height - m));

        clusters
            .iter()
            .map(|&(id, cluster)| {
                let [x, y] = cluster
                    .seed()
                    .ok_or_else(|| LayoutError::MissingSeed(id.to_string()))?;
                Ok(SeedNode {
                    id: id.to_string(),
                    x: x_scale.apply(x),
                    y: y_scale.apply(y),
                    radius: cluster.radius(),
                })
            })
            .collect()
    }

    /// Relax seeds for the fixed number of steps and size the canvas.
    pub fn relax(&self, seeds: &[SeedNode], viewport: Viewport) -> Result<OverviewResult, LayoutError> {
        check_viewport(viewport)?;
        if seeds.is_empty() {
            return Ok(OverviewResult::Empty);
        }
        let cfg = &self.config;
        let particles = seeds
            .iter()
            .map(|s| Particle::new(s.x, s.y, s.radius))
            .collect();
        let params = ForceParams {
            width: viewport.width,
            height: viewport.height,
            clamp_margin: cfg.clamp_margin,
            collide_strength: cfg.collide_strength,
            position_strength: cfg.position_strength,
            velocity_decay: cfg.velocity_decay,
            alpha_min: cfg.alpha_min,
        };
        let settled = Simulation::new(particles, params).run(cfg.steps, cfg.separation_sweeps);

        let positions: Vec<ClusterPosition> = seeds
            .iter()
            .zip(settled)
            .map(|(seed, p)| ClusterPosition {
                id: seed.id.clone(),
                x: p.x,
                y: p.y,
                radius: p.radius,
            })
            .collect();

        let pad = cfg.canvas_padding;
        let bounds = positions.iter().fold(
            BoundingBox {
                min_x: f64::INFINITY,
                min_y: f64::INFINITY,
                max_x: f64::NEG_INFINITY,
                max_y: f64::NEG_INFINITY,
            },
            |b, p| BoundingBox {
                min_x: b.min_x.min(p.x),
                min_y: b.min_y.min(p.y),
                max_x: b.max_x.max(p.x),
                max_y: b.max_y.max(p.y),
            },
        );
        let bounds = BoundingBox {
            min_x: bounds.min_x - pad,
            min_y: bounds.min_y - pad,
            max_x: bounds.max_x + pad,
            max_y: bounds.max_y + pad,
        };

        Ok(OverviewResult::Positioned(OverviewLayout {
            positions,
            canvas: Canvas {
                width: bounds.width(),
                height: bounds.height(),
            },
            bounds,
        }))
    }

    /// Filter, seed and relax in one call.
    pub fn layout(
        &self,
        clusters: &IndexMap<String, ClusterSummary>,
        selection: &Selection,
        viewport: Viewport,
    ) -> Result<OverviewResult, LayoutError> {
        let filtered = self.filter(clusters, selection)?;
        let seeds = self.seeds(&filtered, viewport)?;
        self.relax(&seeds, viewport)
    }
}

fn check_viewport(viewport: Viewport) -> Result<(), LayoutError> {
    let ok = |v: f64| v.is_finite() && v > 0.0;
    if ok(viewport.width) && ok(viewport.height) {
        Ok(())
    } else {
        Err(LayoutError::InvalidViewport {
            width: viewport.width,
            height: viewport.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(size: u64, x: f64, y: f64) -> ClusterSummary {
        ClusterSummary {
            size,
            coords: vec![[x, y]],
            ..Default::default()
        }
    }

    fn clusters() -> IndexMap<String, ClusterSummary> {
        let mut m = IndexMap::new();
        m.insert("0".to_string(), cluster(10, 0.0, 0.0));
        m.insert("-1".to_string(), cluster(99, 5.0, 5.0));
        m.insert("1".to_string(), cluster(200, 10.0, 20.0));
        m.insert("2".to_string(), cluster(3, 5.0, 10.0));
        m
    }

    #[test]
    fn test_filter_all_skips_noise() {
        let engine = OverviewEngine::default();
        let c = clusters();
        let ids: Vec<&str> = engine
            .filter(&c, &Selection::All)
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["0", "1", "2"]);
    }

    #[test]
    fn test_filter_single_and_missing() {
        let engine = OverviewEngine::default();
        let c = clusters();
        assert_eq!(engine.filter(&c, &Selection::parse("1")).unwrap().len(), 1);
        assert!(engine.filter(&c, &Selection::parse("-1")).unwrap().is_empty());
        assert!(matches!(
            engine.filter(&c, &Selection::parse("42")),
            Err(LayoutError::ClusterNotFound(id)) if id == "42"
        ));
    }

    #[test]
    fn test_seed_scaling() {
        let engine = OverviewEngine::default();
        let c = clusters();
        let filtered = engine.filter(&c, &Selection::All).unwrap();
        let seeds = engine.seeds(&filtered, Viewport::new(840.0, 440.0)).unwrap();
        assert_eq!((seeds[0].x, seeds[0].y), (40.0, 40.0));
        assert_eq!((seeds[1].x, seeds[1].y), (800.0, 400.0));
        assert_eq!((seeds[2].x, seeds[2].y), (420.0, 220.0));
    }

    #[test]
    fn test_degenerate_extent_maps_to_middle() {
        let engine = OverviewEngine::default();
        let c = clusters();
        let filtered = engine.filter(&c, &Selection::parse("2")).unwrap();
        let seeds = engine.seeds(&filtered, Viewport::new(800.0, 600.0)).unwrap();
        assert_eq!((seeds[0].x, seeds[0].y), (400.0, 300.0));
    }

    #[test]
    fn test_layout_bounds_and_canvas() {
        let engine = OverviewEngine::default();
        let result = engine.layout(&clusters(), &Selection::All, Viewport::default()).unwrap();
        let layout = result.layout().unwrap();
        assert_eq!(layout.positions.len(), 3);

        let min_x = layout.positions.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        assert_eq!(layout.bounds.min_x, min_x - 40.0);
        assert_eq!(layout.canvas.width, layout.bounds.width());
        let origin = layout.to_canvas(min_x, layout.bounds.min_y + 40.0);
        assert!((origin.x - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_selection() {
        let engine = OverviewEngine::default();
        let result = engine
            .layout(&clusters(), &Selection::parse("-1"), Viewport::default())
            .unwrap();
        assert_eq!(result, OverviewResult::Empty);
    }

    #[test]
    fn test_invalid_viewport() {
        let engine = OverviewEngine::default();
        assert!(matches!(
            engine.layout(&clusters(), &Selection::All, Viewport::new(0.0, 100.0)),
            Err(LayoutError::InvalidViewport { .. })
        ));
    }
}

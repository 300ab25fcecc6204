//! A visualization session over one loaded document.

use crate::cache::{CacheStats, GraphKey, GraphSignature, LayoutCache, OverviewSignature};
use crate::config::VisConfig;
use crate::layout::{
    GraphLayoutEngine, GraphLayoutResult, LayoutError, OverviewEngine, OverviewResult, Selection,
    Viewport,
};
use crate::measure::TextMeasure;
use crate::model::{Document, ProcessGraph};
use std::sync::Arc;

/// Owns the document, both layout engines and their caches.
pub struct Visualizer {
    document: Document,
    config: VisConfig,
    graph_engine: GraphLayoutEngine,
    overview_engine: OverviewEngine,
    overview_cache: LayoutCache<OverviewSignature, OverviewResult>,
    graph_cache: LayoutCache<GraphKey, GraphLayoutResult>,
}

impl Visualizer {
    pub fn new(document: Document, config: VisConfig) -> Self {
        Self {
            graph_engine: GraphLayoutEngine::new(config.graph.clone()),
            overview_engine: OverviewEngine::new(config.overview.clone()),
            overview_cache: LayoutCache::new(config.cache),
            graph_cache: LayoutCache::new(config.cache),
            document,
            config,
        }
    }

    /// Replace the text-metric provider used for node sizing.
    pub fn with_measurer(mut self, measurer: impl TextMeasure + 'static) -> Self {
        self.graph_engine = self.graph_engine.with_measurer(measurer);
        self
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &VisConfig {
        &self.config
    }

    /// Overview layout for the selection, reusing a cached relaxation when
    /// the scaled seeds are identical.
    pub fn layout_overview(
        &mut self,
        selection: &Selection,
        viewport: Viewport,
    ) -> Result<Arc<OverviewResult>, LayoutError> {
        let filtered = self
            .overview_engine
            .filter(&self.document.clusters, selection)?;
        let seeds = self.overview_engine.seeds(&filtered, viewport)?;
        if seeds.is_empty() {
            tracing::debug!(?selection, "overview selection is empty");
            return Ok(Arc::new(OverviewResult::Empty));
        }

        let key = OverviewSignature::new(&seeds, viewport.width, viewport.height);
        tracing::debug!(signature = %key, "overview layout");
        let engine = &self.overview_engine;
        self.overview_cache
            .get_or_try_insert_with(key, || engine.relax(&seeds, viewport))
    }

    /// Process graph layout for one cluster; cached per cluster id.
    pub fn layout_process_graph(
        &mut self,
        cluster_id: &str,
        available_width: f64,
    ) -> Result<Arc<GraphLayoutResult>, LayoutError> {
        let cluster = self
            .document
            .cluster(cluster_id)
            .ok_or_else(|| LayoutError::ClusterNotFound(cluster_id.to_string()))?;
        let engine = &self.graph_engine;
        self.graph_cache
            .get_or_try_insert_with(GraphKey::Cluster(cluster_id.to_string()), || {
                engine.layout(&cluster.process_graph, available_width)
            })
    }

    /// Layout for a graph outside the document, cached by structure.
    pub fn layout_graph(
        &mut self,
        graph: &ProcessGraph,
        available_width: f64,
    ) -> Result<Arc<GraphLayoutResult>, LayoutError> {
        let key = GraphKey::Graph(GraphSignature::new(graph), available_width.to_bits());
        let engine = &self.graph_engine;
        self.graph_cache
            .get_or_try_insert_with(key, || engine.layout(graph, available_width))
    }

    /// Sorted unique activities of one cluster's aligned traces.
    pub fn cluster_activities(&self, cluster_id: &str) -> Result<Vec<String>, LayoutError> {
        self.document
            .cluster(cluster_id)
            .map(|c| c.activities())
            .ok_or_else(|| LayoutError::ClusterNotFound(cluster_id.to_string()))
    }

    pub fn overview_cache_stats(&self) -> CacheStats {
        self.overview_cache.stats()
    }

    pub fn graph_cache_stats(&self) -> CacheStats {
        self.graph_cache.stats()
    }
}

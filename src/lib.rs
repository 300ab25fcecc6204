pub mod cache;
pub mod config;
pub mod layout;
pub mod measure;
pub mod model;
pub mod session;
pub mod svg;

use wasm_bindgen::prelude::*;

use config::VisConfig;
use layout::{GraphLayoutResult, Selection, Viewport};
use measure::{Font, TextMeasure};
use model::Document;
use session::Visualizer;
use svg::{ActivityPalette, SvgRenderer};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Text measurement delegated to a JS `(text, font) => number` callback,
/// typically backed by a canvas 2D context.
struct JsMeasure(js_sys::Function);

impl TextMeasure for JsMeasure {
    fn measure(&self, text: &str, font: &Font) -> Option<f64> {
        self.0
            .call2(
                &JsValue::NULL,
                &JsValue::from_str(text),
                &JsValue::from_str(&font.to_string()),
            )
            .ok()
            .and_then(|v| v.as_f64())
    }
}

/// A visualization session bound to one loaded document.
#[wasm_bindgen]
pub struct ClusterVis {
    inner: Visualizer,
    renderer: SvgRenderer,
}

#[wasm_bindgen]
impl ClusterVis {
    #[wasm_bindgen(constructor)]
    pub fn new(
        document_json: &str,
        measure: Option<js_sys::Function>,
        config_json: Option<String>,
    ) -> Result<ClusterVis, String> {
        let document = Document::from_json(document_json).map_err(|e| e.to_string())?;
        let config = match config_json {
            Some(json) => VisConfig::from_json(&json).map_err(|e| e.to_string())?,
            None => VisConfig::default(),
        };
        let renderer = SvgRenderer::new(
            ActivityPalette::from_document(&document),
            config.end_activities.clone(),
        );
        let mut inner = Visualizer::new(document, config);
        if let Some(f) = measure {
            inner = inner.with_measurer(JsMeasure(f));
        }
        Ok(ClusterVis { inner, renderer })
    }

    /// Overview layout as JSON; `selection` is `"all"` or a cluster id.
    #[wasm_bindgen(js_name = "overviewLayout")]
    pub fn overview_layout(
        &mut self,
        selection: &str,
        width: f64,
        height: f64,
    ) -> Result<String, String> {
        let result = self
            .inner
            .layout_overview(&Selection::parse(selection), Viewport::new(width, height))
            .map_err(|e| e.to_string())?;
        serde_json::to_string(&*result).map_err(|e| e.to_string())
    }

    /// Overview glyphs as SVG; empty selections yield an empty string.
    #[wasm_bindgen(js_name = "overviewSvg")]
    pub fn overview_svg(&mut self, selection: &str, width: f64, height: f64) -> Result<String, String> {
        let result = self
            .inner
            .layout_overview(&Selection::parse(selection), Viewport::new(width, height))
            .map_err(|e| e.to_string())?;
        Ok(result
            .layout()
            .map(|layout| self.renderer.render_overview(layout, self.inner.document()))
            .unwrap_or_default())
    }

    #[wasm_bindgen(js_name = "processGraphLayout")]
    pub fn process_graph_layout(&mut self, cluster_id: &str, width: f64) -> Result<String, String> {
        let result = self
            .inner
            .layout_process_graph(cluster_id, width)
            .map_err(|e| e.to_string())?;
        serde_json::to_string(&*result).map_err(|e| e.to_string())
    }

    #[wasm_bindgen(js_name = "processGraphSvg")]
    pub fn process_graph_svg(&mut self, cluster_id: &str, width: f64) -> Result<String, String> {
        let result = self
            .inner
            .layout_process_graph(cluster_id, width)
            .map_err(|e| e.to_string())?;
        Ok(match &*result {
            GraphLayoutResult::Positioned(layout) => self.renderer.render_process_graph(layout),
            GraphLayoutResult::NoData => self.renderer.render_no_data(cluster_id),
        })
    }

    /// Sorted activity labels of a cluster as a JSON array.
    #[wasm_bindgen(js_name = "clusterActivities")]
    pub fn cluster_activities(&self, cluster_id: &str) -> Result<String, String> {
        let activities = self
            .inner
            .cluster_activities(cluster_id)
            .map_err(|e| e.to_string())?;
        serde_json::to_string(&activities).map_err(|e| e.to_string())
    }
}

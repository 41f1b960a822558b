use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

pub mod clock;
pub mod config;
pub mod dot;
pub mod error;
pub mod math;
pub mod sector_index;
pub mod simulation;
pub mod snapshot;

pub use config::{DotsOptions, SimulationConfig, SpawnRanges};
pub use dot::{Bounds, Dot, DotId, DotSpec, FillColor};
pub use error::DotsError;
pub use sector_index::{Sector, SectorIndex};
pub use simulation::Simulation;
pub use snapshot::DotSnapshot;

/// JavaScript-facing handle. The host owns the canvas and the animation
/// frame loop and calls `frame` (or `advance`) once per tick.
#[wasm_bindgen]
pub struct DotsSim {
    inner: Simulation,
}

#[wasm_bindgen]
impl DotsSim {
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32, config: JsValue) -> Result<DotsSim, JsValue> {
        let config = if config.is_null() || config.is_undefined() {
            SimulationConfig::default()
        } else {
            from_value::<SimulationConfig>(config).map_err(js_error)?
        };
        let inner = Simulation::new(width, height, config).map_err(js_error)?;
        Ok(DotsSim { inner })
    }

    pub fn configure(&mut self, count: usize, options: JsValue) -> Result<(), JsValue> {
        let options = if options.is_null() || options.is_undefined() {
            DotsOptions::default()
        } else {
            from_value::<DotsOptions>(options).map_err(js_error)?
        };
        self.inner.configure(count, options).map_err(js_error)
    }

    pub fn advance(&mut self, delta_seconds: f32) -> Result<JsValue, JsValue> {
        let snapshots = self.inner.advance(delta_seconds);
        to_value(&snapshots).map_err(js_error)
    }

    pub fn frame(&mut self, now_seconds: f64) -> Result<JsValue, JsValue> {
        let snapshots = self.inner.frame(now_seconds);
        to_value(&snapshots).map_err(js_error)
    }

    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_value(&self.inner.snapshots()).map_err(js_error)
    }

    pub fn stop(&mut self) {
        self.inner.stop();
    }

    pub fn resume(&mut self) {
        self.inner.resume();
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.inner.is_running()
    }

    #[wasm_bindgen(js_name = setShowVectors)]
    pub fn set_show_vectors(&mut self, show: bool) {
        self.inner.set_show_vectors(show);
    }

    #[wasm_bindgen(js_name = setShowInfo)]
    pub fn set_show_info(&mut self, show: bool) {
        self.inner.set_show_info(show);
    }

    #[wasm_bindgen(js_name = setAvoidance)]
    pub fn set_avoidance(&mut self, avoid: bool) {
        self.inner.set_avoidance(avoid);
    }

    #[wasm_bindgen(js_name = setClearCanvas)]
    pub fn set_clear_canvas(&mut self, clear: bool) {
        self.inner.set_clear_canvas(clear);
    }

    #[wasm_bindgen(js_name = clearCanvas)]
    pub fn clear_canvas(&self) -> bool {
        self.inner.options().clear_canvas
    }

    #[wasm_bindgen(js_name = setBounds)]
    pub fn set_bounds(&mut self, width: f32, height: f32) -> Result<(), JsValue> {
        self.inner.set_bounds(width, height).map_err(js_error)
    }

    pub fn count(&self) -> usize {
        self.inner.count()
    }
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

//! Browser bindings for builds that run entirely in the page.
//!
//! The page creates one `SheetPlot`, hands it each dropped file as a
//! `Uint8Array`, and passes the returned JSON to `JSON.parse` and
//! `Plotly.react`. The decoded dataset stays inside the object, so chart
//! switches never read the file again.
#![cfg(feature = "wasm")]

use crate::session::Session;
use serde::Serialize;
use wasm_bindgen::prelude::*;

fn js_error(message: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&message.to_string()).into()
}

fn to_json(value: &impl Serialize) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(js_error)
}

#[wasm_bindgen]
#[derive(Default)]
pub struct SheetPlot {
    session: Session,
}

#[wasm_bindgen]
impl SheetPlot {
    #[wasm_bindgen(constructor)]
    pub fn new() -> SheetPlot {
        SheetPlot::default()
    }

    /// Decode a dropped file; returns the page summary, including any error.
    pub fn upload(&mut self, file_name: &str, bytes: &[u8]) -> Result<String, JsValue> {
        to_json(&self.session.upload(file_name, bytes).summary())
    }

    /// Select a chart kind; throws for names other than the six kinds.
    pub fn select(&mut self, kind: &str) -> Result<String, JsValue> {
        let state = self.session.select(kind).map_err(js_error)?;
        to_json(&state.summary())
    }

    pub fn clear(&mut self) -> Result<String, JsValue> {
        to_json(&self.session.clear().summary())
    }

    pub fn summary(&self) -> Result<String, JsValue> {
        to_json(&self.session.summary())
    }

    /// Figure JSON, or `undefined` while there is nothing to render.
    pub fn figure(&self) -> Result<Option<String>, JsValue> {
        self.session.figure().map(|figure| to_json(&figure)).transpose()
    }
}

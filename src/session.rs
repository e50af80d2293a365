//! Single-page session: the current view state plus the actions a page can
//! take on it, for builds where the page holds its own state.

use crate::chart::{ChartKind, Figure, UnknownChartKind};
use crate::loader;
use crate::view::{Event, StateSummary, ViewState};
use log::warn;

/// Owns the current [`ViewState`] and moves it along one action at a time
///
/// A dropped file is decoded once in [`Session::upload`]; choosing another
/// chart kind afterwards only rebuilds traces from the dataset already held.
#[derive(Debug, Default)]
pub struct Session {
    state: ViewState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Decodes a dropped file and replaces the dataset, or records the failure
    pub fn upload(&mut self, file_name: &str, bytes: &[u8]) -> &ViewState {
        let decoded = loader::from_bytes(file_name, bytes);
        if let Err(e) = &decoded {
            warn!("upload rejected: {}", e);
        }
        self.apply(Event::from_upload(file_name.to_string(), decoded))
    }

    /// Selects a chart by its name (`line`, `bar`, `3d`, ...)
    pub fn select(&mut self, kind: &str) -> Result<&ViewState, UnknownChartKind> {
        let kind: ChartKind = kind.parse()?;
        Ok(self.apply(Event::ChartSelected(kind)))
    }

    pub fn clear(&mut self) -> &ViewState {
        self.apply(Event::ChartCleared)
    }

    pub fn summary(&self) -> StateSummary {
        self.state.summary()
    }

    pub fn figure(&self) -> Option<Figure> {
        self.state.figure()
    }

    fn apply(&mut self, event: Event) -> &ViewState {
        self.state = self.state.apply(event);
        &self.state
    }
}

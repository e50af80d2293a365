use crate::chart::{ChartKind, Figure, build_figure};
use crate::dataset::Dataset;
use crate::loader::IngestError;
use serde::Serialize;
use std::sync::Arc;

/// What the page currently holds
#[derive(Clone, Debug, Default)]
pub enum Upload {
    /// Nothing dropped yet
    #[default]
    None,

    /// A file decoded into a dataset
    Loaded(Arc<Dataset>),

    /// The last file could not be decoded
    Failed { message: String },
}

/// Discrete transitions of the view state
#[derive(Clone, Debug)]
pub enum Event {
    UploadSucceeded { file_name: String, dataset: Dataset },
    UploadFailed { file_name: String, message: String },
    ChartSelected(ChartKind),
    ChartCleared,
}

impl Event {
    /// The event for a finished decode of `file_name`
    pub fn from_upload(file_name: String, decoded: Result<Dataset, IngestError>) -> Event {
        match decoded {
            Ok(dataset) => Event::UploadSucceeded { file_name, dataset },
            Err(e) => Event::UploadFailed {
                file_name,
                message: e.to_string(),
            },
        }
    }
}

/// Immutable snapshot of everything the page shows
///
/// A state is never edited in place; [`ViewState::apply`] hands back the next
/// one. The dataset sits behind an `Arc`, so moving between states that keep
/// the same dataset copies no rows.
#[derive(Clone, Debug, Default)]
pub struct ViewState {
    file_name: Option<String>,
    upload: Upload,
    selected: Option<ChartKind>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state that follows `self` after `event`
    ///
    /// A new upload replaces the dataset wholesale and keeps the chart
    /// selection. A failed upload clears the dataset.
    pub fn apply(&self, event: Event) -> ViewState {
        match event {
            Event::UploadSucceeded { file_name, dataset } => ViewState {
                file_name: Some(file_name),
                upload: Upload::Loaded(Arc::new(dataset)),
                selected: self.selected,
            },
            Event::UploadFailed { file_name, message } => ViewState {
                file_name: Some(file_name),
                upload: Upload::Failed { message },
                selected: self.selected,
            },
            Event::ChartSelected(kind) => ViewState {
                selected: Some(kind),
                ..self.clone()
            },
            Event::ChartCleared => ViewState {
                selected: None,
                ..self.clone()
            },
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        match &self.upload {
            Upload::Loaded(dataset) => Some(dataset.as_ref()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.upload {
            Upload::Failed { message } => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn selected(&self) -> Option<ChartKind> {
        self.selected
    }

    /// Chart buttons only work while a dataset is loaded.
    pub fn charts_enabled(&self) -> bool {
        self.dataset().is_some()
    }

    /// The figure to draw, if there is both a dataset and a selection
    pub fn figure(&self) -> Option<Figure> {
        let dataset = self.dataset()?;
        let kind = self.selected?;
        Some(build_figure(dataset, kind))
    }

    pub fn summary(&self) -> StateSummary {
        let (status, columns, row_count) = match &self.upload {
            Upload::None => (Status::Empty, Vec::new(), 0),
            Upload::Loaded(dataset) => (Status::Loaded, dataset.columns().to_vec(), dataset.len()),
            Upload::Failed { .. } => (Status::Failed, Vec::new(), 0),
        };
        let enabled = self.charts_enabled();

        StateSummary {
            file_name: self.file_name.clone(),
            status,
            error: self.error().map(str::to_string),
            columns,
            row_count,
            selected: self.selected,
            charts_enabled: enabled,
            buttons: ChartKind::ALL
                .into_iter()
                .map(|kind| ChartButton {
                    kind,
                    label: kind.label(),
                    active: self.selected == Some(kind),
                    enabled,
                })
                .collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Empty,
    Loaded,
    Failed,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartButton {
    pub kind: ChartKind,
    pub label: &'static str,
    pub active: bool,
    pub enabled: bool,
}

/// Serializable view of a [`ViewState`] for the page
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StateSummary {
    pub file_name: Option<String>,
    pub status: Status,
    pub error: Option<String>,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub selected: Option<ChartKind>,
    pub charts_enabled: bool,
    pub buttons: Vec<ChartButton>,
}

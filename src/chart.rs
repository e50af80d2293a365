//! Reshaping a dataset into plotly traces.
//!
//! Every chart kind maps the dataset's columns onto plotly's trace fields
//! (`x`, `y`, `z`, `labels`, `values`). Figures are rebuilt on each request
//! and never cached.

use crate::cell::CellValue;
use crate::dataset::Dataset;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The six chart renderings a user can toggle between
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartKind {
    #[serde(rename = "line")]
    Line,
    #[serde(rename = "scatter")]
    Scatter,
    #[serde(rename = "bar")]
    Bar,
    #[serde(rename = "pie")]
    Pie,
    #[serde(rename = "histogram")]
    Histogram,
    #[serde(rename = "3d")]
    ThreeD,
}

impl ChartKind {
    /// Button order on the page
    pub const ALL: [ChartKind; 6] = [
        ChartKind::Line,
        ChartKind::Scatter,
        ChartKind::Bar,
        ChartKind::Pie,
        ChartKind::Histogram,
        ChartKind::ThreeD,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Scatter => "scatter",
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Histogram => "histogram",
            ChartKind::ThreeD => "3d",
        }
    }

    /// Text shown on the chart button
    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Line => "Line Chart",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::Bar => "Bar Chart",
            ChartKind::Pie => "Pie Chart",
            ChartKind::Histogram => "Histogram Chart",
            ChartKind::ThreeD => "3D Chart",
        }
    }

    /// Title placed on the rendered figure
    pub fn title(self) -> &'static str {
        match self {
            ChartKind::Line => "Line Charts",
            ChartKind::Scatter => "Scatter Plots",
            ChartKind::Bar => "Bar Charts",
            ChartKind::Pie => "Pie Chart",
            ChartKind::Histogram => "Histogram Chart",
            ChartKind::ThreeD => "3D Chart",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown chart kind '{0}' (expected line, scatter, bar, pie, histogram or 3d)")]
pub struct UnknownChartKind(pub String);

impl FromStr for ChartKind {
    type Err = UnknownChartKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownChartKind(s.to_string()))
    }
}

/// plotly trace `type`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceType {
    Scatter,
    Bar,
    Pie,
    Histogram,
    Scatter3d,
}

/// plotly trace `mode`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Mode {
    #[serde(rename = "markers")]
    Markers,
    #[serde(rename = "lines+markers")]
    LinesMarkers,
}

/// One data series in the shape plotly.js consumes
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub trace_type: TraceType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<Vec<CellValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Vec<CellValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<Vec<CellValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<usize>>,
}

impl Trace {
    fn new(trace_type: TraceType, name: impl Into<String>) -> Self {
        Self {
            trace_type,
            name: name.into(),
            mode: None,
            x: None,
            y: None,
            z: None,
            labels: None,
            values: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AxisTitle {
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scene {
    pub xaxis: AxisTitle,
    pub yaxis: AxisTitle,
    pub zaxis: AxisTitle,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Layout {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barmode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<Scene>,
}

/// Traces plus layout for one chart kind
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Figure {
    #[serde(skip)]
    pub kind: ChartKind,
    pub data: Vec<Trace>,
    pub layout: Layout,
}

/// Reshapes `dataset` into the figure for `kind`
///
/// Line, scatter and 3d plot each column against itself on every axis. Line
/// traces carry no `mode`, leaving plotly to pick its default. Pie shows one
/// wedge per column, each valued at the row count.
///
/// # Examples
/// ```
/// use sheetplot::cell::CellValue::Number;
/// use sheetplot::chart::{ChartKind, build_figure};
/// use sheetplot::dataset::Dataset;
///
/// let dataset = Dataset::from_rows(
///     vec!["A".into(), "B".into()],
///     vec![vec![Number(1.0), Number(2.0)], vec![Number(3.0), Number(4.0)]],
/// )
/// .unwrap();
///
/// let pie = build_figure(&dataset, ChartKind::Pie);
/// assert_eq!(pie.data[0].labels, Some(vec!["A".to_string(), "B".to_string()]));
/// assert_eq!(pie.data[0].values, Some(vec![2, 2]));
/// ```
pub fn build_figure(dataset: &Dataset, kind: ChartKind) -> Figure {
    let data = match kind {
        ChartKind::Line => self_traces(dataset, TraceType::Scatter, None, false),
        ChartKind::Scatter => {
            self_traces(dataset, TraceType::Scatter, Some(Mode::LinesMarkers), false)
        }
        ChartKind::ThreeD => self_traces(dataset, TraceType::Scatter3d, Some(Mode::Markers), true),
        ChartKind::Bar => bar_traces(dataset),
        ChartKind::Pie => vec![pie_trace(dataset)],
        ChartKind::Histogram => histogram_traces(dataset),
    };

    Figure {
        kind,
        data,
        layout: layout(kind),
    }
}

fn self_traces(
    dataset: &Dataset,
    trace_type: TraceType,
    mode: Option<Mode>,
    with_z: bool,
) -> Vec<Trace> {
    dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let values = dataset.column_values(index);
            let mut trace = Trace::new(trace_type, column);
            trace.mode = mode;
            if with_z {
                trace.z = Some(values.clone());
            }
            trace.y = Some(values.clone());
            trace.x = Some(values);
            trace
        })
        .collect()
}

fn bar_traces(dataset: &Dataset) -> Vec<Trace> {
    let names: Vec<CellValue> = dataset
        .columns()
        .iter()
        .map(|column| CellValue::Text(column.clone()))
        .collect();

    dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let mut trace = Trace::new(TraceType::Bar, column);
            trace.x = Some(names.clone());
            trace.y = Some(dataset.column_values(index));
            trace
        })
        .collect()
}

fn pie_trace(dataset: &Dataset) -> Trace {
    let mut trace = Trace::new(TraceType::Pie, "Pie Chart");
    trace.labels = Some(dataset.columns().to_vec());
    trace.values = Some(vec![dataset.len(); dataset.columns().len()]);
    trace
}

fn histogram_traces(dataset: &Dataset) -> Vec<Trace> {
    dataset
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let mut trace = Trace::new(TraceType::Histogram, column);
            trace.x = Some(dataset.column_values(index));
            trace
        })
        .collect()
}

fn layout(kind: ChartKind) -> Layout {
    let axis = |title: &str| AxisTitle {
        title: title.to_string(),
    };

    Layout {
        title: kind.title().to_string(),
        barmode: (kind == ChartKind::Bar).then(|| "group".to_string()),
        scene: (kind == ChartKind::ThreeD).then(|| Scene {
            xaxis: axis("X Axis"),
            yaxis: axis("Y Axis"),
            zaxis: axis("Z Axis"),
        }),
    }
}

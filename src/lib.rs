/*!
# sheetplot

Drop a spreadsheet into a browser page and flip between six charts of its
first sheet.

## Overview

A user drags a workbook onto the page. The first sheet is read with its first
row as the header, rows whose cells are all empty are dropped, and the
remaining rows can be shown as a line, scatter, bar, pie, histogram or 3D
scatter chart. Nothing is stored; the next upload replaces the data.

## Architecture

### Ingestion
- **cell**: decoded cell values (empty, text, number, boolean)
- **dataset**: header naming, empty-row filtering, column access
- **loader**: workbook and CSV decoding into a dataset

### Presentation
- **chart**: reshapes a dataset into plotly traces for each chart kind
- **view**: immutable page state moved along by discrete events
- **session**: the current view state and the page actions on it, for
  builds where the page keeps its own state
- **graph**: PNG rendering of a figure with plotters
- **downloader**: CSV and XLSX export of the cleaned rows

### Serving
- **config**: command line and environment settings
- **app**: axum routes for the page, uploads, chart selection and downloads
- **wasm**: a session object exported to JavaScript

## REST API Endpoints

- `GET /api/state` - Current page state
- `POST /api/upload` - Decode a dropped file (multipart field `file`)
- `PUT /api/chart/{kind}` - Select a chart; returns the state and figure
- `DELETE /api/chart` - Clear the selection
- `GET /api/figure` - Current figure, or 204 when nothing is selected
- `GET /api/chart.png` - Current figure as an image
- `GET /api/export/{csv|xlsx}` - Cleaned dataset download
*/

pub mod cell;
pub mod chart;
pub mod dataset;
pub mod downloader;
pub mod loader;
pub mod session;
pub mod view;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod config;
#[cfg(feature = "web")]
pub mod graph;
#[cfg(feature = "wasm")]
pub mod wasm;

pub use cell::CellValue;
pub use chart::{ChartKind, Figure, build_figure};
pub use dataset::Dataset;
pub use loader::{IngestError, from_bytes};
pub use view::{Event, ViewState};

use crate::cell::CellValue;
use crate::dataset::{Dataset, DatasetError};
use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use log::{debug, info};
use std::io::Cursor;
use std::path::Path;

/// Why an uploaded file could not become a dataset
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("'{file_name}' is not a readable spreadsheet: {reason}")]
    Unreadable { file_name: String, reason: String },

    #[error("'{0}' contains no sheets")]
    NoSheets(String),

    #[error("the first sheet of '{0}' is empty")]
    EmptySheet(String),

    #[error("the first sheet of '{0}' has no rows with data below the header")]
    NoDataRows(String),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    fn from_dataset(file_name: &str, err: DatasetError) -> Self {
        match err {
            DatasetError::NoHeader => IngestError::EmptySheet(file_name.to_string()),
            DatasetError::NoDataRows => IngestError::NoDataRows(file_name.to_string()),
        }
    }
}

/// Decode an uploaded file into a dataset
///
/// The first sheet of the workbook is read with its first row as the header.
/// Workbook formats (xlsx, xlsm, xlsb, xls, ods) are detected from the bytes;
/// a file whose name ends in `.csv` is read as comma separated text. Any other
/// file the workbook reader rejects is tried as CSV when it is valid UTF-8,
/// unless its name claims a workbook format.
///
/// # Arguments
/// * `file_name` - Name the user gave the file, used for format hints and messages
/// * `bytes` - Raw file content
///
/// # Returns
/// * `Result<Dataset, IngestError>` - The filtered dataset or why it could not be built
///
/// # Examples
/// ```
/// use sheetplot::loader::from_bytes;
///
/// let dataset = from_bytes("prices.csv", b"A,B\n1,2\n,\n3,4\n").unwrap();
/// assert_eq!(dataset.columns(), &["A", "B"]);
/// assert_eq!(dataset.len(), 2);
///
/// assert!(from_bytes("broken.xlsx", b"not a workbook").is_err());
/// ```
pub fn from_bytes(file_name: &str, bytes: &[u8]) -> Result<Dataset, IngestError> {
    let dataset = if is_csv(file_name) {
        from_csv(file_name, bytes)?
    } else {
        match from_workbook(file_name, bytes) {
            Err(IngestError::Unreadable { reason, .. })
                if !is_workbook(file_name) && std::str::from_utf8(bytes).is_ok() =>
            {
                debug!("'{}' is not a workbook ({}), trying CSV", file_name, reason);
                from_csv(file_name, bytes)?
            }
            decoded => decoded?,
        }
    };

    info!(
        "decoded '{}': {} columns, {} rows",
        file_name,
        dataset.columns().len(),
        dataset.len()
    );
    Ok(dataset)
}

/// Read a file from disk and decode it with [`from_bytes`].
pub fn from_path(path: impl AsRef<Path>) -> Result<Dataset, IngestError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    from_bytes(&file_name, &bytes)
}

/// Extensions calamine reads; a file named like this is never retried as CSV.
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xlam", "xls", "xla", "ods"];

fn extension(file_name: &str) -> Option<&str> {
    Path::new(file_name).extension().and_then(|ext| ext.to_str())
}

fn is_csv(file_name: &str) -> bool {
    extension(file_name).is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn is_workbook(file_name: &str) -> bool {
    extension(file_name).is_some_and(|ext| {
        WORKBOOK_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
    })
}

fn from_workbook(file_name: &str, bytes: &[u8]) -> Result<Dataset, IngestError> {
    let unreadable = |reason: String| IngestError::Unreadable {
        file_name: file_name.to_string(),
        reason,
    };

    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|e| unreadable(e.to_string()))?;

    // Only the first sheet by position is used
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IngestError::NoSheets(file_name.to_string()))?;
    debug!("reading sheet '{}' of '{}'", sheet_name, file_name);

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| unreadable(e.to_string()))?;

    dataset_from_range(file_name, &range)
}

fn dataset_from_range(file_name: &str, range: &Range<Data>) -> Result<Dataset, IngestError> {
    let mut rows = range
        .rows()
        .map(|row| row.iter().map(CellValue::from).collect::<Vec<_>>());

    let header = rows
        .next()
        .ok_or_else(|| IngestError::EmptySheet(file_name.to_string()))?;

    Dataset::from_rows(header, rows).map_err(|e| IngestError::from_dataset(file_name, e))
}

fn from_csv(file_name: &str, bytes: &[u8]) -> Result<Dataset, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::Unreadable {
            file_name: file_name.to_string(),
            reason: e.to_string(),
        })?;
        rows.push(
            record
                .iter()
                .map(CellValue::from_csv_field)
                .collect::<Vec<_>>(),
        );
    }

    let mut rows = rows.into_iter();
    let header = rows
        .next()
        .ok_or_else(|| IngestError::EmptySheet(file_name.to_string()))?;

    Dataset::from_rows(header, rows).map_err(|e| IngestError::from_dataset(file_name, e))
}

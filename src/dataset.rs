use crate::cell::CellValue;
use serde::Serialize;
use std::collections::HashSet;

/// Name given to a column whose header cell is blank.
pub const EMPTY_HEADER: &str = "__EMPTY";

/// Reasons a sheet can fail to become a dataset
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatasetError {
    #[error("the sheet has no header row")]
    NoHeader,

    #[error("the sheet has no rows with data below the header")]
    NoDataRows,
}

/// One data row, stored positionally against the dataset's columns
#[derive(Clone, Debug, PartialEq)]
pub struct RowRecord {
    values: Vec<CellValue>,
}

impl RowRecord {
    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.values.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(CellValue::is_empty)
    }
}

/// Ordered, non-empty sequence of row records sharing one column set
///
/// A `Dataset` only exists once at least one row survived filtering; a sheet
/// with nothing under its header is a [`DatasetError::NoDataRows`].
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<RowRecord>,
}

impl Dataset {
    /// Builds a dataset from a header row and the rows beneath it
    ///
    /// A row longer than the header widens it with blank header cells, so
    /// the extra columns are named `__EMPTY`, `__EMPTY_1`, ... Shorter rows
    /// are padded with empty cells, then every row whose cells are all empty
    /// is dropped.
    ///
    /// # Examples
    /// ```
    /// use sheetplot::cell::CellValue::{Empty, Number};
    /// use sheetplot::dataset::Dataset;
    ///
    /// let header = vec!["A".into(), "B".into()];
    /// let rows = vec![
    ///     vec![Number(1.0), Number(2.0)],
    ///     vec![Empty, Empty],
    ///     vec![Number(3.0), Number(4.0)],
    /// ];
    /// let dataset = Dataset::from_rows(header, rows).unwrap();
    /// assert_eq!(dataset.len(), 2);
    /// ```
    pub fn from_rows(
        mut header: Vec<CellValue>,
        rows: impl IntoIterator<Item = Vec<CellValue>>,
    ) -> Result<Self, DatasetError> {
        if header.is_empty() {
            return Err(DatasetError::NoHeader);
        }
        let rows: Vec<Vec<CellValue>> = rows.into_iter().collect();
        let width = rows.iter().map(Vec::len).fold(header.len(), usize::max);
        header.resize(width, CellValue::Empty);
        let columns = column_names(&header);

        let rows: Vec<RowRecord> = rows
            .into_iter()
            .map(|mut values| {
                values.resize(width, CellValue::Empty);
                RowRecord { values }
            })
            .filter(|row| !row.is_empty())
            .collect();

        if rows.is_empty() {
            return Err(DatasetError::NoDataRows);
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[RowRecord] {
        &self.rows
    }

    /// Number of rows that survived filtering
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false; kept for the `len`/`is_empty` pairing.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Every value of one column, top to bottom
    pub fn column_values(&self, index: usize) -> Vec<CellValue> {
        self.rows
            .iter()
            .map(|row| row.get(index).cloned().unwrap_or_default())
            .collect()
    }

    /// Column-name keyed view of row `index`
    pub fn record(&self, index: usize) -> Option<Vec<(&str, &CellValue)>> {
        let row = self.rows.get(index)?;
        Some(
            self.columns
                .iter()
                .map(String::as_str)
                .zip(row.values.iter())
                .collect(),
        )
    }

    /// Compact description for the page and the CLI
    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            columns: self.columns.clone(),
            row_count: self.rows.len(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub columns: Vec<String>,
    pub row_count: usize,
}

/// Derives unique column names from the header cells
///
/// Blank headers become `__EMPTY`, `__EMPTY_1`, ...; a repeated name gets the
/// first free `_n` suffix.
fn column_names(header: &[CellValue]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(header.len());

    for cell in header {
        let base = if cell.is_empty() {
            EMPTY_HEADER.to_string()
        } else {
            cell.to_string()
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while taken.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        taken.insert(name.clone());
        names.push(name);
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue::{Bool, Empty, Number, Text};
    use pretty_assertions::assert_eq;

    fn header(names: &[&str]) -> Vec<CellValue> {
        names
            .iter()
            .map(|n| {
                if n.is_empty() {
                    Empty
                } else {
                    Text(n.to_string())
                }
            })
            .collect()
    }

    #[test]
    fn fully_empty_rows_are_dropped() {
        let rows = vec![
            vec![Number(1.0), Number(2.0)],
            vec![Empty, Empty],
            vec![Number(3.0), Number(4.0)],
        ];
        let dataset = Dataset::from_rows(header(&["A", "B"]), rows).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(
            dataset.record(0).unwrap(),
            vec![("A", &Number(1.0)), ("B", &Number(2.0))]
        );
        assert_eq!(
            dataset.record(1).unwrap(),
            vec![("A", &Number(3.0)), ("B", &Number(4.0))]
        );
        assert!(dataset.record(2).is_none());
    }

    #[test]
    fn empty_strings_count_as_empty() {
        let rows = vec![
            vec![Text(String::new()), Empty],
            vec![Empty, Bool(false)],
        ];
        let dataset = Dataset::from_rows(header(&["A", "B"]), rows).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.rows()[0].values(), &[Empty, Bool(false)]);
    }

    #[test]
    fn row_count_is_total_minus_empty_rows() {
        let rows: Vec<Vec<CellValue>> = (0..10)
            .map(|i| {
                if i % 3 == 0 {
                    vec![Empty, Empty, Empty]
                } else {
                    vec![Number(i as f64), Empty, Empty]
                }
            })
            .collect();
        let dataset = Dataset::from_rows(header(&["x", "y", "z"]), rows).unwrap();
        assert_eq!(dataset.len(), 10 - 4);
    }

    #[test]
    fn columns_follow_header_order() {
        let dataset =
            Dataset::from_rows(header(&["zeta", "alpha", "mid"]), vec![vec![Number(1.0)]])
                .unwrap();
        assert_eq!(dataset.columns(), &["zeta", "alpha", "mid"]);
        assert_eq!(dataset.rows()[0].values(), &[Number(1.0), Empty, Empty]);
    }

    #[test]
    fn blank_and_repeated_headers_get_unique_names() {
        let dataset = Dataset::from_rows(
            header(&["", "A", "A", "", "A_1"]),
            vec![vec![Number(1.0)]],
        )
        .unwrap();
        assert_eq!(
            dataset.columns(),
            &["__EMPTY", "A", "A_1", "__EMPTY_1", "A_1_1"]
        );
    }

    #[test]
    fn numeric_headers_are_printed_plainly() {
        let dataset = Dataset::from_rows(
            vec![Number(2020.0), Number(2021.5)],
            vec![vec![Number(1.0), Number(2.0)]],
        )
        .unwrap();
        assert_eq!(dataset.columns(), &["2020", "2021.5"]);
    }

    #[test]
    fn long_rows_widen_the_header() {
        let dataset = Dataset::from_rows(
            header(&["A"]),
            vec![
                vec![Number(1.0), Number(2.0)],
                vec![Empty, Number(5.0)],
                vec![Text("x".into())],
            ],
        )
        .unwrap();

        assert_eq!(dataset.columns(), &["A", "__EMPTY"]);
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.rows()[1].values(), &[Empty, Number(5.0)]);
        assert_eq!(dataset.rows()[2].values(), &[Text("x".into()), Empty]);
    }

    #[test]
    fn widened_header_keeps_blank_names_unique() {
        let dataset = Dataset::from_rows(
            header(&["", "B"]),
            vec![vec![Number(1.0), Number(2.0), Number(3.0), Number(4.0)]],
        )
        .unwrap();
        assert_eq!(dataset.columns(), &["__EMPTY", "B", "__EMPTY_1", "__EMPTY_2"]);
    }

    #[test]
    fn missing_header_or_data_is_an_error() {
        assert_eq!(
            Dataset::from_rows(Vec::new(), vec![vec![Number(1.0)]]),
            Err(DatasetError::NoHeader)
        );
        assert_eq!(
            Dataset::from_rows(header(&["A"]), Vec::<Vec<CellValue>>::new()),
            Err(DatasetError::NoDataRows)
        );
    }

    #[test]
    fn column_values_are_read_top_to_bottom() {
        let dataset = Dataset::from_rows(
            header(&["A", "B"]),
            vec![
                vec![Number(1.0), Text("a".into())],
                vec![Number(2.0), Empty],
            ],
        )
        .unwrap();
        assert_eq!(dataset.column_values(0), vec![Number(1.0), Number(2.0)]);
        assert_eq!(dataset.column_values(1), vec![Text("a".into()), Empty]);
    }
}

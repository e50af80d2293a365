use crate::cell::CellValue;
use crate::dataset::Dataset;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write XLSX: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Convert the cleaned dataset to CSV
///
/// The first line holds the column names; each surviving row follows with
/// empty cells written as empty fields.
///
/// # Examples
/// ```
/// use sheetplot::downloader::to_csv;
/// use sheetplot::loader::from_bytes;
///
/// let dataset = from_bytes("in.csv", b"A,B\n1,x\n,\n2.5,\n").unwrap();
/// assert_eq!(to_csv(&dataset).unwrap(), "A,B\n1,x\n2.5,\n");
/// ```
pub fn to_csv(dataset: &Dataset) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(dataset.columns())?;
    for row in dataset.rows() {
        writer.write_record(row.values().iter().map(CellValue::to_string))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Convert the cleaned dataset to XLSX format
///
/// A single worksheet with a bold header row, then numbers as numbers,
/// booleans as booleans and text as text. Empty cells are left blank.
///
/// # Returns
/// * `Result<Vec<u8>, ExportError>` - XLSX file content as bytes or an error
pub fn to_xlsx(dataset: &Dataset) -> Result<Vec<u8>, ExportError> {
    use rust_xlsxwriter::{Format, Workbook};

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (c, column) in dataset.columns().iter().enumerate() {
        worksheet.write_string_with_format(0, c as u16, column, &bold)?;
    }

    for (r, row) in dataset.rows().iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, value) in row.values().iter().enumerate() {
            let c = c as u16;
            match value {
                CellValue::Empty => {}
                CellValue::Text(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                CellValue::Number(n) => {
                    worksheet.write_number(r, c, *n)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellValue::{Bool, Empty, Number, Text};
    use crate::loader::from_bytes;
    use pretty_assertions::assert_eq;

    fn sample() -> Dataset {
        Dataset::from_rows(
            vec!["name".into(), "value".into(), "ok".into()],
            vec![
                vec![Text("a, b".into()), Number(1.0), Bool(true)],
                vec![Empty, Empty, Empty],
                vec![Text("c".into()), Number(0.5), Empty],
            ],
        )
        .unwrap()
    }

    #[test]
    fn csv_quotes_fields_and_skips_dropped_rows() {
        assert_eq!(
            to_csv(&sample()).unwrap(),
            "name,value,ok\n\"a, b\",1,TRUE\nc,0.5,\n"
        );
    }

    #[test]
    fn xlsx_export_reads_back_as_the_same_dataset() {
        let bytes = to_xlsx(&sample()).unwrap();
        let reread = from_bytes("export.xlsx", &bytes).unwrap();
        assert_eq!(reread, sample());
    }
}

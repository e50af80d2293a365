use calamine::Data;
use serde::{Serialize, Serializer};
use std::fmt;

/// Largest magnitude at which an `f64` still holds every integer exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// A single decoded cell
///
/// Spreadsheet decoders hand back many flavours of value. Only the four that
/// matter for plotting are kept; everything else is folded into one of them
/// when the cell is read.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    /// Blank cell
    #[default]
    Empty,

    /// Text, including error cells in their printed form (`#DIV/0!`)
    Text(String),

    /// Any numeric cell, dates included as their serial number
    Number(f64),

    /// `TRUE` / `FALSE`
    Bool(bool),
}

impl CellValue {
    /// A cell counts as empty when it is blank or holds the empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric view of the cell, used by the raster renderer
    ///
    /// Numeric text is accepted the way plotly accepts it; booleans and
    /// other text are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Interpret one raw CSV field
    ///
    /// # Examples
    /// ```
    /// use sheetplot::cell::CellValue;
    ///
    /// assert_eq!(CellValue::from_csv_field("12.5"), CellValue::Number(12.5));
    /// assert_eq!(CellValue::from_csv_field("TRUE"), CellValue::Bool(true));
    /// assert_eq!(CellValue::from_csv_field(""), CellValue::Empty);
    /// ```
    pub fn from_csv_field(field: &str) -> Self {
        if field.is_empty() {
            return CellValue::Empty;
        }
        match field {
            "TRUE" | "true" => return CellValue::Bool(true),
            "FALSE" | "false" => return CellValue::Bool(false),
            _ => {}
        }
        match field.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => CellValue::Number(n),
            _ => CellValue::Text(field.to_string()),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::Error(e) => CellValue::Text(e.to_string()),
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) if is_whole(*n) => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Bool(true) => f.write_str("TRUE"),
            CellValue::Bool(false) => f.write_str("FALSE"),
        }
    }
}

/// Serializes to the JSON plotly expects: `null`, a string, a number or a
/// boolean. Whole numbers are written without a fractional part.
impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Empty => serializer.serialize_none(),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(n) if is_whole(*n) => serializer.serialize_i64(*n as i64),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

fn is_whole(n: f64) -> bool {
    n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER
}

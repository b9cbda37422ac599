use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::{DataError, Result};

/// Name of the row-key column present in every section.
pub const YEAR_COLUMN: &str = "Année";

/// Aggregate column dropped before cell-wise arithmetic.
pub const TOTAL_COLUMN: &str = "Total";

// ---------------------------------------------------------------------------
// Document – the parsed JSON file
// ---------------------------------------------------------------------------

/// One row of a section: column name → JSON scalar, in file order.
pub type Record = serde_json::Map<String, JsonValue>;

/// The root parsed structure: section name → ordered row records.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct Document {
    sections: BTreeMap<String, Vec<Record>>,
}

impl Document {
    pub fn section(&self, name: &str) -> Option<&[Record]> {
        self.sections.get(name).map(Vec::as_slice)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

#[cfg(test)]
impl Document {
    pub fn from_json(value: JsonValue) -> Self {
        serde_json::from_value(value).expect("test document must be an object of arrays")
    }
}

// ---------------------------------------------------------------------------
// Value – a single cell of a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Null,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<&JsonValue> for Value {
    fn from(val: &JsonValue) -> Self {
        match val {
            JsonValue::Number(n) => n
                .as_f64()
                .map(Value::Number)
                .unwrap_or_else(|| Value::Text(n.to_string())),
            JsonValue::String(s) => Value::Text(s.clone()),
            JsonValue::Null => Value::Null,
            other => Value::Text(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Ratio – a derived cell that may be undefined
// ---------------------------------------------------------------------------

/// Result of a cell-wise division. A zero denominator (or any non-finite
/// quotient) is `Undefined` rather than an infinite float.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Defined(f64),
    Undefined,
}

impl Ratio {
    pub fn of(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            return Ratio::Undefined;
        }
        let q = numerator / denominator;
        if q.is_finite() {
            Ratio::Defined(q)
        } else {
            Ratio::Undefined
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Ratio::Defined(v) => Some(v),
            Ratio::Undefined => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Ratio::Defined(_))
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ratio::Defined(v) => write!(f, "{v:.2}"),
            Ratio::Undefined => write!(f, "n/a"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tabular – common read access for plain and derived tables
// ---------------------------------------------------------------------------

/// Read access to a year × column grid.
pub trait Tabular {
    type Cell: Clone;

    fn name(&self) -> &str;
    fn years(&self) -> &[i32];
    fn column_names(&self) -> Vec<&str>;
    /// Cell at row `row`, column `col` (both positional).
    fn cell(&self, row: usize, col: usize) -> &Self::Cell;
}

// ---------------------------------------------------------------------------
// Table – one section materialized as a grid
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// A section indexed by year (rows) and category (columns).
///
/// Rows keep the order of the source records and columns keep the order of
/// the first record; colors and stacking follow this order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    years: Vec<i32>,
    columns: Vec<Column>,
    /// `rows[r][c]` is the value of column `c` in year `years[r]`.
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table from the row records of a section.
    ///
    /// `Année` is the row key; every other field of the first record becomes
    /// a column whose kind is inferred from that first value.
    pub fn from_records(name: &str, records: &[Record]) -> Result<Self> {
        let columns: Vec<Column> = records
            .first()
            .map(|first| {
                first
                    .iter()
                    .filter(|(key, _)| key.as_str() != YEAR_COLUMN)
                    .map(|(key, val)| Column {
                        name: key.clone(),
                        kind: if val.is_number() {
                            ColumnKind::Numeric
                        } else {
                            ColumnKind::Text
                        },
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut years = Vec::with_capacity(records.len());
        let mut rows = Vec::with_capacity(records.len());

        for (i, rec) in records.iter().enumerate() {
            let year = rec
                .get(YEAR_COLUMN)
                .and_then(JsonValue::as_i64)
                .and_then(|y| i32::try_from(y).ok())
                .ok_or_else(|| DataError::MissingYearKey {
                    table: name.to_string(),
                    row: i,
                })?;
            if years.contains(&year) {
                return Err(DataError::DuplicateYear {
                    table: name.to_string(),
                    year,
                });
            }

            let row = columns
                .iter()
                .map(|col| {
                    rec.get(&col.name)
                        .map(Value::from)
                        .ok_or_else(|| DataError::MissingCell {
                            table: name.to_string(),
                            year,
                            column: col.name.clone(),
                        })
                })
                .collect::<Result<Vec<_>>>()?;

            years.push(year);
            rows.push(row);
        }

        Ok(Table {
            name: name.to_string(),
            years,
            columns,
            rows,
        })
    }

    /// Assemble a table from already-aligned parts.
    pub(crate) fn from_parts(
        name: String,
        years: Vec<i32>,
        columns: Vec<Column>,
        rows: Vec<Vec<Value>>,
    ) -> Self {
        debug_assert_eq!(years.len(), rows.len());
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Table {
            name,
            years,
            columns,
            rows,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == column)
    }

    pub fn row_index(&self, year: i32) -> Option<usize> {
        self.years.iter().position(|&y| y == year)
    }

    pub fn row(&self, year: i32) -> Option<&[Value]> {
        self.row_index(year).map(|r| self.rows[r].as_slice())
    }

    /// Numeric value at `(year, column)`.
    pub fn number(&self, year: i32, column: &str) -> Result<f64> {
        let r = self
            .row_index(year)
            .ok_or_else(|| DataError::year_not_found(&self.name, year))?;
        let c = self
            .column_index(column)
            .ok_or_else(|| DataError::unknown_column(&self.name, column))?;
        self.rows[r][c]
            .as_f64()
            .ok_or_else(|| DataError::non_numeric(&self.name, column))
    }

    /// All values of a column as numbers, in row order.
    pub fn numeric_column(&self, column: &str) -> Result<Vec<f64>> {
        let c = self
            .column_index(column)
            .ok_or_else(|| DataError::unknown_column(&self.name, column))?;
        if self.columns[c].kind == ColumnKind::Text {
            return Err(DataError::non_numeric(&self.name, column));
        }
        self.rows
            .iter()
            .map(|row| {
                row[c]
                    .as_f64()
                    .ok_or_else(|| DataError::non_numeric(&self.name, column))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.years.len()
    }
}

impl Tabular for Table {
    type Cell = Value;

    fn name(&self) -> &str {
        &self.name
    }

    fn years(&self) -> &[i32] {
        &self.years
    }

    fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    fn cell(&self, row: usize, col: usize) -> &Value {
        &self.rows[row][col]
    }
}

// ---------------------------------------------------------------------------
// RatioTable – cell-wise derived table
// ---------------------------------------------------------------------------

/// A year × column grid of [`Ratio`] cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RatioTable {
    name: String,
    years: Vec<i32>,
    columns: Vec<String>,
    cells: Vec<Vec<Ratio>>,
}

impl RatioTable {
    pub(crate) fn new(
        name: String,
        years: Vec<i32>,
        columns: Vec<String>,
        cells: Vec<Vec<Ratio>>,
    ) -> Self {
        debug_assert_eq!(years.len(), cells.len());
        RatioTable {
            name,
            years,
            columns,
            cells,
        }
    }

    pub fn row(&self, year: i32) -> Option<&[Ratio]> {
        let r = self.years.iter().position(|&y| y == year)?;
        Some(&self.cells[r])
    }
}

#[cfg(test)]
impl RatioTable {
    pub fn get(&self, year: i32, column: &str) -> Option<Ratio> {
        let c = self.columns.iter().position(|name| name == column)?;
        self.row(year).map(|cells| cells[c])
    }
}

impl Tabular for RatioTable {
    type Cell = Ratio;

    fn name(&self) -> &str {
        &self.name
    }

    fn years(&self) -> &[i32] {
        &self.years
    }

    fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(String::as_str).collect()
    }

    fn cell(&self, row: usize, col: usize) -> &Ratio {
        &self.cells[row][col]
    }
}

// ---------------------------------------------------------------------------
// Projected views
// ---------------------------------------------------------------------------

/// One row of a table: the year and its values in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSlice {
    pub year: i32,
    pub entries: Vec<(String, Value)>,
}

impl RowSlice {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
    }
}

/// One record of a long-format (melted) table.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRecord<C> {
    /// Row key (`Année`).
    pub id: i32,
    pub variable: String,
    pub value: C,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(value: JsonValue) -> Vec<Record> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn table_keeps_source_column_order() {
        let recs = records(json!([
            {"Année": 2016, "PC": 10, "Console": 20, "Mobile": 5},
            {"Année": 2017, "PC": 12, "Console": 18, "Mobile": 7}
        ]));
        let table = Table::from_records("ca_data_support", &recs).unwrap();
        assert_eq!(table.column_names(), vec!["PC", "Console", "Mobile"]);
        assert_eq!(table.years(), &[2016, 2017]);
        assert_eq!(table.number(2017, "Mobile").unwrap(), 7.0);
    }

    #[test]
    fn column_kind_comes_from_first_row() {
        let recs = records(json!([
            {"Année": 2016, "Label": "a", "N": 1.5},
            {"Année": 2017, "Label": "b", "N": 2}
        ]));
        let table = Table::from_records("t", &recs).unwrap();
        assert_eq!(table.columns()[0].kind, ColumnKind::Text);
        assert_eq!(table.columns()[1].kind, ColumnKind::Numeric);
        assert!(matches!(
            table.numeric_column("Label"),
            Err(DataError::NonNumericColumn { .. })
        ));
    }

    #[test]
    fn duplicate_year_is_rejected() {
        let recs = records(json!([
            {"Année": 2016, "PC": 1},
            {"Année": 2016, "PC": 2}
        ]));
        assert!(matches!(
            Table::from_records("t", &recs),
            Err(DataError::DuplicateYear { year: 2016, .. })
        ));
    }

    #[test]
    fn row_without_year_is_rejected() {
        let recs = records(json!([{"PC": 1}]));
        assert!(matches!(
            Table::from_records("t", &recs),
            Err(DataError::MissingYearKey { row: 0, .. })
        ));
    }

    #[test]
    fn ragged_row_is_rejected() {
        let recs = records(json!([
            {"Année": 2016, "PC": 1, "Mobile": 2},
            {"Année": 2017, "PC": 1}
        ]));
        assert!(matches!(
            Table::from_records("t", &recs),
            Err(DataError::MissingCell { year: 2017, .. })
        ));
    }

    #[test]
    fn ratio_of_zero_denominator_is_undefined() {
        assert_eq!(Ratio::of(3.0, 0.0), Ratio::Undefined);
        assert_eq!(Ratio::of(0.0, 0.0), Ratio::Undefined);
        assert_eq!(Ratio::of(3.0, 2.0), Ratio::Defined(1.5));
    }
}

use crate::utils::{format_date_time, is_truthy_text, parse_date_time, parse_number_lenient};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single scalar read from the backing store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Date(NaiveDateTime),
    Text(String),
}

impl CellValue {
    /// Interprets raw text the way an untyped export would: empty is null,
    /// numbers and ISO dates are recognised, everything else stays text.
    pub fn parse_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        if let Some(n) = parse_number_lenient(trimmed) {
            return CellValue::Number(n);
        }
        if let Some(dt) = parse_date_time(trimmed) {
            return CellValue::Date(dt);
        }
        CellValue::Text(trimmed.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view used for service amounts. Booleans, dates, unparseable
    /// text and non-finite numbers have no amount.
    pub fn as_amount(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(s) => parse_number_lenient(s),
            _ => None,
        }
    }

    pub fn amount_or_zero(&self) -> f64 {
        self.as_amount().unwrap_or(0.0)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Bool(b) => *b,
            CellValue::Number(n) => *n != 0.0 && !n.is_nan(),
            CellValue::Text(s) => is_truthy_text(s),
            CellValue::Null | CellValue::Date(_) => false,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        self.as_date_time().map(|dt| dt.date())
    }

    pub fn as_date_time(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date(dt) => Some(*dt),
            CellValue::Text(s) => parse_date_time(s),
            _ => None,
        }
    }

    /// Display text for identity fields; `None` for null cells.
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Date(dt) => write!(f, "{}", format_date_time(*dt)),
            CellValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::Date(value)
    }
}

/// Orders receipt identifiers: numbers numerically, then text, nulls last.
pub fn compare_identifiers(a: &CellValue, b: &CellValue) -> Ordering {
    match (a.as_amount(), b.as_amount()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.to_string().cmp(&b.to_string()),
        },
    }
}

/// The working table: named columns in query order over positional rows.
/// Every row holds exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from positional rows; short rows are padded with nulls
    /// and extra cells are dropped.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    pub fn value(&self, row: usize, name: &str) -> Option<&CellValue> {
        self.column_index(name).and_then(|idx| self.cell(row, idx))
    }

    pub fn column_values(&self, column: usize) -> impl Iterator<Item = &CellValue> + '_ {
        self.rows.iter().filter_map(move |r| r.get(column))
    }

    /// Inserts a column at `position` (clamped to the end) with one value per row.
    pub fn insert_column(&mut self, position: usize, name: String, values: Vec<CellValue>) {
        let position = position.min(self.columns.len());
        self.columns.insert(position, name);
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.insert(position, values.next().unwrap_or_default());
        }
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Vec<CellValue>> {
        let idx = self.column_index(name)?;
        self.columns.remove(idx);
        Some(self.rows.iter_mut().map(|row| row.remove(idx)).collect())
    }

    /// Renames `from` to `to`. Returns false when `from` is absent or `to`
    /// already names another column.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        if from == to {
            return self.contains_column(from);
        }
        if self.contains_column(to) {
            return false;
        }
        match self.column_index(from) {
            Some(idx) => {
                self.columns[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Stable sort of the rows by one column.
    pub fn sort_rows_by_column(&mut self, name: &str) -> bool {
        match self.column_index(name) {
            Some(idx) => {
                self.rows
                    .sort_by(|a, b| compare_identifiers(&a[idx], &b[idx]));
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RawTable {
        RawTable::from_rows(
            vec!["ReceiptID".to_string(), "_A".to_string(), "_B".to_string()],
            vec![
                vec![CellValue::from(3_i64), CellValue::from(10.0), CellValue::Null],
                vec![CellValue::from(1_i64), CellValue::from("5"), CellValue::from(2.5)],
                vec![CellValue::Null, CellValue::from("n/a")],
            ],
        )
    }

    #[test]
    fn test_rows_are_padded() {
        let table = sample();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows()[2].len(), 3);
        assert_eq!(table.cell(2, 2), Some(&CellValue::Null));
    }

    #[test]
    fn test_amount_coercion() {
        assert_eq!(CellValue::from(10.0).as_amount(), Some(10.0));
        assert_eq!(CellValue::from("1,500.25").as_amount(), Some(1500.25));
        assert_eq!(CellValue::from("n/a").as_amount(), None);
        assert_eq!(CellValue::Bool(true).as_amount(), None);
        assert_eq!(CellValue::Number(f64::INFINITY).amount_or_zero(), 0.0);
        assert_eq!(CellValue::Null.amount_or_zero(), 0.0);
    }

    #[test]
    fn test_truthiness() {
        assert!(CellValue::Bool(true).is_truthy());
        assert!(CellValue::from(1_i64).is_truthy());
        assert!(CellValue::from("نعم").is_truthy());
        assert!(!CellValue::from(0_i64).is_truthy());
        assert!(!CellValue::Null.is_truthy());
        assert!(!CellValue::from("0").is_truthy());
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(CellValue::parse_text(""), CellValue::Null);
        assert_eq!(CellValue::parse_text(" 42 "), CellValue::Number(42.0));
        assert!(matches!(
            CellValue::parse_text("2025-02-01"),
            CellValue::Date(_)
        ));
        assert_eq!(
            CellValue::parse_text("فرع القاهرة"),
            CellValue::Text("فرع القاهرة".to_string())
        );
    }

    #[test]
    fn test_display_integers_without_fraction() {
        assert_eq!(CellValue::from(1001_i64).to_string(), "1001");
        assert_eq!(CellValue::from(12.5).to_string(), "12.5");
        assert_eq!(CellValue::Null.to_text(), None);
    }

    #[test]
    fn test_insert_and_remove_column() {
        let mut table = sample();
        table.insert_column(
            1,
            "Merged".to_string(),
            vec![CellValue::from(1.0), CellValue::from(2.0), CellValue::from(3.0)],
        );
        assert_eq!(table.columns()[1], "Merged");
        assert_eq!(table.value(1, "Merged"), Some(&CellValue::from(2.0)));

        let removed = table.remove_column("_A").unwrap();
        assert_eq!(removed.len(), 3);
        assert!(!table.contains_column("_A"));
        assert_eq!(table.rows()[0].len(), table.column_count());
    }

    #[test]
    fn test_rename_column_refuses_collision() {
        let mut table = sample();
        assert!(!table.rename_column("_A", "_B"));
        assert!(table.rename_column("_A", "_C"));
        assert!(table.contains_column("_C"));
        assert!(!table.rename_column("missing", "_D"));
    }

    #[test]
    fn test_sort_by_identifier_nulls_last() {
        let mut table = sample();
        assert!(table.sort_rows_by_column("ReceiptID"));
        let ids: Vec<String> = table
            .column_values(0)
            .map(|c| c.to_string())
            .collect();
        assert_eq!(ids, vec!["1", "3", ""]);
    }
}

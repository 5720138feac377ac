use crate::catalog::{ColumnCatalog, ColumnCategory};
use crate::classifier::{classify, CancellationState, PaymentChannel, RowClassification};
use crate::schema::{AmountPhrases, FieldNames};
use crate::table::{CellValue, RawTable};
use crate::tafkeet::f64_to_words;
use crate::utils::format_date_time;
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub branch: Option<String>,
    pub member_code: Option<String>,
    pub receipt_id: Option<String>,
    pub member_name: Option<String>,
    pub date: Option<NaiveDate>,
    pub governorate: Option<String>,
    pub classification: RowClassification,
    /// Only filled for cancelled receipts.
    pub cancelled_by: Option<String>,
    /// Only filled for cancelled receipts.
    pub cancelled_at: Option<String>,
    /// One amount per catalog position, zero when absent or non-numeric.
    pub service_values: Vec<f64>,
    /// Sum of every service value, cancelled receipts included.
    pub row_total: f64,
    pub amount_in_words: String,
    pub cash_total: f64,
    pub card_total: f64,
}

impl ReportRow {
    pub fn state(&self) -> CancellationState {
        self.classification.state
    }

    pub fn channel(&self) -> Option<PaymentChannel> {
        self.classification.channel
    }

    pub fn is_active(&self) -> bool {
        self.classification.state.is_active()
    }

    pub fn value_at(&self, position: usize) -> f64 {
        self.service_values.get(position).copied().unwrap_or(0.0)
    }

    pub fn category_total(&self, catalog: &ColumnCatalog, category: ColumnCategory) -> f64 {
        catalog
            .by_category(category)
            .map(|entry| self.value_at(entry.position))
            .sum()
    }
}

/// Table positions of the identity and status fields, looked up once per table.
#[derive(Debug, Clone, Default)]
struct FieldIndices {
    branch: Option<usize>,
    member_code: Option<usize>,
    receipt_id: Option<usize>,
    member_name: Option<usize>,
    date: Option<usize>,
    governorate: Option<usize>,
    cancelled: Option<usize>,
    printed: Option<usize>,
    cancelled_by: Option<usize>,
    cancelled_at: Option<usize>,
    admin_expense: Option<usize>,
}

impl FieldIndices {
    fn resolve(table: &RawTable, fields: &FieldNames) -> Self {
        Self {
            branch: table.column_index(&fields.branch),
            member_code: table.column_index(&fields.member_code),
            receipt_id: table.column_index(&fields.receipt_id),
            member_name: table.column_index(&fields.member_name),
            date: table.column_index(&fields.date),
            governorate: table.column_index(&fields.governorate),
            cancelled: table.column_index(&fields.cancelled),
            printed: table.column_index(&fields.printed),
            cancelled_by: table.column_index(&fields.cancelled_by),
            cancelled_at: table.column_index(&fields.cancelled_at),
            admin_expense: table.column_index(&fields.admin_expense),
        }
    }
}

fn cell(row: &[CellValue], index: Option<usize>) -> Option<&CellValue> {
    index.and_then(|i| row.get(i))
}

fn text(row: &[CellValue], index: Option<usize>) -> Option<String> {
    cell(row, index).and_then(CellValue::to_text)
}

pub struct RowAggregator<'a> {
    catalog: &'a ColumnCatalog,
    phrases: &'a AmountPhrases,
    fields: FieldIndices,
}

impl<'a> RowAggregator<'a> {
    pub fn new(
        table: &RawTable,
        catalog: &'a ColumnCatalog,
        fields: &FieldNames,
        phrases: &'a AmountPhrases,
    ) -> Self {
        Self {
            catalog,
            phrases,
            fields: FieldIndices::resolve(table, fields),
        }
    }

    pub fn classify_row(&self, row: &[CellValue]) -> RowClassification {
        classify(
            cell(row, self.fields.cancelled),
            cell(row, self.fields.printed),
            cell(row, self.fields.admin_expense),
        )
    }

    pub fn aggregate(&self, row: &[CellValue], classification: RowClassification) -> ReportRow {
        let service_values: Vec<f64> = self
            .catalog
            .iter()
            .map(|entry| row.get(entry.table_index).map_or(0.0, CellValue::amount_or_zero))
            .collect();
        let row_total: f64 = service_values.iter().sum();

        let active = classification.state.is_active();
        let amount_in_words = self.phrases.render(&f64_to_words(row_total), !active);

        let (cash_total, card_total) = match (active, classification.channel) {
            (true, Some(PaymentChannel::Cash)) => (row_total, 0.0),
            (true, Some(PaymentChannel::Card)) => (0.0, row_total),
            _ => (0.0, 0.0),
        };

        let (cancelled_by, cancelled_at) = if active {
            (None, None)
        } else {
            let at = cell(row, self.fields.cancelled_at).and_then(|c| match c.as_date_time() {
                Some(dt) => Some(format_date_time(dt)),
                None => c.to_text(),
            });
            (text(row, self.fields.cancelled_by), at)
        };

        ReportRow {
            branch: text(row, self.fields.branch),
            member_code: text(row, self.fields.member_code),
            receipt_id: text(row, self.fields.receipt_id),
            member_name: text(row, self.fields.member_name),
            date: cell(row, self.fields.date).and_then(CellValue::as_date),
            governorate: text(row, self.fields.governorate),
            classification,
            cancelled_by,
            cancelled_at,
            service_values,
            row_total,
            amount_in_words,
            cash_total,
            card_total,
        }
    }

    pub fn aggregate_table(&self, table: &RawTable) -> Vec<ReportRow> {
        table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let report_row = self.aggregate(row, self.classify_row(row));
                if report_row.receipt_id.is_none() {
                    warn!("Row {} has no receipt identifier", i + 1);
                }
                report_row
            })
            .collect()
    }
}

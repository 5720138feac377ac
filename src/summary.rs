use crate::aggregator::ReportRow;
use crate::catalog::ColumnCatalog;
use crate::classifier::CancellationState;
use crate::error::{ReportError, Result};
use crate::funds::{compute_funds, FundTotals};
use crate::layout::{
    CellAnnotation, CellContent, ConditionalSumFormula, ReportCell, ReportColumn, ReportLayout,
};
use crate::utils::approx_eq;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StateTotals {
    pub count: usize,
    pub total: f64,
}

impl StateTotals {
    fn add(&mut self, amount: f64) {
        self.count += 1;
        self.total += amount;
    }
}

/// Active-only total of one numeric report column and the conditional sum
/// that produces it on the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: ReportColumn,
    pub label: String,
    pub active_total: f64,
    pub formula: ConditionalSumFormula,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryBlock {
    pub active: StateTotals,
    pub cancelled_before_print: StateTotals,
    pub cancelled_after_print: StateTotals,
    pub columns: Vec<ColumnSummary>,
    pub cash_total: f64,
    pub card_total: f64,
    /// Total of active receipts over both channels.
    pub grand_total: f64,
    pub funds: FundTotals,
}

impl SummaryBlock {
    pub const TOTAL_LABEL: &'static str = "الإجمالى";

    pub fn compute(rows: &[ReportRow], catalog: &ColumnCatalog, layout: &ReportLayout) -> Self {
        let mut active = StateTotals::default();
        let mut cancelled_before_print = StateTotals::default();
        let mut cancelled_after_print = StateTotals::default();

        for row in rows {
            match row.state() {
                CancellationState::Active => active.add(row.row_total),
                CancellationState::CancelledBeforePrint => cancelled_before_print.add(row.row_total),
                CancellationState::CancelledAfterPrint => cancelled_after_print.add(row.row_total),
            }
        }

        let columns = layout
            .numeric_columns()
            .into_iter()
            .map(|column| ColumnSummary {
                column,
                label: layout.header_label(column, catalog),
                active_total: active_column_total(rows, column),
                formula: layout.active_sum_formula(column),
            })
            .collect();

        let cash_total = active_column_total(rows, ReportColumn::Cash);
        let card_total = active_column_total(rows, ReportColumn::Card);

        Self {
            active,
            cancelled_before_print,
            cancelled_after_print,
            columns,
            cash_total,
            card_total,
            grand_total: active.total,
            funds: compute_funds(rows, catalog),
        }
    }

    pub fn column(&self, column: ReportColumn) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.column == column)
    }

    pub fn cancelled_count(&self) -> usize {
        self.cancelled_before_print.count + self.cancelled_after_print.count
    }

    pub fn receipt_count(&self) -> usize {
        self.active.count + self.cancelled_count()
    }

    /// Cash and card must add up to the active total, and the funds must
    /// allocate exactly what the cash receipts collected.
    pub fn reconcile(&self, tolerance: f64) -> Result<()> {
        let channels = self.cash_total + self.card_total;
        if !approx_eq(channels, self.grand_total, tolerance) {
            return Err(ReportError::ReconciliationMismatch {
                check: "cash + card".to_string(),
                expected: self.grand_total,
                actual: channels,
            });
        }
        self.funds.verify(tolerance)
    }

    /// The totals row under the data followed by the state and fund lines.
    pub fn cells(&self, layout: &ReportLayout) -> Vec<ReportCell> {
        let row = layout.summary_row();
        let label_span = layout.column_number(ReportColumn::CancelledFlag);

        let mut cells = vec![ReportCell::text(row, 1, Some(Self::TOTAL_LABEL))
            .annotated(CellAnnotation::SummaryLabel)
            .annotated(CellAnnotation::MergeAcross {
                columns: label_span,
            })];

        cells.extend(self.columns.iter().map(|summary| {
            ReportCell::new(
                row,
                layout.column_number(summary.column),
                CellContent::Formula {
                    formula: summary.formula.clone(),
                    value: summary.active_total,
                },
            )
            .annotated(CellAnnotation::SummaryValue)
        }));

        let lines = [
            ("عدد الايصالات السارية", self.active.count as f64),
            (
                "عدد الايصالات الملغاة قبل الطباعة",
                self.cancelled_before_print.count as f64,
            ),
            (
                "عدد الايصالات الملغاة بعد الطباعة",
                self.cancelled_after_print.count as f64,
            ),
            ("اجمالى النقدى", self.cash_total),
            ("اجمالى الفيزا", self.card_total),
            ("الاجمالى العام", self.grand_total),
            ("صندوق النقابة", self.funds.union_fund),
            ("صندوق المعاشات", self.funds.pension_fund),
        ];

        for (offset, (label, value)) in lines.iter().enumerate() {
            let line_row = row + 2 + offset;
            cells.push(
                ReportCell::text(line_row, 1, Some(*label))
                    .annotated(CellAnnotation::SummaryLabel)
                    .annotated(CellAnnotation::MergeAcross { columns: 2 }),
            );
            cells.push(
                ReportCell::new(line_row, 3, CellContent::Number(*value))
                    .annotated(CellAnnotation::SummaryValue),
            );
        }

        cells
    }
}

/// Sum of `column` over active receipts, which is what the sheet's
/// conditional sum evaluates to.
pub fn active_column_total(rows: &[ReportRow], column: ReportColumn) -> f64 {
    rows.iter()
        .filter(|r| r.is_active())
        .map(|r| match column {
            ReportColumn::Service(position) => r.value_at(position),
            ReportColumn::Total => r.row_total,
            ReportColumn::Cash => r.cash_total,
            ReportColumn::Card => r.card_total,
            _ => 0.0,
        })
        .sum()
}

use crate::aggregator::{ReportRow, RowAggregator};
use crate::catalog::{CatalogRules, ColumnCatalog};
use crate::error::{ReportError, Result};
use crate::layout::{HeaderBlock, ReportCell, ReportColumn, ReportLayout};
use crate::merger::ColumnMerger;
use crate::schema::{resolve_year_template, ReportConfig};
use crate::summary::SummaryBlock;
use crate::table::RawTable;
use crate::utils::{approx_eq, sanitize_column_name};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

pub const RAW_DATA_SHEET: &str = "RawData";
pub const REPORT_SHEET: &str = "PivotReport";

/// What the sink writes when the query returned no rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyReport {
    pub sheet_name: String,
    pub message: String,
    pub file_name: String,
}

impl Default for EmptyReport {
    fn default() -> Self {
        Self {
            sheet_name: "NoData".to_string(),
            message: "لا توجد بيانات للفترة المحددة.".to_string(),
            file_name: "EmptyReport.xlsx".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptReport {
    pub header: HeaderBlock,
    pub layout: ReportLayout,
    pub catalog: ColumnCatalog,
    pub rows: Vec<ReportRow>,
    pub summary: SummaryBlock,
    pub report_sheet: String,
    pub raw_data_sheet: String,
    /// The working table after cleanup, merging, renaming and sorting.
    pub raw_data: RawTable,
}

impl ReceiptReport {
    /// Every cell of the formatted report sheet, top to bottom.
    pub fn report_cells(&self) -> Vec<ReportCell> {
        let mut cells = self.header.cells();
        cells.extend(self.layout.header_cells(&self.catalog));
        for (index, row) in self.rows.iter().enumerate() {
            cells.extend(self.layout.row_cells(index, row));
        }
        cells.extend(self.summary.cells(&self.layout));
        cells
    }

    /// Re-derives the summary figures from the rows and checks them against
    /// the stored ones.
    pub fn verify(&self, tolerance: f64) -> Result<()> {
        self.summary.reconcile(tolerance)?;

        for column in &self.summary.columns {
            let expected: f64 = self
                .rows
                .iter()
                .filter(|row| row.state().flag_label() == column.formula.criteria)
                .map(|row| cell_amount(row, column.column))
                .sum();

            if !approx_eq(expected, column.active_total, tolerance) {
                return Err(ReportError::ReconciliationMismatch {
                    check: format!("column '{}'", column.label),
                    expected,
                    actual: column.active_total,
                });
            }
        }

        let service_sum: f64 = self
            .summary
            .columns
            .iter()
            .filter(|c| matches!(c.column, ReportColumn::Service(_)))
            .map(|c| c.active_total)
            .sum();
        if !approx_eq(service_sum, self.summary.grand_total, tolerance) {
            return Err(ReportError::ReconciliationMismatch {
                check: "service columns".to_string(),
                expected: self.summary.grand_total,
                actual: service_sum,
            });
        }

        Ok(())
    }
}

fn cell_amount(row: &ReportRow, column: ReportColumn) -> f64 {
    match column {
        ReportColumn::Service(position) => row.value_at(position),
        ReportColumn::Total => row.row_total,
        ReportColumn::Cash => row.cash_total,
        ReportColumn::Card => row.card_total,
        _ => 0.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReportOutcome {
    Empty(EmptyReport),
    Full(Box<ReceiptReport>),
}

impl ReportOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, ReportOutcome::Empty(_))
    }

    pub fn report(&self) -> Option<&ReceiptReport> {
        match self {
            ReportOutcome::Full(report) => Some(report.as_ref()),
            ReportOutcome::Empty(_) => None,
        }
    }
}

pub struct ReportAssembler<'a> {
    config: &'a ReportConfig,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self { config }
    }

    /// Runs name cleanup, merge, rename, sort, catalog discovery, aggregation
    /// and summary over `table`, which ends up in the report as its raw-data
    /// sheet. The configuration is validated before anything else.
    pub fn assemble(&self, mut table: RawTable) -> Result<ReportOutcome> {
        self.config.validate()?;

        if table.is_empty() {
            info!("Query returned no rows; emitting empty report");
            return Ok(ReportOutcome::Empty(EmptyReport::default()));
        }

        let rules = CatalogRules::from_config(self.config)?;

        clean_column_names(&mut table);

        let merged = ColumnMerger::new(&self.config.synonym_groups).merge_all(&mut table)?;
        debug!("Merged synonym groups: {:?}", merged);

        self.apply_renames(&mut table)?;

        let fields = &self.config.fields;
        if table.sort_rows_by_column(&fields.receipt_id) {
            debug!("Sorted {} rows by '{}'", table.row_count(), fields.receipt_id);
        } else {
            warn!(
                "Receipt identifier column '{}' not found; keeping query order",
                fields.receipt_id
            );
        }

        let catalog = ColumnCatalog::discover(&table, &rules);
        let rows = RowAggregator::new(&table, &catalog, fields, &self.config.phrases)
            .aggregate_table(&table);

        let layout = ReportLayout::new(catalog.len(), rows.len());
        let summary = SummaryBlock::compute(&rows, &catalog, &layout);
        let header = HeaderBlock::new(
            &self.config.organization_name,
            rows.first().and_then(|r| r.branch.as_deref()),
            self.config.period,
        );

        debug!(
            "Assembled report: {} rows, {} service columns, active total {:.2}",
            rows.len(),
            catalog.len(),
            summary.grand_total
        );

        Ok(ReportOutcome::Full(Box::new(ReceiptReport {
            header,
            layout,
            catalog,
            rows,
            summary,
            report_sheet: REPORT_SHEET.to_string(),
            raw_data_sheet: RAW_DATA_SHEET.to_string(),
            raw_data: table,
        })))
    }

    /// A rename onto an existing column is skipped.
    fn apply_renames(&self, table: &mut RawTable) -> Result<()> {
        for rename in &self.config.column_renames {
            let to = resolve_year_template(&rename.to, self.config.reference_year)?;
            if table.contains_column(&rename.from) && !table.rename_column(&rename.from, &to) {
                warn!(
                    "Cannot rename '{}' to '{}': a column with that name already exists",
                    rename.from, to
                );
            }
        }

        Ok(())
    }
}

/// Replaces line breaks and trims every column name so that synonym sources
/// and renames match names exactly as configured. A name that would collide
/// with an existing column is left as is.
fn clean_column_names(table: &mut RawTable) {
    let names: Vec<String> = table.columns().to_vec();
    for name in names {
        let clean = sanitize_column_name(&name);
        if clean != name && !table.rename_column(&name, &clean) {
            warn!("Column '{}' clashes with '{}' after cleanup", name, clean);
        }
    }
}

//! # Receipt Report Builder
//!
//! A library for turning a flat table of cash-receipt records into a
//! categorized, totalled report ready to be written to a spreadsheet.
//!
//! ## Core Concepts
//!
//! - **Service Columns**: Amount columns whose names carry an internal-field marker. Which ones
//!   appear in a report depends on the data: columns without a positive amount are dropped
//! - **Synonym Groups**: Differently named columns for the same service, summed into one column
//! - **Cancellation State**: Active, cancelled before print, or cancelled after print
//! - **Payment Channel**: Cash or card, inferred from the administrative expense column
//! - **Tafkeet**: Every row total is spelled out in Arabic words with its currency phrase
//! - **Fund Split**: Active cash receipts are allocated between the union fund and the pension fund
//!
//! ## Example
//!
//! ```rust,ignore
//! use receipt_report_builder::*;
//! use serde_json::json;
//!
//! let config = ReportConfig::new("النقابه العامه للعلاج الطبيعى", 2025);
//!
//! let table = table_from_records(&[
//!     json!({"ReceiptID": 1, "BranchName": "القاهرة", "cancelled": 0, "_اشتراك": 150.50}),
//!     json!({"ReceiptID": 2, "BranchName": "القاهرة", "cancelled": 0, "_رسوم معاش": 20}),
//! ])
//! .unwrap();
//!
//! match build_report(table, &config).unwrap() {
//!     ReportOutcome::Full(report) => {
//!         println!("{}", report.rows[0].amount_in_words);
//!         println!("union fund: {}", report.summary.funds.union_fund);
//!     }
//!     ReportOutcome::Empty(empty) => println!("{}", empty.message),
//! }
//! ```

pub mod aggregator;
pub mod assembler;
pub mod catalog;
pub mod classifier;
pub mod error;
pub mod funds;
pub mod ingestion;
pub mod layout;
pub mod merger;
pub mod schema;
pub mod summary;
pub mod table;
pub mod tafkeet;
pub mod utils;

pub use aggregator::{ReportRow, RowAggregator};
pub use assembler::{
    EmptyReport, ReceiptReport, ReportAssembler, ReportOutcome, RAW_DATA_SHEET, REPORT_SHEET,
};
pub use catalog::{CatalogEntry, CatalogRules, ColumnCatalog, ColumnCategory};
pub use classifier::{classify, CancellationState, PaymentChannel, RowClassification};
pub use error::{ReportError, Result};
pub use funds::{compute_funds, FundSplitCalculator, FundTotals};
pub use ingestion::*;
pub use layout::{
    CellAnnotation, CellContent, CellRange, ConditionalSumFormula, HeaderBlock, ReportCell,
    ReportColumn, ReportLayout,
};
pub use merger::{merge_synonyms, ColumnMerger};
pub use schema::*;
pub use summary::{ColumnSummary, StateTotals, SummaryBlock};
pub use table::{CellValue, RawTable};
pub use tafkeet::{f64_to_words, integer_to_words, to_words};

use log::{debug, info};

pub struct ReceiptReportProcessor;

impl ReceiptReportProcessor {
    pub fn process(table: RawTable, config: &ReportConfig) -> Result<ReportOutcome> {
        config.validate()?;

        info!(
            "Building receipt report for organization: {}",
            config.organization_name
        );
        debug!(
            "Input table has {} rows and {} columns; reference year {}",
            table.row_count(),
            table.column_count(),
            config.reference_year
        );

        ReportAssembler::new(config).assemble(table)
    }

    pub fn process_with_verification(
        table: RawTable,
        config: &ReportConfig,
        tolerance: f64,
    ) -> Result<ReportOutcome> {
        let outcome = Self::process(table, config)?;

        if let Some(report) = outcome.report() {
            report.verify(tolerance)?;
            debug!("Report totals verified within tolerance {}", tolerance);
        }

        Ok(outcome)
    }
}

pub fn build_report(table: RawTable, config: &ReportConfig) -> Result<ReportOutcome> {
    ReceiptReportProcessor::process(table, config)
}

pub fn process_with_verification(
    table: RawTable,
    config: &ReportConfig,
    tolerance: f64,
) -> Result<ReportOutcome> {
    ReceiptReportProcessor::process_with_verification(table, config, tolerance)
}

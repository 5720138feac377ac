use crate::aggregator::ReportRow;
use crate::catalog::{ColumnCatalog, ColumnCategory};
use crate::error::{ReportError, Result};
use crate::utils::approx_eq;
use log::debug;
use serde::{Deserialize, Serialize};

/// Category totals over active cash receipts and their allocation to the
/// union fund and the pension fund.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FundTotals {
    pub base: f64,
    pub other: f64,
    pub pension: f64,
    pub union_fund: f64,
    pub pension_fund: f64,
}

impl FundTotals {
    /// The base category is always split evenly between the two funds.
    pub fn from_category_totals(base: f64, other: f64, pension: f64) -> Self {
        let half = base / 2.0;
        Self {
            base,
            other,
            pension,
            union_fund: half + other,
            pension_fund: half + pension,
        }
    }

    pub fn allocated(&self) -> f64 {
        self.union_fund + self.pension_fund
    }

    pub fn collected(&self) -> f64 {
        self.base + self.other + self.pension
    }

    pub fn verify(&self, tolerance: f64) -> Result<()> {
        if approx_eq(self.allocated(), self.collected(), tolerance) {
            Ok(())
        } else {
            Err(ReportError::FundAllocationMismatch {
                union_fund: self.union_fund,
                pension_fund: self.pension_fund,
                base: self.base,
                other: self.other,
                pension: self.pension,
            })
        }
    }
}

pub struct FundSplitCalculator<'a> {
    catalog: &'a ColumnCatalog,
}

impl<'a> FundSplitCalculator<'a> {
    pub fn new(catalog: &'a ColumnCatalog) -> Self {
        Self { catalog }
    }

    /// Only active cash receipts contribute. Card receipts and cancelled
    /// receipts are left out of both funds.
    pub fn compute(&self, rows: &[ReportRow]) -> FundTotals {
        let (mut base, mut other, mut pension) = (0.0, 0.0, 0.0);

        for row in rows.iter().filter(|r| r.classification.is_active_cash()) {
            base += row.category_total(self.catalog, ColumnCategory::Base);
            other += row.category_total(self.catalog, ColumnCategory::Other);
            pension += row.category_total(self.catalog, ColumnCategory::Pension);
        }

        let totals = FundTotals::from_category_totals(base, other, pension);
        debug!(
            "Fund totals: base={:.2} other={:.2} pension={:.2} union={:.2} pension_fund={:.2}",
            totals.base, totals.other, totals.pension, totals.union_fund, totals.pension_fund
        );
        totals
    }
}

pub fn compute_funds(rows: &[ReportRow], catalog: &ColumnCatalog) -> FundTotals {
    FundSplitCalculator::new(catalog).compute(rows)
}

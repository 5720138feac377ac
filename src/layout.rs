use crate::aggregator::ReportRow;
use crate::catalog::ColumnCatalog;
use crate::classifier::CancellationState;
use crate::schema::ReportPeriod;
use crate::utils::{column_letter, format_date};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Styling intent attached to a cell. The spreadsheet sink decides how each
/// one is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellAnnotation {
    Title,
    HeaderLine,
    ColumnHeader,
    CancelledRow,
    CancelledFlag,
    SummaryLabel,
    SummaryValue,
    /// The cell spans this many columns starting at its own.
    MergeAcross { columns: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellContent {
    Empty,
    Text(String),
    Number(f64),
    /// A conditional sum the sink may write as a formula, with the value the
    /// formula is expected to evaluate to.
    Formula {
        formula: ConditionalSumFormula,
        value: f64,
    },
}

/// A positioned cell. Rows and columns are 1-based like spreadsheet addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportCell {
    pub row: usize,
    pub column: usize,
    pub content: CellContent,
    pub annotations: Vec<CellAnnotation>,
}

impl ReportCell {
    pub fn new(row: usize, column: usize, content: CellContent) -> Self {
        Self {
            row,
            column,
            content,
            annotations: Vec::new(),
        }
    }

    pub fn text(row: usize, column: usize, value: Option<&str>) -> Self {
        let content = match value {
            Some(v) => CellContent::Text(v.to_string()),
            None => CellContent::Empty,
        };
        Self::new(row, column, content)
    }

    pub fn annotated(mut self, annotation: CellAnnotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn has_annotation(&self, annotation: CellAnnotation) -> bool {
        self.annotations.contains(&annotation)
    }

    pub fn address(&self) -> String {
        format!("{}{}", column_letter(self.column), self.row)
    }
}

/// A single-column block of rows, e.g. `I6:I20`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub column: usize,
    pub first_row: usize,
    pub last_row: usize,
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = column_letter(self.column);
        write!(f, "{}{}:{}{}", letter, self.first_row, letter, self.last_row)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalSumFormula {
    pub sum_range: CellRange,
    pub criteria_range: CellRange,
    pub criteria: String,
}

impl ConditionalSumFormula {
    pub fn to_a1(&self) -> String {
        format!(
            "SUMIFS({}, {}, \"{}\")",
            self.sum_range, self.criteria_range, self.criteria
        )
    }
}

impl fmt::Display for ConditionalSumFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportColumn {
    Branch,
    MemberCode,
    ReceiptId,
    MemberName,
    Date,
    Governorate,
    AmountInWords,
    CancelledFlag,
    Status,
    CancelledBy,
    CancelledAt,
    /// Catalog position of a service column.
    Service(usize),
    Total,
    Cash,
    Card,
}

impl ReportColumn {
    pub const FIXED: [ReportColumn; 11] = [
        ReportColumn::Branch,
        ReportColumn::MemberCode,
        ReportColumn::ReceiptId,
        ReportColumn::MemberName,
        ReportColumn::Date,
        ReportColumn::Governorate,
        ReportColumn::AmountInWords,
        ReportColumn::CancelledFlag,
        ReportColumn::Status,
        ReportColumn::CancelledBy,
        ReportColumn::CancelledAt,
    ];

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ReportColumn::Service(_) | ReportColumn::Total | ReportColumn::Cash | ReportColumn::Card
        )
    }

    fn fixed_label(self) -> &'static str {
        match self {
            ReportColumn::Branch => "الفرع",
            ReportColumn::MemberCode => "رقم القيد",
            ReportColumn::ReceiptId => "رقم الايصال",
            ReportColumn::MemberName => "اسم العضو",
            ReportColumn::Date => "التاريخ",
            ReportColumn::Governorate => "المحافظة",
            ReportColumn::AmountInWords => "القيمة فقط وقدرها",
            ReportColumn::CancelledFlag => "لاغى",
            ReportColumn::Status => "حالة الايصال",
            ReportColumn::CancelledBy => "الغى بواسطة",
            ReportColumn::CancelledAt => "تاريخ الالغاء",
            ReportColumn::Service(_) => "",
            ReportColumn::Total => "الإجمالى",
            ReportColumn::Cash => "نقدى",
            ReportColumn::Card => "فيزا",
        }
    }
}

/// Title lines above the column headers, each merged across the first
/// `HEADER_SPAN` columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderBlock {
    pub title: String,
    pub branch_line: String,
    pub period_line: String,
}

impl HeaderBlock {
    pub const HEADER_SPAN: usize = 10;

    pub fn new(organization_name: &str, branch: Option<&str>, period: Option<ReportPeriod>) -> Self {
        let range = match period {
            Some(p) => format!("{} الى {}", format_date(p.start), format_date(p.end)),
            None => "__________________ الى __________________".to_string(),
        };
        Self {
            title: organization_name.to_string(),
            branch_line: format!("فرع/ {}", branch.unwrap_or_default()),
            period_line: format!("كشف حركه المتحصلات النقديه عن الفتره من {}", range),
        }
    }

    pub fn cells(&self) -> Vec<ReportCell> {
        let merge = CellAnnotation::MergeAcross {
            columns: Self::HEADER_SPAN,
        };
        vec![
            ReportCell::text(1, 1, Some(&self.title))
                .annotated(CellAnnotation::Title)
                .annotated(merge),
            ReportCell::text(2, 1, Some(&self.branch_line))
                .annotated(CellAnnotation::HeaderLine)
                .annotated(merge),
            ReportCell::text(3, 1, Some(&self.period_line))
                .annotated(CellAnnotation::HeaderLine)
                .annotated(merge),
        ]
    }
}

/// Column and row positions of the formatted report sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLayout {
    service_count: usize,
    row_count: usize,
}

impl ReportLayout {
    pub const HEADER_ROW: usize = 5;
    pub const FIRST_DATA_ROW: usize = Self::HEADER_ROW + 1;

    pub fn new(service_count: usize, row_count: usize) -> Self {
        Self {
            service_count,
            row_count,
        }
    }

    pub fn service_count(&self) -> usize {
        self.service_count
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> Vec<ReportColumn> {
        ReportColumn::FIXED
            .iter()
            .copied()
            .chain((0..self.service_count).map(ReportColumn::Service))
            .chain([ReportColumn::Total, ReportColumn::Cash, ReportColumn::Card])
            .collect()
    }

    pub fn numeric_columns(&self) -> Vec<ReportColumn> {
        self.columns().into_iter().filter(|c| c.is_numeric()).collect()
    }

    /// 1-based sheet column of `column`.
    pub fn column_number(&self, column: ReportColumn) -> usize {
        let first_service = ReportColumn::FIXED.len() + 1;
        match column {
            ReportColumn::Service(position) => first_service + position,
            ReportColumn::Total => first_service + self.service_count,
            ReportColumn::Cash => first_service + self.service_count + 1,
            ReportColumn::Card => first_service + self.service_count + 2,
            fixed => {
                ReportColumn::FIXED
                    .iter()
                    .position(|c| *c == fixed)
                    .unwrap_or_default()
                    + 1
            }
        }
    }

    pub fn column_letter(&self, column: ReportColumn) -> String {
        column_letter(self.column_number(column))
    }

    pub fn width(&self) -> usize {
        self.column_number(ReportColumn::Card)
    }

    pub fn data_row(&self, index: usize) -> usize {
        Self::FIRST_DATA_ROW + index
    }

    /// Equals the header row when there are no data rows.
    pub fn last_data_row(&self) -> usize {
        Self::HEADER_ROW + self.row_count
    }

    pub fn summary_row(&self) -> usize {
        self.last_data_row() + 2
    }

    pub fn data_range(&self, column: ReportColumn) -> CellRange {
        CellRange {
            column: self.column_number(column),
            first_row: Self::FIRST_DATA_ROW,
            last_row: self.last_data_row(),
        }
    }

    pub fn criteria_range(&self) -> CellRange {
        self.data_range(ReportColumn::CancelledFlag)
    }

    /// Sums `column` over receipts whose cancelled flag reads as not cancelled.
    pub fn active_sum_formula(&self, column: ReportColumn) -> ConditionalSumFormula {
        ConditionalSumFormula {
            sum_range: self.data_range(column),
            criteria_range: self.criteria_range(),
            criteria: CancellationState::Active.flag_label().to_string(),
        }
    }

    pub fn header_label(&self, column: ReportColumn, catalog: &ColumnCatalog) -> String {
        match column {
            ReportColumn::Service(position) => catalog
                .get(position)
                .map(|e| e.display_name.clone())
                .unwrap_or_default(),
            other => other.fixed_label().to_string(),
        }
    }

    pub fn header_cells(&self, catalog: &ColumnCatalog) -> Vec<ReportCell> {
        self.columns()
            .into_iter()
            .map(|column| {
                let label = self.header_label(column, catalog);
                ReportCell::text(Self::HEADER_ROW, self.column_number(column), Some(&label))
                    .annotated(CellAnnotation::ColumnHeader)
            })
            .collect()
    }

    pub fn row_cells(&self, index: usize, row: &ReportRow) -> Vec<ReportCell> {
        let sheet_row = self.data_row(index);
        let cancelled = !row.is_active();

        self.columns()
            .into_iter()
            .map(|column| {
                let content = match column {
                    ReportColumn::Branch => text_content(row.branch.as_deref()),
                    ReportColumn::MemberCode => text_content(row.member_code.as_deref()),
                    ReportColumn::ReceiptId => text_content(row.receipt_id.as_deref()),
                    ReportColumn::MemberName => text_content(row.member_name.as_deref()),
                    ReportColumn::Date => text_content(row.date.map(format_date).as_deref()),
                    ReportColumn::Governorate => text_content(row.governorate.as_deref()),
                    ReportColumn::AmountInWords => CellContent::Text(row.amount_in_words.clone()),
                    ReportColumn::CancelledFlag => {
                        CellContent::Text(row.state().flag_label().to_string())
                    }
                    ReportColumn::Status => CellContent::Text(row.state().label().to_string()),
                    ReportColumn::CancelledBy => text_content(row.cancelled_by.as_deref()),
                    ReportColumn::CancelledAt => text_content(row.cancelled_at.as_deref()),
                    ReportColumn::Service(position) => CellContent::Number(row.value_at(position)),
                    ReportColumn::Total => CellContent::Number(row.row_total),
                    ReportColumn::Cash => CellContent::Number(row.cash_total),
                    ReportColumn::Card => CellContent::Number(row.card_total),
                };

                let mut cell = ReportCell::new(sheet_row, self.column_number(column), content);
                if cancelled {
                    cell = cell.annotated(CellAnnotation::CancelledRow);
                    if column == ReportColumn::CancelledFlag {
                        cell = cell.annotated(CellAnnotation::CancelledFlag);
                    }
                }
                cell
            })
            .collect()
    }
}

fn text_content(value: Option<&str>) -> CellContent {
    match value {
        Some(v) => CellContent::Text(v.to_string()),
        None => CellContent::Empty,
    }
}

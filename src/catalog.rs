use crate::error::Result;
use crate::schema::{resolve_year_template, ReportConfig};
use crate::table::RawTable;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnCategory {
    /// Split half and half between the union fund and the pension fund.
    Base,
    /// Goes entirely to the pension fund.
    Pension,
    /// Goes entirely to the union fund.
    Other,
}

/// Name-based rules deciding which columns are service columns and which
/// category each belongs to. Year placeholders are resolved once, against
/// the configured reference year, when the rules are built.
#[derive(Debug, Clone)]
pub struct CatalogRules {
    field_marker: String,
    allow_list: Vec<String>,
    base_suffixes: Vec<String>,
    pension_keyword: String,
}

impl CatalogRules {
    pub fn new(
        field_marker: &str,
        allow_list: Vec<String>,
        base_suffixes: Vec<String>,
        pension_keyword: &str,
    ) -> Self {
        Self {
            field_marker: field_marker.to_string(),
            allow_list,
            base_suffixes,
            pension_keyword: pension_keyword.to_string(),
        }
    }

    pub fn from_config(config: &ReportConfig) -> Result<Self> {
        let base_suffixes = config
            .base_suffixes
            .iter()
            .map(|s| resolve_year_template(s, config.reference_year))
            .collect::<Result<Vec<_>>>()?;

        let allow_list = config
            .synonym_groups
            .iter()
            .map(|g| g.target.clone())
            .chain(config.extra_service_columns.iter().cloned())
            .collect();

        Ok(Self::new(
            &config.field_marker,
            allow_list,
            base_suffixes,
            &config.pension_keyword,
        ))
    }

    pub fn is_eligible(&self, column_name: &str) -> bool {
        column_name.starts_with(&self.field_marker)
            || self.allow_list.iter().any(|n| n == column_name)
    }

    /// Base suffixes win over the pension keyword.
    pub fn categorize(&self, column_name: &str) -> ColumnCategory {
        if self
            .base_suffixes
            .iter()
            .any(|suffix| column_name.ends_with(suffix.as_str()))
        {
            ColumnCategory::Base
        } else if column_name.contains(self.pension_keyword.as_str()) {
            ColumnCategory::Pension
        } else {
            ColumnCategory::Other
        }
    }

    pub fn display_name(&self, column_name: &str) -> String {
        column_name
            .strip_prefix(self.field_marker.as_str())
            .unwrap_or(column_name)
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Zero-based position among the report's service columns.
    pub position: usize,
    /// Index of the column in the working table.
    pub table_index: usize,
    pub column_name: String,
    pub display_name: String,
    pub category: ColumnCategory,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnCatalog {
    entries: Vec<CatalogEntry>,
}

impl ColumnCatalog {
    /// Selects the eligible columns that hold at least one strictly positive
    /// amount, in table order. The result depends on the data and must be
    /// recomputed for every report.
    pub fn discover(table: &RawTable, rules: &CatalogRules) -> Self {
        let mut entries = Vec::new();

        for (table_index, column_name) in table.columns().iter().enumerate() {
            if !rules.is_eligible(column_name) {
                continue;
            }

            let has_amount = table
                .column_values(table_index)
                .any(|cell| cell.as_amount().is_some_and(|v| v > 0.0));
            if !has_amount {
                debug!("Dropping service column '{}': no positive amounts", column_name);
                continue;
            }

            let category = rules.categorize(column_name);
            if category == ColumnCategory::Other {
                warn!(
                    "Service column '{}' matched no base suffix or pension keyword; treating it as Other",
                    column_name
                );
            }

            entries.push(CatalogEntry {
                position: entries.len(),
                table_index,
                column_name: column_name.clone(),
                display_name: rules.display_name(column_name),
                category,
            });
        }

        debug!("Discovered {} service column(s)", entries.len());

        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&CatalogEntry> {
        self.entries.get(position)
    }

    pub fn by_category(&self, category: ColumnCategory) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str("# Service Columns\n\n");

        for (title, category) in [
            ("Base", ColumnCategory::Base),
            ("Pension", ColumnCategory::Pension),
            ("Other", ColumnCategory::Other),
        ] {
            output.push_str(&format!("## {}\n\n", title));
            for entry in self.by_category(category) {
                let marker = if category == ColumnCategory::Other {
                    " ⚠️ **[UNMATCHED]**"
                } else {
                    ""
                };
                output.push_str(&format!(
                    "- {}. {}{}\n",
                    entry.position + 1,
                    entry.display_name,
                    marker
                ));
            }
            output.push('\n');
        }

        output
    }
}

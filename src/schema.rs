use crate::error::{ReportError, Result};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct SynonymGroup {
    #[schemars(
        description = "Canonical column that replaces the group. It is created only when at least one source column exists."
    )]
    pub target: String,

    #[schemars(
        description = "Raw column names that all mean the same service. Their values are summed row by row and the columns are removed."
    )]
    pub sources: Vec<String>,
}

impl SynonymGroup {
    pub fn new(target: &str, sources: &[&str]) -> Self {
        Self {
            target: target.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(ReportError::InvalidSynonymGroup {
                target: self.target.clone(),
                details: "target name is empty".to_string(),
            });
        }
        if self.sources.is_empty() {
            return Err(ReportError::InvalidSynonymGroup {
                target: self.target.clone(),
                details: "group has no source columns".to_string(),
            });
        }
        if let Some(blank) = self.sources.iter().position(|s| s.trim().is_empty()) {
            return Err(ReportError::InvalidSynonymGroup {
                target: self.target.clone(),
                details: format!("source #{} is empty", blank),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ColumnRename {
    #[schemars(description = "Column name as produced by the query")]
    pub from: String,

    #[schemars(
        description = "New column name. May contain {year}, {next_year} or {year_after_next}, resolved against the reference year."
    )]
    pub to: String,
}

impl ColumnRename {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Names of the identity and status fields after renames are applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct FieldNames {
    pub branch: String,
    pub member_code: String,
    pub receipt_id: String,
    pub member_name: String,
    pub date: String,
    pub governorate: String,
    #[schemars(description = "Boolean-like flag: the receipt was cancelled")]
    pub cancelled: String,
    #[schemars(description = "Boolean-like flag: the receipt had been printed")]
    pub printed: String,
    pub cancelled_by: String,
    pub cancelled_at: String,
    #[schemars(
        description = "Administrative expense column. Zero or absent means the receipt was paid in cash, anything else means card."
    )]
    pub admin_expense: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            branch: "الفرع".to_string(),
            member_code: "رقم القيد".to_string(),
            receipt_id: "رقم الايصال".to_string(),
            member_name: "اسم العضو".to_string(),
            date: "التاريخ".to_string(),
            governorate: "المحافظة".to_string(),
            cancelled: "لاغى".to_string(),
            printed: "تمت الطباعة".to_string(),
            cancelled_by: "الغى بواسطة".to_string(),
            cancelled_at: "تاريخ الالغاء".to_string(),
            admin_expense: "_مصاريف ادارية".to_string(),
        }
    }
}

/// Fixed phrases wrapped around the amount in words on every receipt row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct AmountPhrases {
    pub prefix: String,
    pub currency: String,
    pub closing: String,
    pub cancelled_marker: String,
}

impl Default for AmountPhrases {
    fn default() -> Self {
        Self {
            prefix: "فقط".to_string(),
            currency: "جنيه مصري".to_string(),
            closing: "لا غير".to_string(),
            cancelled_marker: "(ملغى)".to_string(),
        }
    }
}

impl AmountPhrases {
    pub fn render(&self, words: &str, cancelled: bool) -> String {
        let phrase = format!("{} {} {} {}", self.prefix, words, self.currency, self.closing);
        if cancelled {
            format!("{} {}", phrase, self.cancelled_marker)
        } else {
            phrase
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct ReportPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ReportConfig {
    #[schemars(description = "Organization shown on the report title line")]
    pub organization_name: String,

    #[schemars(
        description = "Calendar year the report is produced in. Advance-subscription column names are derived from it."
    )]
    pub reference_year: i32,

    #[serde(default)]
    #[schemars(description = "Period printed in the report header, if the query was date bounded")]
    pub period: Option<ReportPeriod>,

    #[schemars(description = "Prefix that marks a column as an internal service amount field")]
    pub field_marker: String,

    pub fields: FieldNames,

    #[serde(default)]
    #[schemars(description = "Renames applied in order after synonym merging")]
    pub column_renames: Vec<ColumnRename>,

    #[serde(default)]
    pub synonym_groups: Vec<SynonymGroup>,

    #[serde(default)]
    #[schemars(
        description = "Additional column names accepted as service columns even without the field marker"
    )]
    pub extra_service_columns: Vec<String>,

    #[schemars(
        description = "Name suffixes of columns whose totals are split equally between the two funds. May contain year placeholders."
    )]
    pub base_suffixes: Vec<String>,

    #[schemars(description = "Substring identifying pension fund columns")]
    pub pension_keyword: String,

    pub phrases: AmountPhrases,
}

impl ReportConfig {
    pub fn new(organization_name: &str, reference_year: i32) -> Self {
        Self {
            organization_name: organization_name.to_string(),
            reference_year,
            period: None,
            field_marker: "_".to_string(),
            fields: FieldNames::default(),
            column_renames: default_column_renames(),
            synonym_groups: default_synonym_groups(),
            extra_service_columns: Vec::new(),
            base_suffixes: vec![
                "اشتراك".to_string(),
                "اشتراك سنة{year}".to_string(),
                "اشتراك مقدم سنة{next_year}".to_string(),
                "اشتراك مقدم سنة{year_after_next}".to_string(),
                "متأخرات".to_string(),
            ],
            pension_keyword: "معاش".to_string(),
            phrases: AmountPhrases::default(),
        }
    }

    pub fn with_period(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.period = Some(ReportPeriod { start, end });
        self
    }

    /// Checks the configuration as a whole so that faults surface before any
    /// row is processed.
    pub fn validate(&self) -> Result<()> {
        if !(1900..=9999).contains(&self.reference_year) {
            return Err(ReportError::InvalidReferenceYear(self.reference_year));
        }

        if self.field_marker.is_empty() {
            return Err(ReportError::EmptyFieldMarker);
        }

        let mut owners: HashMap<&str, &str> = HashMap::new();
        for group in &self.synonym_groups {
            group.validate()?;
            if self
                .synonym_groups
                .iter()
                .filter(|g| g.target == group.target)
                .count()
                > 1
            {
                return Err(ReportError::DuplicateSynonymTarget(group.target.clone()));
            }
            for source in &group.sources {
                if let Some(first) = owners.insert(source.as_str(), group.target.as_str()) {
                    if first != group.target {
                        return Err(ReportError::OverlappingSynonymSource {
                            column: source.clone(),
                            first: first.to_string(),
                            second: group.target.clone(),
                        });
                    }
                }
            }
        }

        if self.pension_keyword.trim().is_empty() {
            return Err(ReportError::InvalidCategoryRule {
                rule: "pension_keyword".to_string(),
                details: "keyword is empty".to_string(),
            });
        }

        for suffix in &self.base_suffixes {
            if suffix.trim().is_empty() {
                return Err(ReportError::InvalidCategoryRule {
                    rule: suffix.clone(),
                    details: "suffix is empty".to_string(),
                });
            }
            resolve_year_template(suffix, self.reference_year)?;
        }

        for rename in &self.column_renames {
            resolve_year_template(&rename.to, self.reference_year)?;
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ReportConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Substitutes `{year}`, `{next_year}` and `{year_after_next}`. Any other
/// `{...}` placeholder is a configuration error.
pub fn resolve_year_template(template: &str, reference_year: i32) -> Result<String> {
    let resolved = template
        .replace("{year}", &reference_year.to_string())
        .replace("{next_year}", &(reference_year + 1).to_string())
        .replace("{year_after_next}", &(reference_year + 2).to_string());

    if resolved.contains('{') || resolved.contains('}') {
        return Err(ReportError::InvalidCategoryRule {
            rule: template.to_string(),
            details: "unknown placeholder; expected {year}, {next_year} or {year_after_next}"
                .to_string(),
        });
    }

    Ok(resolved)
}

pub fn default_column_renames() -> Vec<ColumnRename> {
    vec![
        ColumnRename::new("MemberCode", "رقم القيد"),
        ColumnRename::new("ReceiptID", "رقم الايصال"),
        ColumnRename::new("MemberName", "اسم العضو"),
        ColumnRename::new("Adddate", "التاريخ"),
        ColumnRename::new("StringAmount", "القيمة فقط وقدرها"),
        ColumnRename::new("BranchName", "الفرع"),
        ColumnRename::new("GovernrateName", "المحافظة"),
        ColumnRename::new("cancelled", "لاغى"),
        ColumnRename::new("printed", "تمت الطباعة"),
        ColumnRename::new("CancelledBy", "الغى بواسطة"),
        ColumnRename::new("CancelDate", "تاريخ الالغاء"),
        ColumnRename::new("_AdminExpenses", "_مصاريف ادارية"),
        ColumnRename::new("_NextYearCalculation", "_اشتراك مقدم سنة{next_year}"),
        ColumnRename::new("_NextNextYearCalculation", "_اشتراك مقدم سنة{year_after_next}"),
    ]
}

pub fn default_synonym_groups() -> Vec<SynonymGroup> {
    vec![
        SynonymGroup::new("كارنيه", &["_كارنيه", "_كارنية", "_استخراج كارنيه"]),
        SynonymGroup::new("رسوم قيد", &["_رسم قيد", "_رسوم قيد", "_رسوم القيد"]),
        SynonymGroup::new(
            "استيفاء اجراءات",
            &["_استيفاء", "_استيفاء اجراءات", "_رسوم استيفاء"],
        ),
        SynonymGroup::new("دمغة", &["_دمغة", "_دمغه", "_طابع دمغة"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ReportConfig::new("النقابه العامه للعلاج الطبيعى", 2025);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_reference_year() {
        let config = ReportConfig::new("Test", 25);
        assert!(matches!(
            config.validate(),
            Err(ReportError::InvalidReferenceYear(25))
        ));
    }

    #[test]
    fn test_year_template_resolution() {
        assert_eq!(
            resolve_year_template("_اشتراك مقدم سنة{next_year}", 2025).unwrap(),
            "_اشتراك مقدم سنة2026"
        );
        assert_eq!(
            resolve_year_template("{year}-{year_after_next}", 2025).unwrap(),
            "2025-2027"
        );
        assert!(resolve_year_template("سنة{last_year}", 2025).is_err());
    }

    #[test]
    fn test_empty_synonym_group_rejected() {
        let mut config = ReportConfig::new("Test", 2025);
        config.synonym_groups.push(SynonymGroup::new("فارغ", &[]));
        assert!(matches!(
            config.validate(),
            Err(ReportError::InvalidSynonymGroup { .. })
        ));
    }

    #[test]
    fn test_duplicate_synonym_target_rejected() {
        let mut config = ReportConfig::new("Test", 2025);
        config
            .synonym_groups
            .push(SynonymGroup::new("دمغة", &["_دمغة قديمة"]));
        assert!(matches!(
            config.validate(),
            Err(ReportError::DuplicateSynonymTarget(_))
        ));
    }

    #[test]
    fn test_overlapping_sources_rejected() {
        let mut config = ReportConfig::new("Test", 2025);
        config
            .synonym_groups
            .push(SynonymGroup::new("طوابع", &["_دمغة"]));
        assert!(matches!(
            config.validate(),
            Err(ReportError::OverlappingSynonymSource { .. })
        ));
    }

    #[test]
    fn test_bad_suffix_placeholder_rejected() {
        let mut config = ReportConfig::new("Test", 2025);
        config.base_suffixes.push("سنة{month}".to_string());
        assert!(matches!(
            config.validate(),
            Err(ReportError::InvalidCategoryRule { .. })
        ));
    }

    #[test]
    fn test_amount_phrase_rendering() {
        let phrases = AmountPhrases::default();
        assert_eq!(
            phrases.render("خمسة", false),
            "فقط خمسة جنيه مصري لا غير"
        );
        assert_eq!(
            phrases.render("خمسة", true),
            "فقط خمسة جنيه مصري لا غير (ملغى)"
        );
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = ReportConfig::schema_as_json().unwrap();
        assert!(schema_json.contains("organization_name"));
        assert!(schema_json.contains("reference_year"));
        assert!(schema_json.contains("synonym_groups"));
    }

    #[test]
    fn test_config_round_trip() {
        let config = ReportConfig::new("Test Syndicate", 2025);
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: ReportConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}

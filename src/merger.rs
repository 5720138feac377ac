use crate::error::Result;
use crate::schema::SynonymGroup;
use crate::table::{CellValue, RawTable};
use log::debug;

/// Collapses each configured synonym group into its canonical column.
/// The table is rewritten in place; nothing else holds the pre-merge table.
pub struct ColumnMerger<'a> {
    groups: &'a [SynonymGroup],
}

impl<'a> ColumnMerger<'a> {
    pub fn new(groups: &'a [SynonymGroup]) -> Self {
        Self { groups }
    }

    /// Applies every group in configuration order and returns the targets
    /// that were created.
    pub fn merge_all(&self, table: &mut RawTable) -> Result<Vec<String>> {
        let mut merged = Vec::new();
        for group in self.groups {
            if merge_synonyms(table, group)? {
                merged.push(group.target.clone());
            }
        }
        Ok(merged)
    }
}

/// Replaces the group's source columns with a single `target` column holding
/// the row-wise sum of whichever sources are present (null and non-numeric
/// cells count as zero). A pre-existing `target` column is folded into the
/// sum. Returns `Ok(false)` without touching the table when no source exists.
///
/// The merged column takes the position of the left-most merged column.
pub fn merge_synonyms(table: &mut RawTable, group: &SynonymGroup) -> Result<bool> {
    group.validate()?;

    let mut indices: Vec<usize> = group
        .sources
        .iter()
        .filter_map(|source| table.column_index(source))
        .collect();

    if indices.is_empty() {
        return Ok(false);
    }

    if let Some(existing) = table.column_index(&group.target) {
        indices.push(existing);
    }
    indices.sort_unstable();
    indices.dedup();

    let position = indices[0];
    let values: Vec<CellValue> = table
        .rows()
        .iter()
        .map(|row| {
            let sum: f64 = indices.iter().map(|&i| row[i].amount_or_zero()).sum();
            CellValue::Number(sum)
        })
        .collect();

    let names: Vec<String> = indices
        .iter()
        .map(|&i| table.columns()[i].clone())
        .collect();
    for name in &names {
        table.remove_column(name);
    }

    table.insert_column(position, group.target.clone(), values);

    debug!(
        "Merged {} column(s) {:?} into '{}'",
        names.len(),
        names,
        group.target
    );

    Ok(true)
}

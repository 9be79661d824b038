//! The cleaning pipeline.
//!
//! Runs in a fixed order: exact-duplicate removal, per-column value repair
//! driven by the inferred semantic types, anomaly detection, and finally
//! imputation of remaining gaps. Every change is recorded in a
//! [`CleanSummary`] so the report can account for it.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::debug;

use crate::error::Result;
use crate::infer::{SemanticType, TypeDetector};
use crate::repair::{normalize_date, normalize_number, parse_bool};
use crate::table::Table;

/// Fraction of non-null values that must convert before a column is
/// committed to a repaired type.
const CONVERT_THRESHOLD: f64 = 0.5;

/// Everything the pipeline changed, for the report.
#[derive(Debug, Default, Clone)]
pub struct CleanSummary {
    /// Exact-duplicate rows dropped.
    pub duplicates_removed: usize,
    /// Imputed columns as (column, filled count, method).
    pub imputed: Vec<(String, usize, String)>,
    /// Unconvertible values left missing, as (column, count).
    pub invalid: Vec<(String, usize)>,
    /// Value transformations per column, in column order.
    pub transformations: Vec<(String, Vec<String>)>,
    /// Warnings and anomaly notes.
    pub warnings: Vec<String>,
    /// Final semantic type per column.
    pub column_types: Vec<(String, SemanticType)>,
}

impl CleanSummary {
    /// Total values imputed across all columns.
    pub fn imputed_total(&self) -> usize {
        self.imputed.iter().map(|(_, n, _)| n).sum()
    }
}

/// Working representation of a column between pipeline stages.
enum ColumnValues {
    Numbers(Vec<Option<f64>>),
    Bools(Vec<Option<bool>>),
    Strings(Vec<Option<String>>),
}

/// Configurable cleaning pipeline.
pub struct Cleaner {
    detector: TypeDetector,
    impute: bool,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl Cleaner {
    /// Creates a cleaner with imputation enabled.
    pub fn new() -> Self {
        Self {
            detector: TypeDetector::new(),
            impute: true,
        }
    }

    /// Enables or disables imputation of missing values.
    pub fn with_imputation(mut self, impute: bool) -> Self {
        self.impute = impute;
        self
    }

    /// Runs the full pipeline and returns the cleaned table with a summary.
    pub fn clean(&self, table: &Table) -> Result<(Table, CleanSummary)> {
        let mut summary = CleanSummary::default();
        let columns = table.string_columns();

        let columns = remove_duplicate_rows(columns, &mut summary);
        debug!("removed {} duplicate rows", summary.duplicates_removed);

        let mut cleaned: Vec<(String, SemanticType, ColumnValues)> = Vec::new();
        for (name, values) in columns {
            let sample: Vec<&str> = values
                .iter()
                .filter_map(|v| v.as_deref())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .take(20)
                .collect();
            let ty = self.detector.detect_column(&name, &sample);
            let (ty, repaired) = repair_column(&name, ty, values, &mut summary);
            cleaned.push((name, ty, repaired));
        }

        detect_anomalies(&cleaned, &mut summary);

        if self.impute {
            for (name, ty, values) in &mut cleaned {
                impute_column(name, *ty, values, &mut summary);
            }
        }

        summary.column_types = cleaned
            .iter()
            .map(|(name, ty, _)| (name.clone(), *ty))
            .collect();

        let table = build_table(cleaned)?;
        Ok((table, summary))
    }
}

/// Drops rows that duplicate an earlier row in every column. Nulls compare
/// equal to nulls, and the first occurrence is kept.
fn remove_duplicate_rows(
    columns: Vec<(String, Vec<Option<String>>)>,
    summary: &mut CleanSummary,
) -> Vec<(String, Vec<Option<String>>)> {
    let row_count = columns.first().map_or(0, |(_, v)| v.len());
    let mut seen: HashMap<String, ()> = HashMap::with_capacity(row_count);
    let mut keep = Vec::with_capacity(row_count);

    for row in 0..row_count {
        let key = columns
            .iter()
            .map(|(_, values)| values[row].as_deref().unwrap_or("\u{0}NULL"))
            .collect::<Vec<_>>()
            .join("\u{1}");
        if seen.insert(key, ()).is_none() {
            keep.push(row);
        }
    }

    summary.duplicates_removed = row_count - keep.len();
    columns
        .into_iter()
        .map(|(name, values)| {
            let kept = keep.iter().map(|&row| values[row].clone()).collect();
            (name, kept)
        })
        .collect()
}

/// Repairs one column according to its semantic type. Returns the possibly
/// demoted type and the typed values.
fn repair_column(
    name: &str,
    ty: SemanticType,
    values: Vec<Option<String>>,
    summary: &mut CleanSummary,
) -> (SemanticType, ColumnValues) {
    let non_null: Vec<&str> = values
        .iter()
        .filter_map(|v| v.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect();

    if ty.is_protected() {
        let skipped = non_null
            .iter()
            .filter(|v| {
                normalize_number(v).is_some_and(|fix| fix.describe(v).is_some())
            })
            .count();
        if skipped > 0 {
            summary.warnings.push(format!(
                "Column '{name}' preserved verbatim ({ty}); {skipped} value(s) looked repairable but were not touched"
            ));
        }
        return (ty, ColumnValues::Strings(normalize_blanks(values)));
    }

    if ty.is_numeric() {
        let convertible = non_null
            .iter()
            .filter(|v| normalize_number(v).is_some())
            .count();
        if !non_null.is_empty()
            && (convertible as f64) / (non_null.len() as f64) < CONVERT_THRESHOLD
        {
            summary.warnings.push(format!(
                "Column '{name}' has too few convertible numbers; left as text"
            ));
            return (SemanticType::Text, ColumnValues::Strings(normalize_blanks(values)));
        }

        let mut changes = Vec::new();
        let mut invalid = 0;
        let out: Vec<Option<f64>> = values
            .iter()
            .map(|v| match v.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(raw) => match normalize_number(raw) {
                    Some(fix) => {
                        if let Some(change) = fix.describe(raw) {
                            changes.push(change);
                        }
                        Some(fix.value)
                    }
                    None => {
                        invalid += 1;
                        None
                    }
                },
            })
            .collect();
        record_changes(name, changes, invalid, summary);
        return (ty, ColumnValues::Numbers(out));
    }

    if ty == SemanticType::Date {
        let parseable = non_null
            .iter()
            .filter(|v| normalize_date(v).is_some())
            .count();
        if !non_null.is_empty()
            && (parseable as f64) / (non_null.len() as f64) < CONVERT_THRESHOLD
        {
            summary.warnings.push(format!(
                "Column '{name}' has too few parseable dates; left as text"
            ));
            return (SemanticType::Text, ColumnValues::Strings(normalize_blanks(values)));
        }

        let mut changes = Vec::new();
        let mut invalid = 0;
        let out: Vec<Option<String>> = values
            .iter()
            .map(|v| match v.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(raw) => match normalize_date(raw) {
                    Some(iso) => {
                        if iso != raw {
                            changes.push(format!("{raw} -> {iso}"));
                        }
                        Some(iso)
                    }
                    None => {
                        invalid += 1;
                        None
                    }
                },
            })
            .collect();
        record_changes(name, changes, invalid, summary);
        return (SemanticType::Date, ColumnValues::Strings(out));
    }

    if ty == SemanticType::Boolean {
        let all_parse = non_null.iter().all(|v| parse_bool(v).is_some());
        if !all_parse {
            return (SemanticType::Text, ColumnValues::Strings(normalize_blanks(values)));
        }
        let mut changes = Vec::new();
        let out: Vec<Option<bool>> = values
            .iter()
            .map(|v| match v.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(raw) => {
                    let parsed = parse_bool(raw);
                    if let Some(b) = parsed {
                        let rendered = if b { "true" } else { "false" };
                        if rendered != raw {
                            changes.push(format!("{raw} -> {rendered}"));
                        }
                    }
                    parsed
                }
            })
            .collect();
        record_changes(name, changes, 0, summary);
        return (SemanticType::Boolean, ColumnValues::Bools(out));
    }

    (ty, ColumnValues::Strings(normalize_blanks(values)))
}

/// Treats empty and whitespace-only strings as missing.
fn normalize_blanks(values: Vec<Option<String>>) -> Vec<Option<String>> {
    values
        .into_iter()
        .map(|v| v.filter(|s| !s.trim().is_empty()))
        .collect()
}

fn record_changes(
    name: &str,
    changes: Vec<String>,
    invalid: usize,
    summary: &mut CleanSummary,
) {
    if !changes.is_empty() {
        summary.transformations.push((name.to_string(), changes));
    }
    if invalid > 0 {
        summary.invalid.push((name.to_string(), invalid));
        summary.warnings.push(format!(
            "Column '{name}' had {invalid} unconvertible value(s) left missing"
        ));
    }
}

/// Flags values that are syntactically valid but semantically suspect.
fn detect_anomalies(
    columns: &[(String, SemanticType, ColumnValues)],
    summary: &mut CleanSummary,
) {
    for (name, _, values) in columns {
        let ColumnValues::Numbers(numbers) = values else {
            continue;
        };
        let lowered = name.to_lowercase();

        let negatives = numbers
            .iter()
            .flatten()
            .filter(|n| **n < 0.0 && n.is_finite())
            .count();
        let infinites = numbers.iter().flatten().filter(|n| n.is_infinite()).count();

        if ["price", "cost", "amount", "fee"]
            .iter()
            .any(|hint| lowered.contains(hint))
            && negatives > 0
        {
            summary.warnings.push(format!(
                "Column '{name}' has {negatives} negative value(s), which is suspect for a monetary column"
            ));
        }
        if ["stock", "quantity", "qty", "count", "inventory"]
            .iter()
            .any(|hint| lowered.contains(hint))
        {
            if negatives > 0 {
                summary.warnings.push(format!(
                    "Column '{name}' has {negatives} negative value(s), which is suspect for a count column"
                ));
            }
            if infinites > 0 {
                summary.warnings.push(format!(
                    "Column '{name}' has {infinites} infinite value(s)"
                ));
            }
        }
        if ["rating", "score"].iter().any(|hint| lowered.contains(hint)) {
            let high = numbers.iter().flatten().filter(|n| **n > 10.0).count();
            if high > 0 {
                summary.warnings.push(format!(
                    "Column '{name}' has {high} unusually high value(s) (> 10)"
                ));
            }
        }
    }
}

/// Fills missing values: median for numbers, mode for strings and booleans.
/// Dates are left missing, since an invented date is worse than a gap.
fn impute_column(
    name: &str,
    ty: SemanticType,
    values: &mut ColumnValues,
    summary: &mut CleanSummary,
) {
    if ty == SemanticType::Date || ty == SemanticType::Identifier {
        return;
    }
    match values {
        ColumnValues::Numbers(numbers) => {
            let missing = numbers.iter().filter(|v| v.is_none()).count();
            let Some(median) = median(numbers.iter().flatten().copied()) else {
                return;
            };
            if missing == 0 {
                return;
            }
            for slot in numbers.iter_mut().filter(|v| v.is_none()) {
                *slot = Some(median);
            }
            summary
                .imputed
                .push((name.to_string(), missing, "median".to_string()));
            summary.transformations.push((
                name.to_string(),
                vec![format!("NaN -> {median:.2} (median)")],
            ));
        }
        ColumnValues::Bools(bools) => {
            let missing = bools.iter().filter(|v| v.is_none()).count();
            let Some(most_common) = mode(bools.iter().flatten().copied()) else {
                return;
            };
            if missing == 0 {
                return;
            }
            for slot in bools.iter_mut().filter(|v| v.is_none()) {
                *slot = Some(most_common);
            }
            summary
                .imputed
                .push((name.to_string(), missing, "mode".to_string()));
            summary.transformations.push((
                name.to_string(),
                vec![format!("NaN -> {most_common} (mode)")],
            ));
        }
        ColumnValues::Strings(strings) => {
            let missing = strings.iter().filter(|v| v.is_none()).count();
            let Some(most_common) = mode(strings.iter().flatten().cloned()) else {
                return;
            };
            if missing == 0 {
                return;
            }
            for slot in strings.iter_mut().filter(|v| v.is_none()) {
                *slot = Some(most_common.clone());
            }
            summary
                .imputed
                .push((name.to_string(), missing, "mode".to_string()));
            summary.transformations.push((
                name.to_string(),
                vec![format!("NaN -> {most_common} (mode)")],
            ));
        }
    }
}

/// Median of the present values. Averages the middle pair for even counts.
fn median(values: impl Iterator<Item = f64>) -> Option<f64> {
    let mut sorted: Vec<f64> = values.filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Most frequent value, first-seen winning ties.
fn mode<T: Eq + std::hash::Hash + Clone>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: HashMap<T, usize> = HashMap::new();
    let mut order: Vec<T> = Vec::new();
    for value in values {
        let entry = counts.entry(value.clone()).or_insert(0);
        if *entry == 0 {
            order.push(value);
        }
        *entry += 1;
    }
    let mut best: Option<(T, usize)> = None;
    for value in order {
        let count = counts.get(&value).copied().unwrap_or(0);
        if best.as_ref().map_or(true, |(_, c)| count > *c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

/// Rebuilds a typed table from the cleaned columns. Numeric columns become
/// `Int64` when every value is integral, otherwise `Float64`.
fn build_table(columns: Vec<(String, SemanticType, ColumnValues)>) -> Result<Table> {
    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());

    for (name, _, values) in columns {
        let (data_type, array): (DataType, ArrayRef) = match values {
            ColumnValues::Numbers(numbers) => {
                let integral = numbers
                    .iter()
                    .flatten()
                    .all(|n| n.fract() == 0.0 && n.is_finite() && n.abs() < 9.2e18);
                if integral {
                    #[allow(clippy::cast_possible_truncation)]
                    let ints: Int64Array = numbers
                        .into_iter()
                        .map(|v| v.map(|n| n as i64))
                        .collect();
                    (DataType::Int64, Arc::new(ints))
                } else {
                    let floats: Float64Array = numbers.into_iter().collect();
                    (DataType::Float64, Arc::new(floats))
                }
            }
            ColumnValues::Bools(bools) => {
                let array: BooleanArray = bools.into_iter().collect();
                (DataType::Boolean, Arc::new(array))
            }
            ColumnValues::Strings(strings) => {
                let array: StringArray = strings.into_iter().collect();
                (DataType::Utf8, Arc::new(array))
            }
        };
        fields.push(Field::new(&name, data_type, true));
        arrays.push(array);
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema, arrays)?;
    Table::from_batch(batch)
}

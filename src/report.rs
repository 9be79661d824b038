//! Markdown change report.
//!
//! Summarizes a run: what was read and written, what the cleaning pipeline
//! changed, and anything it wants a human to look at. Transformations are
//! grouped into named categories so a hundred currency fixes read as one
//! line with examples, not a hundred lines.

use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use crate::clean::CleanSummary;

/// Fixed category order for the transformations section.
const CATEGORY_ORDER: &[&str] = &[
    "Median Imputation",
    "Mean Imputation",
    "Mode Imputation",
    "Unit/Currency Conversion",
    "Numeric Value Extraction",
    "Date Format Standardization",
    "Text to Number Conversion",
    "Other Transformations",
];

/// Everything the report needs about a run.
pub struct ReportContext<'a> {
    /// Input file path.
    pub input: &'a Path,
    /// Output file path.
    pub output: &'a Path,
    /// Rows read.
    pub input_rows: usize,
    /// Rows written.
    pub output_rows: usize,
    /// Wall-clock duration of the run.
    pub duration: Duration,
    /// Cleaning summary, when cleaning ran.
    pub summary: Option<&'a CleanSummary>,
}

/// Renders the full Markdown report.
pub fn build_report(ctx: &ReportContext) -> String {
    let mut out = String::new();
    out.push_str("# DataMorph Report\n\n");

    out.push_str("## Summary\n\n");
    let _ = writeln!(
        out,
        "- **Input:** {} ({} rows)",
        file_name(ctx.input),
        ctx.input_rows
    );
    let _ = writeln!(
        out,
        "- **Output:** {} ({} rows)",
        file_name(ctx.output),
        ctx.output_rows
    );
    if let Some(summary) = ctx.summary {
        let _ = writeln!(out, "- **Duplicates removed:** {}", summary.duplicates_removed);
        let _ = writeln!(out, "- **Values imputed:** {}", summary.imputed_total());
    }
    let _ = writeln!(out, "- **Duration:** {:.2}s", ctx.duration.as_secs_f64());
    out.push('\n');

    let Some(summary) = ctx.summary else {
        out.push_str("Cleaning was not requested; the data was converted as-is.\n");
        return out;
    };

    if !summary.column_types.is_empty() {
        out.push_str("## Column Types\n\n");
        out.push_str("| Column | Type |\n|---|---|\n");
        for (name, ty) in &summary.column_types {
            let _ = writeln!(out, "| {name} | {ty} |");
        }
        out.push('\n');
    }

    out.push_str("## Applied Transformations\n\n");
    if summary.transformations.is_empty() {
        out.push_str("No values needed repair.\n\n");
    } else {
        render_transformations(&mut out, summary);
    }

    out.push_str("## Notes and Warnings\n\n");
    if summary.warnings.is_empty() {
        out.push_str("None.\n");
    } else {
        for warning in &summary.warnings {
            let _ = writeln!(out, "- {warning}");
        }
    }

    out
}

fn render_transformations(out: &mut String, summary: &CleanSummary) {
    // category -> ordered (column, entries)
    let mut grouped: Vec<(&str, Vec<(&str, Vec<&str>)>)> = CATEGORY_ORDER
        .iter()
        .map(|c| (*c, Vec::new()))
        .collect();

    for (column, entries) in &summary.transformations {
        for entry in entries {
            let category = categorize_transformation(entry);
            let Some((_, columns)) = grouped.iter_mut().find(|(c, _)| *c == category)
            else {
                continue;
            };
            match columns.iter_mut().find(|(name, _)| *name == column.as_str()) {
                Some((_, list)) => list.push(entry.as_str()),
                None => columns.push((column.as_str(), vec![entry.as_str()])),
            }
        }
    }

    for (category, columns) in grouped {
        if columns.is_empty() {
            continue;
        }
        let _ = writeln!(out, "### {category}\n");
        for (column, entries) in columns {
            let _ = writeln!(
                out,
                "- **{}**: {} value(s), e.g. {}",
                column,
                entries.len(),
                format_example_values(&entries)
            );
        }
        out.push('\n');
    }
}

/// Assigns a transformation entry to a report category based on its shape.
pub fn categorize_transformation(entry: &str) -> &'static str {
    if entry.contains("(median)") {
        return "Median Imputation";
    }
    if entry.contains("(mean)") {
        return "Mean Imputation";
    }
    if entry.contains("(mode)") {
        return "Mode Imputation";
    }
    if entry.contains("unit conversion")
        || entry.contains("currency conversion")
        || entry.contains("separator removal")
    {
        return "Unit/Currency Conversion";
    }
    if entry.contains("(extraction)") {
        return "Numeric Value Extraction";
    }
    let (lhs, rhs) = match entry.split_once(" -> ") {
        Some(parts) => parts,
        None => return "Other Transformations",
    };
    if is_iso_date(rhs.trim()) {
        return "Date Format Standardization";
    }
    if lhs.chars().any(|c| c.is_alphabetic()) && rhs.trim().parse::<f64>().is_ok() {
        return "Text to Number Conversion";
    }
    "Other Transformations"
}

/// Up to three example source values, quoted when non-numeric and truncated
/// when long.
fn format_example_values(entries: &[&str]) -> String {
    entries
        .iter()
        .take(3)
        .map(|entry| {
            let lhs = entry.split(" -> ").next().unwrap_or(entry).trim();
            let shown = if lhs.len() > 40 {
                format!("{}...", truncate_on_char_boundary(lhs, 40))
            } else {
                lhs.to_string()
            };
            if shown.parse::<f64>().is_ok() {
                shown
            } else {
                format!("'{shown}'")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Longest prefix of at most `max` bytes that ends on a char boundary.
fn truncate_on_char_boundary(value: &str, max: usize) -> &str {
    let mut end = max.min(value.len());
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

fn is_iso_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && value
            .chars()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infer::SemanticType;
    use std::path::PathBuf;

    fn sample_summary() -> CleanSummary {
        CleanSummary {
            duplicates_removed: 2,
            imputed: vec![("price".to_string(), 1, "median".to_string())],
            invalid: vec![],
            transformations: vec![
                (
                    "price".to_string(),
                    vec![
                        "$50.99 -> 50.99 (currency conversion)".to_string(),
                        "10k -> 10000 (unit conversion k)".to_string(),
                        "NaN -> 25.50 (median)".to_string(),
                    ],
                ),
                (
                    "order_date".to_string(),
                    vec!["01/15/2023 -> 2023-01-15".to_string()],
                ),
                (
                    "sales".to_string(),
                    vec![
                        "twenty five -> 25".to_string(),
                        "100 units -> 100 (extraction)".to_string(),
                    ],
                ),
            ],
            warnings: vec!["Column 'rating' has 1 unusually high value(s) (> 10)".to_string()],
            column_types: vec![
                ("price".to_string(), SemanticType::Currency),
                ("order_date".to_string(), SemanticType::Date),
            ],
        }
    }

    fn render(summary: Option<&CleanSummary>) -> String {
        let input = PathBuf::from("data.csv");
        let output = PathBuf::from("data.json");
        build_report(&ReportContext {
            input: &input,
            output: &output,
            input_rows: 10,
            output_rows: 8,
            duration: Duration::from_millis(420),
            summary,
        })
    }

    #[test]
    fn test_categorize_transformation() {
        assert_eq!(
            categorize_transformation("NaN -> 5.00 (median)"),
            "Median Imputation"
        );
        assert_eq!(
            categorize_transformation("NaN -> red (mode)"),
            "Mode Imputation"
        );
        assert_eq!(
            categorize_transformation("10k -> 10000 (unit conversion k)"),
            "Unit/Currency Conversion"
        );
        assert_eq!(
            categorize_transformation("$50.99 -> 50.99 (currency conversion)"),
            "Unit/Currency Conversion"
        );
        assert_eq!(
            categorize_transformation("100 units -> 100 (extraction)"),
            "Numeric Value Extraction"
        );
        assert_eq!(
            categorize_transformation("01/15/2023 -> 2023-01-15"),
            "Date Format Standardization"
        );
        assert_eq!(
            categorize_transformation("twenty five -> 25"),
            "Text to Number Conversion"
        );
        assert_eq!(categorize_transformation("weird"), "Other Transformations");
    }

    #[test]
    fn test_report_sections() {
        let summary = sample_summary();
        let report = render(Some(&summary));
        assert!(report.starts_with("# DataMorph Report"));
        assert!(report.contains("## Summary"));
        assert!(report.contains("- **Input:** data.csv (10 rows)"));
        assert!(report.contains("- **Duplicates removed:** 2"));
        assert!(report.contains("- **Values imputed:** 1"));
        assert!(report.contains("## Column Types"));
        assert!(report.contains("| price | currency |"));
        assert!(report.contains("## Applied Transformations"));
        assert!(report.contains("### Unit/Currency Conversion"));
        assert!(report.contains("### Date Format Standardization"));
        assert!(report.contains("### Text to Number Conversion"));
        assert!(report.contains("### Median Imputation"));
        assert!(report.contains("## Notes and Warnings"));
        assert!(report.contains("rating"));
    }

    #[test]
    fn test_report_without_cleaning() {
        let report = render(None);
        assert!(report.contains("Cleaning was not requested"));
        assert!(!report.contains("## Column Types"));
    }

    #[test]
    fn test_format_example_values() {
        let entries = vec![
            "$50.99 -> 50.99 (currency conversion)",
            "10k -> 10000 (unit conversion k)",
            "100 -> 100",
            "extra -> 1",
        ];
        let formatted = format_example_values(&entries);
        assert_eq!(formatted, "'$50.99', '10k', 100");

        let long = "x".repeat(60);
        let entry = format!("{long} -> 1");
        let formatted = format_example_values(&[entry.as_str()]);
        assert!(formatted.ends_with("...'"));
        assert!(formatted.len() < 50);
    }

    #[test]
    fn test_format_example_values_multibyte_truncation() {
        // A char straddling the byte limit must not panic the truncation
        let long = format!("{}é tail", "x".repeat(39));
        let entry = format!("{long} -> 1");
        let formatted = format_example_values(&[entry.as_str()]);
        assert!(formatted.ends_with("...'"));

        let euros = format!("€{} -> 1", "9".repeat(45));
        let formatted = format_example_values(&[euros.as_str()]);
        assert!(formatted.starts_with("'€"));
        assert!(formatted.ends_with("...'"));
    }

    #[test]
    fn test_category_order_is_stable() {
        let summary = sample_summary();
        let report = render(Some(&summary));
        let median = report.find("### Median Imputation").unwrap_or(usize::MAX);
        let unit = report.find("### Unit/Currency Conversion").unwrap_or(0);
        assert!(median < unit);
    }
}

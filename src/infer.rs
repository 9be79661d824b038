//! Semantic column type inference.
//!
//! Assigns each column a semantic type from two signals: the column name
//! (strong hints like an `_id` suffix or a `price` substring) and a sample
//! of its values. Name hints win when the content agrees or is ambiguous.

use std::fmt;

use regex::Regex;

use crate::repair::{parse_bool, parse_date};
use crate::table::Table;

/// Number of non-null values sampled per column.
const SAMPLE_SIZE: usize = 20;

/// Semantic type assigned to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    /// Key-like values that must never be coerced.
    Identifier,
    /// Whole numbers.
    Integer,
    /// Numbers with a fractional part.
    Float,
    /// Monetary amounts.
    Currency,
    /// Calendar dates.
    Date,
    /// Boolean flags.
    Boolean,
    /// Free text.
    Text,
    /// Product or model names, which look numeric but are labels.
    ProductName,
    /// Place names and addresses.
    Location,
}

impl SemanticType {
    /// Whether values of this type should be coerced to numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SemanticType::Integer | SemanticType::Float | SemanticType::Currency
        )
    }

    /// Whether this type is preserved verbatim during cleaning.
    pub fn is_protected(&self) -> bool {
        matches!(self, SemanticType::Identifier | SemanticType::ProductName)
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SemanticType::Identifier => "identifier",
            SemanticType::Integer => "integer",
            SemanticType::Float => "floating",
            SemanticType::Currency => "currency",
            SemanticType::Date => "date",
            SemanticType::Boolean => "boolean",
            SemanticType::Text => "string",
            SemanticType::ProductName => "product_name",
            SemanticType::Location => "location",
        };
        write!(f, "{name}")
    }
}

/// Infers semantic column types from names and sampled content.
pub struct TypeDetector {
    product_patterns: Vec<Regex>,
    currency_pattern: Regex,
}

impl Default for TypeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeDetector {
    /// Creates a detector with its patterns compiled once.
    pub fn new() -> Self {
        #[allow(clippy::expect_used)]
        let product_patterns = vec![
            // "Laptop 15", "Galaxy 22"
            Regex::new(r"\b[A-Z][a-z]+\s+\d+\b").expect("valid regex"),
            // "Magic Mouse"
            Regex::new(r"\b[A-Z][a-z]+\s+[A-Z][a-z]+\b").expect("valid regex"),
            // "XPS13", "RTX4090"
            Regex::new(r"\b[A-Z]+\d+\b").expect("valid regex"),
        ];
        #[allow(clippy::expect_used)]
        let currency_pattern =
            Regex::new(r"^\s*[$€£]\s*-?\d|^\s*-?\d[\d,]*(\.\d+)?\s*[$€£]\s*$")
                .expect("valid regex");
        Self {
            product_patterns,
            currency_pattern,
        }
    }

    /// Infers a semantic type for every column, in schema order.
    pub fn detect(&self, table: &Table) -> Vec<(String, SemanticType)> {
        table
            .string_columns()
            .into_iter()
            .map(|(name, values)| {
                let sample: Vec<&str> = values
                    .iter()
                    .filter_map(|v| v.as_deref())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .take(SAMPLE_SIZE)
                    .collect();
                let ty = self.detect_column(&name, &sample);
                (name, ty)
            })
            .collect()
    }

    /// Infers a single column's type from its name and a content sample.
    pub fn detect_column(&self, name: &str, sample: &[&str]) -> SemanticType {
        let lowered = name.to_lowercase();

        if lowered == "id" || lowered.ends_with("_id") || lowered.ends_with(" id") {
            return SemanticType::Identifier;
        }
        if ["name", "title", "product", "model"]
            .iter()
            .any(|hint| lowered.contains(hint))
        {
            if self.looks_like_product_names(sample) {
                return SemanticType::ProductName;
            }
            return SemanticType::Text;
        }
        if ["date", "time", "created", "updated"]
            .iter()
            .any(|hint| lowered.contains(hint))
        {
            return SemanticType::Date;
        }
        if ["price", "cost", "amount", "fee"]
            .iter()
            .any(|hint| lowered.contains(hint))
        {
            return SemanticType::Currency;
        }
        if ["location", "address", "city", "country", "street"]
            .iter()
            .any(|hint| lowered.contains(hint))
        {
            return SemanticType::Location;
        }

        self.detect_from_content(sample)
    }

    fn detect_from_content(&self, sample: &[&str]) -> SemanticType {
        if sample.is_empty() {
            return SemanticType::Text;
        }
        let total = sample.len() as f64;

        let booleans = sample.iter().filter(|v| parse_bool(v).is_some()).count();
        if booleans as f64 / total >= 0.5 {
            return SemanticType::Boolean;
        }

        let dates = sample.iter().filter(|v| parse_date(v).is_some()).count();
        if dates as f64 / total > 0.5 {
            return SemanticType::Date;
        }

        let currencies = sample
            .iter()
            .filter(|v| self.currency_pattern.is_match(v))
            .count();
        if currencies as f64 / total > 0.2 {
            return SemanticType::Currency;
        }

        let numbers: Vec<f64> = sample
            .iter()
            .filter_map(|v| v.replace(',', "").parse::<f64>().ok())
            .collect();
        if numbers.len() as f64 / total > 0.5 {
            if numbers.iter().all(|n| n.fract() == 0.0) {
                return SemanticType::Integer;
            }
            return SemanticType::Float;
        }

        SemanticType::Text
    }

    fn looks_like_product_names(&self, sample: &[&str]) -> bool {
        if sample.is_empty() {
            return false;
        }
        let hits = sample
            .iter()
            .filter(|v| self.product_patterns.iter().any(|p| p.is_match(v)))
            .count();
        hits as f64 / sample.len() as f64 > 0.3
    }
}

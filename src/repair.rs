//! Per-value repair heuristics.
//!
//! Coerces malformed cell values into their inferred semantic type: numbers
//! hidden in currency strings, unit suffixes, thousands separators, number
//! words or mixed text; dates in a range of numeric and textual layouts;
//! boolean tokens. Every coercion can describe itself for the change report.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a number with optional currency symbol, thousands separators,
/// magnitude suffix and trailing unit text.
///
/// Groups: 1=leading currency, 2=number, 3=magnitude suffix,
/// 4=trailing currency, 5=trailing unit text.
#[allow(clippy::expect_used)]
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([$€£])?\s*(-?\d+(?:,\d{3})*(?:\.\d+)?)\s*([kKmMbB])?\s*([$€£])?\s*([A-Za-z%].*)?$")
        .expect("valid regex")
});

/// Matches ordinal day suffixes ("20th", "1st") for textual date parsing.
#[allow(clippy::expect_used)]
static ORDINAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})(?:st|nd|rd|th)\b").expect("valid regex")
});

/// Date layouts tried in order. Day-first variants come before month-first,
/// so ambiguous values like "03/04/2021" resolve to April 3rd.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%m-%d-%Y",
];

/// Textual layouts tried after ordinal suffixes and commas are stripped.
const TEXTUAL_DATE_FORMATS: &[&str] = &["%d %B %Y", "%d %b %Y", "%B %d %Y", "%b %d %Y"];

/// How a numeric value was recovered from its raw form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairAction {
    /// Parsed directly (possibly scientific notation).
    Parsed,
    /// Currency symbol stripped.
    Currency,
    /// Magnitude suffix applied (k, M, B).
    Unit(char),
    /// Thousands separators removed.
    Separators,
    /// Number extracted from surrounding text.
    Extraction,
    /// Number words converted.
    Words,
}

/// A numeric value recovered from a malformed cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberFix {
    /// The recovered value.
    pub value: f64,
    /// How it was recovered.
    pub action: RepairAction,
}

impl NumberFix {
    /// Describes the repair for the change report, or `None` when the raw
    /// value already rendered identically.
    pub fn describe(&self, raw: &str) -> Option<String> {
        let rendered = format_number(self.value);
        match self.action {
            RepairAction::Parsed => {
                if rendered == raw.trim() {
                    None
                } else {
                    Some(format!("{} -> {}", raw.trim(), rendered))
                }
            }
            RepairAction::Currency => {
                Some(format!("{} -> {} (currency conversion)", raw.trim(), rendered))
            }
            RepairAction::Unit(suffix) => Some(format!(
                "{} -> {} (unit conversion {})",
                raw.trim(),
                rendered,
                suffix
            )),
            RepairAction::Separators => Some(format!(
                "{} -> {} (separator removal)",
                raw.trim(),
                rendered
            )),
            RepairAction::Extraction => {
                Some(format!("{} -> {} (extraction)", raw.trim(), rendered))
            }
            RepairAction::Words => Some(format!("{} -> {}", raw.trim(), rendered)),
        }
    }
}

/// Attempts to recover a number from a raw cell value.
///
/// Tries, in order: direct parse (covers scientific notation), the pattern
/// of currency symbol / separators / magnitude suffix / trailing unit text,
/// and finally number words.
pub fn normalize_number(raw: &str) -> Option<NumberFix> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = trimmed.parse::<f64>() {
        return Some(NumberFix {
            value,
            action: RepairAction::Parsed,
        });
    }

    if let Some(caps) = NUMBER_RE.captures(trimmed) {
        let number = caps.get(2)?.as_str();
        let bare: String = number.replace(',', "");
        let mut value: f64 = bare.parse().ok()?;

        let suffix = caps.get(3).map(|m| m.as_str().chars().next());
        let suffix = suffix.flatten();
        if let Some(s) = suffix {
            value *= match s.to_ascii_lowercase() {
                'k' => 1_000.0,
                'm' => 1_000_000.0,
                _ => 1_000_000_000.0,
            };
        }

        let has_currency = caps.get(1).is_some() || caps.get(4).is_some();
        let action = if has_currency {
            RepairAction::Currency
        } else if let Some(s) = suffix {
            RepairAction::Unit(s)
        } else if number.contains(',') {
            RepairAction::Separators
        } else if caps.get(5).is_some() {
            RepairAction::Extraction
        } else {
            RepairAction::Parsed
        };

        return Some(NumberFix { value, action });
    }

    words_to_number(trimmed).map(|value| NumberFix {
        value,
        action: RepairAction::Words,
    })
}

/// Converts number words to a value.
///
/// Handles tens/units compounds ("twenty five", "twenty-five"), hundred and
/// thousand scales ("one thousand two hundred"), decimal digits after
/// "point" ("four point eight"), and ignores connective or currency words
/// ("one thousand and fifty", "fifty dollars").
pub fn words_to_number(text: &str) -> Option<f64> {
    let lowered = text.to_lowercase().replace('-', " ");
    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    let (int_tokens, frac_tokens) = match tokens.iter().position(|t| *t == "point") {
        Some(idx) => (&tokens[..idx], &tokens[idx + 1..]),
        None => (&tokens[..], &[][..]),
    };

    let mut total = 0.0;
    let mut current = 0.0;
    let mut matched = false;

    for token in int_tokens {
        if is_filler_word(token) {
            continue;
        }
        if let Some(value) = small_number_word(token) {
            current += value;
            matched = true;
        } else {
            match *token {
                "hundred" => {
                    current = if current == 0.0 { 100.0 } else { current * 100.0 };
                    matched = true;
                }
                "thousand" => {
                    total += if current == 0.0 { 1000.0 } else { current * 1000.0 };
                    current = 0.0;
                    matched = true;
                }
                "million" => {
                    total += if current == 0.0 {
                        1_000_000.0
                    } else {
                        current * 1_000_000.0
                    };
                    current = 0.0;
                    matched = true;
                }
                _ => return None,
            }
        }
    }

    if !matched {
        return None;
    }

    let mut value = total + current;

    if !frac_tokens.is_empty() {
        let mut scale = 0.1;
        for token in frac_tokens {
            if is_filler_word(token) {
                continue;
            }
            let digit = small_number_word(token).filter(|d| *d < 10.0)?;
            value += digit * scale;
            scale /= 10.0;
        }
    }

    Some(value)
}

fn is_filler_word(token: &str) -> bool {
    matches!(
        token,
        "and" | "dollar" | "dollars" | "euro" | "euros" | "pound" | "pounds" | "usd"
    )
}

fn small_number_word(token: &str) -> Option<f64> {
    let value = match token {
        "zero" => 0.0,
        "one" => 1.0,
        "two" => 2.0,
        "three" => 3.0,
        "four" => 4.0,
        "five" => 5.0,
        "six" => 6.0,
        "seven" => 7.0,
        "eight" => 8.0,
        "nine" => 9.0,
        "ten" => 10.0,
        "eleven" => 11.0,
        "twelve" => 12.0,
        "thirteen" => 13.0,
        "fourteen" => 14.0,
        "fifteen" => 15.0,
        "sixteen" => 16.0,
        "seventeen" => 17.0,
        "eighteen" => 18.0,
        "nineteen" => 19.0,
        "twenty" => 20.0,
        "thirty" => 30.0,
        "forty" => 40.0,
        "fifty" => 50.0,
        "sixty" => 60.0,
        "seventy" => 70.0,
        "eighty" => 80.0,
        "ninety" => 90.0,
        _ => return None,
    };
    Some(value)
}

/// Attempts to parse a date from any of the supported layouts, including
/// textual forms with ordinal day suffixes ("20th Feb 2023").
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    // ISO timestamps keep their date component
    if let Some(prefix) = trimmed.get(..10) {
        if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
            return Some(date);
        }
    }

    let textual = ORDINAL_RE.replace_all(trimmed, "$1").replace(',', " ");
    let textual = textual.split_whitespace().collect::<Vec<_>>().join(" ");
    for format in TEXTUAL_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&textual, format) {
            return Some(date);
        }
    }

    None
}

/// Normalizes a date value to ISO `YYYY-MM-DD`, if it parses at all.
pub fn normalize_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|d| d.format("%Y-%m-%d").to_string())
}

/// Normalizes a boolean token.
///
/// Truthy: true/t/yes/y/1/active. Falsy: false/f/no/n/0/inactive.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" | "active" => Some(true),
        "false" | "f" | "no" | "n" | "0" | "inactive" => Some(false),
        _ => None,
    }
}

/// Renders a number the way repaired columns are reported: integral values
/// without a fractional part, everything else in shortest float form.
#[allow(clippy::cast_possible_truncation)]
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    value.to_string()
}

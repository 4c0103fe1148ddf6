//! Value comparators for attribute predicates.
//!
//! Both sides are compared in normalized (trimmed, lower-cased) form; `%=`
//! patterns are compiled as written and matched case-insensitively.
//! Ordering operators compare numerically when both sides parse as numbers
//! and lexicographically otherwise.

use super::tokens::normalize;
use super::{SearchError, SearchResult};
use regex::Regex;
use std::cmp::Ordering;

/// Compiled comparison against one operand.
#[derive(Debug, Clone)]
pub enum Comparator {
    Equals(String),
    NotEquals(String),
    Contains(String),
    StartsWith(String),
    EndsWith(String),
    Matches(Regex),
    Greater(String),
    GreaterOrEqual(String),
    Less(String),
    LessOrEqual(String),
}

impl Comparator {
    /// Builds a comparator from an operator and its operand.
    ///
    /// # Errors
    /// - Unsupported operator.
    /// - `%=` operand that is not a valid regular expression.
    pub fn parse(operator: &str, raw_operand: &str) -> SearchResult<Self> {
        let operand = normalize(raw_operand);
        let comparator = match operator.trim() {
            "=" => Self::Equals(operand),
            "!=" => Self::NotEquals(operand),
            "*=*" => Self::Contains(operand),
            "=*" => Self::StartsWith(operand),
            "*=" => Self::EndsWith(operand),
            "%=" => {
                // Not lower-cased: that would turn `\D` into `\d`.
                let pattern = raw_operand.trim();
                let regex = Regex::new(&format!("(?i){pattern}")).map_err(|err| {
                    SearchError::InvalidRegex {
                        pattern: pattern.to_string(),
                        message: err.to_string(),
                    }
                })?;
                Self::Matches(regex)
            }
            ">" => Self::Greater(operand),
            ">=" => Self::GreaterOrEqual(operand),
            "<" => Self::Less(operand),
            "<=" => Self::LessOrEqual(operand),
            other => return Err(SearchError::InvalidOperator(other.to_string())),
        };
        Ok(comparator)
    }

    /// Whether `value` satisfies this comparison.
    pub fn matches(&self, value: &str) -> bool {
        let value = normalize(value);
        match self {
            Self::Equals(operand) => value == *operand,
            Self::NotEquals(operand) => value != *operand,
            Self::Contains(operand) => value.contains(operand.as_str()),
            Self::StartsWith(operand) => value.starts_with(operand.as_str()),
            Self::EndsWith(operand) => value.ends_with(operand.as_str()),
            Self::Matches(regex) => regex.is_match(&value),
            Self::Greater(operand) => compare_values(&value, operand) == Ordering::Greater,
            Self::GreaterOrEqual(operand) => compare_values(&value, operand) != Ordering::Less,
            Self::Less(operand) => compare_values(&value, operand) == Ordering::Less,
            Self::LessOrEqual(operand) => compare_values(&value, operand) != Ordering::Greater,
        }
    }
}

fn compare_values(value: &str, operand: &str) -> Ordering {
    match (value.parse::<f64>(), operand.parse::<f64>()) {
        (Ok(left), Ok(right)) => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
        _ => value.cmp(operand),
    }
}

//! Column type classification from observed string values.
//!
//! Classification walks an ordered rule list; the first rule every non-empty
//! value satisfies decides the column type. Boolean comes first, so a column
//! of only `0`/`1` is a boolean even though those values are also integers.

use std::{fmt, sync::OnceLock};

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TypeTag {
    Integer,
    Decimal,
    Boolean,
    Text,
}

impl TypeTag {
    pub fn sql_type(self) -> &'static str {
        match self {
            TypeTag::Integer => "INTEGER",
            TypeTag::Decimal => "DECIMAL",
            TypeTag::Boolean => "BOOLEAN",
            TypeTag::Text => "TEXT",
        }
    }

    /// Maps an engine-declared column type onto a tag using SQLite's
    /// affinity rules, with booleans split out.
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.to_ascii_uppercase();
        if upper.contains("INT") {
            TypeTag::Integer
        } else if upper.contains("BOOL") {
            TypeTag::Boolean
        } else if ["DEC", "REAL", "FLOA", "DOUB", "NUM"]
            .iter()
            .any(|token| upper.contains(token))
        {
            TypeTag::Decimal
        } else {
            TypeTag::Text
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type())
    }
}

fn integer_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-?[0-9]+$").expect("valid integer pattern"))
}

fn decimal_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^-?[0-9]*\.[0-9]+$").expect("valid decimal pattern"))
}

pub fn is_integer(value: &str) -> bool {
    integer_pattern().is_match(value)
}

pub fn is_decimal(value: &str) -> bool {
    decimal_pattern().is_match(value) || is_integer(value)
}

pub fn is_boolean(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "true" | "false" | "0" | "1" | "yes" | "no"
    )
}

const RULES: &[(fn(&str) -> bool, TypeTag)] = &[
    (is_boolean, TypeTag::Boolean),
    (is_integer, TypeTag::Integer),
    (is_decimal, TypeTag::Decimal),
];

/// Classifies one column from all of its observed values.
///
/// Empty strings are ignored; a column with no non-empty value is `Text`.
pub fn classify<S: AsRef<str>>(values: &[S]) -> TypeTag {
    let observed = values
        .iter()
        .map(AsRef::as_ref)
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>();
    if observed.is_empty() {
        return TypeTag::Text;
    }
    RULES
        .iter()
        .find(|(accepts, _)| observed.iter().all(|v| accepts(v)))
        .map(|(_, tag)| *tag)
        .unwrap_or(TypeTag::Text)
}

/// Classifies every column of `rows`, sampling the first `sample_rows` rows
/// (0 scans all). Fields missing from short rows count as empty.
pub fn classify_columns<R: AsRef<[String]>>(
    column_count: usize,
    rows: &[R],
    sample_rows: usize,
) -> Vec<TypeTag> {
    let limit = if sample_rows == 0 {
        rows.len()
    } else {
        sample_rows.min(rows.len())
    };
    let sample = &rows[..limit];
    (0..column_count)
        .map(|idx| {
            let values = sample
                .iter()
                .map(|row| row.as_ref().get(idx).map(String::as_str).unwrap_or(""))
                .collect::<Vec<_>>();
            classify(&values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_each_kind() {
        assert_eq!(classify(&["1", "2", "-3"]), TypeTag::Integer);
        assert_eq!(classify(&["1.5", "2"]), TypeTag::Decimal);
        assert_eq!(classify(&["true", "0", "yes"]), TypeTag::Boolean);
        assert_eq!(classify(&["1", "2", "abc"]), TypeTag::Text);
    }

    #[test]
    fn blank_columns_fall_back_to_text() {
        assert_eq!(classify(&["", "", ""]), TypeTag::Text);
        assert_eq!(classify::<&str>(&[]), TypeTag::Text);
    }

    #[test]
    fn blanks_are_ignored_among_values() {
        assert_eq!(classify(&["", "4", ""]), TypeTag::Integer);
        assert_eq!(classify(&["NO", "", "Yes"]), TypeTag::Boolean);
    }

    #[test]
    fn zero_one_columns_prefer_boolean() {
        assert_eq!(classify(&["0", "1", "1"]), TypeTag::Boolean);
        assert_eq!(classify(&["0", "1", "2"]), TypeTag::Integer);
    }

    #[test]
    fn decimal_forms() {
        assert!(is_decimal(".5"));
        assert!(is_decimal("-0.25"));
        assert!(!is_decimal("1."));
        assert!(!is_decimal("1e5"));
        assert_eq!(classify(&["-.5", "10"]), TypeTag::Decimal);
    }

    #[test]
    fn only_ascii_digits_are_numeric() {
        assert_eq!(classify(&["١٢٣", "٤٥"]), TypeTag::Text);
        assert_eq!(classify(&["１２", "３.５"]), TypeTag::Text);
        assert!(!is_integer("٣"));
        assert!(!is_decimal("0.٥"));
    }

    #[test]
    fn classify_columns_respects_sample_limit() {
        let rows = vec![
            vec!["1".to_string(), "x".to_string()],
            vec!["2".to_string()],
            vec!["abc".to_string(), "y".to_string()],
        ];
        let sampled = classify_columns(2, &rows, 2);
        assert_eq!(sampled, vec![TypeTag::Integer, TypeTag::Text]);
        let full = classify_columns(2, &rows, 0);
        assert_eq!(full, vec![TypeTag::Text, TypeTag::Text]);
    }

    #[test]
    fn declared_types_map_back_to_tags() {
        assert_eq!(TypeTag::from_declared("INT"), TypeTag::Integer);
        assert_eq!(TypeTag::from_declared("integer"), TypeTag::Integer);
        assert_eq!(TypeTag::from_declared("BOOLEAN"), TypeTag::Boolean);
        assert_eq!(TypeTag::from_declared("DECIMAL"), TypeTag::Decimal);
        assert_eq!(TypeTag::from_declared("REAL"), TypeTag::Decimal);
        assert_eq!(TypeTag::from_declared("VARCHAR"), TypeTag::Text);
        assert_eq!(TypeTag::from_declared(""), TypeTag::Text);
    }
}

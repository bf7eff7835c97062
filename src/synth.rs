//! DDL synthesis for ingested and altered tables.
//!
//! Identifiers only have their whitespace normalized to underscores, then are
//! emitted double-quoted so arbitrary header text cannot break out of the
//! statement.

use itertools::Itertools;
use log::warn;

use crate::classify::TypeTag;

const ALLOWED_COLUMN_TYPES: &[(&str, &str)] = &[
    ("TEXT", "TEXT"),
    ("VARCHAR", "TEXT"),
    ("INT", "INT"),
    ("INTEGER", "INT"),
    ("DECIMAL", "DECIMAL"),
    ("REAL", "REAL"),
    ("BOOLEAN", "BOOLEAN"),
];

pub fn sanitize_identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Table name for an uploaded file: its base name up to the first `.`.
pub fn derive_table_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    let stem = base.split('.').next().unwrap_or(base);
    sanitize_identifier(stem)
}

pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn create_table_sql(table: &str, columns: &[(String, TypeTag)]) -> String {
    let definitions = columns
        .iter()
        .map(|(name, tag)| {
            format!(
                "{} {}",
                quote_identifier(&sanitize_identifier(name)),
                tag.sql_type()
            )
        })
        .join(", ");
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({definitions})",
        quote_identifier(&sanitize_identifier(table))
    )
}

/// Resolves a requested column type against the allow-list. Unknown types
/// become `TEXT`.
pub fn normalize_column_type(requested: &str) -> &'static str {
    let upper = requested.trim().to_ascii_uppercase();
    match ALLOWED_COLUMN_TYPES
        .iter()
        .find(|(alias, _)| *alias == upper)
    {
        Some((_, declared)) => *declared,
        None => {
            warn!("Unrecognized column type '{requested}', using TEXT");
            "TEXT"
        }
    }
}

pub fn add_column_sql(table: &str, column: &str, requested_type: &str) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        quote_identifier(&sanitize_identifier(table)),
        quote_identifier(&sanitize_identifier(column)),
        normalize_column_type(requested_type)
    )
}

pub fn insert_sql(table: &str, column_count: usize) -> String {
    let placeholders = (1..=column_count).map(|i| format!("?{i}")).join(", ");
    format!(
        "INSERT INTO {} VALUES ({placeholders})",
        quote_identifier(table)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_statement_uses_inferred_types() {
        let sql = create_table_sql(
            "sales data",
            &[
                ("user id".to_string(), TypeTag::Integer),
                ("amount".to_string(), TypeTag::Decimal),
            ],
        );
        assert_eq!(
            sql,
            r#"CREATE TABLE IF NOT EXISTS "sales_data" ("user_id" INTEGER, "amount" DECIMAL)"#
        );
    }

    #[test]
    fn embedded_quotes_are_escaped() {
        assert_eq!(quote_identifier(r#"a"b"#), r#""a""b""#);
    }

    #[test]
    fn table_names_come_from_file_stem() {
        assert_eq!(derive_table_name("my users.csv"), "my_users");
        assert_eq!(derive_table_name("orders.2024.csv"), "orders");
        assert_eq!(derive_table_name("/tmp/data/items.tsv"), "items");
        assert_eq!(derive_table_name("plain"), "plain");
    }

    #[test]
    fn add_column_normalizes_requested_type() {
        assert_eq!(
            add_column_sql("t", "new col", "real"),
            r#"ALTER TABLE "t" ADD COLUMN "new_col" REAL"#
        );
        assert_eq!(normalize_column_type("varchar"), "TEXT");
        assert_eq!(normalize_column_type("Boolean"), "BOOLEAN");
        assert_eq!(normalize_column_type("blob; DROP TABLE t"), "TEXT");
    }

    #[test]
    fn insert_statement_has_numbered_placeholders() {
        assert_eq!(insert_sql("t", 3), r#"INSERT INTO "t" VALUES (?1, ?2, ?3)"#);
    }
}

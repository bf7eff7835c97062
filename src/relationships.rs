//! Foreign-key style links inferred from column naming.
//!
//! A column `<name>_id` links to a table called `<name>` and to one called
//! `<name>s`. Both links are reported when both tables exist. Nothing here
//! checks row values; the result is a view over the current schema.

use serde::Serialize;

const ID_SUFFIX: &str = "_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    pub source_table: String,
    pub source_column: String,
    pub target_table: String,
}

/// Derives relationships from `(table, column names)` pairs.
pub fn infer_relationships<T, C, S>(tables: &[(T, C)]) -> Vec<Relationship>
where
    T: AsRef<str>,
    C: AsRef<[S]>,
    S: AsRef<str>,
{
    let names = tables.iter().map(|(name, _)| name.as_ref()).collect::<Vec<_>>();
    let mut relationships = Vec::new();
    for (source, columns) in tables {
        for column in columns.as_ref() {
            let column = column.as_ref();
            let Some(candidate) = column.strip_suffix(ID_SUFFIX) else {
                continue;
            };
            let plural = format!("{candidate}s");
            for target in &names {
                if *target == candidate || *target == plural {
                    relationships.push(Relationship {
                        source_table: source.as_ref().to_string(),
                        source_column: column.to_string(),
                        target_table: target.to_string(),
                    });
                }
            }
        }
    }
    relationships
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, columns: &[&str]) -> (String, Vec<String>) {
        (
            name.to_string(),
            columns.iter().map(|c| c.to_string()).collect(),
        )
    }

    #[test]
    fn links_to_plural_table() {
        let tables = vec![table("users", &["id", "name"]), table("orders", &["id", "user_id"])];
        let rels = infer_relationships(&tables);
        assert_eq!(
            rels,
            vec![Relationship {
                source_table: "orders".to_string(),
                source_column: "user_id".to_string(),
                target_table: "users".to_string(),
            }]
        );
    }

    #[test]
    fn singular_and_plural_targets_both_fire() {
        let tables = vec![
            table("user", &["id"]),
            table("users", &["id"]),
            table("orders", &["user_id"]),
        ];
        let targets = infer_relationships(&tables)
            .into_iter()
            .map(|r| r.target_table)
            .collect::<Vec<_>>();
        assert_eq!(targets, vec!["user", "users"]);
    }

    #[test]
    fn unmatched_and_non_suffix_columns_are_ignored() {
        let tables = vec![
            table("orders", &["customer_id", "id", "identity", "user_idx"]),
            table("users", &["id"]),
        ];
        assert!(infer_relationships(&tables).is_empty());
    }

    #[test]
    fn self_reference_is_reported() {
        let tables = vec![table("nodes", &["id", "node_id"])];
        let rels = infer_relationships(&tables);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].target_table, "nodes");
    }

    #[test]
    fn bare_suffix_column_targets_s_table() {
        let tables = vec![table("s", &["_id"])];
        assert_eq!(infer_relationships(&tables).len(), 1);
    }
}

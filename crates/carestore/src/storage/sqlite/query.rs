//! Translation of lookup expressions into SQL predicates.
//!
//! Comparison mapping: Equal becomes `=`, Like becomes a case-sensitive
//! `instr` containment test (SQLite's own `LIKE` is ASCII-case-insensitive
//! and would disagree with the in-memory backend), In expands to an `IN`
//! list, and the orderings map straight through. Multiple lookups fold
//! into one `AND` conjunction in lookup order.

use uuid::Uuid;

use carestore_core::query::{Comparison, Lookup};
use carestore_core::records::{fields, Record};

use super::conversions::{format_datetime, stored_now, value_to_sql};

/// A rendered filter: the SQL suffix and its bound parameters.
#[derive(Debug, Default)]
pub struct SqlFilter {
    /// Empty, or a leading-space `" WHERE ..."` suffix for the base SELECT.
    pub clause: String,
    pub params: Vec<rusqlite::types::Value>,
}

/// Builds the conjunction over `lookups` for a table with `columns`.
///
/// Field names are validated against the column table — they are spliced
/// into the SQL text, so nothing outside the whitelist may pass. A lookup
/// naming an unknown column returns `None`; the repository treats that as
/// an empty result, matching the in-memory rule that an absent field never
/// matches.
pub fn build_filter(lookups: &[Lookup], columns: &[&str]) -> Option<SqlFilter> {
    let mut clauses = Vec::with_capacity(lookups.len());
    let mut params = Vec::with_capacity(lookups.len());

    for lookup in lookups {
        if !columns.contains(&lookup.field.as_str()) {
            return None;
        }
        match lookup.comparison {
            Comparison::Equal => {
                clauses.push(format!("{} = ?", lookup.field));
                params.push(value_to_sql(&lookup.value));
            }
            Comparison::Like => {
                clauses.push(format!("instr({}, ?) > 0", lookup.field));
                params.push(value_to_sql(&lookup.value));
            }
            Comparison::In => match lookup.value.as_list() {
                Some(items) if !items.is_empty() => {
                    let placeholders = vec!["?"; items.len()].join(", ");
                    clauses.push(format!("{} IN ({placeholders})", lookup.field));
                    params.extend(items.iter().map(value_to_sql));
                }
                // An empty or non-list In query can match nothing.
                _ => clauses.push("1 = 0".to_string()),
            },
            Comparison::Lt => {
                clauses.push(format!("{} < ?", lookup.field));
                params.push(value_to_sql(&lookup.value));
            }
            Comparison::Lte => {
                clauses.push(format!("{} <= ?", lookup.field));
                params.push(value_to_sql(&lookup.value));
            }
            Comparison::Gt => {
                clauses.push(format!("{} > ?", lookup.field));
                params.push(value_to_sql(&lookup.value));
            }
            Comparison::Gte => {
                clauses.push(format!("{} >= ?", lookup.field));
                params.push(value_to_sql(&lookup.value));
            }
        }
    }

    let clause = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    Some(SqlFilter { clause, params })
}

/// Builds the partial-update statement for one record of `table`.
///
/// Backend-owned fields are dropped from the payload first; whatever
/// remains must name writable columns, otherwise the whole update is
/// rejected with `None`. The SET list always ends with the refreshed
/// `updated_date`, so an empty payload still touches the record.
pub fn build_update(
    table: &str,
    writable: &[&str],
    mut data: Record,
    id: Uuid,
) -> Option<(String, Vec<rusqlite::types::Value>)> {
    data.remove(fields::ID);
    data.remove(fields::CREATED_DATE);
    data.remove(fields::UPDATED_DATE);
    if !data.field_names().all(|field| writable.contains(&field)) {
        return None;
    }

    let mut assignments = Vec::with_capacity(data.len() + 1);
    let mut params = Vec::with_capacity(data.len() + 2);
    for (field, value) in &data {
        assignments.push(format!("{field} = ?"));
        params.push(value_to_sql(value));
    }
    assignments.push("updated_date = ?".to_string());
    params.push(rusqlite::types::Value::Text(format_datetime(&stored_now())));
    params.push(rusqlite::types::Value::Text(id.to_string()));

    let sql = format!("UPDATE {table} SET {} WHERE id = ?", assignments.join(", "));
    Some((sql, params))
}

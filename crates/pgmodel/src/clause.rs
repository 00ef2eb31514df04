//! Auxiliary clause builders: projection, pagination, grouping, ordering
//! and SET-assignment lists.
//!
//! All builders are pure functions of their inputs and default safely when
//! an option is absent.

use crate::error::ModelResult;
use crate::escape::{quote_ident, quote_literal};
use crate::value::Value;

/// Default row cap applied when a select carries no explicit limit.
pub const DEFAULT_LIMIT: i64 = 1000;

/// Column projection for SELECT and RETURNING positions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Columns {
    /// `*`
    #[default]
    All,
    /// Caller-supplied projection expression, passed through verbatim.
    Expr(String),
    /// Column list, joined with `, `.
    List(Vec<String>),
}

impl Columns {
    /// Render the projection.
    pub fn render(&self) -> String {
        match self {
            Columns::All => "*".to_string(),
            Columns::Expr(s) if s.is_empty() => "*".to_string(),
            Columns::Expr(s) => s.clone(),
            Columns::List(cols) if cols.is_empty() => "*".to_string(),
            Columns::List(cols) => cols.join(", "),
        }
    }
}

impl From<&str> for Columns {
    fn from(s: &str) -> Self {
        Columns::Expr(s.to_string())
    }
}

impl From<Vec<&str>> for Columns {
    fn from(cols: Vec<&str>) -> Self {
        Columns::List(cols.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Columns {
    fn from(cols: Vec<String>) -> Self {
        Columns::List(cols)
    }
}

/// `LIMIT n`, falling back to `default` unless `limit` is positive.
pub fn limit_clause(limit: Option<i64>, default: i64) -> String {
    let default = if default > 0 { default } else { DEFAULT_LIMIT };
    match limit {
        Some(n) if n > 0 => format!("LIMIT {n}"),
        _ => format!("LIMIT {default}"),
    }
}

/// `OFFSET n`, or empty when absent.
pub fn offset_clause(offset: Option<i64>) -> String {
    match offset {
        Some(n) => format!("OFFSET {n}"),
        None => String::new(),
    }
}

/// `GROUP BY` with each element literal-quoted, or empty when absent.
pub fn group_clause(group: &[String]) -> String {
    if group.is_empty() {
        return String::new();
    }
    let cols = group
        .iter()
        .map(|g| quote_literal(g))
        .collect::<Vec<_>>()
        .join(", ");
    format!("GROUP BY {cols}")
}

/// `ORDER BY <literal> ASC`, defaulting to `ORDER BY id ASC`.
pub fn order_clause(order: Option<&str>) -> String {
    match order {
        Some(expr) if !expr.is_empty() => format!("ORDER BY {} ASC", quote_literal(expr)),
        _ => "ORDER BY id ASC".to_string(),
    }
}

/// Ordered column → value assignment map used by INSERT and UPDATE.
///
/// Insertion order is preserved; re-assigning a column keeps its original
/// position. Empty text and `Null` render as SQL `NULL`.
#[derive(Clone, Debug, Default)]
pub struct SetMap {
    entries: Vec<(String, Value)>,
}

impl SetMap {
    /// Create an empty set map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `column = value`, overwriting an earlier assignment in place.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.assign(column, value);
        self
    }

    /// In-place variant of [`SetMap::set`], used for audit-column injection.
    pub fn assign(&mut self, column: &str, value: impl Into<Value>) {
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(c, _)| c == column) {
            entry.1 = value;
        } else {
            self.entries.push((column.to_string(), value));
        }
    }

    /// Whether any assignment was made.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `column` has an assignment.
    pub fn contains(&self, column: &str) -> bool {
        self.entries.iter().any(|(c, _)| c == column)
    }

    /// Render the `SET col = lit, ...` clause.
    pub fn render_set(&self) -> ModelResult<String> {
        let mut parts = Vec::with_capacity(self.entries.len());
        for (column, value) in &self.entries {
            parts.push(format!(
                "{} = {}",
                quote_ident(column)?,
                value.to_set_literal()
            ));
        }
        Ok(format!("SET {}", parts.join(", ")))
    }

    /// Render the `(cols)` and `(vals)` halves of an INSERT.
    pub fn render_insert(&self) -> ModelResult<(String, String)> {
        let mut cols = Vec::with_capacity(self.entries.len());
        let mut vals = Vec::with_capacity(self.entries.len());
        for (column, value) in &self.entries {
            cols.push(quote_ident(column)?);
            vals.push(value.to_set_literal());
        }
        Ok((
            format!("({})", cols.join(", ")),
            format!("VALUES ({})", vals.join(", ")),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_default_to_star() {
        assert_eq!(Columns::All.render(), "*");
        assert_eq!(Columns::Expr(String::new()).render(), "*");
        assert_eq!(Columns::List(vec![]).render(), "*");
    }

    #[test]
    fn columns_string_passes_through_and_list_joins() {
        assert_eq!(Columns::from("id, count(*)").render(), "id, count(*)");
        assert_eq!(Columns::from(vec!["id", "email"]).render(), "id, email");
    }

    #[test]
    fn limit_defaults_to_one_thousand() {
        assert_eq!(limit_clause(None, DEFAULT_LIMIT), "LIMIT 1000");
        assert_eq!(limit_clause(Some(0), DEFAULT_LIMIT), "LIMIT 1000");
        assert_eq!(limit_clause(Some(-5), DEFAULT_LIMIT), "LIMIT 1000");
        assert_eq!(limit_clause(Some(25), DEFAULT_LIMIT), "LIMIT 25");
        assert_eq!(limit_clause(None, 50), "LIMIT 50");
    }

    #[test]
    fn offset_omitted_when_absent() {
        assert_eq!(offset_clause(None), "");
        assert_eq!(offset_clause(Some(10)), "OFFSET 10");
    }

    #[test]
    fn group_quotes_each_element() {
        assert_eq!(group_clause(&[]), "");
        assert_eq!(
            group_clause(&["role".to_string(), "team".to_string()]),
            "GROUP BY 'role', 'team'"
        );
    }

    #[test]
    fn order_defaults_to_id_asc() {
        assert_eq!(order_clause(None), "ORDER BY id ASC");
        assert_eq!(order_clause(Some("")), "ORDER BY id ASC");
        assert_eq!(order_clause(Some("email")), "ORDER BY 'email' ASC");
    }

    #[test]
    fn set_map_preserves_insertion_order() {
        let set = SetMap::new()
            .set("email", "a@test.com")
            .set("age", 30i64)
            .set("note", Value::Null);
        assert_eq!(
            set.render_set().unwrap(),
            "SET email = 'a@test.com', age = 30, note = NULL"
        );
    }

    #[test]
    fn set_map_overwrite_keeps_position() {
        let set = SetMap::new()
            .set("a", 1i64)
            .set("b", 2i64)
            .set("a", 3i64);
        assert_eq!(set.render_set().unwrap(), "SET a = 3, b = 2");
    }

    #[test]
    fn empty_text_assignment_renders_null() {
        let set = SetMap::new().set("deleted_at", "");
        assert_eq!(set.render_set().unwrap(), "SET deleted_at = NULL");
    }

    #[test]
    fn insert_halves_line_up() {
        let set = SetMap::new().set("email", "a@test.com").set("age", 30i64);
        let (cols, vals) = set.render_insert().unwrap();
        assert_eq!(cols, "(email, age)");
        assert_eq!(vals, "VALUES ('a@test.com', 30)");
    }
}

//! Filter expressions and the WHERE-clause compiler.
//!
//! A [`Filter`] is an ordered list of predicates. Compilation walks the
//! predicates in insertion order, emits one comparison per predicate and
//! joins everything with `AND`. The filter language is deliberately flat:
//! no `OR`, no nested groups.

use crate::error::{ModelError, ModelResult};
use crate::escape::quote_ident;
use crate::value::Value;

/// Comparison operator for a single filter predicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cmp {
    /// column = value
    Eq,
    /// column != value
    Ne,
    /// column > value
    Gt,
    /// column >= value
    Gte,
    /// column < value
    Lt,
    /// column <= value
    Lte,
    /// column LIKE pattern
    Like,
}

impl Cmp {
    fn symbol(self) -> &'static str {
        match self {
            Cmp::Eq => "=",
            Cmp::Ne => "!=",
            Cmp::Gt => ">",
            Cmp::Gte => ">=",
            Cmp::Lt => "<",
            Cmp::Lte => "<=",
            Cmp::Like => "like",
        }
    }
}

#[derive(Clone, Debug)]
enum Term {
    Cmp {
        op: Cmp,
        column: String,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
    NullTest {
        column: String,
        negated: bool,
    },
}

/// Compiled WHERE clause.
///
/// `sql` is empty when the filter had no predicates (no `WHERE` keyword at
/// all). `force_limit_one` is set when a plain equality predicate targeted
/// the `id` column: selecting by id always implies at most one row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhereClause {
    pub sql: String,
    pub force_limit_one: bool,
}

impl WhereClause {
    /// An empty clause (matches everything).
    pub fn empty() -> Self {
        WhereClause {
            sql: String::new(),
            force_limit_one: false,
        }
    }

    /// Whether the clause carries any predicate.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Declarative predicate set, compiled into a WHERE clause.
///
/// # Example
/// ```
/// use pgmodel::filter::Filter;
///
/// let clause = Filter::new()
///     .eq("role", "manager")
///     .gte("id", 2i64)
///     .compile()
///     .unwrap();
/// assert_eq!(clause.sql, "WHERE role = 'manager' AND id >= 2");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Filter {
    terms: Vec<Term>,
    build_error: Option<String>,
}

impl Filter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `column = value`.
    ///
    /// Text values equal (case-insensitively) to `"is null"` or
    /// `"is not null"` compile to the corresponding null test instead of an
    /// escaped literal comparison.
    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.cmp(Cmp::Eq, column, value)
    }

    /// Add `column != value`.
    pub fn ne(self, column: &str, value: impl Into<Value>) -> Self {
        self.cmp(Cmp::Ne, column, value)
    }

    /// Add `column > value`.
    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.cmp(Cmp::Gt, column, value)
    }

    /// Add `column >= value`.
    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.cmp(Cmp::Gte, column, value)
    }

    /// Add `column < value`.
    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.cmp(Cmp::Lt, column, value)
    }

    /// Add `column <= value`.
    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.cmp(Cmp::Lte, column, value)
    }

    /// Add `column LIKE pattern`.
    pub fn like(self, column: &str, pattern: impl Into<Value>) -> Self {
        self.cmp(Cmp::Like, column, pattern)
    }

    /// Add one comparison per `(column, value)` pair under a single operator.
    ///
    /// This is the operator-tagged filter shape; an empty payload is a
    /// validation error surfaced at compile time.
    pub fn group<C, V>(mut self, op: Cmp, pairs: impl IntoIterator<Item = (C, V)>) -> Self
    where
        C: Into<String>,
        V: Into<Value>,
    {
        let mut any = false;
        for (column, value) in pairs {
            any = true;
            self = self.cmp(op, &column.into(), value);
        }
        if !any && self.build_error.is_none() {
            self.build_error = Some(format!("empty payload for {:?} operator", op));
        }
        self
    }

    /// Add `column IN (values...)`. An empty list is a validation error.
    pub fn in_list<V: Into<Value>>(mut self, column: &str, values: Vec<V>) -> Self {
        if values.is_empty() && self.build_error.is_none() {
            self.build_error = Some(format!("empty IN list for column '{column}'"));
        }
        self.terms.push(Term::In {
            column: column.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Add `column IS NULL`.
    pub fn is_null(mut self, column: &str) -> Self {
        self.terms.push(Term::NullTest {
            column: column.to_string(),
            negated: false,
        });
        self
    }

    /// Add `column IS NOT NULL`.
    pub fn is_not_null(mut self, column: &str) -> Self {
        self.terms.push(Term::NullTest {
            column: column.to_string(),
            negated: true,
        });
        self
    }

    fn cmp(mut self, op: Cmp, column: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if op == Cmp::Eq {
            if let Some(negated) = value.null_test() {
                return if negated {
                    self.is_not_null(column)
                } else {
                    self.is_null(column)
                };
            }
        }
        self.terms.push(Term::Cmp {
            op,
            column: column.to_string(),
            value,
        });
        self
    }

    /// Whether no predicates were added.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether any predicate targets `column`.
    pub fn constrains(&self, column: &str) -> bool {
        self.terms.iter().any(|t| match t {
            Term::Cmp { column: c, .. }
            | Term::In { column: c, .. }
            | Term::NullTest { column: c, .. } => c == column,
        })
    }

    /// Compile into a WHERE clause.
    ///
    /// Deterministic for a given filter; predicates appear in insertion
    /// order joined by `AND`.
    pub fn compile(&self) -> ModelResult<WhereClause> {
        if let Some(ref msg) = self.build_error {
            return Err(ModelError::validation(msg.clone()));
        }
        if self.terms.is_empty() {
            return Ok(WhereClause::empty());
        }

        let mut parts = Vec::with_capacity(self.terms.len());
        let mut force_limit_one = false;
        for term in &self.terms {
            match term {
                Term::Cmp { op, column, value } => {
                    // Plain equality on id implies at most one row; ranged
                    // comparisons on id do not.
                    if *op == Cmp::Eq && column == "id" {
                        force_limit_one = true;
                    }
                    parts.push(format!(
                        "{} {} {}",
                        quote_ident(column)?,
                        op.symbol(),
                        value.to_literal()
                    ));
                }
                Term::In { column, values } => {
                    let list = values
                        .iter()
                        .map(Value::to_literal)
                        .collect::<Vec<_>>()
                        .join(", ");
                    parts.push(format!("{} IN ({})", quote_ident(column)?, list));
                }
                Term::NullTest { column, negated } => {
                    let test = if *negated { "IS NOT NULL" } else { "IS NULL" };
                    parts.push(format!("{} {}", quote_ident(column)?, test));
                }
            }
        }

        Ok(WhereClause {
            sql: format!("WHERE {}", parts.join(" AND ")),
            force_limit_one,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_compiles_to_empty_clause() {
        let clause = Filter::new().compile().unwrap();
        assert!(clause.is_empty());
        assert!(!clause.force_limit_one);
    }

    #[test]
    fn equality_terms_join_with_and_in_insertion_order() {
        let clause = Filter::new()
            .eq("email", "a@test.com")
            .eq("role", "manager")
            .compile()
            .unwrap();
        assert_eq!(
            clause.sql,
            "WHERE email = 'a@test.com' AND role = 'manager'"
        );
    }

    #[test]
    fn every_operator_emits_its_symbol() {
        let clause = Filter::new()
            .like("email", "%@test.com")
            .gt("a", 1i64)
            .gte("b", 2i64)
            .lt("c", 3i64)
            .lte("d", 4i64)
            .ne("e", "x")
            .compile()
            .unwrap();
        assert_eq!(
            clause.sql,
            "WHERE email like '%@test.com' AND a > 1 AND b >= 2 AND c < 3 AND d <= 4 AND e != 'x'"
        );
    }

    #[test]
    fn numeric_values_unquoted_strings_quoted() {
        let clause = Filter::new()
            .gt("id", 5i64)
            .gt("name", "m")
            .compile()
            .unwrap();
        assert_eq!(clause.sql, "WHERE id > 5 AND name > 'm'");
    }

    #[test]
    fn group_expands_one_comparison_per_pair() {
        let clause = Filter::new()
            .group(Cmp::Gte, vec![("id", 2i64), ("age", 21i64)])
            .compile()
            .unwrap();
        assert_eq!(clause.sql, "WHERE id >= 2 AND age >= 21");
        assert!(!clause.force_limit_one);
    }

    #[test]
    fn empty_group_payload_is_a_validation_error() {
        let err = Filter::new()
            .group(Cmp::Gt, Vec::<(&str, i64)>::new())
            .compile()
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn id_term_forces_limit_one() {
        let clause = Filter::new().eq("id", 3i64).compile().unwrap();
        assert_eq!(clause.sql, "WHERE id = 3");
        assert!(clause.force_limit_one);
    }

    #[test]
    fn is_null_strings_bypass_literal_escaping() {
        let clause = Filter::new()
            .eq("deleted_at", "is null")
            .eq("approved_at", "IS NOT NULL")
            .compile()
            .unwrap();
        assert_eq!(
            clause.sql,
            "WHERE deleted_at IS NULL AND approved_at IS NOT NULL"
        );
    }

    #[test]
    fn in_list_compiles_membership() {
        let clause = Filter::new()
            .in_list("id", vec![1i64, 2, 3])
            .compile()
            .unwrap();
        assert_eq!(clause.sql, "WHERE id IN (1, 2, 3)");
        assert!(!clause.force_limit_one);

        let clause = Filter::new()
            .in_list("email", vec!["a@test.com", "b@test.com"])
            .compile()
            .unwrap();
        assert_eq!(clause.sql, "WHERE email IN ('a@test.com', 'b@test.com')");
    }

    #[test]
    fn empty_in_list_is_a_validation_error() {
        let err = Filter::new()
            .in_list("id", Vec::<i64>::new())
            .compile()
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn literal_injection_is_escaped() {
        let clause = Filter::new()
            .eq("name", "'; DROP TABLE employees; --")
            .compile()
            .unwrap();
        assert_eq!(
            clause.sql,
            "WHERE name = '''; DROP TABLE employees; --'"
        );
    }

    #[test]
    fn constrains_reports_touched_columns() {
        let f = Filter::new().eq("deleted_at", "is null");
        assert!(f.constrains("deleted_at"));
        assert!(!f.constrains("id"));
    }
}

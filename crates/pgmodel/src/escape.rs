//! Safe SQL identifier quoting and literal escaping.
//!
//! Every externally supplied string enters generated SQL through this module:
//! identifiers via [`quote_ident`], values via [`quote_literal`] (usually
//! through [`Value::to_literal`](crate::value::Value::to_literal)). Clause
//! builders never interpolate a raw caller string outside this path.
//!
//! - Unquoted identifiers must match `[a-z_][a-z0-9_$]*`; anything else is
//!   wrapped in double quotes with embedded `"` doubled.
//! - Literals double embedded single quotes; strings containing a backslash
//!   use the `E'...'` form with backslashes doubled.

use crate::error::{ModelError, ModelResult};

/// Quote a column/table/schema name so it cannot be read as SQL syntax.
///
/// Names that are already safe unquoted identifiers pass through untouched,
/// so generated SQL stays readable for the common case.
///
/// # Example
/// ```
/// use pgmodel::escape::quote_ident;
///
/// assert_eq!(quote_ident("email").unwrap(), "email");
/// assert_eq!(quote_ident("CamelCase").unwrap(), r#""CamelCase""#);
/// ```
pub fn quote_ident(name: &str) -> ModelResult<String> {
    if name.is_empty() {
        return Err(ModelError::validation("identifier cannot be empty"));
    }
    if name.contains('\0') {
        return Err(ModelError::validation(
            "identifier cannot contain NUL character",
        ));
    }
    if is_safe_unquoted(name) {
        return Ok(name.to_string());
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

fn is_safe_unquoted(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$')
}

/// Escape a string into a SQL text literal.
///
/// # Example
/// ```
/// use pgmodel::escape::quote_literal;
///
/// assert_eq!(quote_literal("o'neil"), "'o''neil'");
/// assert_eq!(quote_literal(r"a\b"), r"E'a\\b'");
/// ```
pub fn quote_literal(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('\'', "''");
    if text.contains('\\') {
        format!("E'{}'", escaped)
    } else {
        format!("'{}'", escaped)
    }
}

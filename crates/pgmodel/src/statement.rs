//! Statement assembly.
//!
//! Composes clause-builder and predicate-compiler output into one complete
//! SQL statement per operation. Every statement is a single atomic unit:
//! mutations carry their affected rows back via `RETURNING` on the same
//! connection, so no explicit transaction is needed for read-your-write.
//!
//! Timestamps are injected from a caller-supplied `now` so assembly stays a
//! pure function; the operation layer passes `Utc::now()`.

use crate::clause::{group_clause, limit_clause, offset_clause, order_clause, SetMap, DEFAULT_LIMIT};
use crate::error::ModelResult;
use crate::escape::{quote_ident, quote_literal};
use crate::options::{DeleteOptions, DescribeOptions, InsertOptions, SelectOptions, UpdateOptions};
use chrono::{DateTime, Utc};

fn table_ref(schema: &str, model: &str) -> ModelResult<String> {
    Ok(format!("{}.{}", quote_ident(schema)?, quote_ident(model)?))
}

fn join_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Assemble a SELECT statement.
///
/// Unless the caller opted into deleted rows or already constrains
/// `deleted_at`, an `deleted_at IS NULL` predicate is appended so selects
/// default to active rows only.
pub fn build_select(opts: &SelectOptions) -> ModelResult<String> {
    opts.validate()?;

    let mut filter = opts.effective_filter();
    if !opts.include_deleted && !filter.constrains("deleted_at") {
        filter = filter.is_null("deleted_at");
    }
    let clause = filter.compile()?;

    let limit = if clause.force_limit_one {
        limit_clause(Some(1), DEFAULT_LIMIT)
    } else {
        limit_clause(opts.limit, DEFAULT_LIMIT)
    };

    Ok(join_parts(&[
        "SELECT",
        &opts.columns.render(),
        "FROM",
        &table_ref(&opts.schema, &opts.model)?,
        &clause.sql,
        &group_clause(&opts.group),
        &order_clause(opts.order.as_deref()),
        &limit,
        &offset_clause(opts.offset),
    ]))
}

/// Assemble an INSERT statement with audit-column injection.
///
/// `created_at` is always stamped; `created_by` only when a caller identity
/// is present. `RETURNING` reflects server-assigned defaults back to the
/// caller.
pub fn build_insert(opts: &InsertOptions, now: DateTime<Utc>) -> ModelResult<String> {
    opts.validate()?;

    let mut set = opts.set.clone();
    set.assign("created_at", now);
    if let Some(ref user_id) = opts.user_id {
        set.assign("created_by", user_id.as_str());
    }
    let (columns, values) = set.render_insert()?;

    Ok(join_parts(&[
        "INSERT INTO",
        &table_ref(&opts.schema, &opts.model)?,
        &columns,
        &values,
        "RETURNING",
        &opts.columns.render(),
    ]))
}

fn build_update_shape(
    schema: &str,
    model: &str,
    set: &SetMap,
    where_sql: &str,
    returning: &str,
) -> ModelResult<String> {
    Ok(join_parts(&[
        "UPDATE",
        &table_ref(schema, model)?,
        &set.render_set()?,
        where_sql,
        "RETURNING",
        returning,
    ]))
}

/// Assemble an UPDATE statement with audit-column injection.
///
/// A predicate is mandatory; validation rejects a whole-table update before
/// any SQL is built.
pub fn build_update(opts: &UpdateOptions, now: DateTime<Utc>) -> ModelResult<String> {
    opts.validate()?;

    let mut set = opts.set.clone();
    set.assign("updated_at", now);
    if let Some(ref user_id) = opts.user_id {
        set.assign("updated_by", user_id.as_str());
    }
    let clause = opts.effective_filter().compile()?;

    build_update_shape(
        &opts.schema,
        &opts.model,
        &set,
        &clause.sql,
        &opts.columns.render(),
    )
}

/// Assemble a soft-delete statement: stamps `deleted_at`/`updated_at`
/// (plus actor columns) instead of physically removing rows.
pub fn build_soft_delete(opts: &DeleteOptions, now: DateTime<Utc>) -> ModelResult<String> {
    opts.validate()?;

    let mut set = SetMap::new().set("deleted_at", now).set("updated_at", now);
    if let Some(ref user_id) = opts.user_id {
        set.assign("deleted_by", user_id.as_str());
        set.assign("updated_by", user_id.as_str());
    }
    let clause = opts.effective_filter().compile()?;

    build_update_shape(
        &opts.schema,
        &opts.model,
        &set,
        &clause.sql,
        &opts.columns.render(),
    )
}

/// Assemble a restore statement: clears `deleted_at`/`deleted_by` and
/// re-stamps `updated_at`.
pub fn build_restore(opts: &DeleteOptions, now: DateTime<Utc>) -> ModelResult<String> {
    opts.validate()?;

    let mut set = SetMap::new()
        .set("deleted_at", "")
        .set("deleted_by", "")
        .set("updated_at", now);
    if let Some(ref user_id) = opts.user_id {
        set.assign("updated_by", user_id.as_str());
    }
    let clause = opts.effective_filter().compile()?;

    build_update_shape(
        &opts.schema,
        &opts.model,
        &set,
        &clause.sql,
        &opts.columns.render(),
    )
}

/// Assemble the catalog introspection query behind
/// [`describe_table`](crate::ops::describe_table).
pub fn build_describe(opts: &DescribeOptions) -> ModelResult<String> {
    opts.validate()?;

    Ok(format!(
        "SELECT column_name, data_type, ordinal_position \
         FROM information_schema.columns \
         WHERE table_catalog = {} AND table_schema = {} AND table_name = {} \
         ORDER BY ordinal_position",
        quote_literal(&opts.database),
        quote_literal(&opts.schema),
        quote_literal(&opts.model),
    ))
}

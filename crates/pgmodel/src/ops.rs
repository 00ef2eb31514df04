//! CRUD operations: assemble a statement, execute it, shape the result.
//!
//! Each operation comes in two flavors: a `*_with` variant generic over any
//! [`Executor`] (the unit-testable seam) and, with the `pool` feature, an
//! entry point that acquires the named pool from a [`PoolManager`] first.
//! One operation runs over one acquired connection.
//!
//! Result contracts are deliberately uniform: select returns
//! `{fields, rows}`, insert returns the single inserted row, update /
//! soft-delete / restore return the affected rows. Callers that only need a
//! count use [`query_with`] and read `row_count`.

use crate::error::{ModelError, ModelResult};
use crate::exec::{normalize, Executor, QueryOutput, RowMode};
use crate::options::{DeleteOptions, DescribeOptions, InsertOptions, SelectOptions, UpdateOptions};
use crate::statement;
use chrono::Utc;
use serde::Serialize;
use tracing::debug;

#[cfg(feature = "pool")]
use crate::pool::PoolManager;

/// A normalized row: JSON object (default) or JSON array per [`RowMode`].
pub type Row = serde_json::Value;

/// Result shape for select-like operations.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SelectResult {
    pub fields: Vec<String>,
    pub rows: Vec<Row>,
}

async fn run(exec: &impl Executor, sql: &str, mode: RowMode) -> ModelResult<QueryOutput> {
    debug!(sql, "executing statement");
    let raw = exec.run(sql).await?;
    Ok(normalize(raw, mode))
}

/// Run a SELECT described by `opts` on `exec`.
pub async fn select_with(exec: &impl Executor, opts: &SelectOptions) -> ModelResult<SelectResult> {
    let sql = statement::build_select(opts)?;
    let out = run(exec, &sql, opts.row_mode).await?;
    Ok(SelectResult {
        fields: out.fields,
        rows: out.rows,
    })
}

/// Insert one row and return it with server-assigned defaults reflected.
pub async fn insert_with(exec: &impl Executor, opts: &InsertOptions) -> ModelResult<Row> {
    let sql = statement::build_insert(opts, Utc::now())?;
    let mut out = run(exec, &sql, opts.row_mode).await?;
    if out.rows.is_empty() {
        return Err(ModelError::not_found("insert returned no row"));
    }
    Ok(out.rows.swap_remove(0))
}

/// Update matching rows and return every affected row.
pub async fn update_with(exec: &impl Executor, opts: &UpdateOptions) -> ModelResult<Vec<Row>> {
    let sql = statement::build_update(opts, Utc::now())?;
    Ok(run(exec, &sql, opts.row_mode).await?.rows)
}

/// Soft-delete matching rows (stamp `deleted_at`) and return them.
pub async fn soft_delete_with(exec: &impl Executor, opts: &DeleteOptions) -> ModelResult<Vec<Row>> {
    let sql = statement::build_soft_delete(opts, Utc::now())?;
    Ok(run(exec, &sql, opts.row_mode).await?.rows)
}

/// Restore soft-deleted rows (clear `deleted_at`) and return them.
pub async fn restore_with(exec: &impl Executor, opts: &DeleteOptions) -> ModelResult<Vec<Row>> {
    let sql = statement::build_restore(opts, Utc::now())?;
    Ok(run(exec, &sql, opts.row_mode).await?.rows)
}

/// Introspect column metadata for a table from the catalog.
pub async fn describe_with(
    exec: &impl Executor,
    opts: &DescribeOptions,
) -> ModelResult<SelectResult> {
    let sql = statement::build_describe(opts)?;
    let out = run(exec, &sql, opts.row_mode).await?;
    Ok(SelectResult {
        fields: out.fields,
        rows: out.rows,
    })
}

/// Raw SQL escape hatch. The caller owns escaping for anything interpolated
/// into `sql`; prefer the typed operations.
pub async fn query_with(
    exec: &impl Executor,
    sql: &str,
    mode: RowMode,
) -> ModelResult<QueryOutput> {
    run(exec, sql, mode).await
}

#[cfg(feature = "pool")]
mod pooled {
    use super::*;

    /// [`select_with`] over a client acquired from `opts.pool`.
    pub async fn select(mgr: &PoolManager, opts: &SelectOptions) -> ModelResult<SelectResult> {
        let client = mgr.acquire(&opts.pool).await?;
        select_with(&client, opts).await
    }

    /// [`insert_with`] over a client acquired from `opts.pool`.
    pub async fn insert(mgr: &PoolManager, opts: &InsertOptions) -> ModelResult<Row> {
        let client = mgr.acquire(&opts.pool).await?;
        insert_with(&client, opts).await
    }

    /// [`update_with`] over a client acquired from `opts.pool`.
    pub async fn update(mgr: &PoolManager, opts: &UpdateOptions) -> ModelResult<Vec<Row>> {
        let client = mgr.acquire(&opts.pool).await?;
        update_with(&client, opts).await
    }

    /// [`soft_delete_with`] over a client acquired from `opts.pool`.
    pub async fn soft_delete(mgr: &PoolManager, opts: &DeleteOptions) -> ModelResult<Vec<Row>> {
        let client = mgr.acquire(&opts.pool).await?;
        soft_delete_with(&client, opts).await
    }

    /// [`restore_with`] over a client acquired from `opts.pool`.
    pub async fn restore(mgr: &PoolManager, opts: &DeleteOptions) -> ModelResult<Vec<Row>> {
        let client = mgr.acquire(&opts.pool).await?;
        restore_with(&client, opts).await
    }

    /// [`describe_with`] over a client acquired from `opts.pool`.
    pub async fn describe_table(
        mgr: &PoolManager,
        opts: &DescribeOptions,
    ) -> ModelResult<SelectResult> {
        let client = mgr.acquire(&opts.pool).await?;
        describe_with(&client, opts).await
    }

    /// [`query_with`] over a client acquired from a named pool.
    pub async fn query(
        mgr: &PoolManager,
        pool: &str,
        sql: &str,
        mode: RowMode,
    ) -> ModelResult<QueryOutput> {
        let client = mgr.acquire(pool).await?;
        query_with(&client, sql, mode).await
    }
}

#[cfg(feature = "pool")]
pub use pooled::{describe_table, insert, query, restore, select, soft_delete, update};

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::exec::RawOutput;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Executor that records submitted SQL and replays canned results.
    pub struct FakeExecutor {
        pub log: Mutex<Vec<String>>,
        responses: Mutex<VecDeque<RawOutput>>,
    }

    impl FakeExecutor {
        pub fn new() -> Self {
            Self {
                log: Mutex::new(Vec::new()),
                responses: Mutex::new(VecDeque::new()),
            }
        }

        pub fn respond(self, raw: RawOutput) -> Self {
            self.responses.lock().unwrap().push_back(raw);
            self
        }

        pub fn rows(fields: &[&str], rows: &[&[&str]]) -> RawOutput {
            RawOutput {
                fields: fields.iter().map(|f| f.to_string()).collect(),
                rows: rows
                    .iter()
                    .map(|r| r.iter().map(|c| Some(c.to_string())).collect())
                    .collect(),
                row_count: rows.len() as u64,
            }
        }

        pub fn submitted(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    impl Executor for FakeExecutor {
        fn run(
            &self,
            sql: &str,
        ) -> impl std::future::Future<Output = ModelResult<RawOutput>> + Send {
            self.log.lock().unwrap().push(sql.to_string());
            let raw = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default();
            async move { Ok(raw) }
        }
    }
}

//! # pgmodel
//!
//! A soft-delete CRUD and SQL query-construction layer for PostgreSQL.
//!
//! ## Features
//!
//! - **Declarative filters**: flat, AND-joined predicates compiled into a
//!   safe WHERE clause ([`Filter`])
//! - **Escaped by construction**: every identifier and value enters
//!   generated SQL through one escaper ([`escape`])
//! - **Audit columns**: inserts stamp `created_at/by`, updates stamp
//!   `updated_at/by`, deletes are soft (`deleted_at`) and reversible
//! - **Safe defaults**: selects see active rows only, mutations require a
//!   predicate, results come back via `RETURNING` on one connection
//! - **Named pools**: explicit [`PoolManager`] over deadpool-postgres,
//!   lazily built per name, released by name or in bulk
//!
//! ## Usage
//!
//! ```ignore
//! use pgmodel::{Filter, PoolManager, SelectOptions, SetMap};
//! use std::sync::Arc;
//!
//! let mgr = Arc::new(PoolManager::new());
//!
//! // SELECT
//! let active = pgmodel::select(
//!     &mgr,
//!     &SelectOptions::new("employees").filter(Filter::new().eq("role", "manager")),
//! )
//! .await?;
//!
//! // INSERT with audit columns
//! let row = pgmodel::insert(
//!     &mgr,
//!     &pgmodel::InsertOptions::new("employees")
//!         .set(SetMap::new().set("email", "a@test.com"))
//!         .user_id("42"),
//! )
//! .await?;
//!
//! // Per-table model
//! let employees = pgmodel::Model::new(mgr.clone(), "employees")?;
//! let mut employee = employees.find(7).await?;
//! employee.soft_delete().await?;
//! employee.restore().await?;
//! ```

pub mod clause;
pub mod error;
pub mod escape;
pub mod exec;
pub mod filter;
pub mod ops;
pub mod options;
pub mod statement;
pub mod value;

pub use clause::{Columns, SetMap, DEFAULT_LIMIT};
pub use error::{ModelError, ModelResult};
pub use exec::{Executor, QueryOutput, RawOutput, RowMode};
pub use filter::{Cmp, Filter, WhereClause};
pub use ops::{
    describe_with, insert_with, query_with, restore_with, select_with, soft_delete_with,
    update_with, Row, SelectResult,
};
pub use options::{DeleteOptions, DescribeOptions, InsertOptions, SelectOptions, UpdateOptions};
pub use value::Value;

#[cfg(feature = "pool")]
pub mod model;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use model::{Model, ModelInstance};

#[cfg(feature = "pool")]
pub use ops::{describe_table, insert, query, restore, select, soft_delete, update};

#[cfg(feature = "pool")]
pub use pool::{PoolManager, PoolSettings};

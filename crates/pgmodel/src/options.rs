//! Typed, per-operation option structs.
//!
//! Each operation takes its own options type, validated before any SQL is
//! assembled: `model` must be non-empty, mutating operations must carry a
//! predicate (explicit filter or the `id` shortcut), inserts and updates
//! must carry assignments. `schema` defaults to `public`, `pool` to
//! `default`.

use crate::clause::{Columns, SetMap};
use crate::error::{ModelError, ModelResult};
use crate::exec::RowMode;
use crate::filter::Filter;

pub(crate) const DEFAULT_SCHEMA: &str = "public";
pub(crate) const DEFAULT_POOL: &str = "default";

fn require_model(model: &str) -> ModelResult<()> {
    if model.is_empty() {
        return Err(ModelError::validation("you must specify a valid model"));
    }
    Ok(())
}

/// Fold the `id` shortcut into a filter; a bare numeric id always implies
/// at most one row.
fn fold_id(filter: Filter, id: Option<i64>) -> Filter {
    match id {
        Some(id) => filter.eq("id", id),
        None => filter,
    }
}

/// Options for [`select`](crate::ops::select).
#[derive(Clone, Debug)]
pub struct SelectOptions {
    pub model: String,
    pub schema: String,
    pub pool: String,
    pub columns: Columns,
    pub filter: Filter,
    pub id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub group: Vec<String>,
    pub order: Option<String>,
    /// Include soft-deleted rows instead of defaulting to active rows only.
    pub include_deleted: bool,
    pub row_mode: RowMode,
}

impl SelectOptions {
    /// Create select options for a model (table) name.
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
            pool: DEFAULT_POOL.to_string(),
            columns: Columns::All,
            filter: Filter::new(),
            id: None,
            limit: None,
            offset: None,
            group: Vec::new(),
            order: None,
            include_deleted: false,
            row_mode: RowMode::Object,
        }
    }

    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = schema.to_string();
        self
    }

    pub fn pool(mut self, pool: &str) -> Self {
        self.pool = pool.to_string();
        self
    }

    pub fn columns(mut self, columns: impl Into<Columns>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Shortcut for `filter(id = n)`; forces `LIMIT 1`.
    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn group(mut self, group: Vec<&str>) -> Self {
        self.group = group.into_iter().map(str::to_string).collect();
        self
    }

    pub fn order(mut self, order: &str) -> Self {
        self.order = Some(order.to_string());
        self
    }

    /// Do not filter rows carrying a `deleted_at` timestamp.
    pub fn include_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    pub fn row_mode(mut self, mode: RowMode) -> Self {
        self.row_mode = mode;
        self
    }

    pub(crate) fn validate(&self) -> ModelResult<()> {
        require_model(&self.model)
    }

    /// Filter with the `id` shortcut folded in.
    pub(crate) fn effective_filter(&self) -> Filter {
        fold_id(self.filter.clone(), self.id)
    }
}

/// Options for [`insert`](crate::ops::insert).
#[derive(Clone, Debug)]
pub struct InsertOptions {
    pub model: String,
    pub schema: String,
    pub pool: String,
    pub set: SetMap,
    /// RETURNING projection.
    pub columns: Columns,
    pub row_mode: RowMode,
    /// Caller identity recorded in `created_by`.
    pub user_id: Option<String>,
}

impl InsertOptions {
    /// Create insert options for a model (table) name.
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
            pool: DEFAULT_POOL.to_string(),
            set: SetMap::new(),
            columns: Columns::All,
            row_mode: RowMode::Object,
            user_id: None,
        }
    }

    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = schema.to_string();
        self
    }

    pub fn pool(mut self, pool: &str) -> Self {
        self.pool = pool.to_string();
        self
    }

    pub fn set(mut self, set: SetMap) -> Self {
        self.set = set;
        self
    }

    pub fn columns(mut self, columns: impl Into<Columns>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn row_mode(mut self, mode: RowMode) -> Self {
        self.row_mode = mode;
        self
    }

    pub fn user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub(crate) fn validate(&self) -> ModelResult<()> {
        require_model(&self.model)?;
        if self.set.is_empty() {
            return Err(ModelError::validation("you must specify a set object"));
        }
        Ok(())
    }
}

/// Options for [`update`](crate::ops::update).
#[derive(Clone, Debug)]
pub struct UpdateOptions {
    pub model: String,
    pub schema: String,
    pub pool: String,
    pub set: SetMap,
    pub filter: Filter,
    pub id: Option<i64>,
    /// RETURNING projection.
    pub columns: Columns,
    pub row_mode: RowMode,
    /// Caller identity recorded in `updated_by`.
    pub user_id: Option<String>,
}

impl UpdateOptions {
    /// Create update options for a model (table) name.
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
            pool: DEFAULT_POOL.to_string(),
            set: SetMap::new(),
            filter: Filter::new(),
            id: None,
            columns: Columns::All,
            row_mode: RowMode::Object,
            user_id: None,
        }
    }

    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = schema.to_string();
        self
    }

    pub fn pool(mut self, pool: &str) -> Self {
        self.pool = pool.to_string();
        self
    }

    pub fn set(mut self, set: SetMap) -> Self {
        self.set = set;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn columns(mut self, columns: impl Into<Columns>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn row_mode(mut self, mode: RowMode) -> Self {
        self.row_mode = mode;
        self
    }

    pub fn user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub(crate) fn validate(&self) -> ModelResult<()> {
        require_model(&self.model)?;
        if self.set.is_empty() {
            return Err(ModelError::validation("you must specify a set object"));
        }
        if self.filter.is_empty() && self.id.is_none() {
            return Err(ModelError::validation(
                "update requires a where filter or id",
            ));
        }
        Ok(())
    }

    pub(crate) fn effective_filter(&self) -> Filter {
        fold_id(self.filter.clone(), self.id)
    }
}

/// Options for [`soft_delete`](crate::ops::soft_delete) and
/// [`restore`](crate::ops::restore).
#[derive(Clone, Debug)]
pub struct DeleteOptions {
    pub model: String,
    pub schema: String,
    pub pool: String,
    pub filter: Filter,
    pub id: Option<i64>,
    /// RETURNING projection.
    pub columns: Columns,
    pub row_mode: RowMode,
    /// Caller identity recorded in the actor columns.
    pub user_id: Option<String>,
}

impl DeleteOptions {
    /// Create delete/restore options for a model (table) name.
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
            pool: DEFAULT_POOL.to_string(),
            filter: Filter::new(),
            id: None,
            columns: Columns::All,
            row_mode: RowMode::Object,
            user_id: None,
        }
    }

    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = schema.to_string();
        self
    }

    pub fn pool(mut self, pool: &str) -> Self {
        self.pool = pool.to_string();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn columns(mut self, columns: impl Into<Columns>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn row_mode(mut self, mode: RowMode) -> Self {
        self.row_mode = mode;
        self
    }

    pub fn user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub(crate) fn validate(&self) -> ModelResult<()> {
        require_model(&self.model)?;
        if self.filter.is_empty() && self.id.is_none() {
            return Err(ModelError::validation(
                "delete/restore requires a where filter or id",
            ));
        }
        Ok(())
    }

    pub(crate) fn effective_filter(&self) -> Filter {
        fold_id(self.filter.clone(), self.id)
    }
}

/// Options for [`describe_table`](crate::ops::describe_table): catalog
/// introspection of column metadata.
#[derive(Clone, Debug)]
pub struct DescribeOptions {
    pub database: String,
    pub schema: String,
    pub model: String,
    pub pool: String,
    pub row_mode: RowMode,
}

impl DescribeOptions {
    /// Create describe options for a database + model pair.
    pub fn new(database: &str, model: &str) -> Self {
        Self {
            database: database.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
            model: model.to_string(),
            pool: DEFAULT_POOL.to_string(),
            row_mode: RowMode::Object,
        }
    }

    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = schema.to_string();
        self
    }

    pub fn pool(mut self, pool: &str) -> Self {
        self.pool = pool.to_string();
        self
    }

    pub fn row_mode(mut self, mode: RowMode) -> Self {
        self.row_mode = mode;
        self
    }

    pub(crate) fn validate(&self) -> ModelResult<()> {
        require_model(&self.model)?;
        if self.database.is_empty() {
            return Err(ModelError::validation("you must specify a database"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_is_mandatory() {
        assert!(SelectOptions::new("").validate().is_err());
        assert!(InsertOptions::new("").validate().is_err());
    }

    #[test]
    fn schema_and_pool_default() {
        let opts = SelectOptions::new("employees");
        assert_eq!(opts.schema, "public");
        assert_eq!(opts.pool, "default");
    }

    #[test]
    fn id_folds_into_filter_and_forces_limit_one() {
        let opts = SelectOptions::new("employees").id(3);
        let clause = opts.effective_filter().compile().unwrap();
        assert_eq!(clause.sql, "WHERE id = 3");
        assert!(clause.force_limit_one);
    }

    #[test]
    fn insert_requires_set() {
        let err = InsertOptions::new("employees").validate().unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn update_requires_set_and_predicate() {
        let set = SetMap::new().set("email", "x@test.com");
        let err = UpdateOptions::new("employees")
            .set(set.clone())
            .validate()
            .unwrap_err();
        assert!(err.is_validation());

        assert!(UpdateOptions::new("employees")
            .set(set)
            .id(1)
            .validate()
            .is_ok());
    }

    #[test]
    fn delete_requires_predicate() {
        let err = DeleteOptions::new("employees").validate().unwrap_err();
        assert!(err.is_validation());
        assert!(DeleteOptions::new("employees").id(1).validate().is_ok());
    }
}

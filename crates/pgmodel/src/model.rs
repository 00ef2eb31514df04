//! Per-table convenience layer.
//!
//! [`Model`] binds a pool manager and a table name plus defaults (schema,
//! pool, projection, caller identity) and forwards into the operation
//! layer. [`ModelInstance`] wraps one fetched row and mutates it by primary
//! key, refreshing its cached data from the affected rows the database
//! returns.

use crate::clause::{Columns, SetMap};
use crate::error::{ModelError, ModelResult};
use crate::filter::Filter;
use crate::ops::{self, Row, SelectResult};
use crate::options::{DeleteOptions, DescribeOptions, InsertOptions, SelectOptions, UpdateOptions};
use crate::pool::PoolManager;
use std::sync::Arc;

/// A named table bound to a pool manager and per-table defaults.
#[derive(Clone)]
pub struct Model {
    mgr: Arc<PoolManager>,
    model: String,
    schema: String,
    pool: String,
    database: Option<String>,
    columns: Columns,
    user_id: Option<String>,
}

impl Model {
    /// Bind a model (table) name to a pool manager.
    pub fn new(mgr: Arc<PoolManager>, model: &str) -> ModelResult<Self> {
        if model.is_empty() {
            return Err(ModelError::validation("you must specify a valid model"));
        }
        Ok(Self {
            mgr,
            model: model.to_string(),
            schema: "public".to_string(),
            pool: "default".to_string(),
            database: None,
            columns: Columns::All,
            user_id: None,
        })
    }

    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = schema.to_string();
        self
    }

    pub fn pool(mut self, pool: &str) -> Self {
        self.pool = pool.to_string();
        self
    }

    /// Database (catalog) name, required by [`Model::describe`].
    pub fn database(mut self, database: &str) -> Self {
        self.database = Some(database.to_string());
        self
    }

    pub fn columns(mut self, columns: impl Into<Columns>) -> Self {
        self.columns = columns.into();
        self
    }

    /// Caller identity stamped into audit actor columns.
    pub fn user_id(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    /// Select options pre-bound to this model's table and defaults; refine
    /// and pass to [`ops::select`] for anything beyond a plain filter.
    pub fn select_options(&self) -> SelectOptions {
        SelectOptions::new(&self.model)
            .schema(&self.schema)
            .pool(&self.pool)
            .columns(self.columns.clone())
    }

    /// Select active rows matching `filter`.
    pub async fn select(&self, filter: Filter) -> ModelResult<SelectResult> {
        ops::select(&self.mgr, &self.select_options().filter(filter)).await
    }

    /// Insert a row and wrap the returned data.
    pub async fn create(&self, set: SetMap) -> ModelResult<ModelInstance> {
        let mut opts = InsertOptions::new(&self.model)
            .schema(&self.schema)
            .pool(&self.pool)
            .set(set);
        if let Some(ref user_id) = self.user_id {
            opts = opts.user_id(user_id);
        }
        let data = ops::insert(&self.mgr, &opts).await?;
        Ok(ModelInstance {
            model: self.clone(),
            data,
        })
    }

    /// Fetch one row by id.
    pub async fn find(&self, id: i64) -> ModelResult<ModelInstance> {
        self.find_where(Filter::new().eq("id", id)).await
    }

    /// Fetch the first active row matching `filter`.
    pub async fn find_where(&self, filter: Filter) -> ModelResult<ModelInstance> {
        let result = ops::select(&self.mgr, &self.select_options().filter(filter).limit(1)).await?;
        let data = result
            .rows
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::not_found(format!("no matching {} row", self.model)))?;
        Ok(ModelInstance {
            model: self.clone(),
            data,
        })
    }

    /// Column metadata for this table from the catalog.
    pub async fn describe(&self) -> ModelResult<SelectResult> {
        let database = self.database.as_deref().ok_or_else(|| {
            ModelError::validation("describe requires a database name")
        })?;
        let opts = DescribeOptions::new(database, &self.model)
            .schema(&self.schema)
            .pool(&self.pool);
        ops::describe_table(&self.mgr, &opts).await
    }
}

/// One fetched row, mutated by primary key.
pub struct ModelInstance {
    model: Model,
    data: Row,
}

impl ModelInstance {
    /// The cached row.
    pub fn data(&self) -> &Row {
        &self.data
    }

    /// One column of the cached row.
    pub fn get(&self, column: &str) -> Option<&serde_json::Value> {
        self.data.get(column)
    }

    /// Primary key of the cached row.
    ///
    /// Simple-query results carry numbers as strings, so both JSON string
    /// and number forms are accepted.
    pub fn id(&self) -> ModelResult<i64> {
        let id = self
            .data
            .get("id")
            .ok_or_else(|| ModelError::validation("row has no id column"))?;
        match id {
            serde_json::Value::Number(n) => n
                .as_i64()
                .ok_or_else(|| ModelError::validation("id is not an integer")),
            serde_json::Value::String(s) => s
                .parse()
                .map_err(|_| ModelError::validation(format!("id '{s}' is not an integer"))),
            _ => Err(ModelError::validation("id is not an integer")),
        }
    }

    /// Update this row and refresh the cached data.
    pub async fn update(&mut self, set: SetMap) -> ModelResult<&mut Self> {
        let mut opts = UpdateOptions::new(&self.model.model)
            .schema(&self.model.schema)
            .pool(&self.model.pool)
            .set(set)
            .id(self.id()?);
        if let Some(ref user_id) = self.model.user_id {
            opts = opts.user_id(user_id);
        }
        let rows = ops::update(&self.model.mgr, &opts).await?;
        self.refresh(rows)
    }

    /// Soft-delete this row and refresh the cached data.
    pub async fn soft_delete(&mut self) -> ModelResult<&mut Self> {
        let opts = self.delete_options()?;
        let rows = ops::soft_delete(&self.model.mgr, &opts).await?;
        self.refresh(rows)
    }

    /// Restore this row and refresh the cached data.
    pub async fn restore(&mut self) -> ModelResult<&mut Self> {
        let opts = self.delete_options()?;
        let rows = ops::restore(&self.model.mgr, &opts).await?;
        self.refresh(rows)
    }

    fn delete_options(&self) -> ModelResult<DeleteOptions> {
        let mut opts = DeleteOptions::new(&self.model.model)
            .schema(&self.model.schema)
            .pool(&self.model.pool)
            .id(self.id()?);
        if let Some(ref user_id) = self.model.user_id {
            opts = opts.user_id(user_id);
        }
        Ok(opts)
    }

    fn refresh(&mut self, rows: Vec<Row>) -> ModelResult<&mut Self> {
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::not_found(format!("no matching {} row", self.model.model)))?;
        self.data = row;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance(data: Row) -> ModelInstance {
        let mgr = Arc::new(PoolManager::new());
        ModelInstance {
            model: Model::new(mgr, "employees").unwrap(),
            data,
        }
    }

    #[test]
    fn empty_model_name_is_rejected() {
        let mgr = Arc::new(PoolManager::new());
        assert!(Model::new(mgr, "").is_err());
    }

    #[test]
    fn select_options_carry_model_defaults() {
        let mgr = Arc::new(PoolManager::new());
        let model = Model::new(mgr, "employees")
            .unwrap()
            .schema("hr")
            .pool("viewer")
            .columns(vec!["id", "email"]);
        let opts = model.select_options();
        assert_eq!(opts.model, "employees");
        assert_eq!(opts.schema, "hr");
        assert_eq!(opts.pool, "viewer");
        assert_eq!(opts.columns.render(), "id, email");
    }

    #[test]
    fn instance_id_accepts_string_and_number() {
        assert_eq!(instance(json!({"id": "7"})).id().unwrap(), 7);
        assert_eq!(instance(json!({"id": 7})).id().unwrap(), 7);
        assert!(instance(json!({"email": "a@test.com"})).id().is_err());
        assert!(instance(json!({"id": "x"})).id().is_err());
    }

    #[test]
    fn instance_get_reads_cached_columns() {
        let inst = instance(json!({"id": "7", "email": "a@test.com"}));
        assert_eq!(inst.get("email"), Some(&json!("a@test.com")));
        assert_eq!(inst.get("missing"), None);
    }
}

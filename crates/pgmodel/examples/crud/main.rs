//! End-to-end CRUD walkthrough against a live database.
//!
//! Expects `PGHOST`/`PGPORT`/`PGDATABASE`/`PGUSER`/`PGPASSWORD` (a `.env`
//! file works) and an `employees` table carrying the audit columns.

use pgmodel::{Filter, Model, ModelResult, PoolManager, SetMap};
use std::sync::Arc;

#[tokio::main]
async fn main() -> ModelResult<()> {
    dotenvy::dotenv().ok();

    let mgr = Arc::new(PoolManager::new());
    let employees = Model::new(mgr.clone(), "employees")?.user_id("1");

    let mut employee = employees
        .create(
            SetMap::new()
                .set("email", "demo@example.com")
                .set("position", "employee"),
        )
        .await?;
    println!("created: {}", employee.data());

    employee
        .update(SetMap::new().set("position", "manager"))
        .await?;
    println!("updated: {}", employee.data());

    employee.soft_delete().await?;
    println!("soft-deleted: {}", employee.data());

    let active = employees
        .select(Filter::new().like("email", "%@example.com"))
        .await?;
    println!("active rows after delete: {}", active.rows.len());

    employee.restore().await?;
    println!("restored: {}", employee.data());

    mgr.release_all();
    Ok(())
}

//! Named connection pools over deadpool-postgres.
//!
//! The [`PoolManager`] replaces module-level pool state with an explicit
//! object owned by the host application: pools are registered up front or
//! resolved from environment variables, lazily built on first acquire and
//! explicitly released by name or in bulk. No reconnection retries and no
//! timeouts live here.

use crate::error::{ModelError, ModelResult};
use crate::exec::{collect_messages, Executor, RawOutput};
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use std::collections::HashMap;
use std::sync::Mutex;
use tokio_postgres::NoTls;
use tracing::debug;

/// Credentials and target for one named pool.
#[derive(Clone, Debug)]
pub struct PoolSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl PoolSettings {
    /// Resolve settings for a pool name from the process environment.
    ///
    /// The `default` pool reads `PGHOST`/`PGPORT`/`PGDATABASE`/`PGUSER`/
    /// `PGPASSWORD`. Any other name reads `PG_<NAME>_HOST` etc., falling
    /// back to the default host/port/database but requiring its own
    /// credentials. Missing variables are a [`ModelError::Connection`].
    pub fn from_env(name: &str) -> ModelResult<Self> {
        Self::resolve(name, |var| std::env::var(var).ok())
    }

    fn resolve(name: &str, lookup: impl Fn(&str) -> Option<String>) -> ModelResult<Self> {
        let upper = name.to_uppercase();
        let required = |var: String| {
            lookup(&var).ok_or_else(|| {
                ModelError::connection(format!("environment variable {var} not found"))
            })
        };

        let (host, port, database, user, password) = if upper == "DEFAULT" {
            (
                required("PGHOST".to_string())?,
                required("PGPORT".to_string())?,
                required("PGDATABASE".to_string())?,
                required("PGUSER".to_string())?,
                required("PGPASSWORD".to_string())?,
            )
        } else {
            let scoped = |suffix: &str| format!("PG_{upper}_{suffix}");
            (
                lookup(&scoped("HOST"))
                    .map_or_else(|| required("PGHOST".to_string()), Ok)?,
                lookup(&scoped("PORT"))
                    .map_or_else(|| required("PGPORT".to_string()), Ok)?,
                lookup(&scoped("DATABASE"))
                    .map_or_else(|| required("PGDATABASE".to_string()), Ok)?,
                required(scoped("USER"))?,
                required(scoped("PASSWORD"))?,
            )
        };

        let port: u16 = port
            .parse()
            .map_err(|_| ModelError::connection(format!("invalid port '{port}'")))?;

        Ok(Self {
            host,
            port,
            database,
            user,
            password,
        })
    }

    fn to_pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user)
            .password(&self.password);
        config
    }
}

/// Registry of named, lazily-built connection pools.
pub struct PoolManager {
    settings: Mutex<HashMap<String, PoolSettings>>,
    pools: Mutex<HashMap<String, Pool>>,
    max_size: usize,
}

impl PoolManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self {
            settings: Mutex::new(HashMap::new()),
            pools: Mutex::new(HashMap::new()),
            max_size: 16,
        }
    }

    /// Create an empty manager with a per-pool size cap.
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            max_size,
            ..Self::new()
        }
    }

    /// Register settings for a pool name ahead of first use, instead of
    /// resolving them from the environment.
    pub fn register(&self, name: &str, settings: PoolSettings) {
        self.settings
            .lock()
            .expect("pool settings lock poisoned")
            .insert(name.to_string(), settings);
    }

    /// Acquire a client from the named pool, building the pool on first use.
    pub async fn acquire(&self, name: &str) -> ModelResult<Object> {
        let name = if name.is_empty() { "default" } else { name };
        let pool = self.get_or_build(name)?;
        pool.get().await.map_err(ModelError::from)
    }

    fn get_or_build(&self, name: &str) -> ModelResult<Pool> {
        let mut pools = self.pools.lock().expect("pool registry lock poisoned");
        if let Some(pool) = pools.get(name) {
            return Ok(pool.clone());
        }

        let settings = {
            let settings = self.settings.lock().expect("pool settings lock poisoned");
            settings.get(name).cloned()
        };
        let settings = match settings {
            Some(s) => s,
            None => PoolSettings::from_env(name)?,
        };

        let manager = Manager::from_config(
            settings.to_pg_config(),
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager)
            .max_size(self.max_size)
            .build()
            .map_err(|e| ModelError::Pool(e.to_string()))?;
        debug!(pool = name, host = %settings.host, "built connection pool");
        pools.insert(name.to_string(), pool.clone());
        Ok(pool)
    }

    /// Tear down one named pool.
    pub fn release(&self, name: &str) {
        if let Some(pool) = self
            .pools
            .lock()
            .expect("pool registry lock poisoned")
            .remove(name)
        {
            pool.close();
        }
    }

    /// Tear down every pool.
    pub fn release_all(&self) {
        let mut pools = self.pools.lock().expect("pool registry lock poisoned");
        for (_, pool) in pools.drain() {
            pool.close();
        }
    }
}

impl Default for PoolManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for Object {
    fn run(&self, sql: &str) -> impl std::future::Future<Output = ModelResult<RawOutput>> + Send {
        async move {
            let messages = self
                .simple_query(sql)
                .await
                .map_err(ModelError::from_db_error)?;
            Ok(collect_messages(messages))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |var| {
            pairs
                .iter()
                .find(|(k, _)| *k == var)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn default_pool_reads_pg_vars() {
        let settings = PoolSettings::resolve(
            "default",
            env(&[
                ("PGHOST", "localhost"),
                ("PGPORT", "5432"),
                ("PGDATABASE", "company"),
                ("PGUSER", "app"),
                ("PGPASSWORD", "secret"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.host, "localhost");
        assert_eq!(settings.port, 5432);
        assert_eq!(settings.database, "company");
    }

    #[test]
    fn named_pool_requires_its_own_credentials() {
        let err = PoolSettings::resolve(
            "admin",
            env(&[
                ("PGHOST", "localhost"),
                ("PGPORT", "5432"),
                ("PGDATABASE", "company"),
            ]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("PG_ADMIN_USER"));
    }

    #[test]
    fn named_pool_falls_back_to_default_host() {
        let settings = PoolSettings::resolve(
            "admin",
            env(&[
                ("PGHOST", "localhost"),
                ("PGPORT", "5432"),
                ("PGDATABASE", "company"),
                ("PG_ADMIN_USER", "root"),
                ("PG_ADMIN_PASSWORD", "secret"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.host, "localhost");
        assert_eq!(settings.user, "root");
    }

    #[test]
    fn named_pool_overrides_win() {
        let settings = PoolSettings::resolve(
            "admin",
            env(&[
                ("PGHOST", "localhost"),
                ("PGPORT", "5432"),
                ("PGDATABASE", "company"),
                ("PG_ADMIN_HOST", "db.internal"),
                ("PG_ADMIN_DATABASE", "audit"),
                ("PG_ADMIN_USER", "root"),
                ("PG_ADMIN_PASSWORD", "secret"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.host, "db.internal");
        assert_eq!(settings.database, "audit");
    }

    #[test]
    fn invalid_port_is_a_connection_error() {
        let err = PoolSettings::resolve(
            "default",
            env(&[
                ("PGHOST", "localhost"),
                ("PGPORT", "not-a-port"),
                ("PGDATABASE", "company"),
                ("PGUSER", "app"),
                ("PGPASSWORD", "secret"),
            ]),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::Connection(_)));
    }
}

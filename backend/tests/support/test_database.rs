//! Per-test database, pool and runtime for the Diesel adapter suites.

use fleet_proximity::outbound::persistence::{DbPool, PoolConfig};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use tokio::runtime::Runtime;

use super::{provision_template_database, shared_cluster};

/// Migrated database with a pool over it. The database is dropped with the
/// context.
pub struct TestDatabase {
    pub runtime: Runtime,
    pub pool: DbPool,
    pub url: String,
    _database: TemporaryDatabase,
}

/// Provision a database and a pool of at most `max_size` connections.
pub fn setup_database(max_size: u32) -> Result<TestDatabase, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_template_database(cluster)?;
    let url = database.url().to_string();

    let config = PoolConfig::new(url.as_str())
        .with_max_size(max_size)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    Ok(TestDatabase {
        runtime,
        pool,
        url,
        _database: database,
    })
}

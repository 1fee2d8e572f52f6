//! Pool membership reconciliation
//!
//! Converges the pool onto the resolver's current address set:
//! departed addresses are evicted and their connections closed, new
//! addresses get freshly opened connections. Running it again with the
//! same set is a no-op, so concurrent duplicate runs are merely wasted
//! work.

use std::collections::HashSet;

use tracing::debug;

use servelink_core::{Address, ClientResult};

use crate::connection::Connect;
use crate::pool::RoundRobinPool;

/// Bring pool membership in line with `current`.
///
/// Steady state is a fast path: when membership already matches, the
/// pool is untouched and no connections are churned.
pub fn reconcile_pool(
    pool: &mut RoundRobinPool,
    current: &HashSet<Address>,
    connector: &dyn Connect,
) -> ClientResult<()> {
    let known = pool.addresses();
    if known == *current {
        return Ok(());
    }

    for addr in known.difference(current) {
        if let Some(connection) = pool.remove(addr) {
            debug!(addr = %addr, "evicting departed address");
            connection.close();
        }
    }

    for addr in current.difference(&known) {
        let connection = connector.connect(addr)?;
        debug!(addr = %addr, "pooling new address");
        pool.upsert(addr.clone(), connection)?;
    }

    Ok(())
}

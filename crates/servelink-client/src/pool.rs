//! Round-robin connection pool
//!
//! An ordered mapping from address to connection with a persistent
//! rotation cursor. Order is kept in a vector so rotation is fair;
//! a side index gives O(1) membership checks and removal lookup. The
//! cursor is a position, not a value: removals before it shift it back
//! so the next selection neither skips nor revisits a survivor.

use std::collections::{HashMap, HashSet};

use servelink_core::{Address, ClientError, ClientResult};

use crate::connection::Connection;

/// Ordered address-to-connection pool with fair cyclic selection
pub struct RoundRobinPool {
    /// Entries in rotation order
    entries: Vec<(Address, Connection)>,
    /// Address to position in `entries`
    index: HashMap<Address, usize>,
    /// Position of the next entry to serve. Always < entries.len()
    /// when the pool is non-empty.
    cursor: usize,
}

impl RoundRobinPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            cursor: 0,
        }
    }

    /// Number of pooled connections
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the pool has no connections
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of current membership
    pub fn addresses(&self) -> HashSet<Address> {
        self.index.keys().cloned().collect()
    }

    /// Insert a connection for an address not currently present.
    ///
    /// Fails with `DuplicateAddress` if the address is already pooled;
    /// a connection is bound 1:1 to its address, so callers must
    /// remove before re-inserting.
    pub fn upsert(&mut self, address: Address, connection: Connection) -> ClientResult<()> {
        if self.index.contains_key(&address) {
            return Err(ClientError::DuplicateAddress(address));
        }
        self.index.insert(address.clone(), self.entries.len());
        self.entries.push((address, connection));
        Ok(())
    }

    /// Remove an address, returning its connection for teardown.
    ///
    /// Absent addresses are a no-op. The cursor is adjusted so the
    /// next selection continues the rotation without skipping or
    /// double-visiting a surviving entry.
    pub fn remove(&mut self, address: &Address) -> Option<Connection> {
        let removed = self.index.remove(address)?;
        let (_, connection) = self.entries.remove(removed);

        // Entries after the removed slot shifted left by one.
        for position in self.index.values_mut() {
            if *position > removed {
                *position -= 1;
            }
        }

        if removed < self.cursor {
            self.cursor -= 1;
        }
        if self.cursor >= self.entries.len() {
            self.cursor = 0;
        }

        Some(connection)
    }

    /// Return the next entry in rotation order and advance the cursor
    pub fn select_next(&mut self) -> ClientResult<(Address, Connection)> {
        if self.entries.is_empty() {
            return Err(ClientError::EmptyPool);
        }
        let (address, connection) = &self.entries[self.cursor];
        let selected = (address.clone(), connection.clone());
        self.cursor = (self.cursor + 1) % self.entries.len();
        Ok(selected)
    }
}

impl Default for RoundRobinPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::idle_connection;

    fn pool_with(addresses: &[&str]) -> RoundRobinPool {
        let mut pool = RoundRobinPool::new();
        for addr in addresses {
            let address = Address::from(*addr);
            pool.upsert(address.clone(), idle_connection(&address))
                .unwrap();
        }
        pool
    }

    fn next_addr(pool: &mut RoundRobinPool) -> Address {
        pool.select_next().unwrap().0
    }

    #[test]
    fn test_empty_pool_select_fails() {
        let mut pool = RoundRobinPool::new();
        assert!(pool.is_empty());
        assert!(matches!(pool.select_next(), Err(ClientError::EmptyPool)));
    }

    #[test]
    fn test_fairness() {
        let mut pool = pool_with(&["a", "b", "c"]);

        let round: HashSet<Address> = (0..3).map(|_| next_addr(&mut pool)).collect();
        assert_eq!(round.len(), 3, "one full round visits every member once");

        // Next round starts over in the same order.
        assert_eq!(next_addr(&mut pool), Address::from("a"));
        assert_eq!(next_addr(&mut pool), Address::from("b"));
        assert_eq!(next_addr(&mut pool), Address::from("c"));
    }

    #[test]
    fn test_duplicate_upsert_fails() {
        let mut pool = pool_with(&["a"]);
        let address = Address::from("a");
        let err = pool
            .upsert(address.clone(), idle_connection(&address))
            .unwrap_err();
        assert!(matches!(err, ClientError::DuplicateAddress(_)));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut pool = pool_with(&["a"]);
        assert!(pool.remove(&Address::from("zz")).is_none());
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_remove_before_cursor_keeps_rotation() {
        let mut pool = pool_with(&["a", "b", "c"]);

        assert_eq!(next_addr(&mut pool), Address::from("a"));
        assert_eq!(next_addr(&mut pool), Address::from("b"));
        // Cursor now points at "c". Removing "a" shifts everything left.
        pool.remove(&Address::from("a")).unwrap();

        assert_eq!(next_addr(&mut pool), Address::from("c"));
        assert_eq!(next_addr(&mut pool), Address::from("b"));
    }

    #[test]
    fn test_remove_at_cursor_serves_successor() {
        let mut pool = pool_with(&["a", "b", "c"]);

        assert_eq!(next_addr(&mut pool), Address::from("a"));
        // Cursor points at "b"; removing it must not skip "c".
        pool.remove(&Address::from("b")).unwrap();

        assert_eq!(next_addr(&mut pool), Address::from("c"));
        assert_eq!(next_addr(&mut pool), Address::from("a"));
    }

    #[test]
    fn test_remove_last_entry_wraps_cursor() {
        let mut pool = pool_with(&["a", "b"]);

        assert_eq!(next_addr(&mut pool), Address::from("a"));
        // Cursor points at "b", the final slot.
        pool.remove(&Address::from("b")).unwrap();

        assert_eq!(next_addr(&mut pool), Address::from("a"));
        assert_eq!(next_addr(&mut pool), Address::from("a"));
    }

    #[test]
    fn test_no_consecutive_repeat_after_churn() {
        let mut pool = pool_with(&["a", "b"]);

        assert_eq!(next_addr(&mut pool), Address::from("a"));
        pool.remove(&Address::from("b"));
        let address = Address::from("c");
        pool.upsert(address.clone(), idle_connection(&address))
            .unwrap();

        // Two members remain; consecutive selections must differ.
        let first = next_addr(&mut pool);
        let second = next_addr(&mut pool);
        assert_ne!(first, second);
    }

    #[test]
    fn test_addresses_snapshot() {
        let pool = pool_with(&["a", "b"]);
        let snapshot = pool.addresses();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains(&Address::from("a")));
        assert!(snapshot.contains(&Address::from("b")));
    }

    #[test]
    fn test_insertion_joins_rotation() {
        let mut pool = pool_with(&["a"]);
        assert_eq!(next_addr(&mut pool), Address::from("a"));

        let address = Address::from("b");
        pool.upsert(address.clone(), idle_connection(&address))
            .unwrap();

        // New member is visible on the very next rotation.
        assert_eq!(next_addr(&mut pool), Address::from("a"));
        assert_eq!(next_addr(&mut pool), Address::from("b"));
    }
}

//! Name resolution boundary

use std::collections::HashSet;

use async_trait::async_trait;

use servelink_core::{Address, ClientError, ClientResult};

/// Resolves a backend hostname to its current set of addresses.
///
/// The client calls this at the start of every operation; the returned
/// set drives pool reconciliation. An empty set is a valid answer and
/// leads to an empty pool, not an error.
#[async_trait]
pub trait Resolve: Send + Sync {
    /// Resolve `host` to the current set of backend addresses
    async fn resolve(&self, host: &str) -> ClientResult<HashSet<Address>>;
}

/// System DNS resolver
pub struct DnsResolver {
    port: u16,
}

impl DnsResolver {
    /// Create a resolver; the port is only used to form the lookup
    /// query and is not part of the returned addresses
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

#[async_trait]
impl Resolve for DnsResolver {
    async fn resolve(&self, host: &str) -> ClientResult<HashSet<Address>> {
        let addrs = tokio::net::lookup_host((host, self.port))
            .await
            .map_err(|e| ClientError::Resolution {
                host: host.to_string(),
                reason: e.to_string(),
            })?;
        Ok(addrs.map(|sockaddr| Address::from(sockaddr.ip())).collect())
    }
}

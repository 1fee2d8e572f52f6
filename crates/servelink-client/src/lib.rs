//! servelink-client: Resilient client for model-serving gRPC backends
//!
//! This crate provides the core of servelink:
//! - A round-robin connection pool over the addresses a backend
//!   hostname currently resolves to
//! - Per-call reconciliation of pool membership against DNS
//! - Retry with failover across pool members, with fatal errors
//!   (model not found) surfaced immediately
//!
//! The pool is the interesting part: it keeps a persistent rotation
//! cursor that stays fair while membership changes underneath it.

pub mod client;
pub mod connection;
pub mod pool;
pub mod reconcile;
pub mod resolver;
pub mod retry;

#[cfg(test)]
pub(crate) mod testutil;

pub use client::{Client, ClientBuilder};
pub use connection::{Connect, Connection, GrpcConnector, ServingStub, StubFlavor};
pub use pool::RoundRobinPool;
pub use resolver::{DnsResolver, Resolve};

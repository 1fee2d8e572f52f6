//! Public client surface
//!
//! `Client` owns the pool and drives the retry state machine. Both
//! call surfaces share the same pool and the same per-address
//! connections; they differ only in which stub flavor they invoke and
//! in how the caller waits.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Mutex;
use tracing::warn;

use servelink_core::{
    Address, ClientConfig, ClientError, ClientResult, InferenceRequest, ModelDescriptor, Tensor,
};
use servelink_proto::{
    build_predict_request, parse_predict_response, PredictRequest, PredictResponse,
};

use crate::connection::{Connect, Connection, GrpcConnector, StubFlavor};
use crate::pool::RoundRobinPool;
use crate::reconcile::reconcile_pool;
use crate::resolver::{DnsResolver, Resolve};
use crate::retry::{classify, Disposition};

/// Builder for [`Client`]
pub struct ClientBuilder {
    config: ClientConfig,
    resolver: Option<Arc<dyn Resolve>>,
    connector: Option<Arc<dyn Connect>>,
}

impl ClientBuilder {
    fn new(config: ClientConfig) -> Self {
        Self {
            config,
            resolver: None,
            connector: None,
        }
    }

    /// Number of attempts before giving up on a prediction
    pub fn n_tries(mut self, n_tries: u32) -> Self {
        self.config.n_tries = n_tries;
        self
    }

    /// Per-attempt deadline in seconds
    pub fn call_timeout_secs(mut self, secs: u64) -> Self {
        self.config.call_timeout_secs = secs;
        self
    }

    /// Path to a PEM CA certificate; enables TLS
    pub fn ca_pem_file(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.config.ca_pem_file = Some(path.into());
        self
    }

    /// Add a channel option passed through to the transport layer
    pub fn channel_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.channel_options.insert(key.into(), value.into());
        self
    }

    /// Replace the name resolver (used by tests and custom discovery)
    pub fn resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Replace the connector (used by tests)
    pub fn connector(mut self, connector: Arc<dyn Connect>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Build the client and establish initial pool membership.
    ///
    /// Must be called within a tokio runtime; the current runtime
    /// handle becomes the executor for the blocking call surface.
    pub async fn build(self) -> ClientResult<Client> {
        let config = self.config;

        let resolver = match self.resolver {
            Some(resolver) => resolver,
            None => Arc::new(DnsResolver::new(config.port)) as Arc<dyn Resolve>,
        };

        let connector = match self.connector {
            Some(connector) => connector,
            None => {
                let ca_pem = match &config.ca_pem_file {
                    Some(path) => Some(std::fs::read_to_string(path).map_err(|e| {
                        ClientError::Config(format!("Failed to read CA PEM file: {}", e))
                    })?),
                    None => None,
                };
                Arc::new(GrpcConnector::new(
                    config.port,
                    ca_pem,
                    config.channel_options.clone(),
                )) as Arc<dyn Connect>
            }
        };

        let client = Client {
            config,
            resolver,
            connector,
            pool: Mutex::new(RoundRobinPool::new()),
            handle: Handle::current(),
        };

        // Initial membership; a resolution failure here is surfaced to
        // the caller rather than deferred to the first prediction.
        client.reconcile().await?;
        Ok(client)
    }
}

/// Resilient round-robin client to a model-serving backend.
///
/// One connection pair is kept per address the backend hostname
/// resolves to. Membership follows DNS on every call; failed attempts
/// are retried against other pool members.
pub struct Client {
    config: ClientConfig,
    resolver: Arc<dyn Resolve>,
    connector: Arc<dyn Connect>,
    pool: Mutex<RoundRobinPool>,
    handle: Handle,
}

impl Client {
    /// Start building a client for `host:port`
    pub fn builder(host: impl Into<String>, port: u16) -> ClientBuilder {
        ClientBuilder::new(ClientConfig::new(host, port))
    }

    /// Build a client from a full configuration
    pub async fn from_config(config: ClientConfig) -> ClientResult<Self> {
        ClientBuilder::new(config).build().await
    }

    /// Issue a prediction on the concurrent surface.
    ///
    /// Dropping the returned future cancels the in-flight RPC; a
    /// cancellation observed from the transport propagates immediately
    /// and never consumes retry budget.
    pub async fn predict(
        &self,
        request: InferenceRequest,
    ) -> ClientResult<HashMap<String, Tensor>> {
        let wire = build_predict_request(&request);
        let response = self.run_predict(StubFlavor::Concurrent, wire).await?;
        parse_predict_response(&response)
    }

    /// Issue a prediction on the blocking surface.
    ///
    /// Drives the same retry state machine over the blocking-flavor
    /// stubs. Must not be called from inside the async runtime.
    pub fn predict_blocking(
        &self,
        request: InferenceRequest,
    ) -> ClientResult<HashMap<String, Tensor>> {
        let wire = build_predict_request(&request);
        let response = self
            .handle
            .block_on(self.run_predict(StubFlavor::Blocking, wire))?;
        parse_predict_response(&response)
    }

    /// List the models loaded by the backend.
    ///
    /// Uses one arbitrary pool member; no retry.
    pub async fn list_models(&self) -> ClientResult<Vec<ModelDescriptor>> {
        self.reconcile().await?;
        let (_, connection) = self.select().await?;
        let models = connection
            .stub(StubFlavor::Blocking)
            .list_models(self.config.call_timeout())
            .await?;
        Ok(models
            .into_iter()
            .map(|m| ModelDescriptor {
                name: m.name,
                version: m.version,
            })
            .collect())
    }

    /// Current pool size, as seen at this instant
    pub async fn pool_size(&self) -> usize {
        self.pool.lock().await.len()
    }

    /// Sync pool membership with the resolver's current address set
    async fn reconcile(&self) -> ClientResult<()> {
        let current = self.resolver.resolve(&self.config.host).await?;
        let mut pool = self.pool.lock().await;
        reconcile_pool(&mut pool, &current, self.connector.as_ref())
    }

    async fn select(&self) -> ClientResult<(Address, Connection)> {
        self.pool.lock().await.select_next()
    }

    /// The retry state machine shared by both call surfaces.
    ///
    /// Each attempt reconciles membership, selects the next member in
    /// rotation, and issues the call outside the pool lock. Retryable
    /// failures are recorded and the loop moves on; fatal and
    /// cancelled outcomes terminate immediately.
    async fn run_predict(
        &self,
        flavor: StubFlavor,
        request: PredictRequest,
    ) -> ClientResult<PredictResponse> {
        let timeout = self.config.call_timeout();
        let mut errors = Vec::new();

        for attempt in 1..=self.config.n_tries {
            if let Err(e) = self.reconcile().await {
                warn!(attempt, error = %e, "reconciliation failed");
                errors.push(e);
                continue;
            }

            let (addr, connection) = match self.select().await {
                Ok(selected) => selected,
                Err(e) => {
                    warn!(attempt, "connection pool is empty");
                    errors.push(e);
                    continue;
                }
            };

            match connection.stub(flavor).predict(request.clone(), timeout).await {
                Ok(response) => return Ok(response),
                Err(status) => match classify(&status) {
                    Disposition::Fatal => {
                        return Err(ClientError::ModelNotFound(status.message().to_string()));
                    }
                    Disposition::Cancelled => return Err(ClientError::Cancelled),
                    Disposition::Retryable => {
                        warn!(
                            attempt,
                            addr = %addr,
                            code = ?status.code(),
                            error = %status,
                            "predict attempt failed"
                        );
                        errors.push(ClientError::Rpc(status));
                    }
                },
            }
        }

        Err(ClientError::RetryFailed {
            attempts: self.config.n_tries,
            errors,
        })
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("n_tries", &self.config.n_tries)
            .finish_non_exhaustive()
    }
}

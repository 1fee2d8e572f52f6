//! Backend connections and the transport boundary
//!
//! A `Connection` bundles one backend address's two stub flavors: one
//! used by the blocking call surface and one by the concurrent
//! surface. All handles are created together by a `Connect`
//! implementation and dropped together when the reconciler evicts the
//! address.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};
use tracing::{debug, warn};

use servelink_core::{Address, ClientError, ClientResult};
use servelink_proto::{
    ListModelsClient, ListModelsRequest, Model, PredictRequest, PredictResponse,
    PredictionServiceClient,
};

/// Which of a connection's two transport flavors a call goes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubFlavor {
    /// Used by the blocking call surface
    Blocking,
    /// Used by the concurrent call surface
    Concurrent,
}

/// One backend's callable surface.
///
/// Every call is bounded by the supplied deadline; an expired deadline
/// surfaces as `DeadlineExceeded`, which the retry layer treats as
/// retryable.
#[async_trait]
pub trait ServingStub: Send + Sync {
    /// Issue one unary predict call
    async fn predict(
        &self,
        request: PredictRequest,
        timeout: Duration,
    ) -> Result<PredictResponse, tonic::Status>;

    /// List the models loaded by this backend
    async fn list_models(&self, timeout: Duration) -> Result<Vec<Model>, tonic::Status>;
}

/// Live transport bundle for one pooled address.
///
/// Both stubs are constructed together and share teardown: dropping
/// the connection releases both underlying channels.
#[derive(Clone)]
pub struct Connection {
    addr: Address,
    blocking: Arc<dyn ServingStub>,
    concurrent: Arc<dyn ServingStub>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Bundle two stub flavors for an address
    pub fn new(
        addr: Address,
        blocking: Arc<dyn ServingStub>,
        concurrent: Arc<dyn ServingStub>,
    ) -> Self {
        Self {
            addr,
            blocking,
            concurrent,
        }
    }

    /// The address this connection is bound to
    pub fn addr(&self) -> &Address {
        &self.addr
    }

    /// The stub for the requested flavor
    pub fn stub(&self, flavor: StubFlavor) -> &dyn ServingStub {
        match flavor {
            StubFlavor::Blocking => self.blocking.as_ref(),
            StubFlavor::Concurrent => self.concurrent.as_ref(),
        }
    }

    /// Release both transport handles. Idempotent: clones of this
    /// connection still in flight keep their handles alive until they
    /// finish.
    pub fn close(self) {
        debug!(addr = %self.addr, "closing connection");
    }
}

/// Creates connections for addresses joining the pool
pub trait Connect: Send + Sync {
    /// Open both transport flavors for an address
    fn connect(&self, addr: &Address) -> ClientResult<Connection>;
}

/// Connector that opens lazy tonic channels.
///
/// Channels are built eagerly but connect on first use, so an
/// unreachable backend surfaces as a call error, not a construction
/// error.
pub struct GrpcConnector {
    port: u16,
    ca_pem: Option<String>,
    channel_options: BTreeMap<String, String>,
}

impl GrpcConnector {
    /// Create a connector for a backend port, with optional CA PEM for
    /// TLS and channel options interpreted by the transport
    pub fn new(
        port: u16,
        ca_pem: Option<String>,
        channel_options: BTreeMap<String, String>,
    ) -> Self {
        Self {
            port,
            ca_pem,
            channel_options,
        }
    }

    fn open_channel(&self, addr: &Address) -> ClientResult<Channel> {
        let scheme = if self.ca_pem.is_some() { "https" } else { "http" };
        let uri = format!("{}://{}:{}", scheme, addr, self.port);
        let mut endpoint =
            Endpoint::from_shared(uri).map_err(|e| ClientError::Transport(e.to_string()))?;

        if let Some(pem) = &self.ca_pem {
            let tls = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem));
            endpoint = endpoint
                .tls_config(tls)
                .map_err(|e| ClientError::Transport(e.to_string()))?;
        }

        endpoint = apply_channel_options(endpoint, &self.channel_options)?;
        Ok(endpoint.connect_lazy())
    }
}

impl Connect for GrpcConnector {
    fn connect(&self, addr: &Address) -> ClientResult<Connection> {
        let blocking = self.open_channel(addr)?;
        let concurrent = self.open_channel(addr)?;
        debug!(addr = %addr, port = self.port, "opened channel pair");
        Ok(Connection::new(
            addr.clone(),
            Arc::new(GrpcStub::new(blocking)),
            Arc::new(GrpcStub::new(concurrent)),
        ))
    }
}

fn apply_channel_options(
    mut endpoint: Endpoint,
    options: &BTreeMap<String, String>,
) -> ClientResult<Endpoint> {
    for (key, value) in options {
        endpoint = match key.as_str() {
            "connect_timeout_ms" => {
                endpoint.connect_timeout(Duration::from_millis(parse_option(key, value)?))
            }
            "tcp_nodelay" => endpoint.tcp_nodelay(parse_option(key, value)?),
            "http2_keep_alive_interval_ms" => {
                endpoint.http2_keep_alive_interval(Duration::from_millis(parse_option(key, value)?))
            }
            "keep_alive_timeout_ms" => {
                endpoint.keep_alive_timeout(Duration::from_millis(parse_option(key, value)?))
            }
            "keep_alive_while_idle" => endpoint.keep_alive_while_idle(parse_option(key, value)?),
            "concurrency_limit" => endpoint.concurrency_limit(parse_option(key, value)?),
            _ => {
                warn!(option = %key, "ignoring unrecognized channel option");
                endpoint
            }
        };
    }
    Ok(endpoint)
}

fn parse_option<T: FromStr>(key: &str, value: &str) -> ClientResult<T> {
    value.parse().map_err(|_| {
        ClientError::Config(format!(
            "invalid value {:?} for channel option {:?}",
            value, key
        ))
    })
}

/// Stub over one tonic channel
struct GrpcStub {
    predict: PredictionServiceClient<Channel>,
    models: ListModelsClient<Channel>,
}

impl GrpcStub {
    fn new(channel: Channel) -> Self {
        Self {
            predict: PredictionServiceClient::new(channel.clone()),
            models: ListModelsClient::new(channel),
        }
    }
}

#[async_trait]
impl ServingStub for GrpcStub {
    async fn predict(
        &self,
        request: PredictRequest,
        timeout: Duration,
    ) -> Result<PredictResponse, tonic::Status> {
        let mut client = self.predict.clone();
        match tokio::time::timeout(timeout, client.predict(request)).await {
            Ok(result) => result.map(tonic::Response::into_inner),
            Err(_) => Err(tonic::Status::deadline_exceeded(format!(
                "predict timed out after {:?}",
                timeout
            ))),
        }
    }

    async fn list_models(&self, timeout: Duration) -> Result<Vec<Model>, tonic::Status> {
        let mut client = self.models.clone();
        match tokio::time::timeout(timeout, client.list_models(ListModelsRequest {})).await {
            Ok(result) => result.map(|response| response.into_inner().models),
            Err(_) => Err(tonic::Status::deadline_exceeded(format!(
                "list_models timed out after {:?}",
                timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connector_builds_lazy_connection() {
        let connector = GrpcConnector::new(8500, None, BTreeMap::new());
        let connection = connector.connect(&Address::from("127.0.0.1")).unwrap();
        assert_eq!(connection.addr(), &Address::from("127.0.0.1"));
    }

    #[test]
    fn test_invalid_channel_option_value_fails() {
        let mut options = BTreeMap::new();
        options.insert("connect_timeout_ms".to_string(), "soon".to_string());
        let connector = GrpcConnector::new(8500, None, options);
        let err = connector.connect(&Address::from("127.0.0.1")).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn test_unknown_channel_option_is_ignored() {
        let mut options = BTreeMap::new();
        options.insert("grpc.some_future_option".to_string(), "1".to_string());
        let connector = GrpcConnector::new(8500, None, options);
        assert!(connector.connect(&Address::from("127.0.0.1")).is_ok());
    }
}

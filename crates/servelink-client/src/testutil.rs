//! Shared test doubles for the resolver and transport boundaries

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tonic::{Code, Status};

use servelink_core::{Address, ClientError, ClientResult};
use servelink_proto::{Model, PredictRequest, PredictResponse};

use crate::connection::{Connect, Connection, ServingStub};
use crate::resolver::Resolve;

pub(crate) fn addr_set(addrs: &[&str]) -> HashSet<Address> {
    addrs.iter().map(|a| Address::from(*a)).collect()
}

/// Resolver whose answer can be swapped mid-test
pub(crate) struct StaticResolver {
    current: Mutex<HashSet<Address>>,
    fail: bool,
}

impl StaticResolver {
    pub(crate) fn new(addrs: HashSet<Address>) -> Self {
        Self {
            current: Mutex::new(addrs),
            fail: false,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            current: Mutex::new(HashSet::new()),
            fail: true,
        }
    }

    pub(crate) fn set(&self, addrs: HashSet<Address>) {
        *self.current.lock().unwrap() = addrs;
    }
}

#[async_trait]
impl Resolve for StaticResolver {
    async fn resolve(&self, host: &str) -> ClientResult<HashSet<Address>> {
        if self.fail {
            return Err(ClientError::Resolution {
                host: host.to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        Ok(self.current.lock().unwrap().clone())
    }
}

/// What scripted stubs do when called
#[derive(Debug, Clone, Copy)]
pub(crate) enum Behavior {
    /// Return an empty response / a single default model
    Succeed,
    /// Fail every call with this status
    Fail(Code, &'static str),
}

/// Connector that counts connects and hands out scripted stubs.
///
/// All stubs share one call log so tests can observe which addresses
/// served which attempts.
pub(crate) struct RecordingConnector {
    behavior: Behavior,
    connects: Mutex<Vec<Address>>,
    calls: Arc<Mutex<Vec<Address>>>,
}

impl RecordingConnector {
    pub(crate) fn succeeding() -> Self {
        Self::with_behavior(Behavior::Succeed)
    }

    pub(crate) fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            connects: Mutex::new(Vec::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn connect_count(&self) -> usize {
        self.connects.lock().unwrap().len()
    }

    pub(crate) fn calls(&self) -> Vec<Address> {
        self.calls.lock().unwrap().clone()
    }
}

impl Connect for RecordingConnector {
    fn connect(&self, addr: &Address) -> ClientResult<Connection> {
        self.connects.lock().unwrap().push(addr.clone());
        let stub = Arc::new(ScriptedStub {
            addr: addr.clone(),
            behavior: self.behavior,
            calls: self.calls.clone(),
        });
        Ok(Connection::new(addr.clone(), stub.clone(), stub))
    }
}

struct ScriptedStub {
    addr: Address,
    behavior: Behavior,
    calls: Arc<Mutex<Vec<Address>>>,
}

#[async_trait]
impl ServingStub for ScriptedStub {
    async fn predict(
        &self,
        _request: PredictRequest,
        _timeout: Duration,
    ) -> Result<PredictResponse, Status> {
        self.calls.lock().unwrap().push(self.addr.clone());
        match self.behavior {
            Behavior::Succeed => Ok(PredictResponse::default()),
            Behavior::Fail(code, message) => Err(Status::new(code, message)),
        }
    }

    async fn list_models(&self, _timeout: Duration) -> Result<Vec<Model>, Status> {
        match self.behavior {
            Behavior::Succeed => Ok(vec![Model {
                name: "default".to_string(),
                version: 1,
            }]),
            Behavior::Fail(code, message) => Err(Status::new(code, message)),
        }
    }
}

/// A connection whose stubs are never expected to be called
pub(crate) fn idle_connection(addr: &Address) -> Connection {
    let stub = Arc::new(ScriptedStub {
        addr: addr.clone(),
        behavior: Behavior::Fail(Code::Unavailable, "idle test connection"),
        calls: Arc::new(Mutex::new(Vec::new())),
    });
    Connection::new(addr.clone(), stub.clone(), stub)
}

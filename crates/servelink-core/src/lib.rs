//! servelink-core: Core types for servelink
//!
//! This crate provides the shared vocabulary of the client:
//! - Backend addresses and inference request/response types
//! - Tensor values exchanged with the serving backend
//! - Client configuration
//! - The error taxonomy

pub mod config;
pub mod error;
pub mod model;
pub mod tensor;

pub use config::{ClientConfig, DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_N_TRIES};
pub use error::{ClientError, ClientResult};
pub use model::{Address, InferenceRequest, ModelDescriptor, DEFAULT_MODEL_NAME};
pub use tensor::{Tensor, TensorValue};

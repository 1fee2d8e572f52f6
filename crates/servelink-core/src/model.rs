//! Address, inference request, and model descriptor types

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tensor::Tensor;

/// Model name used when the caller does not specify one
pub const DEFAULT_MODEL_NAME: &str = "default";

/// A resolvable network endpoint identifier for one backend instance.
///
/// Typically an IP address returned by name resolution. Addresses are
/// the unique keys of the connection pool; the string itself is opaque
/// to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Create an address from a host string
    pub fn new(host: impl Into<String>) -> Self {
        Self(host.into())
    }

    /// The raw host string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(host: &str) -> Self {
        Self(host.to_string())
    }
}

impl From<String> for Address {
    fn from(host: String) -> Self {
        Self(host)
    }
}

impl From<std::net::IpAddr> for Address {
    fn from(ip: std::net::IpAddr) -> Self {
        Self(ip.to_string())
    }
}

/// A logical prediction request: named input tensors plus model routing
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    /// Named input tensors
    pub inputs: HashMap<String, Tensor>,
    /// Restrict the response to these output names, if set
    pub output_names: Option<Vec<String>>,
    /// Target model name
    pub model_name: String,
    /// Target model signature, if any
    pub signature_name: Option<String>,
}

impl InferenceRequest {
    /// Create a request for the default model
    pub fn new(inputs: HashMap<String, Tensor>) -> Self {
        Self {
            inputs,
            output_names: None,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            signature_name: None,
        }
    }

    /// Target a specific model
    pub fn with_model(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    /// Target a specific model signature
    pub fn with_signature(mut self, name: impl Into<String>) -> Self {
        self.signature_name = Some(name.into());
        self
    }

    /// Restrict the outputs returned by the backend
    pub fn with_output_names(mut self, names: Vec<String>) -> Self {
        self.output_names = Some(names);
        self
    }
}

/// A model advertised by the serving backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Model name
    pub name: String,
    /// Loaded model version
    pub version: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::TensorValue;

    #[test]
    fn test_address_display() {
        let addr = Address::from("10.0.0.1");
        assert_eq!(addr.to_string(), "10.0.0.1");
        assert_eq!(addr.as_str(), "10.0.0.1");
    }

    #[test]
    fn test_inference_request_defaults() {
        let req = InferenceRequest::new(HashMap::new());
        assert_eq!(req.model_name, DEFAULT_MODEL_NAME);
        assert!(req.output_names.is_none());
        assert!(req.signature_name.is_none());
    }

    #[test]
    fn test_inference_request_builders() {
        let mut inputs = HashMap::new();
        inputs.insert(
            "a".to_string(),
            Tensor::new(vec![2], TensorValue::Float(vec![1.0, 2.0])),
        );
        let req = InferenceRequest::new(inputs)
            .with_model("resnet")
            .with_signature("serving_default")
            .with_output_names(vec!["logits".to_string()]);
        assert_eq!(req.model_name, "resnet");
        assert_eq!(req.signature_name.as_deref(), Some("serving_default"));
        assert_eq!(req.output_names.as_deref(), Some(&["logits".to_string()][..]));
    }
}

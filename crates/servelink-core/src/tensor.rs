//! Tensor value types exchanged with the serving backend
//!
//! The wire representation lives in `servelink-proto`; these types are
//! what callers construct and receive.

use serde::{Deserialize, Serialize};

/// Typed element storage for a tensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorValue {
    /// 32-bit floats
    Float(Vec<f32>),
    /// 64-bit floats
    Double(Vec<f64>),
    /// 32-bit signed integers
    Int(Vec<i32>),
    /// 64-bit signed integers
    Int64(Vec<i64>),
    /// Booleans
    Bool(Vec<bool>),
    /// UTF-8 strings
    String(Vec<String>),
    /// Raw byte strings, for payloads that are not valid UTF-8
    /// (serialized images, encoded examples)
    Bytes(Vec<Vec<u8>>),
}

impl TensorValue {
    /// Number of elements stored
    pub fn len(&self) -> usize {
        match self {
            TensorValue::Float(v) => v.len(),
            TensorValue::Double(v) => v.len(),
            TensorValue::Int(v) => v.len(),
            TensorValue::Int64(v) => v.len(),
            TensorValue::Bool(v) => v.len(),
            TensorValue::String(v) => v.len(),
            TensorValue::Bytes(v) => v.len(),
        }
    }

    /// Whether the value holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A shaped, typed payload for one named input or output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    /// Dimension sizes, outermost first. Empty for scalars.
    pub shape: Vec<i64>,
    /// Element storage
    pub value: TensorValue,
}

impl Tensor {
    /// Create a tensor from a shape and value
    pub fn new(shape: Vec<i64>, value: TensorValue) -> Self {
        Self { shape, value }
    }

    /// A scalar f32 tensor
    pub fn scalar_f32(value: f32) -> Self {
        Self::new(Vec::new(), TensorValue::Float(vec![value]))
    }

    /// A rank-1 f32 tensor
    pub fn vector_f32(values: Vec<f32>) -> Self {
        let len = values.len() as i64;
        Self::new(vec![len], TensorValue::Float(values))
    }

    /// Number of elements implied by the shape
    pub fn element_count(&self) -> i64 {
        self.shape.iter().product()
    }
}

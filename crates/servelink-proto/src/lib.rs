//! servelink-proto: Wire layer for servelink
//!
//! This crate provides:
//! - prost message types for the TensorFlow-Serving-compatible Predict
//!   RPC and the ListModels RPC
//! - hand-rolled tonic unary client stubs for both services
//! - conversions between `servelink_core` tensors and wire tensors

pub mod client;
pub mod convert;
pub mod messages;

pub use client::{ListModelsClient, PredictionServiceClient};
pub use convert::{build_predict_request, decode_tensor, encode_tensor, parse_predict_response};
pub use messages::{
    DataType, ListModelsRequest, ListModelsResponse, Model, ModelSpec, PredictRequest,
    PredictResponse, TensorProto, TensorShapeProto,
};

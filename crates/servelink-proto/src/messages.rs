//! Wire message definitions
//!
//! Hand-written prost structs matching the subset of the
//! TensorFlow Serving predict surface the client speaks, plus the
//! sidecar ListModels service. Field numbers follow the upstream
//! protos so the bytes interoperate with a stock model server.

use std::collections::HashMap;

/// Tensor element type. Values match TensorFlow's `DataType` enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum DataType {
    DtInvalid = 0,
    DtFloat = 1,
    DtDouble = 2,
    DtInt32 = 3,
    DtString = 7,
    DtInt64 = 9,
    DtBool = 10,
}

/// Shape of a tensor
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorShapeProto {
    #[prost(message, repeated, tag = "2")]
    pub dim: Vec<tensor_shape_proto::Dim>,
    #[prost(bool, tag = "3")]
    pub unknown_rank: bool,
}

pub mod tensor_shape_proto {
    /// One dimension of a tensor shape
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Dim {
        #[prost(int64, tag = "1")]
        pub size: i64,
        #[prost(string, tag = "2")]
        pub name: String,
    }
}

/// A serialized tensor value
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TensorProto {
    #[prost(enumeration = "DataType", tag = "1")]
    pub dtype: i32,
    #[prost(message, optional, tag = "2")]
    pub tensor_shape: Option<TensorShapeProto>,
    #[prost(int32, tag = "3")]
    pub version_number: i32,
    /// Row-major packed representation, used instead of the typed
    /// repeated fields by some producers
    #[prost(bytes = "vec", tag = "4")]
    pub tensor_content: Vec<u8>,
    #[prost(float, repeated, tag = "5")]
    pub float_val: Vec<f32>,
    #[prost(double, repeated, tag = "6")]
    pub double_val: Vec<f64>,
    #[prost(int32, repeated, tag = "7")]
    pub int_val: Vec<i32>,
    #[prost(bytes = "vec", repeated, tag = "8")]
    pub string_val: Vec<Vec<u8>>,
    #[prost(int64, repeated, tag = "10")]
    pub int64_val: Vec<i64>,
    #[prost(bool, repeated, tag = "11")]
    pub bool_val: Vec<bool>,
}

/// Identifies the model and signature a request targets
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModelSpec {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(message, optional, tag = "2")]
    pub version: Option<i64>,
    #[prost(string, tag = "3")]
    pub signature_name: String,
}

/// Predict RPC request
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PredictRequest {
    #[prost(message, optional, tag = "1")]
    pub model_spec: Option<ModelSpec>,
    #[prost(map = "string, message", tag = "2")]
    pub inputs: HashMap<String, TensorProto>,
    #[prost(string, repeated, tag = "3")]
    pub output_filter: Vec<String>,
}

/// Predict RPC response
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PredictResponse {
    #[prost(map = "string, message", tag = "1")]
    pub outputs: HashMap<String, TensorProto>,
    #[prost(message, optional, tag = "2")]
    pub model_spec: Option<ModelSpec>,
}

/// ListModels RPC request
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListModelsRequest {}

/// ListModels RPC response
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListModelsResponse {
    #[prost(message, repeated, tag = "1")]
    pub models: Vec<Model>,
}

/// One model advertised by the backend
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Model {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(int64, tag = "2")]
    pub version: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_predict_request_roundtrip() {
        let mut inputs = HashMap::new();
        inputs.insert(
            "a".to_string(),
            TensorProto {
                dtype: DataType::DtFloat as i32,
                float_val: vec![1.0, 2.0],
                ..Default::default()
            },
        );
        let req = PredictRequest {
            model_spec: Some(ModelSpec {
                name: "default".to_string(),
                version: None,
                signature_name: String::new(),
            }),
            inputs,
            output_filter: vec!["c".to_string()],
        };

        let bytes = req.encode_to_vec();
        let decoded = PredictRequest::decode(bytes.as_slice()).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn test_empty_list_models_request_encodes_to_nothing() {
        let req = ListModelsRequest {};
        assert!(req.encode_to_vec().is_empty());
    }
}

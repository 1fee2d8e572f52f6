//! Conversions between core tensors and wire messages

use std::collections::HashMap;

use servelink_core::{ClientError, ClientResult, InferenceRequest, Tensor, TensorValue};

use crate::messages::{
    tensor_shape_proto::Dim, DataType, ModelSpec, PredictRequest, PredictResponse, TensorProto,
    TensorShapeProto,
};

/// Encode a core tensor into its wire representation.
///
/// Always emits the typed repeated fields rather than packed
/// `tensor_content`; both are accepted by stock model servers.
pub fn encode_tensor(tensor: &Tensor) -> TensorProto {
    let shape = TensorShapeProto {
        dim: tensor
            .shape
            .iter()
            .map(|&size| Dim {
                size,
                name: String::new(),
            })
            .collect(),
        unknown_rank: false,
    };

    let mut proto = TensorProto {
        tensor_shape: Some(shape),
        ..Default::default()
    };

    match &tensor.value {
        TensorValue::Float(v) => {
            proto.dtype = DataType::DtFloat as i32;
            proto.float_val = v.clone();
        }
        TensorValue::Double(v) => {
            proto.dtype = DataType::DtDouble as i32;
            proto.double_val = v.clone();
        }
        TensorValue::Int(v) => {
            proto.dtype = DataType::DtInt32 as i32;
            proto.int_val = v.clone();
        }
        TensorValue::Int64(v) => {
            proto.dtype = DataType::DtInt64 as i32;
            proto.int64_val = v.clone();
        }
        TensorValue::Bool(v) => {
            proto.dtype = DataType::DtBool as i32;
            proto.bool_val = v.clone();
        }
        TensorValue::String(v) => {
            proto.dtype = DataType::DtString as i32;
            proto.string_val = v.iter().map(|s| s.clone().into_bytes()).collect();
        }
        TensorValue::Bytes(v) => {
            proto.dtype = DataType::DtString as i32;
            proto.string_val = v.clone();
        }
    }

    proto
}

/// Decode a wire tensor into a core tensor.
///
/// Understands both the typed repeated fields and, for numeric dtypes,
/// the packed little-endian `tensor_content` form.
pub fn decode_tensor(proto: &TensorProto) -> ClientResult<Tensor> {
    let shape: Vec<i64> = proto
        .tensor_shape
        .as_ref()
        .map(|s| s.dim.iter().map(|d| d.size).collect())
        .unwrap_or_default();

    let dtype = DataType::try_from(proto.dtype)
        .map_err(|_| ClientError::Decode(format!("unknown dtype {}", proto.dtype)))?;

    let content = &proto.tensor_content;
    let value = match dtype {
        DataType::DtFloat => TensorValue::Float(if content.is_empty() {
            proto.float_val.clone()
        } else {
            unpack_content(content, 4, |b| f32::from_le_bytes(b.try_into().unwrap()))?
        }),
        DataType::DtDouble => TensorValue::Double(if content.is_empty() {
            proto.double_val.clone()
        } else {
            unpack_content(content, 8, |b| f64::from_le_bytes(b.try_into().unwrap()))?
        }),
        DataType::DtInt32 => TensorValue::Int(if content.is_empty() {
            proto.int_val.clone()
        } else {
            unpack_content(content, 4, |b| i32::from_le_bytes(b.try_into().unwrap()))?
        }),
        DataType::DtInt64 => TensorValue::Int64(if content.is_empty() {
            proto.int64_val.clone()
        } else {
            unpack_content(content, 8, |b| i64::from_le_bytes(b.try_into().unwrap()))?
        }),
        DataType::DtBool => TensorValue::Bool(if content.is_empty() {
            proto.bool_val.clone()
        } else {
            content.iter().map(|&b| b != 0).collect()
        }),
        // UTF-8 decodes to strings; anything else stays raw bytes
        // (DT_STRING carries arbitrary byte strings on the wire).
        DataType::DtString => match proto
            .string_val
            .iter()
            .map(|bytes| String::from_utf8(bytes.clone()))
            .collect::<Result<Vec<String>, _>>()
        {
            Ok(strings) => TensorValue::String(strings),
            Err(_) => TensorValue::Bytes(proto.string_val.clone()),
        },
        DataType::DtInvalid => {
            return Err(ClientError::Decode("tensor has invalid dtype".to_string()));
        }
    };

    Ok(Tensor { shape, value })
}

fn unpack_content<T>(
    content: &[u8],
    width: usize,
    convert: impl Fn(&[u8]) -> T,
) -> ClientResult<Vec<T>> {
    if content.len() % width != 0 {
        return Err(ClientError::Decode(format!(
            "tensor_content length {} is not a multiple of element width {}",
            content.len(),
            width
        )));
    }
    Ok(content.chunks_exact(width).map(convert).collect())
}

/// Build the wire request for a logical prediction request
pub fn build_predict_request(request: &InferenceRequest) -> PredictRequest {
    PredictRequest {
        model_spec: Some(ModelSpec {
            name: request.model_name.clone(),
            version: None,
            signature_name: request.signature_name.clone().unwrap_or_default(),
        }),
        inputs: request
            .inputs
            .iter()
            .map(|(name, tensor)| (name.clone(), encode_tensor(tensor)))
            .collect(),
        output_filter: request.output_names.clone().unwrap_or_default(),
    }
}

/// Decode every named output of a predict response
pub fn parse_predict_response(
    response: &PredictResponse,
) -> ClientResult<HashMap<String, Tensor>> {
    response
        .outputs
        .iter()
        .map(|(name, proto)| Ok((name.clone(), decode_tensor(proto)?)))
        .collect()
}

//! gRPC client stubs
//!
//! Written in the shape `tonic-build` generates so the wire behavior
//! matches a generated client exactly.

use tonic::codegen::http::uri::PathAndQuery;
use tonic::codegen::*;

use crate::messages::{ListModelsRequest, ListModelsResponse, PredictRequest, PredictResponse};

/// Client for the TensorFlow Serving prediction service
#[derive(Debug, Clone)]
pub struct PredictionServiceClient<T> {
    inner: tonic::client::Grpc<T>,
}

impl<T> PredictionServiceClient<T>
where
    T: tonic::client::GrpcService<tonic::body::BoxBody>,
    T::Error: Into<StdError>,
    T::ResponseBody: Body<Data = Bytes> + Send + 'static,
    <T::ResponseBody as Body>::Error: Into<StdError> + Send,
{
    pub fn new(inner: T) -> Self {
        let inner = tonic::client::Grpc::new(inner);
        Self { inner }
    }

    /// Issue one unary Predict call
    pub async fn predict(
        &mut self,
        request: impl tonic::IntoRequest<PredictRequest>,
    ) -> std::result::Result<tonic::Response<PredictResponse>, tonic::Status> {
        self.inner.ready().await.map_err(|e| {
            tonic::Status::new(
                tonic::Code::Unknown,
                format!("Service was not ready: {}", e.into()),
            )
        })?;
        let codec = tonic::codec::ProstCodec::default();
        let path = PathAndQuery::from_static("/tensorflow.serving.PredictionService/Predict");
        let mut req = request.into_request();
        req.extensions_mut().insert(GrpcMethod::new(
            "tensorflow.serving.PredictionService",
            "Predict",
        ));
        self.inner.unary(req, path, codec).await
    }
}

/// Client for the sidecar ListModels service
#[derive(Debug, Clone)]
pub struct ListModelsClient<T> {
    inner: tonic::client::Grpc<T>,
}

impl<T> ListModelsClient<T>
where
    T: tonic::client::GrpcService<tonic::body::BoxBody>,
    T::Error: Into<StdError>,
    T::ResponseBody: Body<Data = Bytes> + Send + 'static,
    <T::ResponseBody as Body>::Error: Into<StdError> + Send,
{
    pub fn new(inner: T) -> Self {
        let inner = tonic::client::Grpc::new(inner);
        Self { inner }
    }

    /// List the models loaded by the backend
    pub async fn list_models(
        &mut self,
        request: impl tonic::IntoRequest<ListModelsRequest>,
    ) -> std::result::Result<tonic::Response<ListModelsResponse>, tonic::Status> {
        self.inner.ready().await.map_err(|e| {
            tonic::Status::new(
                tonic::Code::Unknown,
                format!("Service was not ready: {}", e.into()),
            )
        })?;
        let codec = tonic::codec::ProstCodec::default();
        let path = PathAndQuery::from_static("/serving.ListModels/ListModels");
        let mut req = request.into_request();
        req.extensions_mut()
            .insert(GrpcMethod::new("serving.ListModels", "ListModels"));
        self.inner.unary(req, path, codec).await
    }
}

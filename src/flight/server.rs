//! Hangar Arrow Flight Server
//!
//! Implements the tonic `FlightService` by delegating to a [`CatalogHandler`]
//! and mapping [`crate::Error`] to `tonic::Status`.
//!
//! # Ticket Format
//!
//! A ticket is the UTF-8 dataset key, the same string as the first path
//! segment of the descriptor that resolved it.
//!
//! # Actions
//!
//! - `list_datasets` - JSON summaries of every dataset
//! - `describe` - JSON summary of one dataset (body: key)

use std::pin::Pin;

use arrow_flight::{
    encode::FlightDataEncoderBuilder,
    error::FlightError,
    flight_service_server::{FlightService, FlightServiceServer},
    Action, ActionType, Criteria, Empty, FlightData, FlightDescriptor, FlightInfo,
    HandshakeRequest, HandshakeResponse, PollInfo, PutResult, SchemaAsIpc, SchemaResult,
    Ticket,
};
use arrow_array::RecordBatch;
use arrow_ipc::writer::IpcWriteOptions;
use futures::{stream, Stream, TryStreamExt};
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, error, warn};

use super::actions::{action_types, execute_action};
use super::handler::{CatalogHandler, FlightHandler};
use crate::Error;

/// Handshake protocol version
const PROTOCOL_VERSION: u64 = 1;

/// Stream type for tonic responses
type TonicStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send + 'static>>;

/// Flight service over the dataset catalog
#[derive(Debug, Clone)]
pub struct HangarFlightService {
    handler: CatalogHandler,
}

impl HangarFlightService {
    pub fn new(handler: CatalogHandler) -> Self {
        Self { handler }
    }

    /// Wrap in the generated tonic server
    pub fn into_server(self) -> FlightServiceServer<Self> {
        FlightServiceServer::new(self)
    }
}

/// Log a failed request and convert it for the wire. Caller mistakes are
/// warnings; anything else is a server fault.
fn to_status(err: Error) -> Status {
    if err.is_client_error() {
        warn!(error = %err, "Request rejected");
    } else {
        error!(error = %err, "Request failed");
    }
    Status::from(err)
}

#[tonic::async_trait]
impl FlightService for HangarFlightService {
    type HandshakeStream = TonicStream<HandshakeResponse>;
    type ListFlightsStream = TonicStream<FlightInfo>;
    type DoGetStream = TonicStream<FlightData>;
    type DoPutStream = TonicStream<PutResult>;
    type DoActionStream = TonicStream<arrow_flight::Result>;
    type ListActionsStream = TonicStream<ActionType>;
    type DoExchangeStream = TonicStream<FlightData>;

    async fn handshake(
        &self,
        _request: Request<Streaming<HandshakeRequest>>,
    ) -> Result<Response<Self::HandshakeStream>, Status> {
        let output = stream::once(async {
            Ok(HandshakeResponse {
                protocol_version: PROTOCOL_VERSION,
                payload: bytes::Bytes::from(format!("hangar-flight-{}", crate::VERSION)),
            })
        });
        Ok(Response::new(Box::pin(output)))
    }

    async fn list_flights(
        &self,
        request: Request<Criteria>,
    ) -> Result<Response<Self::ListFlightsStream>, Status> {
        let listing = self.handler.list_flights(&request.into_inner());
        debug!(datasets = listing.size_hint().0, "Listing flights");

        let output = stream::iter(listing.map(|info| info.map_err(to_status)));
        Ok(Response::new(Box::pin(output)))
    }

    async fn get_flight_info(
        &self,
        request: Request<FlightDescriptor>,
    ) -> Result<Response<FlightInfo>, Status> {
        let info = self
            .handler
            .get_flight_info(request.into_inner())
            .map_err(to_status)?;
        Ok(Response::new(info))
    }

    async fn poll_flight_info(
        &self,
        _request: Request<FlightDescriptor>,
    ) -> Result<Response<PollInfo>, Status> {
        Err(Status::unimplemented("poll_flight_info not implemented"))
    }

    async fn get_schema(
        &self,
        request: Request<FlightDescriptor>,
    ) -> Result<Response<SchemaResult>, Status> {
        let dataset = self
            .handler
            .resolve_descriptor(&request.into_inner())
            .map_err(to_status)?;

        let options = IpcWriteOptions::default();
        let schema_result = SchemaAsIpc::new(dataset.schema(), &options)
            .try_into()
            .map_err(|e: arrow_schema::ArrowError| to_status(e.into()))?;

        Ok(Response::new(schema_result))
    }

    /// DoGet - stream a dataset as RecordBatches
    ///
    /// Batches are produced and encoded one at a time as the client pulls.
    /// If the client goes away tonic drops the stream and production stops.
    async fn do_get(
        &self,
        request: Request<Ticket>,
    ) -> Result<Response<Self::DoGetStream>, Status> {
        let batches = self.handler.do_get(&request.into_inner()).map_err(to_status)?;
        let schema = batches.schema();

        let output = FlightDataEncoderBuilder::new()
            .with_schema(schema)
            .build(stream::iter(batches.map(Ok::<RecordBatch, FlightError>)))
            .map_err(|e| to_status(e.into()));

        Ok(Response::new(Box::pin(output)))
    }

    async fn do_put(
        &self,
        _request: Request<Streaming<FlightData>>,
    ) -> Result<Response<Self::DoPutStream>, Status> {
        Err(Status::unimplemented("datasets are read-only"))
    }

    async fn do_action(
        &self,
        request: Request<Action>,
    ) -> Result<Response<Self::DoActionStream>, Status> {
        let action = request.into_inner();
        debug!(action = %action.r#type, "Executing action");

        let result = execute_action(&action.r#type, &action.body, self.handler.registry())
            .map_err(to_status)?;

        let flight_result = arrow_flight::Result {
            body: bytes::Bytes::from(result),
        };

        let output = stream::once(async { Ok(flight_result) });
        Ok(Response::new(Box::pin(output)))
    }

    async fn list_actions(
        &self,
        _request: Request<Empty>,
    ) -> Result<Response<Self::ListActionsStream>, Status> {
        let output = stream::iter(action_types().into_iter().map(Ok));
        Ok(Response::new(Box::pin(output)))
    }

    async fn do_exchange(
        &self,
        _request: Request<Streaming<FlightData>>,
    ) -> Result<Response<Self::DoExchangeStream>, Status> {
        Err(Status::unimplemented("do_exchange not implemented"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow_flight::decode::FlightRecordBatchStream;
    use tonic::Code;

    use crate::storage::seed;

    fn service() -> HangarFlightService {
        let registry = Arc::new(seed::default_registry().unwrap());
        HangarFlightService::new(CatalogHandler::new(
            registry,
            vec!["grpc+tcp://0.0.0.0:8815".to_string()],
        ))
    }

    #[tokio::test]
    async fn test_list_flights_stream() {
        let response = service()
            .list_flights(Request::new(Criteria::default()))
            .await
            .unwrap();
        let infos: Vec<FlightInfo> = response.into_inner().try_collect().await.unwrap();

        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].total_records, 3);
    }

    #[tokio::test]
    async fn test_get_flight_info_not_found_status() {
        let status = service()
            .get_flight_info(Request::new(FlightDescriptor::new_path(vec![
                "nonexistent".to_string(),
            ])))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn test_get_schema() {
        let response = service()
            .get_schema(Request::new(FlightDescriptor::new_path(vec!["people".to_string()])))
            .await
            .unwrap();
        let schema = arrow_schema::Schema::try_from(&response.into_inner()).unwrap();
        assert_eq!(schema.fields().len(), 2);
        assert_eq!(schema.field(0).name(), "name");
    }

    #[tokio::test]
    async fn test_do_get_decodes_rows() {
        let response = service()
            .do_get(Request::new(Ticket::new("people")))
            .await
            .unwrap();

        let flight_data = response.into_inner().map_err(FlightError::from);
        let batches: Vec<RecordBatch> = FlightRecordBatchStream::new_from_flight_data(flight_data)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(batches.iter().map(|b| b.num_rows()).sum::<usize>(), 3);
    }

    #[tokio::test]
    async fn test_do_get_errors() {
        let svc = service();

        let missing = svc.do_get(Request::new(Ticket::new("nonexistent"))).await;
        assert_eq!(missing.err().map(|s| s.code()), Some(Code::NotFound));

        let invalid = svc.do_get(Request::new(Ticket::new(vec![0xc3, 0x28]))).await;
        assert_eq!(invalid.err().map(|s| s.code()), Some(Code::InvalidArgument));
    }

    #[tokio::test]
    async fn test_do_action_describe() {
        let response = service()
            .do_action(Request::new(Action::new("describe", "people")))
            .await
            .unwrap();
        let results: Vec<arrow_flight::Result> = response.into_inner().try_collect().await.unwrap();

        let summary: serde_json::Value = serde_json::from_slice(&results[0].body).unwrap();
        assert_eq!(summary["rows"], 3);
    }

    #[test]
    fn test_to_status_codes() {
        assert_eq!(to_status(Error::not_found("x")).code(), Code::NotFound);
        assert_eq!(
            to_status(Error::MalformedRequest("empty path".into())).code(),
            Code::InvalidArgument
        );
        assert_eq!(
            to_status(Error::SchemaMismatch { key: "x".into(), index: 1 }).code(),
            Code::Internal
        );
    }

    #[tokio::test]
    async fn test_unknown_action_rejected() {
        let status = service()
            .do_action(Request::new(Action::new("drop_everything", "")))
            .await
            .err()
            .map(|s| s.code());
        assert_eq!(status, Some(Code::InvalidArgument));
    }

    #[tokio::test]
    async fn test_read_only_operations_unimplemented() {
        let status = service()
            .poll_flight_info(Request::new(FlightDescriptor::new_path(vec!["people".into()])))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Unimplemented);
    }
}

//! HTTP Client Integration Tests
//!
//! A stub JSON-RPC server records every request it sees and answers with a
//! canned response, so the tests can check both what the client sent and how
//! it read the reply.
//!
//! All test URLs use `http://127.0.0.1:PORT` to avoid DNS resolution.

use fbarpc_client::FbaClient;
use fbarpc_common::protocol::error::FbaError;
use fbarpc_common::protocol::{
    CheckJobParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ReactionSensitivityParams,
    RunFbaParams,
};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// What the stub saw for one request.
#[derive(Debug, Clone)]
struct Recorded {
    authorization: Option<String>,
    body: Value,
}

type Handler = fn(&JsonRpcRequest) -> (StatusCode, Value);

/// Stub JSON-RPC server that runs on a separate task
struct TestJsonRpcServer {
    addr: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestJsonRpcServer {
    async fn new(handler: Handler) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = tokio::sync::oneshot::channel();

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        let Ok((stream, _)) = result else { continue };
                        let io = TokioIo::new(stream);
                        let recorded = recorded.clone();

                        tokio::spawn(async move {
                            let service = service_fn(move |req| {
                                let recorded = recorded.clone();
                                async move { Self::respond(req, recorded, handler).await }
                            });
                            let _ = http1::Builder::new().serve_connection(io, service).await;
                        });
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
        });

        Self {
            addr,
            requests,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    async fn respond(
        req: Request<Incoming>,
        recorded: Arc<Mutex<Vec<Recorded>>>,
        handler: Handler,
    ) -> Result<Response<Full<Bytes>>, hyper::Error> {
        let authorization = req
            .headers()
            .get("authorization")
            .map(|v| v.to_str().unwrap().to_string());
        let whole_body = req.into_body().collect().await?.to_bytes();
        let body: Value = serde_json::from_slice(&whole_body).unwrap();
        recorded.lock().unwrap().push(Recorded {
            authorization,
            body: body.clone(),
        });

        let jsonrpc_req: JsonRpcRequest = serde_json::from_value(body).unwrap();
        let (status, payload) = handler(&jsonrpc_req);

        Ok(Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(serde_json::to_vec(&payload).unwrap())))
            .unwrap())
    }

    fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for TestJsonRpcServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn success(req: &JsonRpcRequest, result: Value) -> (StatusCode, Value) {
    let response = JsonRpcResponse::success(req.id.clone(), result);
    (StatusCode::OK, serde_json::to_value(response).unwrap())
}

fn queued_job(req: &JsonRpcRequest) -> (StatusCode, Value) {
    let kind = match req.method.as_str() {
        "fbaModelServices.queue_runfba" => "RunFBA",
        "fbaModelServices.queue_reaction_sensitivity_analysis" => "ReactionSensitivityAnalysis",
        _ => "Unknown",
    };
    success(
        req,
        json!([{
            "id": "job.17",
            "type": kind,
            "status": "queued",
            "jobdata": req.params[0],
            "queuetime": 1700000000000u64,
            "complete": false
        }]),
    )
}

fn version(req: &JsonRpcRequest) -> (StatusCode, Value) {
    success(req, json!(["3.1.0"]))
}

fn bare_result(req: &JsonRpcRequest) -> (StatusCode, Value) {
    success(req, json!({"id": "job.1"}))
}

fn application_error(req: &JsonRpcRequest) -> (StatusCode, Value) {
    let error = JsonRpcError::application_error(
        "Model iJO1366 not found",
        json!({"name": "JSONRPCError", "method": req.method, "error": "trace"}),
    );
    let response = JsonRpcResponse::error(req.id.clone(), error);
    (StatusCode::INTERNAL_SERVER_ERROR, serde_json::to_value(response).unwrap())
}

fn runfba_params() -> RunFbaParams {
    serde_json::from_value(json!({"model": "iJO1366", "workspace": "alice:home"})).unwrap()
}

// ============================================================================
// Request Shape
// ============================================================================

#[tokio::test]
async fn test_call_sends_qualified_method_and_positional_params() {
    let server = TestJsonRpcServer::new(queued_job).await;
    let client = FbaClient::new(server.base_url()).unwrap();

    client.queue_runfba(&runfba_params()).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let body = &requests[0].body;
    assert_eq!(body["jsonrpc"], "2.0");
    assert_eq!(body["method"], "fbaModelServices.queue_runfba");
    assert!(body["params"].is_array());
    assert_eq!(body["params"].as_array().unwrap().len(), 1);
    assert_eq!(body["params"][0]["model"], "iJO1366");
    assert_eq!(body["params"][0]["formulation"]["objfraction"], 0.1);
    assert!(body["id"].is_number());
    assert!(requests[0].authorization.is_none());
}

#[tokio::test]
async fn test_token_is_sent_in_authorization_header() {
    let server = TestJsonRpcServer::new(version).await;
    let client = FbaClient::new(server.base_url())
        .unwrap()
        .with_token("un=alice|tokenid=1");

    client.version().await.unwrap();

    let requests = server.requests();
    assert_eq!(requests[0].authorization.as_deref(), Some("un=alice|tokenid=1"));
}

// ============================================================================
// Response Handling
// ============================================================================

#[tokio::test]
async fn test_single_result_is_unwrapped() {
    let server = TestJsonRpcServer::new(version).await;
    let client = FbaClient::new(server.base_url()).unwrap();

    assert_eq!(client.version().await.unwrap(), "3.1.0");
    assert_eq!(client.call("version", vec![]).await.unwrap(), json!(["3.1.0"]));
}

#[tokio::test]
async fn test_queue_returns_job_object() {
    let server = TestJsonRpcServer::new(queued_job).await;
    let client = FbaClient::new(server.base_url()).unwrap();

    let mut params: ReactionSensitivityParams =
        serde_json::from_value(json!({"model": "m", "workspace": "ws"})).unwrap();
    params.reactions_to_delete = vec!["rxn00001".into()];
    let job = client.queue_reaction_sensitivity_analysis(&params).await.unwrap();
    assert_eq!(job.id, "job.17");
    assert_eq!(job.kind, "ReactionSensitivityAnalysis");
    assert!(job.is_queued());
    assert_eq!(job.jobdata["reactions_to_delete"], json!(["rxn00001"]));
}

#[tokio::test]
async fn test_result_without_list_is_invalid_response() {
    let server = TestJsonRpcServer::new(bare_result).await;
    let client = FbaClient::new(server.base_url()).unwrap();

    let err = client
        .check_job(&CheckJobParams { jobid: "job.1".into(), auth: None })
        .await
        .unwrap_err();
    assert!(matches!(err, FbaError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_remote_error_surfaces_without_retry() {
    let server = TestJsonRpcServer::new(application_error).await;
    let client = FbaClient::new(server.base_url()).unwrap();

    let err = client.queue_runfba(&runfba_params()).await.unwrap_err();
    match err {
        FbaError::Remote { code, message, data } => {
            assert_eq!(code, -32500);
            assert_eq!(message, "Model iJO1366 not found");
            assert_eq!(data.unwrap()["method"], "fbaModelServices.queue_runfba");
        }
        other => panic!("expected remote error, got {:?}", other),
    }
    assert_eq!(server.requests().len(), 1);
}

// ============================================================================
// Transport Failures
// ============================================================================

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = FbaClient::new(format!("http://{}", addr)).unwrap();
    let err = client.version().await.unwrap_err();
    assert!(matches!(err, FbaError::Transport(_)));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    // Accepts connections but never answers.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let client = FbaClient::new(format!("http://{}", addr))
        .unwrap()
        .with_timeout(Duration::from_millis(200));
    let err = client.version().await.unwrap_err();
    assert!(matches!(err, FbaError::Timeout(200)));
}

use fbarpc_common::protocol::error::{FbaError, Result};
use fbarpc_common::protocol::{
    CheckJobParams, GapfillModelParams, JobObject, ReactionSensitivityParams, RunFbaParams,
};
use fbarpc_common::transport::HttpTransport;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{AUTHORIZATION, CONTENT_TYPE};
use hyper::Request;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Default time allowed for one round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the `fbaModelServices` JSON-RPC module.
///
/// Every call is a single HTTP POST. Nothing is retried: a queue request that
/// failed in flight may or may not have been recorded by the server, and
/// sending it again could queue the job twice.
#[derive(Clone)]
pub struct FbaClient {
    url: String,
    token: Option<String>,
    timeout: Duration,
    http: Client<HttpConnector, Full<Bytes>>,
}

impl FbaClient {
    /// Creates a client for the service at `url`.
    ///
    /// The URL must start with `http://`. The connector speaks plain HTTP
    /// only, so `https://` URLs are refused up front instead of failing on
    /// every call.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        if url.starts_with("https://") {
            return Err(FbaError::InvalidRequest(format!(
                "https is not supported, reach '{}' through a plain http:// endpoint",
                url
            )));
        }
        if !url.starts_with("http://") {
            return Err(FbaError::InvalidRequest(format!(
                "Service URL must start with http://, got '{}'",
                url
            )));
        }

        Ok(Self {
            url,
            token: None,
            timeout: DEFAULT_TIMEOUT,
            http: Client::builder(TokioExecutor::new()).build_http(),
        })
    }

    /// Sends `token` in the `Authorization` header of every call.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Calls `fbaModelServices.<method>` with positional arguments and returns
    /// the raw `result` value.
    pub async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        let request = HttpTransport::build_request(method, args);
        let body = serde_json::to_vec(&request)?;

        let mut builder = Request::builder()
            .method("POST")
            .uri(&self.url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, token.as_str());
        }
        let http_request = builder
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| FbaError::Transport(format!("Failed to build request: {}", e)))?;

        tracing::debug!("calling {} at {}", request.method, self.url);

        let response = tokio::time::timeout(self.timeout, self.http.request(http_request))
            .await
            .map_err(|_| FbaError::Timeout(self.timeout.as_millis() as u64))?
            .map_err(|e| FbaError::Transport(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = tokio::time::timeout(self.timeout, response.into_body().collect())
            .await
            .map_err(|_| FbaError::Timeout(self.timeout.as_millis() as u64))?
            .map_err(|e| FbaError::Transport(format!("Failed to read response: {}", e)))?
            .to_bytes();

        let jsonrpc = match HttpTransport::parse_jsonrpc_response(&body) {
            Ok(jsonrpc) => jsonrpc,
            Err(_) if !status.is_success() => {
                return Err(FbaError::Transport(format!(
                    "HTTP {}: {}",
                    status,
                    String::from_utf8_lossy(&body)
                )));
            }
            Err(e) => return Err(e),
        };

        if let Some(error) = jsonrpc.error {
            return Err(FbaError::Remote {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }
        jsonrpc
            .result
            .ok_or_else(|| FbaError::InvalidResponse("Missing result in success response".to_string()))
    }

    /// Calls a single-value method and returns the value inside its
    /// one-element result list.
    pub async fn call_single<P: Serialize, T: DeserializeOwned>(&self, method: &str, params: &P) -> Result<T> {
        let result = self.call(method, vec![serde_json::to_value(params)?]).await?;
        decode_single(method, result)
    }

    pub async fn version(&self) -> Result<String> {
        let result = self.call("version", Vec::new()).await?;
        decode_single("version", result)
    }

    pub async fn queue_runfba(&self, params: &RunFbaParams) -> Result<JobObject> {
        self.call_single("queue_runfba", params).await
    }

    pub async fn queue_gapfill_model(&self, params: &GapfillModelParams) -> Result<JobObject> {
        self.call_single("queue_gapfill_model", params).await
    }

    pub async fn queue_reaction_sensitivity_analysis(
        &self,
        params: &ReactionSensitivityParams,
    ) -> Result<JobObject> {
        self.call_single("queue_reaction_sensitivity_analysis", params).await
    }

    pub async fn check_job(&self, params: &CheckJobParams) -> Result<JobObject> {
        self.call_single("check_job", params).await
    }
}

/// Unwraps the `[value]` envelope single-value methods return.
pub fn unwrap_single(method: &str, result: Value) -> Result<Value> {
    match result {
        Value::Array(mut values) if values.len() == 1 => Ok(values.remove(0)),
        other => Err(FbaError::InvalidResponse(format!(
            "{} should return a one-element list, got {}",
            method, other
        ))),
    }
}

fn decode_single<T: DeserializeOwned>(method: &str, result: Value) -> Result<T> {
    serde_json::from_value(unwrap_single(method, result)?)
        .map_err(|e| FbaError::InvalidResponse(format!("Unexpected {} result: {}", method, e)))
}

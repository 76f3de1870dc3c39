//! Dice drawn from the random.org JSON-RPC API

use super::Source;
use crate::error::SourceError;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

pub const ENDPOINT: &str = "https://api.random.org/json-rpc/4/invoke";

/// Largest batch a single `generateIntegers` call accepts
const MAX_PER_CALL: usize = 10_000;
/// Bounds the API accepts for `min` and `max`
const MAX_MAGNITUDE: i64 = 1_000_000_000;

/// Failure talking to random.org
#[derive(Debug, thiserror::Error)]
pub enum RandomOrgError {
    #[error("random.org unreachable: {0}")]
    Transport(String),
    #[error("random.org answered with status {0}")]
    Status(u16),
    #[error("random.org error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("unexpected random.org response: {0}")]
    Malformed(String),
    #[error("random.org cannot draw {count} values in {min}..={max}")]
    OutOfRange { count: usize, min: i64, max: i64 },
}

/// Posts one JSON-RPC request and hands back the decoded reply
pub trait Transport {
    fn call(&mut self, url: &str, request: &Value) -> Result<Value, RandomOrgError>;
}

impl<F> Transport for F
where
    F: FnMut(&str, &Value) -> Result<Value, RandomOrgError>,
{
    fn call(&mut self, url: &str, request: &Value) -> Result<Value, RandomOrgError> {
        self(url, request)
    }
}

/// Blocking HTTP transport
#[derive(Debug, Clone, Default)]
pub struct Http {
    client: reqwest::blocking::Client,
}

impl Transport for Http {
    fn call(&mut self, url: &str, request: &Value) -> Result<Value, RandomOrgError> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .map_err(|e| RandomOrgError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            warn!("random.org API error: {}", status);
            return Err(RandomOrgError::Status(status.as_u16()));
        }
        response
            .json()
            .map_err(|e| RandomOrgError::Malformed(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: Params<'a>,
    id: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Params<'a> {
    api_key: &'a str,
    n: usize,
    min: i64,
    max: i64,
    replacement: bool,
}

#[derive(Debug, Deserialize)]
struct Response {
    result: Option<RpcResult>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcResult {
    random: RandomData,
    #[serde(default)]
    requests_left: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RandomData {
    data: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// True random dice from random.org, one request per draw
#[derive(Debug)]
pub struct RandomOrg<T: Transport = Http> {
    api_key: String,
    url: String,
    transport: T,
    id: u64,
}

impl RandomOrg<Http> {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_transport(api_key, Http::default())
    }
}

impl<T: Transport> RandomOrg<T> {
    pub fn with_transport(api_key: impl Into<String>, transport: T) -> Self {
        Self {
            api_key: api_key.into(),
            url: ENDPOINT.to_owned(),
            transport,
            id: 0,
        }
    }

    fn generate(&mut self, count: usize, min: i64, max: i64) -> Result<Vec<i64>, RandomOrgError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        if count > MAX_PER_CALL || min > max || min < -MAX_MAGNITUDE || max > MAX_MAGNITUDE {
            return Err(RandomOrgError::OutOfRange { count, min, max });
        }
        self.id += 1;
        let request = Request {
            jsonrpc: "2.0",
            method: "generateIntegers",
            params: Params {
                api_key: &self.api_key,
                n: count,
                min,
                max,
                replacement: true,
            },
            id: self.id,
        };
        let request =
            serde_json::to_value(&request).map_err(|e| RandomOrgError::Malformed(e.to_string()))?;
        let reply = self.transport.call(&self.url, &request)?;
        let reply: Response =
            serde_json::from_value(reply).map_err(|e| RandomOrgError::Malformed(e.to_string()))?;
        match (reply.result, reply.error) {
            (_, Some(error)) => Err(RandomOrgError::Api {
                code: error.code,
                message: error.message,
            }),
            (Some(result), None) => {
                debug!("random.org requests left: {:?}", result.requests_left);
                let data = result.random.data;
                if data.len() != count || data.iter().any(|v| *v < min || *v > max) {
                    return Err(RandomOrgError::Malformed(format!(
                        "asked for {} values in {}..={}, got {:?}",
                        count, min, max, data
                    )));
                }
                Ok(data)
            }
            (None, None) => Err(RandomOrgError::Malformed("no result".to_owned())),
        }
    }
}

impl<T: Transport> Source for RandomOrg<T> {
    fn draw(&mut self, count: usize, min: i64, max: i64) -> Result<Vec<i64>, SourceError> {
        Ok(self.generate(count, min, max)?)
    }
}

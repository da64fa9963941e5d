//! HTTP JSON-RPC client for an aria2 instance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dl_logging::dl_debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::client::{EngineClient, EngineError, SubmitOptions};
use crate::{EngineState, Gid, JobStatus};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Keys requested from `aria2.tellStatus` for each poll.
pub const STATUS_KEYS: [&str; 5] = [
    "gid",
    "completedLength",
    "totalLength",
    "downloadSpeed",
    "status",
];

pub struct Aria2Client {
    http: reqwest::Client,
    endpoint: String,
    token: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcFault>,
}

#[derive(Debug, Deserialize)]
struct RpcFault {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStatus {
    gid: String,
    completed_length: String,
    total_length: String,
    #[serde(default)]
    download_speed: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl Aria2Client {
    /// * `endpoint` - JSON-RPC URL, e.g. `http://127.0.0.1:6800/jsonrpc`.
    /// * `secret`   - value of aria2's `--rpc-secret`.
    pub fn new(endpoint: impl Into<String>, secret: &str) -> Result<Self, EngineError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| EngineError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            token: format!("token:{secret}"),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Calls an `aria2.*` method with the secret token prepended.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, EngineError> {
        let mut with_token = Vec::with_capacity(params.len() + 1);
        with_token.push(Value::String(self.token.clone()));
        with_token.extend(params);
        self.raw_call(method, Value::Array(with_token)).await
    }

    async fn raw_call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, EngineError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id.to_string(),
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|err| EngineError::Transport(err.to_string()))?;

        // aria2 answers faults with a non-2xx status and a JSON-RPC error body.
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| EngineError::Transport(err.to_string()))?;
        let envelope: RpcResponse<T> = serde_json::from_str(&text).map_err(|err| {
            if status.is_success() {
                EngineError::Malformed(format!("{method}: {err}"))
            } else {
                EngineError::Transport(format!("{method}: http status {status}"))
            }
        })?;

        match (envelope.result, envelope.error) {
            (_, Some(fault)) => Err(EngineError::Rpc {
                code: fault.code,
                message: fault.message,
            }),
            (Some(result), None) => Ok(result),
            (None, None) => Err(EngineError::Malformed(format!(
                "{method}: neither result nor error"
            ))),
        }
    }
}

/// aria2 option object for a submission. aria2 expects every value as a string.
pub fn to_aria2_options(options: &SubmitOptions) -> Map<String, Value> {
    let mut map = Map::new();
    if let Some(out) = &options.out {
        map.insert("out".into(), Value::String(out.clone()));
    }
    if let Some(dir) = &options.dir {
        map.insert("dir".into(), Value::String(dir.to_string_lossy().into_owned()));
    }
    if let Some(referer) = &options.referer {
        map.insert("referer".into(), Value::String(referer.clone()));
    }
    if let Some(split) = options.split {
        map.insert("split".into(), Value::String(split.to_string()));
    }
    map
}

/// Parses a `system.multicall` result of `aria2.tellStatus` calls. Faulted
/// entries (typically unknown gids) are skipped.
pub fn parse_multicall_statuses(entries: Vec<Value>) -> Result<Vec<JobStatus>, EngineError> {
    let mut statuses = Vec::with_capacity(entries.len());
    for entry in entries {
        let raw = match entry {
            Value::Array(mut values) if !values.is_empty() => values.swap_remove(0),
            Value::Object(fault) => {
                dl_debug!("tellStatus fault in multicall: {:?}", fault);
                continue;
            }
            other => {
                return Err(EngineError::Malformed(format!(
                    "unexpected multicall entry: {other}"
                )))
            }
        };
        let raw: RawStatus = serde_json::from_value(raw)
            .map_err(|err| EngineError::Malformed(format!("tellStatus: {err}")))?;
        statuses.push(JobStatus {
            completed_length: parse_count("completedLength", &raw.completed_length)?,
            total_length: parse_count("totalLength", &raw.total_length)?,
            download_speed: raw
                .download_speed
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            state: raw.status.as_deref().and_then(EngineState::parse),
            gid: raw.gid,
        });
    }
    Ok(statuses)
}

fn parse_count(field: &str, raw: &str) -> Result<u64, EngineError> {
    raw.parse()
        .map_err(|_| EngineError::Malformed(format!("{field} is not a number: {raw:?}")))
}

#[async_trait::async_trait]
impl EngineClient for Aria2Client {
    async fn version(&self) -> Result<String, EngineError> {
        let info: VersionInfo = self.call("aria2.getVersion", Vec::new()).await?;
        Ok(info.version)
    }

    async fn submit(&self, sources: &[String], options: &SubmitOptions) -> Result<Gid, EngineError> {
        self.call(
            "aria2.addUri",
            vec![json!(sources), Value::Object(to_aria2_options(options))],
        )
        .await
    }

    async fn batch_query(&self, gids: &[Gid]) -> Result<Vec<JobStatus>, EngineError> {
        if gids.is_empty() {
            return Ok(Vec::new());
        }
        let calls: Vec<Value> = gids
            .iter()
            .map(|gid| {
                json!({
                    "methodName": "aria2.tellStatus",
                    "params": [self.token, gid, STATUS_KEYS],
                })
            })
            .collect();
        let entries: Vec<Value> = self.raw_call("system.multicall", json!([calls])).await?;
        parse_multicall_statuses(entries)
    }

    async fn force_shutdown(&self) -> Result<(), EngineError> {
        let _ok: String = self.call("aria2.forceShutdown", Vec::new()).await?;
        Ok(())
    }
}

// crates/db/src/connection/remote.rs
//! Hosted libSQL replica, reached through the Hrana-over-HTTP v2 pipeline.
//!
//! Every statement is sent as its own `execute + close` pipeline, so no
//! stream baton is carried between calls.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::{ExecuteResult, JsonRow};
use crate::config::redact_url;
use crate::value::SqlValue;
use crate::{DbError, DbResult};

const ERROR_BODY_LIMIT: usize = 200;

#[derive(Clone)]
pub(super) struct RemoteBackend {
    client: reqwest::Client,
    pipeline_url: String,
    auth_token: Option<String>,
    endpoint: String,
}

impl fmt::Debug for RemoteBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteBackend")
            .field("endpoint", &self.endpoint)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RemoteBackend {
    pub(super) fn new(url: &str, auth_token: Option<String>, timeout: Duration) -> DbResult<Self> {
        let endpoint = redact_url(url);
        let (base, query_token) = split_url(url);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DbError::Connection {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            pipeline_url: format!("{base}/v2/pipeline"),
            auth_token: auth_token.or(query_token),
            endpoint,
        })
    }

    /// Round-trip a trivial statement so a bad URL or token fails at connect.
    pub(super) async fn probe(&self) -> DbResult<()> {
        self.run("SELECT 1", &[], true).await.map(|_| ())
    }

    pub(super) async fn query(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<JsonRow>> {
        let result = self.run(sql, params, true).await?;
        let names: Vec<String> = result
            .cols
            .iter()
            .enumerate()
            .map(|(i, c)| c.name.clone().unwrap_or_else(|| format!("column{i}")))
            .collect();

        result
            .rows
            .into_iter()
            .map(|row| {
                names
                    .iter()
                    .cloned()
                    .zip(row)
                    .map(|(name, value)| value.into_json().map(|v| (name, v)))
                    .collect::<DbResult<JsonRow>>()
            })
            .collect()
    }

    pub(super) async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<ExecuteResult> {
        let result = self.run(sql, params, false).await?;
        let inserted_id = result
            .last_insert_rowid
            .as_deref()
            .and_then(|id| id.parse::<i64>().ok())
            .filter(|&id| id != 0 && result.affected_row_count > 0);
        Ok(ExecuteResult {
            changes: result.affected_row_count,
            inserted_id,
        })
    }

    async fn run(&self, sql: &str, params: &[SqlValue], want_rows: bool) -> DbResult<StmtResult> {
        let body = PipelineRequest {
            requests: vec![
                StreamRequest::Execute {
                    stmt: Stmt {
                        sql,
                        args: params.iter().map(HranaValue::from).collect(),
                        want_rows,
                    },
                },
                StreamRequest::Close,
            ],
        };

        let mut request = self.client.post(&self.pipeline_url).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = format!("HTTP {status}: {}", truncate(&text, ERROR_BODY_LIMIT));
            return Err(
                if status == StatusCode::UNAUTHORIZED
                    || status == StatusCode::FORBIDDEN
                    || status.is_server_error()
                {
                    self.unreachable(message)
                } else {
                    DbError::Query {
                        message,
                        sql: sql.to_string(),
                    }
                },
            );
        }

        let parsed: PipelineResponse = response
            .json()
            .await
            .map_err(|e| self.unreachable(format!("invalid pipeline response: {e}")))?;

        match parsed.results.into_iter().next() {
            Some(StreamResult::Ok {
                response: StreamResponse::Execute { result },
            }) => Ok(result),
            Some(StreamResult::Error { error }) => Err(DbError::Query {
                message: match error.code {
                    Some(code) => format!("{} ({code})", error.message),
                    None => error.message,
                },
                sql: sql.to_string(),
            }),
            _ => Err(self.unreachable("pipeline returned no execute result".to_string())),
        }
    }

    fn unreachable(&self, message: String) -> DbError {
        DbError::Connection {
            endpoint: self.endpoint.clone(),
            message,
        }
    }
}

/// Normalize a `libsql://` URL to its HTTPS base and pull out any
/// `authToken` query parameter.
fn split_url(url: &str) -> (String, Option<String>) {
    let (base, query) = match url.split_once('?') {
        Some((b, q)) => (b, Some(q)),
        None => (url, None),
    };
    let base = match base.strip_prefix("libsql://") {
        Some(rest) => format!("https://{rest}"),
        None => base.to_string(),
    };
    let token = query.and_then(|q| {
        q.split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == "authToken")
            .map(|(_, v)| v.to_string())
    });
    (base.trim_end_matches('/').to_string(), token)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// Hrana wire types

#[derive(Serialize)]
struct PipelineRequest<'a> {
    requests: Vec<StreamRequest<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamRequest<'a> {
    Execute { stmt: Stmt<'a> },
    Close,
}

#[derive(Serialize)]
struct Stmt<'a> {
    sql: &'a str,
    args: Vec<HranaValue>,
    want_rows: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum HranaValue {
    Null,
    /// 64-bit integers travel as strings.
    Integer { value: String },
    Float { value: f64 },
    Text { value: String },
    Blob { base64: String },
}

impl From<&SqlValue> for HranaValue {
    fn from(v: &SqlValue) -> Self {
        match v {
            SqlValue::Null => Self::Null,
            SqlValue::Integer(i) => Self::Integer {
                value: i.to_string(),
            },
            SqlValue::Real(f) => Self::Float { value: *f },
            SqlValue::Text(s) => Self::Text { value: s.clone() },
        }
    }
}

impl HranaValue {
    fn into_json(self) -> DbResult<Value> {
        Ok(match self {
            Self::Null => Value::Null,
            Self::Integer { value } => {
                let i: i64 = value
                    .parse()
                    .map_err(|_| DbError::Decode(format!("invalid integer value {value:?}")))?;
                Value::Number(i.into())
            }
            Self::Float { value } => Number::from_f64(value)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Text { value } => Value::String(value),
            Self::Blob { base64 } => Value::String(base64),
        })
    }
}

#[derive(Deserialize)]
struct PipelineResponse {
    #[serde(default)]
    results: Vec<StreamResult>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamResult {
    Ok { response: StreamResponse },
    Error { error: HranaError },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum StreamResponse {
    Execute { result: StmtResult },
    Close,
}

#[derive(Deserialize)]
struct HranaError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Deserialize)]
struct StmtResult {
    #[serde(default)]
    cols: Vec<Col>,
    #[serde(default)]
    rows: Vec<Vec<HranaValue>>,
    #[serde(default)]
    affected_row_count: u64,
    #[serde(default)]
    last_insert_rowid: Option<String>,
}

#[derive(Deserialize)]
struct Col {
    name: Option<String>,
}

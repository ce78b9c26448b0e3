//! Counter store backed by the Upstash Redis REST API.
//!
//! Single commands are POSTed to the endpoint root as a JSON array
//! (`["INCR","key"]`) and answer `{"result": ...}` or `{"error": "..."}`.
//! Batches go to `/pipeline` as an array of commands and answer an array of
//! the same envelopes.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::application::store::{CounterOp, CounterStore, StoreError, StoreKind};
use crate::config::RemoteStoreSettings;
use crate::infra::error::InfraError;

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

impl Reply {
    fn into_result(self) -> Result<Value, StoreError> {
        match self.error {
            Some(message) => Err(StoreError::Remote(message)),
            None => Ok(self.result),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstashCounterStore {
    client: Client,
    endpoint: Url,
    pipeline: Url,
    token: String,
}

impl UpstashCounterStore {
    pub fn new(settings: &RemoteStoreSettings) -> Result<Self, InfraError> {
        let mut builder = Client::builder().user_agent(Self::user_agent());
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        Self::with_client(builder.build()?, settings.url.clone(), settings.token.clone())
    }

    pub fn with_client(client: Client, url: Url, token: String) -> Result<Self, InfraError> {
        let mut endpoint = url;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        let pipeline = endpoint.join("pipeline").map_err(|err| {
            InfraError::configuration(format!("invalid store url `{endpoint}`: {err}"))
        })?;
        Ok(Self {
            client,
            endpoint,
            pipeline,
            token,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("blog-counters/", env!("CARGO_PKG_VERSION"))
    }

    async fn command(&self, args: Value) -> Result<Value, StoreError> {
        let reply: Reply = self.post(&self.endpoint, &args).await?;
        reply.into_result()
    }

    async fn pipeline(&self, commands: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        let expected = commands.len();
        let replies: Vec<Reply> = self.post(&self.pipeline, &Value::Array(commands)).await?;
        if replies.len() != expected {
            return Err(StoreError::Decode(format!(
                "pipeline returned {} replies for {expected} commands",
                replies.len()
            )));
        }
        replies.into_iter().map(Reply::into_result).collect()
    }

    async fn post<T>(&self, url: &Url, body: &Value) -> Result<T, StoreError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(StoreError::transport)?;

        let status = response.status();
        if !status.is_success() {
            debug!(
                target = "blog_counters::store::upstash",
                status = status.as_u16(),
                url = %url,
                "upstash request rejected"
            );
            return Err(StoreError::Status {
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(StoreError::decode)
    }
}

fn op_to_command(op: &CounterOp) -> Value {
    match op {
        CounterOp::Increment(key) => json!(["INCR", key]),
        CounterOp::Expire { key, seconds } => json!(["EXPIRE", key, seconds]),
    }
}

/// Interpret a reply as a non-negative count. Redis answers integers for
/// `INCR`/`SADD` and strings (or `null`) for `GET`/`MGET`.
pub(crate) fn coerce_count(value: &Value) -> u64 {
    match value {
        Value::Number(number) => number.as_u64().unwrap_or(0),
        Value::String(text) => text.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

pub(crate) fn coerce_counts(value: &Value, expected: usize) -> Vec<u64> {
    let mut counts: Vec<u64> = match value {
        Value::Array(items) => items.iter().map(coerce_count).collect(),
        _ => Vec::new(),
    };
    counts.resize(expected, 0);
    counts
}

#[async_trait]
impl CounterStore for UpstashCounterStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Remote
    }

    async fn increment(&self, key: &str) -> Result<u64, StoreError> {
        let result = self.command(json!(["INCR", key])).await?;
        Ok(coerce_count(&result))
    }

    async fn read(&self, key: &str) -> Result<u64, StoreError> {
        let result = self.command(json!(["GET", key])).await?;
        Ok(coerce_count(&result))
    }

    async fn read_many(&self, keys: &[String]) -> Result<Vec<u64>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut args = Vec::with_capacity(keys.len() + 1);
        args.push(Value::from("MGET"));
        args.extend(keys.iter().map(|key| Value::from(key.as_str())));
        let result = self.command(Value::Array(args)).await?;
        Ok(coerce_counts(&result, keys.len()))
    }

    async fn set_expire(&self, key: &str, seconds: u64) -> Result<(), StoreError> {
        self.command(json!(["EXPIRE", key, seconds])).await?;
        Ok(())
    }

    async fn add_to_set(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let result = self.command(json!(["SADD", key, member])).await?;
        Ok(coerce_count(&result) > 0)
    }

    async fn apply(&self, ops: &[CounterOp]) -> Result<(), StoreError> {
        if ops.is_empty() {
            return Ok(());
        }
        self.pipeline(ops.iter().map(op_to_command).collect()).await?;
        Ok(())
    }
}

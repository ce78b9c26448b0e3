//! Counter store capability shared by the view and visit services.

use std::fmt;

use async_trait::async_trait;
use metrics::counter;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(String),
    #[error("store responded with HTTP {status}")]
    Status { status: u16 },
    #[error("store rejected command: {0}")]
    Remote(String),
    #[error("store response could not be decoded: {0}")]
    Decode(String),
}

impl StoreError {
    pub fn transport(err: impl fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn decode(err: impl fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Hosted key-value store shared by every instance.
    Remote,
    /// Process-local fallback; not shared, not durable.
    Memory,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Remote => "remote",
            StoreKind::Memory => "memory",
        }
    }
}

/// A write that can be batched with others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterOp {
    Increment(String),
    Expire { key: String, seconds: u64 },
}

impl CounterOp {
    pub fn increment(key: impl Into<String>) -> Self {
        Self::Increment(key.into())
    }

    pub fn expire(key: impl Into<String>, seconds: u64) -> Self {
        Self::Expire {
            key: key.into(),
            seconds,
        }
    }
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    fn kind(&self) -> StoreKind;

    /// Add one and return the new value.
    async fn increment(&self, key: &str) -> Result<u64, StoreError>;

    /// Current value, zero when the key does not exist.
    async fn read(&self, key: &str) -> Result<u64, StoreError>;

    /// Values for `keys`, same length and order; missing keys read as zero.
    async fn read_many(&self, keys: &[String]) -> Result<Vec<u64>, StoreError>;

    async fn set_expire(&self, key: &str, seconds: u64) -> Result<(), StoreError>;

    /// Returns `true` when `member` was not yet in the set.
    async fn add_to_set(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    async fn apply(&self, ops: &[CounterOp]) -> Result<(), StoreError> {
        for op in ops {
            match op {
                CounterOp::Increment(key) => {
                    self.increment(key).await?;
                }
                CounterOp::Expire { key, seconds } => self.set_expire(key, *seconds).await?,
            }
        }
        Ok(())
    }

    /// Forget every key that was given an expiration. Stores that enforce
    /// expiry themselves leave this as a no-op.
    async fn reset_buckets(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub(crate) fn report_failure(operation: &'static str, err: &StoreError) {
    counter!("blog_counters_store_errors_total", "operation" => operation).increment(1);
    warn!(
        target = "blog_counters::store",
        operation,
        error = %err,
        "counter store call failed; treating as zero"
    );
}

/// Swallow a store failure, logging it and substituting the default value.
pub(crate) fn absorb<T: Default>(operation: &'static str, result: Result<T, StoreError>) -> T {
    result.unwrap_or_else(|err| {
        report_failure(operation, &err);
        T::default()
    })
}

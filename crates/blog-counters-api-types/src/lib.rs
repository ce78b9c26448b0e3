//! Response bodies served by the blog-counters HTTP API.
//!
//! Shared between the server and any client that wants typed access to the
//! counter endpoints.

use serde::{Deserialize, Serialize};

/// `GET|POST /api/post-views`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostViewsResponse {
    pub views: u64,
}

/// `GET|POST /api/visits`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitsResponse {
    pub total: u64,
    pub today: u64,
    /// Present (and `true`) only when the hit was classified as a bot or prefetch.
    #[serde(default, skip_serializing_if = "is_false")]
    pub ignored: bool,
}

/// One bucket of the visit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEntry {
    pub key: String,
    pub value: u64,
}

/// `GET /api/visits/stats`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitStatsResponse {
    pub days: Vec<BucketEntry>,
    pub hours: Vec<BucketEntry>,
}

/// Error envelope for rejected requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn is_false(value: &bool) -> bool {
    !*value
}

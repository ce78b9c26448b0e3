//! Handlers for the page-view and site-visit endpoints.

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, header},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use blog_counters_api_types::{BucketEntry, PostViewsResponse, VisitStatsResponse, VisitsResponse};
use tracing::debug;

use crate::application::visits::{BucketValue, VisitCounts};
use crate::domain::traffic::{RequestSignals, classify};
use crate::domain::visitor::VisitorId;

use super::{HttpState, error::ApiError};

const VISITOR_COOKIE_MAX_AGE_DAYS: i64 = 365;

/// Raw query pairs; a repeated `slug` resolves to its first value.
pub type SlugQuery = Query<Vec<(String, String)>>;

fn require_slug(query: Result<SlugQuery, QueryRejection>) -> Result<String, ApiError> {
    let Query(pairs) = query.map_err(|rejection| ApiError::rejected("slug required", &rejection))?;
    pairs
        .into_iter()
        .find_map(|(name, value)| (name == "slug").then_some(value))
        .filter(|slug| !slug.is_empty())
        .ok_or_else(|| ApiError::bad_request("slug required"))
}

pub async fn record_post_view(
    State(state): State<HttpState>,
    query: Result<SlugQuery, QueryRejection>,
) -> Result<Json<PostViewsResponse>, ApiError> {
    let slug = require_slug(query)?;
    let views = state.views.record(&slug).await;
    Ok(Json(PostViewsResponse { views }))
}

pub async fn post_views(
    State(state): State<HttpState>,
    query: Result<SlugQuery, QueryRejection>,
) -> Result<Json<PostViewsResponse>, ApiError> {
    let slug = require_slug(query)?;
    let views = state.views.current(&slug).await;
    Ok(Json(PostViewsResponse { views }))
}

pub async fn record_visit(
    State(state): State<HttpState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (CookieJar, Json<VisitsResponse>) {
    if let Some(exclusion) = classify(&request_signals(&headers)) {
        let counts = state.visits.ignore(exclusion).await;
        return (jar, Json(visits_response(counts, true)));
    }

    let (visitor, jar) = match existing_visitor(&jar, &state.cookie_name) {
        Some(visitor) => (visitor, jar),
        None => {
            let visitor = VisitorId::generate();
            let jar = jar.add(visitor_cookie(&state.cookie_name, &visitor));
            (visitor, jar)
        }
    };

    let outcome = state.visits.record(&visitor).await;
    (jar, Json(visits_response(outcome.counts, false)))
}

pub async fn visits(State(state): State<HttpState>) -> Json<VisitsResponse> {
    Json(visits_response(state.visits.counts().await, false))
}

pub async fn visit_stats(State(state): State<HttpState>) -> Json<VisitStatsResponse> {
    let stats = state.visits.stats().await;
    Json(VisitStatsResponse {
        days: stats.days.into_iter().map(bucket_entry).collect(),
        hours: stats.hours.into_iter().map(bucket_entry).collect(),
    })
}

fn request_signals(headers: &HeaderMap) -> RequestSignals<'_> {
    let text = move |name: &str| headers.get(name).and_then(|value| value.to_str().ok());
    RequestSignals {
        user_agent: text(header::USER_AGENT.as_str()),
        purpose: text("purpose"),
        sec_purpose: text("sec-purpose"),
        fetch_mode: text("sec-fetch-mode"),
    }
}

fn existing_visitor(jar: &CookieJar, cookie_name: &str) -> Option<VisitorId> {
    let cookie = jar.get(cookie_name)?;
    match VisitorId::parse(cookie.value()) {
        Ok(visitor) => Some(visitor),
        Err(err) => {
            debug!(
                target = "blog_counters::http::counters",
                error = %err,
                "replacing malformed visitor cookie"
            );
            None
        }
    }
}

fn visitor_cookie(name: &str, visitor: &VisitorId) -> Cookie<'static> {
    Cookie::build((name.to_string(), visitor.as_str().to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(VISITOR_COOKIE_MAX_AGE_DAYS))
        .build()
}

fn visits_response(counts: VisitCounts, ignored: bool) -> VisitsResponse {
    VisitsResponse {
        total: counts.total,
        today: counts.today,
        ignored,
    }
}

fn bucket_entry(bucket: BucketValue) -> BucketEntry {
    BucketEntry {
        key: bucket.key,
        value: bucket.value,
    }
}

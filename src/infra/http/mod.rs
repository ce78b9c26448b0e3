mod counters;
mod error;
mod middleware;

use std::sync::Arc;

use axum::{Router, http::StatusCode, middleware::from_fn, routing::get};

use crate::application::views::PostViewService;
use crate::application::visits::VisitService;

#[derive(Clone)]
pub struct HttpState {
    pub views: Arc<PostViewService>,
    pub visits: Arc<VisitService>,
    /// Cookie carrying the visitor id used for daily dedup.
    pub cookie_name: String,
}

pub fn build_router(state: HttpState) -> Router {
    let counter_routes = Router::new()
        .route(
            "/api/post-views",
            get(counters::post_views).post(counters::record_post_view),
        )
        .route(
            "/api/visits",
            get(counters::visits).post(counters::record_visit),
        )
        .route("/api/visits/stats", get(counters::visit_stats))
        .layer(from_fn(middleware::no_store));

    let health_routes = Router::new().route("/_health", get(health));

    counter_routes
        .merge(health_routes)
        .with_state(state)
        .layer(from_fn(middleware::log_responses))
        .layer(from_fn(middleware::set_request_context))
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

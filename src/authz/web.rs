use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::authz::types::{
    CheckRequest, CheckResponse, ResolveRequest, ResolveResponse, TemplateFilterRequest,
    TemplateFilterResponse,
};
use crate::authz::AuthzState;

pub fn router(state: Arc<AuthzState>) -> Router {
    Router::new()
        .route("/v1/resolve", post(handle_resolve))
        .route("/v1/check", post(handle_check))
        .route("/v1/templates/filter", post(handle_template_filter))
        .route("/healthz", get(health))
        .with_state(state)
}

async fn handle_resolve(
    State(state): State<Arc<AuthzState>>,
    Json(req): Json<ResolveRequest>,
) -> impl IntoResponse {
    let identity = req.identity.as_deref();
    let role = state.resolver.resolve(identity);
    Json(ResolveResponse {
        identity: state.resolver.effective_identity(identity).to_string(),
        role,
    })
}

async fn handle_check(
    State(state): State<Arc<AuthzState>>,
    Json(req): Json<CheckRequest>,
) -> impl IntoResponse {
    let role = state.resolver.resolve(req.identity.as_deref());
    let (decision, rule) = state
        .engine
        .evaluate(&role, &req.permission, req.resource.as_deref());
    Json(CheckResponse {
        role,
        decision,
        allowed: decision.is_allowed(),
        rule,
    })
}

async fn handle_template_filter(
    State(state): State<Arc<AuthzState>>,
    Json(req): Json<TemplateFilterRequest>,
) -> impl IntoResponse {
    let role = state.resolver.resolve(req.identity.as_deref());
    let filter = state.engine.template_filter(&role);
    let unrestricted = filter.is_unrestricted();
    let allowed = filter.apply(req.templates);
    Json(TemplateFilterResponse {
        role,
        unrestricted,
        allowed,
    })
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

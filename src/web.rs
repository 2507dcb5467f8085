use std::net::SocketAddr;
use std::sync::Arc;

use miette::{IntoDiagnostic, Result};
use tower_http::trace::TraceLayer;

use crate::authz::AuthzState;
use crate::settings::Settings;

/// Serve the authorization API until the process is stopped.
pub async fn serve(settings: &Settings, state: Arc<AuthzState>) -> Result<()> {
    let addr: SocketAddr = settings
        .listen_addr()
        .parse()
        .map_err(|e| miette::miette!("bad listen addr: {e}"))?;

    let router = crate::authz::web::router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .into_diagnostic()?;
    tracing::info!(%addr, "Authorization policy API listening");
    axum::serve(listener, router).await.into_diagnostic()?;
    Ok(())
}

use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tokio::net::ToSocketAddrs;

use crate::collector::{Aggregator, exposition};
use crate::swarm::Orchestrator;

const LANDING_PAGE: &str = r#"<html>
<head><title>Docker Swarm Exporter</title></head>
<body>
<h1>Docker Swarm Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
</body>
</html>
"#;

async fn metrics<O>(aggregator: State<Arc<Aggregator<O>>>) -> Response
where
    O: Orchestrator + Send + Sync + 'static,
{
    match aggregator.scrape().await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, exposition::content_type())],
            body,
        )
            .into_response(),
        Err(err) => {
            log::error!("Failed to collect swarm metrics: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to collect metrics: {err}"),
            )
                .into_response()
        }
    }
}

async fn landing() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

pub struct APIServer {
    router: axum::Router,
}

impl APIServer {
    pub fn new<O>(aggregator: Arc<Aggregator<O>>) -> Self
    where
        O: Orchestrator + Send + Sync + 'static,
    {
        let router = axum::Router::new()
            .route("/", get(landing))
            .route("/metrics", get(metrics::<O>))
            .with_state(aggregator);
        Self { router }
    }

    /// Binds to `addr` and serves until the server fails.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the listener cannot be bound or the server stops
    /// with an error.
    pub async fn listen(self, addr: impl ToSocketAddrs) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, self.router.into_make_service()).await
    }

    #[cfg(test)]
    fn into_router(self) -> axum::Router {
        self.router
    }
}

use crate::api::{self, response, response::ResponseBody};
use crate::error::Result;
use crate::pages;
use crate::upstream::UpstreamClient;
use classguard_core::gate::FORWARDED_FOR_HEADER;
use classguard_core::{AccessGate, Config, GateDecision, GateRequest};
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Shared, read-only state handed to every connection
#[derive(Clone)]
pub struct ProxyServerConfig {
    /// Access gate evaluated before anything else
    pub gate: Arc<AccessGate>,
    /// Client for the upstream control API
    pub upstream: Arc<UpstreamClient>,
    /// Largest accepted API request body
    pub max_body_bytes: usize,
}

impl ProxyServerConfig {
    pub fn from_config(config: &Config) -> Result<Self> {
        let gate = AccessGate::new(config)?;
        let upstream = UpstreamClient::new(config.credentials.clone(), config.upstream.clone())?;

        Ok(Self {
            gate: Arc::new(gate),
            upstream: Arc::new(upstream),
            max_body_bytes: config.server.max_body_bytes,
        })
    }
}

/// HTTP server putting the access gate in front of the pages and the API
pub struct ProxyServer {
    config: ProxyServerConfig,
}

impl ProxyServer {
    /// Create a new server with the given configuration
    pub fn new(config: ProxyServerConfig) -> Self {
        Self { config }
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Connections already accepted keep running to completion on their own tasks.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("Listening on {}", listener.local_addr()?);
        tokio::pin!(shutdown);

        loop {
            let (stream, peer) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = &mut shutdown => {
                    info!("Shutdown requested, no longer accepting connections");
                    return Ok(());
                }
            };

            let config = self.config.clone();

            // Spawn a task for each connection
            tokio::spawn(async move {
                let service = service_fn(move |request| {
                    let config = config.clone();
                    async move {
                        Ok::<_, Infallible>(handle_request(&config, Some(peer.ip()), request).await)
                    }
                });

                if let Err(e) = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await
                {
                    debug!("Connection from {} ended with error: {}", peer, e);
                }
            });
        }
    }
}

/// Resolves once `signal` fires; never resolves if the signal cannot be awaited
pub async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Gate one request, then hand it to the API or the pages
pub async fn handle_request<B>(
    config: &ProxyServerConfig,
    peer: Option<IpAddr>,
    request: Request<B>,
) -> Response<ResponseBody>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let path = request.uri().path().to_string();
    // An unreadable header is still a present header, resolving to no address
    let forwarded_for = request.headers().get(FORWARDED_FOR_HEADER).map(|v| {
        v.to_str().unwrap_or_else(|_| {
            debug!("Unreadable {} header value", FORWARDED_FOR_HEADER);
            ""
        })
    });

    let gate_request = GateRequest {
        path: &path,
        query: request.uri().query(),
        forwarded_for,
        peer,
    };

    debug!("{} {} from {:?}", request.method(), path, peer);

    match config.gate.evaluate(&gate_request) {
        GateDecision::Fail(e) => {
            response::text(StatusCode::INTERNAL_SERVER_ERROR, e.public_message())
        }
        GateDecision::Redirect { location } => response::redirect(&location),
        GateDecision::PassThrough if api::is_api_path(&path) => {
            api::dispatch(&config.upstream, request, config.max_body_bytes).await
        }
        GateDecision::PassThrough => pages::render(&path),
    }
}

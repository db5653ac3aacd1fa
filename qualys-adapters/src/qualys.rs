//! Pooled HTTPS connection to the Qualys platform.

use std::error::Error as StdError;
use std::{fmt, io};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hyper::body::to_bytes;
use hyper::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use hyper::{Body, Request, Uri};
use qualys_config::QualysConfig;
use tokio::sync::OnceCell;
use tokio::time::{Instant, timeout};
use tracing::{debug, info};

use crate::http_client::{HyperClient, build_https_client};
use crate::transport::{Transport, TransportError, TransportResult, WireRequest, WireResponse};

/// Header the platform requires on every API call.
pub const CLIENT_ID_HEADER: &str = "X-Requested-With";

/// Value sent in [`CLIENT_ID_HEADER`].
pub const CLIENT_ID: &str = "qualys-mcp";

/// Lazily connected Qualys API client.
///
/// The HTTP pool and the `Authorization` header are built on the first
/// [`Transport::send`] and reused for the lifetime of the value. Configuration
/// is captured at construction, so later credential changes only take effect
/// in a new client.
pub struct QualysClient {
    config: QualysConfig,
    connection: OnceCell<Connection>,
}

struct Connection {
    client: HyperClient,
    authorization: HeaderValue,
}

impl Connection {
    fn establish(config: &QualysConfig) -> TransportResult<Self> {
        let (Some(username), Some(password)) = (config.username(), config.password()) else {
            return Err(TransportError::configuration(
                "QUALYS_USERNAME and QUALYS_PASSWORD are required",
            ));
        };

        let mut authorization = basic_authorization(username, password)?;
        authorization.set_sensitive(true);

        info!(base_url = config.base_url(), "opening Qualys connection pool");
        Ok(Self {
            client: build_https_client(config.pool()),
            authorization,
        })
    }
}

impl fmt::Debug for QualysClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualysClient")
            .field("base_url", &self.config.base_url())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl QualysClient {
    /// Creates a client; no connection work happens until the first request.
    #[must_use]
    pub fn new(config: QualysConfig) -> Self {
        Self {
            config,
            connection: OnceCell::new(),
        }
    }

    /// Returns the configuration captured at construction.
    #[must_use]
    pub fn config(&self) -> &QualysConfig {
        &self.config
    }

    /// Returns `true` once the connection pool has been built.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    async fn connection(&self) -> TransportResult<&Connection> {
        self.connection
            .get_or_try_init(|| async { Connection::establish(&self.config) })
            .await
    }

    fn endpoint(&self, path: &str) -> TransportResult<Uri> {
        format!("{}{path}", self.config.base_url())
            .parse::<Uri>()
            .map_err(|err| TransportError::configuration(format!("invalid endpoint: {err}")))
    }
}

#[async_trait]
impl Transport for QualysClient {
    async fn send(&self, request: WireRequest) -> TransportResult<WireResponse> {
        let connection = self.connection().await?;
        let uri = self.endpoint(request.path())?;
        let path = request.path().to_owned();

        let mut builder = Request::post(uri)
            .header(CLIENT_ID_HEADER, CLIENT_ID)
            .header(AUTHORIZATION, connection.authorization.clone())
            .header(CONTENT_TYPE, request.content_type());
        if let Some(accept) = request.accept() {
            builder = builder.header(ACCEPT, accept);
        }
        let outbound = builder
            .body(Body::from(request.into_body()))
            .map_err(|err| TransportError::request(format!("failed to build request: {err}")))?;

        let started = Instant::now();
        let exchange = async {
            let response = connection.client.request(outbound).await?;
            let status = response.status();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let body = to_bytes(response.into_body()).await?;
            Ok::<_, hyper::Error>((status, content_type, body))
        };

        let after = self.config.request_timeout();
        let (status, content_type, body) = timeout(after, exchange)
            .await
            .map_err(|_| TransportError::Timeout { after })?
            .map_err(|err| self.map_hyper_error(&err))?;

        debug!(
            path = %path,
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Qualys response received"
        );

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_owned(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(WireResponse::new(status.as_u16(), content_type, body))
    }
}

impl QualysClient {
    fn map_hyper_error(&self, err: &hyper::Error) -> TransportError {
        if is_connection_refused(err) {
            return TransportError::ConnectionRefused {
                endpoint: self.config.base_url().to_owned(),
            };
        }
        TransportError::request(error_chain(err))
    }
}

fn basic_authorization(username: &str, password: &str) -> TransportResult<HeaderValue> {
    let token = STANDARD.encode(format!("{username}:{password}"));
    HeaderValue::from_str(&format!("Basic {token}"))
        .map_err(|err| TransportError::configuration(format!("invalid credentials: {err}")))
}

fn is_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(error) = current {
        if let Some(io) = error.downcast_ref::<io::Error>() {
            if io.kind() == io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        current = error.source();
    }
    false
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(source) = current {
        let detail = source.to_string();
        if !message.contains(&detail) {
            message.push_str(": ");
            message.push_str(&detail);
        }
        current = source.source();
    }
    message
}

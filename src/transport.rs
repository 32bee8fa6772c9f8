use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::{
    body::Bytes,
    client::conn::http1,
    header::{HeaderValue, HOST},
    Uri,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tracing::{debug, error};

use crate::{Error, Request, Response};

/// Per-request options a [Client](crate::Client) passes down to its
/// transports. Transports are free to ignore them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    pub timeout: Option<Duration>,
}

/// The pluggable component of a [Client](crate::Client) that actually delivers
/// a request and produces a response.
#[async_trait]
pub trait Transport: Debug + Send + Sync {
    async fn send(&self, request: Request, options: &SendOptions) -> Result<Response, Error>;

    /// Releases any resources held by the transport.
    fn close(&self);
}

/// Sends requests over the network using HTTP/1.1. Every request opens a new
/// connection.
///
/// Does not support TLS, so `https` URLs fail with [Error::UnsupportedScheme].
#[derive(Debug, Clone, Default)]
pub struct HttpTransport;

impl HttpTransport {
    pub fn new() -> Self {
        Self
    }

    async fn round_trip(&self, request: Request) -> Result<Response, Error> {
        let url = request.url().clone();
        match url.scheme_str() {
            Some("http") => {}
            other => {
                return Err(Error::UnsupportedScheme(
                    other.unwrap_or_default().to_string(),
                ))
            }
        }

        let authority = url.authority().ok_or_else(|| Error::InvalidUrl {
            url: url.to_string(),
            reason: "missing host".to_string(),
        })?;
        let addr = format!("{}:{}", authority.host(), authority.port_u16().unwrap_or(80));

        debug!(%addr, "connecting");
        let tcp_stream = TcpStream::connect(addr.as_str())
            .await
            .map_err(|source| Error::Connect {
                addr: addr.clone(),
                source,
            })?;

        let (mut sender, conn) = http1::handshake(TokioIo::new(tcp_stream))
            .await
            .map_err(Error::Http)?;
        tokio::spawn(async move {
            if let Err(err) = conn.await {
                error!(%addr, %err, "HTTP connection failed");
            }
        });

        let mut outbound = hyper::Request::builder()
            .method(request.method().clone())
            .uri(origin_form(&url)?)
            .body(Full::new(request.body().clone()))
            .map_err(Error::BuildRequest)?;
        *outbound.headers_mut() = request.headers().clone();
        if !outbound.headers().contains_key(HOST) {
            let host = HeaderValue::from_str(authority.as_str()).map_err(|_| {
                Error::InvalidHeaderValue {
                    name: HOST.to_string(),
                    value: authority.to_string(),
                }
            })?;
            outbound.headers_mut().insert(HOST, host);
        }

        let res = sender.send_request(outbound).await.map_err(Error::Http)?;
        let (parts, body) = res.into_parts();
        let raw: Bytes = body.collect().await.map_err(Error::Http)?.to_bytes();

        Ok(Response::new(request, parts.status, parts.headers, raw))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request, options: &SendOptions) -> Result<Response, Error> {
        match options.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.round_trip(request))
                .await
                .map_err(|_| Error::Timeout(timeout))?,
            None => self.round_trip(request).await,
        }
    }

    fn close(&self) {}
}

/// The path-and-query form of the URL that goes on the request line.
fn origin_form(url: &Uri) -> Result<Uri, Error> {
    let path_and_query = url.path_and_query().map_or("/", |pq| pq.as_str());
    Uri::builder()
        .path_and_query(path_and_query)
        .build()
        .map_err(Error::BuildRequest)
}

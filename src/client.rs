use std::{collections::BTreeMap, sync::Arc, time::Duration};

use hyper::{
    body::Bytes,
    header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT},
    Method,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{headers, registry, Error, Request, Response, SendOptions, Transport};

const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Settings applied to every request a [Client] sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Passed to transports through [SendOptions]. Patched transports ignore
    /// it.
    pub timeout: Option<Duration>,

    /// Sent as the `User-Agent` header unless the request sets one.
    pub user_agent: String,

    /// Extra headers added to requests that don't already set them.
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: BTreeMap::new(),
        }
    }
}

/// An HTTP client that resolves a transport per URL prefix.
///
/// [Client::new] mounts a transport for `http://` and `https://` built with the
/// installed [TransportFactory](crate::TransportFactory), so clients created
/// inside a [PatchScope](crate::PatchScope) send every request to the scope's
/// adapter. Clients created before the scope keep the transports they were
/// built with.
///
/// Cloning a client is cheap and shares its transports.
#[derive(Debug, Clone)]
pub struct Client {
    // Sorted by descending prefix length.
    transports: Vec<(String, Arc<dyn Transport>)>,
    default_headers: HeaderMap,
    options: SendOptions,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    pub fn new() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        default_headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));

        let mut client = Self {
            transports: Vec::new(),
            default_headers,
            options: SendOptions::default(),
        };
        client.mount("https://", registry::build_transport());
        client.mount("http://", registry::build_transport());
        client
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, Error> {
        let mut client = Self::new();
        client.default_headers.insert(
            USER_AGENT,
            headers::header_value(USER_AGENT.as_str(), &config.user_agent)?,
        );
        headers::extend_headers(&mut client.default_headers, &config.headers)?;
        client.options.timeout = config.timeout;
        Ok(client)
    }

    /// Mounts a transport for every URL starting with `prefix`, replacing any
    /// transport already mounted for the same prefix. The longest matching
    /// prefix wins.
    pub fn mount(&mut self, prefix: impl Into<String>, transport: Arc<dyn Transport>) {
        let prefix = prefix.into().to_ascii_lowercase();
        self.transports.retain(|(existing, _)| *existing != prefix);
        let idx = self
            .transports
            .iter()
            .position(|(existing, _)| existing.len() < prefix.len())
            .unwrap_or(self.transports.len());
        self.transports.insert(idx, (prefix, transport));
    }

    /// Returns the transport requests to `url` are sent through.
    pub fn transport_for(&self, url: &str) -> Result<Arc<dyn Transport>, Error> {
        let lower = url.to_ascii_lowercase();
        self.transports
            .iter()
            .find(|(prefix, _)| lower.starts_with(prefix.as_str()))
            .map(|(_, transport)| transport.clone())
            .ok_or_else(|| Error::NoTransport(url.to_string()))
    }

    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        RequestBuilder {
            client: self.clone(),
            request: Request::new(method, url),
        }
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }

    /// Sends a prepared request, filling in default headers the request does
    /// not set.
    pub async fn execute(&self, mut request: Request) -> Result<Response, Error> {
        for (name, value) in &self.default_headers {
            if !request.headers().contains_key(name) {
                request.headers_mut().insert(name.clone(), value.clone());
            }
        }

        let transport = self.transport_for(&request.url().to_string())?;
        debug!(method = %request.method(), url = %request.url(), "sending request");
        transport.send(request, &self.options).await
    }

    /// Closes every mounted transport.
    pub fn close(&self) {
        for (_, transport) in &self.transports {
            transport.close();
        }
    }
}

/// A request being prepared by a [Client]. Errors in any step are reported by
/// [send](RequestBuilder::send).
#[derive(Debug)]
pub struct RequestBuilder {
    client: Client,
    request: Result<Request, Error>,
}

impl RequestBuilder {
    fn map(mut self, f: impl FnOnce(&mut Request) -> Result<(), Error>) -> Self {
        if let Ok(request) = &mut self.request {
            if let Err(err) = f(request) {
                self.request = Err(err);
            }
        }
        self
    }

    pub fn header(self, name: &str, value: &str) -> Self {
        self.map(|request| request.set_header(name, value))
    }

    pub fn headers<I, K, V>(self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.map(|request| headers::extend_headers(request.headers_mut(), headers))
    }

    pub fn body(self, body: impl Into<Bytes>) -> Self {
        self.map(|request| {
            request.set_body(body);
            Ok(())
        })
    }

    /// Serializes `value` as the body and sets the content type to
    /// `application/json`.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Self {
        self.map(|request| {
            let body = serde_json::to_vec(value).map_err(Error::EncodeJson)?;
            request.set_body(body);
            request
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            Ok(())
        })
    }

    pub fn build(self) -> Result<Request, Error> {
        self.request
    }

    pub async fn send(self) -> Result<Response, Error> {
        let request = self.request?;
        self.client.execute(request).await
    }
}

/// Builds a request with a fresh [Client].
pub fn request(method: Method, url: &str) -> RequestBuilder {
    Client::new().request(method, url)
}

pub fn get(url: &str) -> RequestBuilder {
    request(Method::GET, url)
}

pub fn post(url: &str) -> RequestBuilder {
    request(Method::POST, url)
}

pub fn put(url: &str) -> RequestBuilder {
    request(Method::PUT, url)
}

pub fn delete(url: &str) -> RequestBuilder {
    request(Method::DELETE, url)
}

use hyper::{body::Bytes, header::HeaderMap, Method, Uri};

use crate::{headers, Error};

/// A fully prepared outbound request, as handed to a [Transport](crate::Transport).
///
/// Requests are cheap to clone, which lets patched transports keep the last
/// request around for assertions after the response was returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: Method,
    url: Uri,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    /// Creates a request with no headers and an empty body. The URL must be
    /// absolute.
    pub fn new(method: Method, url: &str) -> Result<Self, Error> {
        Ok(Self {
            method,
            url: parse_url(url)?,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        })
    }

    pub fn get(url: &str) -> Result<Self, Error> {
        Self::new(Method::GET, url)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Uri {
        &self.url
    }

    /// The path component of the URL, without the query string.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Sets a header, replacing any existing value with the same name.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        self.headers
            .insert(headers::header_name(name)?, headers::header_value(name, value)?);
        Ok(())
    }
}

fn parse_url(url: &str) -> Result<Uri, Error> {
    let invalid = |reason: &str| Error::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let parsed: Uri = url
        .parse()
        .map_err(|err: hyper::http::uri::InvalidUri| invalid(&err.to_string()))?;
    if parsed.scheme().is_none() || parsed.authority().is_none() {
        return Err(invalid("URL must be absolute"));
    }
    Ok(parsed)
}

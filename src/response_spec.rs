use hyper::{
    body::Bytes,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    StatusCode,
};
use serde::Serialize;

use crate::{headers, Error, Request, Response};

/// The body of a [ResponseSpec].
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    /// Serialized to JSON text when the response is built.
    Json(serde_json::Value),
    Bytes(Bytes),
}

impl Body {
    /// Serializes any value into a structured body.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, Error> {
        serde_json::to_value(value)
            .map(Body::Json)
            .map_err(Error::EncodeJson)
    }

    pub fn to_bytes(&self) -> Bytes {
        match self {
            Body::Text(text) => Bytes::from(text.clone()),
            Body::Json(value) => Bytes::from(value.to_string()),
            Body::Bytes(bytes) => bytes.clone(),
        }
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Body::Text(text.to_string())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::Text(text)
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Body::Json(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes.into())
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Body::Bytes(bytes)
    }
}

/// A declarative response that a patched transport returns.
///
/// The content-type helpers consume and return the value so they can be
/// chained straight off [good] or [bad]:
///
/// ```
/// use http_patch::good;
/// use serde_json::json;
///
/// let spec = good(json!({"a": "b"})).as_json();
/// assert_eq!(spec.headers()["content-type"], "application/json");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSpec {
    body: Body,
    status: StatusCode,
    headers: HeaderMap,
}

impl ResponseSpec {
    pub fn new<B, I, K, V>(body: B, status_code: u16, headers: I) -> Result<Self, Error>
    where
        B: Into<Body>,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Ok(Self {
            body: body.into(),
            status: status(status_code)?,
            headers: headers::to_header_map(headers)?,
        })
    }

    fn with_defaults(body: Body, status: StatusCode) -> Self {
        Self {
            body,
            status,
            headers: HeaderMap::new(),
        }
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn with_status(mut self, status_code: u16) -> Result<Self, Error> {
        self.status = status(status_code)?;
        Ok(self)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, Error> {
        headers::extend_headers(&mut self.headers, [(name, value)])?;
        Ok(self)
    }

    pub fn with_headers<I, K, V>(mut self, headers: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        headers::extend_headers(&mut self.headers, headers)?;
        Ok(self)
    }

    /// Sets the content type to `application/json`.
    pub fn as_json(self) -> Self {
        self.content_type(HeaderValue::from_static("application/json"))
    }

    /// Sets the content type to `text/html`.
    pub fn as_html(self) -> Self {
        self.content_type(HeaderValue::from_static("text/html"))
    }

    /// Sets the content type to an arbitrary MIME type, e.g. `text/plain`.
    pub fn as_type(self, mime_type: &str) -> Result<Self, Error> {
        let value = headers::header_value(CONTENT_TYPE.as_str(), mime_type)?;
        Ok(self.content_type(value))
    }

    fn content_type(mut self, value: HeaderValue) -> Self {
        self.headers.insert(CONTENT_TYPE, value);
        self
    }

    /// Builds the response a transport hands back for `request`.
    pub fn to_response(&self, request: &Request) -> Response {
        Response::new(
            request.clone(),
            self.status,
            self.headers.clone(),
            self.body.to_bytes(),
        )
    }
}

fn status(status_code: u16) -> Result<StatusCode, Error> {
    StatusCode::from_u16(status_code).map_err(|_| Error::InvalidStatusCode(status_code))
}

/// A 200 response with no headers, for success-path tests.
pub fn good(body: impl Into<Body>) -> ResponseSpec {
    ResponseSpec::with_defaults(body.into(), StatusCode::OK)
}

/// A 500 response with no headers, for failure-path tests.
pub fn bad(body: impl Into<Body>) -> ResponseSpec {
    ResponseSpec::with_defaults(body.into(), StatusCode::INTERNAL_SERVER_ERROR)
}

use hyper::{body::Bytes, header::HeaderMap, StatusCode, Uri};
use serde::de::DeserializeOwned;

use crate::{error::StatusClass, Error, Request};

/// A response returned by a [Transport](crate::Transport), whether it came
/// from the network or from a patched transport.
#[derive(Debug, Clone)]
pub struct Response {
    url: Uri,
    status: StatusCode,
    headers: HeaderMap,
    raw: Bytes,
    request: Request,
}

impl Response {
    /// Creates a response for the given request. The response URL is taken
    /// from the request.
    pub fn new(request: Request, status: StatusCode, headers: HeaderMap, raw: Bytes) -> Self {
        Self {
            url: request.url().clone(),
            status,
            headers,
            raw,
            request,
        }
    }

    pub fn url(&self) -> &Uri {
        &self.url
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The undecoded response body.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// The request that produced this response.
    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn bytes(self) -> Bytes {
        self.raw
    }

    /// Decodes the body as UTF-8.
    pub fn text(&self) -> Result<String, Error> {
        String::from_utf8(self.raw.to_vec()).map_err(Error::DecodeText)
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.raw).map_err(Error::DecodeJson)
    }

    /// Returns an [Error::Status] if the status is a client or server error.
    pub fn error_for_status(self) -> Result<Self, Error> {
        self.status_error().map_or(Ok(self), Err)
    }

    /// Like [error_for_status](Response::error_for_status) but borrows the
    /// response.
    pub fn error_for_status_ref(&self) -> Result<&Self, Error> {
        self.status_error().map_or(Ok(self), Err)
    }

    fn status_error(&self) -> Option<Error> {
        let class = if self.status.is_client_error() {
            StatusClass::Client
        } else if self.status.is_server_error() {
            StatusClass::Server
        } else {
            return None;
        };

        Some(Error::Status {
            status: self.status,
            class,
            url: self.url.clone(),
        })
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::ErrorKind;

    fn response(status: u16, body: &'static str) -> Response {
        let req = Request::get("https://test.api/api/test").expect("valid URL");
        Response::new(
            req,
            StatusCode::from_u16(status).expect("valid status"),
            HeaderMap::new(),
            Bytes::from_static(body.as_bytes()),
        )
    }

    #[test]
    fn url_follows_request() {
        let res = response(200, "hello");
        assert_eq!(res.url(), res.request().url());
        assert_eq!(res.text().expect("utf-8 body"), "hello");
    }

    #[test]
    fn success_statuses_pass() {
        for status in [200, 201, 204, 301, 304] {
            let res = response(status, "");
            assert!(res.error_for_status_ref().is_ok(), "status {}", status);
            assert!(res.error_for_status().is_ok(), "status {}", status);
        }
    }

    #[test]
    fn error_statuses_fail() {
        let err = response(404, "").error_for_status().expect_err("client error");
        assert_eq!(err.kind(), ErrorKind::Status);
        assert_eq!(
            err.to_string(),
            "404 Client Error: Not Found for url: https://test.api/api/test"
        );

        let err = response(503, "").error_for_status().expect_err("server error");
        assert!(matches!(
            err,
            Error::Status {
                class: StatusClass::Server,
                ..
            }
        ));
    }

    #[test]
    fn decode_json_and_failures() {
        let res = response(200, r#"{"a":"b"}"#);
        let value: serde_json::Value = res.json().expect("valid JSON");
        assert_eq!(value, json!({"a": "b"}));

        let res = response(200, "not json");
        let err = res.json::<serde_json::Value>().expect_err("invalid JSON");
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn invalid_utf8_text() {
        let req = Request::get("https://test.api/").expect("valid URL");
        let res = Response::new(
            req,
            StatusCode::OK,
            HeaderMap::new(),
            Bytes::from_static(&[0xff, 0xfe]),
        );
        assert!(matches!(res.text(), Err(Error::DecodeText(_))));
    }
}

use std::sync::Mutex;

use async_trait::async_trait;
use tracing::{trace, warn};

use crate::{headers, Error, Request, Response, ResponseSpec, SendOptions, Transport};

/// A transport that answers every request for one path with a bound
/// [ResponseSpec], recording each call for later assertions.
///
/// State is synchronized, so requests may be dispatched from several threads.
#[derive(Debug)]
pub struct InterceptAdapter {
    path: String,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    response: Option<ResponseSpec>,
    call_count: u64,
    last_request: Option<Request>,
}

impl InterceptAdapter {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(State::default()),
        }
    }

    /// The path requests must have to be answered.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Binds the response returned for matching requests, replacing any
    /// previously bound response.
    pub fn returns(&self, response: ResponseSpec) {
        self.state.lock().expect("lock poisoned").response = Some(response);
    }

    pub fn response(&self) -> Option<ResponseSpec> {
        self.state.lock().expect("lock poisoned").response.clone()
    }

    /// The number of requests answered so far. Requests for other paths are
    /// rejected without being counted.
    pub fn call_count(&self) -> u64 {
        self.state.lock().expect("lock poisoned").call_count
    }

    pub fn last_request(&self) -> Option<Request> {
        self.state.lock().expect("lock poisoned").last_request.clone()
    }

    /// Answers `request` with the bound response.
    ///
    /// Fails with [Error::PathMismatch] if the request path is not exactly the
    /// patched path, and with [Error::NoResponseBound] if nothing was bound
    /// with [returns](InterceptAdapter::returns). Neither failure is counted
    /// as a call.
    pub fn dispatch(&self, request: Request) -> Result<Response, Error> {
        if request.path() != self.path {
            warn!(actual = request.path(), expected = %self.path, "request path mismatch");
            return Err(Error::PathMismatch {
                actual: request.path().to_string(),
                expected: self.path.clone(),
            });
        }

        let mut state = self.state.lock().expect("lock poisoned");
        let Some(spec) = &state.response else {
            warn!(path = %self.path, "request dispatched without a bound response");
            return Err(Error::NoResponseBound {
                path: self.path.clone(),
            });
        };

        let response = spec.to_response(&request);
        state.call_count += 1;
        state.last_request = Some(request);
        trace!(path = %self.path, call_count = state.call_count, "request intercepted");

        Ok(response)
    }

    /// Fails unless exactly `expected` requests have been answered.
    pub fn was_called_times(&self, expected: u64) -> Result<(), Error> {
        let actual = self.call_count();
        if actual != expected {
            return Err(Error::CallCount {
                path: self.path.clone(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Fails unless exactly one request has been answered.
    pub fn was_called_once(&self) -> Result<(), Error> {
        self.was_called_times(1)
    }

    /// Fails unless the last answered request carried every expected header
    /// with an equal value. Header names compare case-insensitively; headers
    /// that are not expected are ignored.
    pub fn was_called_with_headers<I, K, V>(&self, expected: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let request = self.last_request().ok_or_else(|| Error::NotCalled {
            path: self.path.clone(),
        })?;

        for (name, value) in expected {
            let (name, value) = (name.as_ref(), value.as_ref());
            let actual = request
                .headers()
                .get(headers::header_name(name)?)
                .ok_or_else(|| Error::HeaderMissing {
                    path: self.path.clone(),
                    name: name.to_string(),
                })?;

            if actual.as_bytes() != value.as_bytes() {
                return Err(Error::HeaderMismatch {
                    path: self.path.clone(),
                    name: name.to_string(),
                    expected: value.to_string(),
                    actual: String::from_utf8_lossy(actual.as_bytes()).into_owned(),
                });
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Transport for InterceptAdapter {
    async fn send(&self, request: Request, _: &SendOptions) -> Result<Response, Error> {
        self.dispatch(request)
    }

    fn close(&self) {}
}

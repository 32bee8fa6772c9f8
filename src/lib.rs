//! Patches the transport of an HTTP client for the duration of a test, so
//! client code can be exercised against a pre-programmed response without a
//! network.
//!
//! Requests are sent with [Client] (or the [get], [post], [put], [delete] and
//! [request] shortcuts). Every new client builds its transports with the
//! process-wide [TransportFactory]. Entering a [PatchScope] replaces that
//! factory with one that hands out an [InterceptAdapter], which answers
//! requests for one path with a bound [ResponseSpec] and records them.
//! Dropping the scope puts the original factory back.
//!
//! Without a patch, requests go over the network with [HttpTransport], which
//! only supports HTTP/1.1 without TLS.
//!
//! ## Example
//!
//! ```
//! # // Please keep this example up-to-date with README.md, but remove all
//! # // lines starting with `#` and their contents.
//! use http_patch::{good, patch};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let patch = patch("/api/test");
//! patch.returns(good("hello"));
//!
//! let res = http_patch::get("https://test.api/api/test")
//!     .header("X-Special", "value")
//!     .send()
//!     .await
//!     .expect("send request");
//!
//! assert_eq!(res.status(), 200);
//! assert_eq!(res.text().expect("read response"), "hello");
//!
//! patch.was_called_once().expect("called once");
//! patch
//!     .was_called_with_headers([("x-special", "value")])
//!     .expect("headers sent");
//! # });
//! ```
//!
//! Requests for any other path fail with [Error::PathMismatch], and assertion
//! helpers return errors of [ErrorKind::Assertion], so a `?` or `expect` in
//! the test reports the mismatch.
//!
//! There are also more examples as tests.

mod client;
mod error;
mod headers;
mod intercept;
mod patch;
pub mod registry;
mod request;
mod response;
mod response_spec;
#[cfg(test)]
mod test_server;
mod transport;

pub use client::{delete, get, post, put, request, Client, ClientConfig, RequestBuilder};
pub use error::{Error, ErrorKind, StatusClass};
pub use intercept::InterceptAdapter;
pub use patch::{patch, PatchScope};
pub use registry::TransportFactory;
pub use request::Request;
pub use response::Response;
pub use response_spec::{bad, good, Body, ResponseSpec};
pub use transport::{HttpTransport, SendOptions, Transport};

pub use hyper;

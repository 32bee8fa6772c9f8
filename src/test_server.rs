//! A local HTTP/1.1 server for exercising [HttpTransport](crate::HttpTransport)
//! against a real socket.
//!
//! Routes:
//! - `/slow` sleeps for 10 seconds before answering.
//! - `/status/{code}` answers with the given status.
//! - anything else echoes the request body back, with the request path in the
//!   `x-echo-path` header.

use std::{
    convert::Infallible,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use http_body_util::{BodyExt, Full};
use hyper::{
    body::{self, Bytes},
    header::HeaderMap,
    server::conn::http1,
    service::service_fn,
    Method, StatusCode,
};
use hyper_util::rt::TokioIo;
use tokio::{net::TcpListener, select, sync::watch};

/// A request as observed by the [TestServer].
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug)]
pub struct TestServer {
    close_tx: watch::Sender<u8>,
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<SeenRequest>>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let addr: SocketAddr = ([127, 0, 0, 1], 0).into();
        let tcp_listener = TcpListener::bind(addr).await.expect("bind TCP listener");
        let addr = tcp_listener
            .local_addr()
            .expect("get TCP listener socket address");

        let (close_tx, close_rx) = watch::channel::<u8>(0);
        let requests = Arc::new(Mutex::new(Vec::new()));

        {
            let requests = requests.clone();
            tokio::spawn(async move {
                let mut close_rx = close_rx.clone();

                loop {
                    let (tcp_stream, _) = select! {
                        _ = close_rx.changed() => {
                            return;
                        }
                        res = tcp_listener.accept() => {
                            match res {
                                Ok(res) => res,
                                Err(_) => return,
                            }
                        }
                    };

                    let mut close_rx = close_rx.clone();
                    let requests = requests.clone();
                    tokio::spawn(async move {
                        let requests = &requests;
                        let service = service_fn(|req: hyper::Request<body::Incoming>| async move {
                            handle(req, requests).await
                        });

                        select! {
                            _ = close_rx.changed() => {}
                            _ = http1::Builder::new()
                                .serve_connection(TokioIo::new(tcp_stream), service) => {}
                        }
                    });
                }
            });
        }

        Self {
            close_tx,
            addr,
            requests,
        }
    }

    /// Returns an absolute `http` URL for the given path and query string.
    pub fn url(&self, path_and_query: &str) -> String {
        format!("http://{}{}", self.addr, path_and_query)
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.lock().expect("lock poisoned").clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.close_tx.send(1);
    }
}

async fn handle(
    req: hyper::Request<body::Incoming>,
    requests: &Mutex<Vec<SeenRequest>>,
) -> Result<hyper::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = body
        .collect()
        .await
        .map(|full| full.to_bytes())
        .unwrap_or_default();
    let path = parts.uri.path().to_string();

    requests.lock().expect("lock poisoned").push(SeenRequest {
        method: parts.method,
        path_and_query: parts
            .uri
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_default(),
        headers: parts.headers,
        body: body.clone(),
    });

    if path == "/slow" {
        tokio::time::sleep(Duration::from_secs(10)).await;
    }

    let status = path
        .strip_prefix("/status/")
        .and_then(|code| code.parse().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK);

    Ok(hyper::Response::builder()
        .status(status)
        .header("x-echo-path", path)
        .body(Full::new(body))
        .expect("should be a valid response"))
}

//! Forwarding to the scan service.
//!
//! Everything the gate does not answer itself goes upstream unchanged. For
//! the gated route this only happens after admission. An upstream failure
//! does not give the consumed slot back.

use std::str::FromStr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{
        header,
        uri::{Authority, InvalidUri, PathAndQuery, Scheme},
        Request, StatusCode, Uri,
    },
    response::Response,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::http::request::request_id_of;
use crate::http::response::error_response;
use crate::http::server::AppState;
use crate::observability::metrics;

/// HTTP client bound to the configured upstream.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client<HttpConnector, Body>,
    authority: Authority,
}

impl UpstreamClient {
    pub fn new(address: &str) -> Result<Self, InvalidUri> {
        let authority = Authority::from_str(address)?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(Self { client, authority })
    }

    /// Rewrite `request` to point at the upstream and send it.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let request_id = request_id_of(&request).to_string();
        let method = request.method().clone();

        let (mut parts, body) = request.into_parts();
        let mut uri_parts = parts.uri.clone().into_parts();
        uri_parts.scheme = Some(Scheme::HTTP);
        uri_parts.authority = Some(self.authority.clone());
        if uri_parts.path_and_query.is_none() {
            uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
        }
        parts.uri = match Uri::from_parts(uri_parts) {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
                return error_response(StatusCode::BAD_REQUEST, "Bad request", "Unroutable request URI");
            }
        };
        // Let the client derive Host from the rewritten URI.
        parts.headers.remove(header::HOST);

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            uri = %parts.uri,
            "Forwarding request upstream"
        );

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => {
                metrics::record_upstream(method.as_str(), response.status().as_u16(), start);
                let (parts, body) = response.into_parts();
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    upstream = %self.authority,
                    error = %e,
                    "Upstream error"
                );
                metrics::record_upstream(method.as_str(), 502, start);
                error_response(
                    StatusCode::BAD_GATEWAY,
                    "Bad gateway",
                    "Scan service unavailable",
                )
            }
        }
    }
}

/// Fallback handler: send anything not served locally to the upstream.
pub async fn forward_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.upstream.forward(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_address() {
        assert!(UpstreamClient::new("bad host:80").is_err());
        assert!(UpstreamClient::new("127.0.0.1:8090").is_ok());
    }

    #[tokio::test]
    async fn unreachable_upstream_is_bad_gateway() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let upstream = UpstreamClient::new(&addr.to_string()).unwrap();
        let res = upstream
            .forward(Request::post("/api/scan").body(Body::empty()).unwrap())
            .await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }
}

use std::time::Duration;

use actix_web::body::SizedStream;
use actix_web::dev::Payload;
use actix_web::{HttpRequest, HttpResponse};
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use log::{debug, error};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, Response};

use crate::error::GatewayError;
use crate::headers::{self, is_hop_by_hop};
use crate::route_config::HttpMethod;
use crate::route_table::MatchedRoute;
use crate::upstream_request::UpstreamRequest;

/// Relays matched requests to the single upstream origin, one attempt each.
pub struct Forwarder {
  client: Client,
  origin: Box<str>,
  timeout: Option<Duration>,
  max_body_bytes: usize,
}

impl Forwarder {
  pub fn new(client: Client, origin: &str, timeout: Option<Duration>, max_body_bytes: usize) -> Forwarder {
    Forwarder {
      client,
      origin: Box::from(origin),
      timeout,
      max_body_bytes,
    }
  }

  pub fn origin(&self) -> &str {
    &self.origin
  }

  pub async fn forward(
    &self,
    path: &str,
    matched: &MatchedRoute,
    source_request: &HttpRequest,
    payload: Payload,
  ) -> Result<HttpResponse, GatewayError> {
    let body = if sends_body(matched) {
      Some(self.read_body(path, payload).await?)
    } else {
      None
    };

    let upstream_request = self.init_request(matched, source_request, body);
    debug!("Forwarding '{}' to {}", path, upstream_request.url());

    let proxy_response = match self.timeout {
      Some(timeout) => actix_web::rt::time::timeout(timeout, upstream_request.send(&self.client))
        .await
        .map_err(|_| GatewayError::UpstreamTimeout {
          path: String::from(path),
          timeout,
        })?,
      None => upstream_request.send(&self.client).await,
    };

    match proxy_response {
      Ok(response) => Ok(Forwarder::map_response(response)),
      Err(err) => {
        error!("Proxy request for '{}' failed {}", path, err);
        Err(GatewayError::from_send(path, err, self.timeout))
      }
    }
  }

  /// Upstream request for a matched route: origin swapped in, path and query
  /// kept, only the content-type, accept and cache-control headers set.
  pub fn init_request(&self, matched: &MatchedRoute, source_request: &HttpRequest, body: Option<Bytes>) -> UpstreamRequest {
    let method = matched.rule.method;
    let url = format!("{}{}", self.origin, matched.upstream_target());
    let mut request = UpstreamRequest::new(method, url);

    let source_headers = source_request.headers();
    match source_headers.get(headers::CONTENT_TYPE) {
      Some(value) => {
        request = request.set_header(HeaderName::from_static(headers::CONTENT_TYPE), value.clone());
      }
      None if sends_body(matched) => {
        request = request.set_header(
          HeaderName::from_static(headers::CONTENT_TYPE),
          HeaderValue::from_static(headers::DEFAULT_BODY_TYPE),
        );
      }
      None => {}
    }

    if let Some(value) = source_headers.get(headers::ACCEPT) {
      request = request.set_header(HeaderName::from_static(headers::ACCEPT), value.clone());
    }

    if method == HttpMethod::Get {
      request = request.set_header(
        HeaderName::from_static(headers::CACHE_CONTROL),
        HeaderValue::from_static(headers::NO_STORE),
      );
    }

    if let Some(body) = body {
      request = request.set_body(body);
    }

    request
  }

  async fn read_body(&self, path: &str, mut payload: Payload) -> Result<Bytes, GatewayError> {
    let mut body_buffer = BytesMut::new();

    while let Some(chunk) = payload.next().await {
      let bytes = chunk.map_err(|err| GatewayError::RequestBody {
        path: String::from(path),
        message: err.to_string(),
      })?;

      if body_buffer.len() + bytes.len() > self.max_body_bytes {
        return Err(GatewayError::PayloadTooLarge {
          path: String::from(path),
          limit: self.max_body_bytes,
        });
      }
      body_buffer.extend_from_slice(&bytes);
    }

    Ok(body_buffer.freeze())
  }

  /// Status and end-to-end headers copied, body streamed as it arrives.
  /// Names listed in the upstream `Connection` header are dropped too.
  fn map_response(response: Response) -> HttpResponse {
    let mut http_response = HttpResponse::build(response.status());
    let connection_scoped = headers::connection_tokens(
      response
        .headers()
        .get_all(headers::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok()),
    );

    for (name, value) in response.headers() {
      let name_str = name.as_str();
      if is_hop_by_hop(name_str)
        || name_str == headers::CONTENT_LENGTH
        || connection_scoped.iter().any(|token| token == name_str)
      {
        continue;
      }
      http_response.append_header((name.clone(), value.clone()));
    }

    match response.content_length() {
      Some(length) => http_response.body(SizedStream::new(length, response.bytes_stream())),
      None => http_response.streaming(response.bytes_stream()),
    }
  }
}

fn sends_body(matched: &MatchedRoute) -> bool {
  matched.rule.forward_body && matched.rule.method.carries_body()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::route_config::{RouteConfig, RouteConfigFile};
  use crate::route_table::RouteTable;
  use actix_web::test::TestRequest;

  fn forwarder() -> Forwarder {
    Forwarder::new(Client::new(), "http://upstream.test", None, 64)
  }

  fn matched(method: HttpMethod, path: &str, query: &str) -> MatchedRoute {
    RouteTable::from_config(RouteConfigFile::builtin())
      .unwrap()
      .match_route(method, path)
      .unwrap()
      .with_query(query)
  }

  #[test]
  fn get_request_carries_no_store_and_no_body() {
    let source = TestRequest::get()
      .uri("/analyze/news?ticker=AAPL&days=7")
      .insert_header(("accept", "application/json"))
      .insert_header(("cookie", "session=abc"))
      .insert_header(("authorization", "Bearer x"))
      .to_http_request();

    let request = forwarder().init_request(&matched(HttpMethod::Get, "/analyze/news", "ticker=AAPL&days=7"), &source, None);

    assert_eq!(request.method(), HttpMethod::Get);
    assert_eq!(request.url(), "http://upstream.test/analyze/news?ticker=AAPL&days=7");
    assert_eq!(request.headers().get(headers::CACHE_CONTROL).unwrap(), headers::NO_STORE);
    assert_eq!(request.headers().get(headers::ACCEPT).unwrap(), "application/json");
    assert!(request.headers().get(headers::CONTENT_TYPE).is_none());
    assert!(request.headers().get("cookie").is_none());
    assert!(request.headers().get("authorization").is_none());
    assert!(request.body().is_none());
  }

  #[test]
  fn post_request_keeps_client_content_type() {
    let source = TestRequest::post()
      .uri("/advice/v1")
      .insert_header(("content-type", "application/json; charset=utf-8"))
      .to_http_request();
    let body = Bytes::from_static(br#"{"risk":3}"#);

    let request = forwarder().init_request(&matched(HttpMethod::Post, "/advice/v1", ""), &source, Some(body.clone()));

    assert_eq!(request.url(), "http://upstream.test/advice/v1");
    assert_eq!(
      request.headers().get(headers::CONTENT_TYPE).unwrap(),
      "application/json; charset=utf-8"
    );
    assert!(request.headers().get(headers::CACHE_CONTROL).is_none());
    assert_eq!(request.body(), Some(&body));
  }

  #[test]
  fn post_query_is_dropped_and_content_type_defaulted() {
    let source = TestRequest::post().uri("/advice?debug=1").to_http_request();

    let request = forwarder().init_request(&matched(HttpMethod::Post, "/advice", "debug=1"), &source, Some(Bytes::new()));

    assert_eq!(request.url(), "http://upstream.test/advice");
    assert_eq!(
      request.headers().get(headers::CONTENT_TYPE).unwrap(),
      headers::DEFAULT_BODY_TYPE
    );
  }

  #[test]
  fn body_only_read_for_body_routes() {
    let get = RouteTable::from_config(RouteConfigFile {
      routes: vec![RouteConfig::new(HttpMethod::Get, "/x").forward_body(true)],
    })
    .unwrap()
    .match_route(HttpMethod::Get, "/x")
    .unwrap();
    assert!(!sends_body(&get));

    assert!(sends_body(&matched(HttpMethod::Post, "/advice", "")));
  }

  #[actix_web::test]
  async fn read_body_enforces_limit() {
    let (_, payload) = TestRequest::post().set_payload(vec![b'x'; 65]).to_http_parts();
    let err = forwarder().read_body("/advice", payload).await.unwrap_err();
    assert!(matches!(err, GatewayError::PayloadTooLarge { limit: 64, .. }));

    let (_, payload) = TestRequest::post().set_payload(vec![b'x'; 64]).to_http_parts();
    let body = forwarder().read_body("/advice", payload).await.unwrap();
    assert_eq!(body.len(), 64);
  }
}

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Error, Response};

use crate::route_config::HttpMethod;

/// Request issued to the upstream origin on behalf of one client request.
#[derive(Debug)]
pub struct UpstreamRequest {
  method: HttpMethod,
  url: String,
  headers: HeaderMap,
  body: Option<Bytes>,
}

impl UpstreamRequest {
  pub fn new(method: HttpMethod, url: String) -> UpstreamRequest {
    UpstreamRequest {
      method,
      url,
      headers: HeaderMap::new(),
      body: None,
    }
  }

  pub fn set_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
    self.headers.insert(name, value);
    self
  }

  pub fn set_body(mut self, body: Bytes) -> Self {
    self.body = Some(body);
    self
  }

  pub fn method(&self) -> HttpMethod {
    self.method
  }

  pub fn url(&self) -> &str {
    &self.url
  }

  pub fn headers(&self) -> &HeaderMap {
    &self.headers
  }

  pub fn body(&self) -> Option<&Bytes> {
    self.body.as_ref()
  }

  pub async fn send(self, client: &Client) -> std::result::Result<Response, Error> {
    let mut builder = client
      .request(self.method.as_method(), self.url.as_str())
      .headers(self.headers);

    if let Some(body) = self.body {
      builder = builder.body(body);
    }

    builder.send().await
  }
}

use actix_web::http::Method;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::ErrorKind;

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone, Copy, Hash, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
  #[default]
  Get,
  Post,
  Put,
  Delete,
  Head,
  Patch,
  Options,
}

impl HttpMethod {
  pub const ALL: [HttpMethod; 7] = [
    HttpMethod::Get,
    HttpMethod::Post,
    HttpMethod::Put,
    HttpMethod::Delete,
    HttpMethod::Head,
    HttpMethod::Patch,
    HttpMethod::Options,
  ];

  /// Methods whose requests may carry a body worth forwarding.
  pub fn carries_body(&self) -> bool {
    matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
  }

  pub fn as_method(&self) -> Method {
    match self {
      HttpMethod::Get => Method::GET,
      HttpMethod::Post => Method::POST,
      HttpMethod::Put => Method::PUT,
      HttpMethod::Delete => Method::DELETE,
      HttpMethod::Head => Method::HEAD,
      HttpMethod::Patch => Method::PATCH,
      HttpMethod::Options => Method::OPTIONS,
    }
  }
}

/// One proxied endpoint as written in a route file.
#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct RouteConfig {
  pub path: String,
  pub method: Option<HttpMethod>,
  pub upstream: Option<String>,
  pub forward_query: Option<bool>,
  pub forward_body: Option<bool>,
}

impl RouteConfig {
  pub fn new(method: HttpMethod, path: &str) -> RouteConfig {
    RouteConfig {
      path: String::from(path),
      method: Some(method),
      upstream: None,
      forward_query: None,
      forward_body: None,
    }
  }

  pub fn forward_query(mut self, enabled: bool) -> Self {
    self.forward_query = Some(enabled);
    self
  }

  pub fn forward_body(mut self, enabled: bool) -> Self {
    self.forward_body = Some(enabled);
    self
  }
}

#[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
pub struct RouteConfigFile {
  pub routes: Vec<RouteConfig>,
}

impl RouteConfigFile {
  pub fn load_from_file(file: &File) -> Result<RouteConfigFile, std::io::Error> {
    let route_configs: RouteConfigFile =
      serde_yaml::from_reader(file).map_err(|err| std::io::Error::new(ErrorKind::Other, err))?;

    Ok(route_configs)
  }

  /// The advisor API surface proxied when no route file is given.
  pub fn builtin() -> RouteConfigFile {
    use HttpMethod::{Get, Post};

    let routes = vec![
      RouteConfig::new(Get, "/health").forward_query(false),
      RouteConfig::new(Get, "/db/ping").forward_query(false),
      RouteConfig::new(Post, "/advice"),
      RouteConfig::new(Post, "/advice/v1"),
      RouteConfig::new(Get, "/ingest/finnhub"),
      RouteConfig::new(Get, "/finnhub/*"),
      RouteConfig::new(Get, "/asset/:ticker"),
      RouteConfig::new(Get, "/analyze/fundamentals"),
      RouteConfig::new(Get, "/analyze/fundamentals_v1"),
      RouteConfig::new(Get, "/analyze/news"),
      RouteConfig::new(Get, "/analyze/street"),
      RouteConfig::new(Post, "/analyze/news_refine"),
    ];

    RouteConfigFile { routes }
  }
}

impl TryFrom<&Method> for HttpMethod {
  type Error = ();

  /// Method tokens are case-sensitive: an extension method `get` is not `GET`.
  fn try_from(value: &Method) -> Result<Self, Self::Error> {
    HttpMethod::ALL
      .into_iter()
      .find(|method| method.as_method() == *value)
      .ok_or(())
  }
}

impl Display for HttpMethod {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      HttpMethod::Get => f.write_str("get"),
      HttpMethod::Post => f.write_str("post"),
      HttpMethod::Put => f.write_str("put"),
      HttpMethod::Delete => f.write_str("delete"),
      HttpMethod::Head => f.write_str("head"),
      HttpMethod::Patch => f.write_str("patch"),
      HttpMethod::Options => f.write_str("options"),
    }
  }
}

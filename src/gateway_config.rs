use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{info, LevelFilter};
use reqwest::Url;

use crate::error::ConfigError;
use crate::gateway_service::forwarder::Forwarder;
use crate::gateway_service::Gateway;
use crate::http_client::HttpClientConfig;
use crate::route_config::RouteConfigFile;
use crate::route_table::RouteTable;
use crate::static_files::StaticAssets;

const DEFAULT_ORIGIN: &str = "https://api-advisor.onrender.com";

/// Edge gateway for the advisor API and its static UI bundle.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct GatewayConfig {
  /// Absolute upstream origin, no trailing slash.
  #[arg(long, env = "GATEWAY_UPSTREAM_ORIGIN", default_value = DEFAULT_ORIGIN)]
  pub upstream_origin: String,

  /// Directory served for requests no route matches.
  #[arg(long, env = "GATEWAY_ASSET_ROOT", default_value = "public")]
  pub asset_root: PathBuf,

  /// YAML route file replacing the built-in route table.
  #[arg(long = "routes", env = "GATEWAY_ROUTES_FILE")]
  pub routes_file: Option<PathBuf>,

  #[arg(long, env = "HTTP_BIND", default_value = "0.0.0.0")]
  pub bind: String,

  #[arg(long, env = "HTTP_PORT", default_value_t = 8080)]
  pub port: u16,

  #[arg(long, env = "HTTP_WORKER_COUNT", default_value_t = 4)]
  pub workers: usize,

  /// Budget for connecting and receiving upstream headers; 0 disables it.
  #[arg(long, env = "GATEWAY_UPSTREAM_TIMEOUT_MS", default_value_t = 10_000)]
  pub upstream_timeout_ms: u64,

  #[arg(long, env = "GATEWAY_CONNECT_TIMEOUT_MS", default_value_t = 3_000)]
  pub connect_timeout_ms: u64,

  #[arg(long, env = "GATEWAY_MAX_BODY_BYTES", default_value_t = 1024 * 1024)]
  pub max_body_bytes: usize,

  /// Origins allowed by CORS; CORS stays off when none are given.
  #[arg(long = "cors-origin", env = "GATEWAY_CORS_ORIGINS", value_delimiter = ',')]
  pub cors_origins: Vec<String>,

  #[arg(long, env = "HTTP_PROXY_URL")]
  pub http_proxy: Option<String>,

  #[arg(long, env = "HTTP_PROXY_USER")]
  pub http_proxy_user: Option<String>,

  #[arg(long, env = "HTTP_PROXY_PASS")]
  pub http_proxy_pass: Option<String>,

  /// off, error, warn, info, debug or trace.
  #[arg(long, env = "GATEWAY_LOG_LEVEL", default_value = "info")]
  pub log_level: String,
}

impl GatewayConfig {
  /// Defaults with the given origin and asset root, as if parsed from an
  /// empty command line.
  pub fn with_upstream(upstream_origin: &str, asset_root: impl Into<PathBuf>) -> GatewayConfig {
    GatewayConfig {
      upstream_origin: String::from(upstream_origin),
      asset_root: asset_root.into(),
      routes_file: None,
      bind: String::from("0.0.0.0"),
      port: 8080,
      workers: 4,
      upstream_timeout_ms: 10_000,
      connect_timeout_ms: 3_000,
      max_body_bytes: 1024 * 1024,
      cors_origins: Vec::new(),
      http_proxy: None,
      http_proxy_user: None,
      http_proxy_pass: None,
      log_level: String::from("info"),
    }
  }

  pub fn log_filter(&self) -> LevelFilter {
    LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::Info)
  }

  pub fn upstream_timeout(&self) -> Option<Duration> {
    match self.upstream_timeout_ms {
      0 => None,
      ms => Some(Duration::from_millis(ms)),
    }
  }

  /// CORS origins, each a full `scheme://host[:port]`; wildcards are refused.
  pub fn cors_origins(&self) -> Result<Vec<String>, ConfigError> {
    self
      .cors_origins
      .iter()
      .map(|origin| origin.trim())
      .filter(|origin| !origin.is_empty())
      .map(|origin| match validate_origin(origin) {
        Ok(valid) => Ok(String::from(valid)),
        Err(_) => Err(ConfigError::InvalidCorsOrigin(String::from(origin))),
      })
      .collect()
  }

  pub fn load_routes(&self) -> Result<RouteTable, ConfigError> {
    let config_file = match &self.routes_file {
      Some(file_path) => {
        let route_error = |source| ConfigError::RouteFile {
          file: file_path.display().to_string(),
          source,
        };
        let config_fd = File::open(file_path).map_err(route_error)?;
        info!("Loading routes from '{}'.", file_path.display());
        RouteConfigFile::load_from_file(&config_fd).map_err(route_error)?
      }
      None => RouteConfigFile::builtin(),
    };

    Ok(RouteTable::from_config(config_file)?)
  }

  pub fn build_gateway(&self) -> Result<Gateway, ConfigError> {
    let origin = validate_origin(&self.upstream_origin)?;
    let routes = self.load_routes()?;

    let client = HttpClientConfig {
      http_proxy: self.http_proxy.clone(),
      user: self.http_proxy_user.clone(),
      pass: self.http_proxy_pass.clone(),
      connect_timeout: Some(Duration::from_millis(self.connect_timeout_ms)).filter(|d| !d.is_zero()),
    }
    .to_client()?;

    let forwarder = Forwarder::new(client, origin, self.upstream_timeout(), self.max_body_bytes);
    let assets = StaticAssets::new(self.asset_root.clone());
    info!(
      "Gateway ready: {} routes to '{}', assets from '{}'.",
      routes.len(),
      origin,
      assets.root().display()
    );

    Ok(Gateway::new(routes, forwarder, assets))
  }

  pub fn into_shared_gateway(self) -> Result<Arc<Gateway>, ConfigError> {
    self.build_gateway().map(Arc::new)
  }
}

/// Accepts `scheme://host[:port]` only: http(s), no path, query, fragment,
/// credentials or trailing slash.
pub fn validate_origin(raw: &str) -> Result<&str, ConfigError> {
  let invalid = |reason: &str| ConfigError::InvalidOrigin {
    origin: String::from(raw),
    reason: String::from(reason),
  };

  if raw.ends_with('/') {
    return Err(invalid("trailing slash"));
  }

  let url = Url::parse(raw).map_err(|err| invalid(&err.to_string()))?;

  if url.scheme() != "http" && url.scheme() != "https" {
    return Err(invalid("scheme must be http or https"));
  }
  if url.host_str().is_none() {
    return Err(invalid("missing host"));
  }
  if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
    return Err(invalid("origin must not carry a path, query or fragment"));
  }
  if !url.username().is_empty() || url.password().is_some() {
    return Err(invalid("origin must not carry credentials"));
  }

  Ok(raw)
}

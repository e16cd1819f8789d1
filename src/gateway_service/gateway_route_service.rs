use std::sync::Arc;

use actix_web::dev::{self, Payload, Service, ServiceRequest, ServiceResponse};
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use futures_core::future::LocalBoxFuture;
use log::{debug, warn};

use crate::error::GatewayError;
use crate::gateway_service::Gateway;
use crate::path;
use crate::route_config::HttpMethod;
use crate::route_table::MatchedRoute;

/// Outcome of consulting the route table for one request.
#[derive(Debug)]
pub enum Routed {
  Forward(MatchedRoute),
  Fallback,
}

pub struct GatewayRouteService {
  pub(super) gateway: Arc<Gateway>,
}

impl Service<ServiceRequest> for GatewayRouteService {
  type Response = ServiceResponse;
  type Error = actix_web::Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  dev::always_ready!();

  fn call(&self, req: ServiceRequest) -> Self::Future {
    let (http_request, payload) = req.into_parts();
    let gateway = self.gateway.clone();

    Box::pin(GatewayRouteService::exec(gateway, http_request, payload))
  }
}

impl GatewayRouteService {
  async fn exec(gateway: Arc<Gateway>, http: HttpRequest, payload: Payload) -> Result<ServiceResponse, actix_web::Error> {
    let path = path::normalize(http.path());
    let routed = GatewayRouteService::route(&gateway, &http, &path);
    debug!("{} '{}' routed as {:?}", http.method(), path, routed);

    let result = match routed {
      Routed::Forward(matched) => gateway.forwarder.forward(&path, &matched, &http, payload).await,
      Routed::Fallback => gateway.assets.serve(http.method(), &path).await,
    };

    let response = result.unwrap_or_else(|err| GatewayRouteService::map_error(&err));
    Ok(ServiceResponse::new(http, response))
  }

  /// Normalised path and method looked up in the table; the raw query string
  /// rides along untouched.
  pub fn route(gateway: &Gateway, http: &HttpRequest, path: &str) -> Routed {
    let matched = HttpMethod::try_from(http.method())
      .ok()
      .and_then(|method| gateway.routes.match_route(method, path));

    match matched {
      Some(matched) => Routed::Forward(matched.with_query(http.query_string())),
      None => Routed::Fallback,
    }
  }

  fn map_error(err: &GatewayError) -> HttpResponse {
    match err {
      GatewayError::RouteNotFound { .. } => debug!("{}", err),
      _ => warn!("{}", err),
    }

    err.error_response()
  }
}

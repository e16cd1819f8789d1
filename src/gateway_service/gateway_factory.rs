use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use futures_core::future::LocalBoxFuture;

use crate::gateway_service::gateway_route_service::GatewayRouteService;
use crate::gateway_service::Gateway;

pub struct GatewayServiceFactory {
  pub gateway: Arc<Gateway>,
}

impl ServiceFactory<ServiceRequest> for GatewayServiceFactory {
  type Response = ServiceResponse;
  type Error = actix_web::Error;
  type Config = ();
  type Service = GatewayRouteService;
  type InitError = ();
  type Future = LocalBoxFuture<'static, Result<Self::Service, Self::InitError>>;

  fn new_service(&self, _: Self::Config) -> Self::Future {
    let service = GatewayRouteService {
      gateway: self.gateway.clone(),
    };

    Box::pin(async move { Ok(service) })
  }
}

impl GatewayServiceFactory {
  pub fn create(gateway: Arc<Gateway>) -> Self {
    Self { gateway }
  }
}

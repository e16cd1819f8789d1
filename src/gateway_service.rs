use std::sync::Arc;

use crate::gateway_service::forwarder::Forwarder;
use crate::route_table::RouteTable;
use crate::static_files::StaticAssets;

pub mod forwarder;
pub mod gateway_factory;
pub mod gateway_route_service;

/// Everything a request needs, built once at startup and shared read-only by
/// every worker.
pub struct Gateway {
  pub routes: Arc<RouteTable>,
  pub forwarder: Forwarder,
  pub assets: StaticAssets,
}

impl Gateway {
  pub fn new(routes: RouteTable, forwarder: Forwarder, assets: StaticAssets) -> Gateway {
    Gateway {
      routes: Arc::new(routes),
      forwarder,
      assets,
    }
  }
}

//! Shared helpers for the gateway integration tests.

use std::fs;
use std::sync::Arc;

use advisor_gateway::{Gateway, GatewayConfig};
use tempfile::TempDir;

/// Asset root holding a tiny UI bundle.
pub fn asset_root() -> TempDir {
  let dir = tempfile::tempdir().unwrap();
  fs::write(dir.path().join("index.html"), "<!doctype html><title>advisor</title>").unwrap();
  fs::write(dir.path().join("app.js"), "document.title = 'advisor';").unwrap();
  dir
}

/// Config pointing at `origin` with short timeouts suited to tests.
pub fn config(origin: &str, assets: &TempDir) -> GatewayConfig {
  let mut config = GatewayConfig::with_upstream(origin, assets.path());
  config.upstream_timeout_ms = 2_000;
  config.connect_timeout_ms = 500;
  config
}

pub fn gateway(config: GatewayConfig) -> Arc<Gateway> {
  config.into_shared_gateway().unwrap()
}

pub mod error;
pub mod gateway_config;
pub mod gateway_service;
pub mod headers;
pub mod http_client;
pub mod path;
pub mod route_config;
pub mod route_table;
pub mod static_files;
pub mod std_logger;
pub mod upstream_request;

pub use error::{ConfigError, GatewayError};
pub use gateway_config::GatewayConfig;
pub use gateway_service::gateway_factory::GatewayServiceFactory;
pub use gateway_service::Gateway;
